//! Host thread for native tray objects.
//!
//! `tray_icon::TrayIcon` is not `Send`, and on Linux it only works on the
//! thread that runs the GTK main loop. One thread per process owns every
//! native icon: peers submit commands over a channel and block on the
//! reply, so the call path stays synchronous. The same thread drains the
//! native event channel and fans events out to the per-icon listener
//! sets.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use tray_icon::{TrayIconBuilder, TrayIconEvent};

use super::IconShared;
use crate::error::{BindFailure, TrayError};
use crate::event::{ActionEvent, MouseButton, MouseEvent, MouseMotionEvent};
use crate::image::TrayImage;
use crate::menu::MenuEntry;
use crate::peer::{IconId, IconRequest};

const PUMP_INTERVAL: Duration = Duration::from_millis(50);

enum HostCommand {
    Create {
        id: IconId,
        image: TrayImage,
        tooltip: Option<String>,
        menu: Option<Vec<MenuEntry>>,
        shared: Arc<IconShared>,
        reply: Sender<Result<(), BindFailure>>,
    },
    SetImage {
        id: IconId,
        image: TrayImage,
        reply: Sender<Result<(), TrayError>>,
    },
    SetTooltip {
        id: IconId,
        tooltip: Option<String>,
        reply: Sender<Result<(), TrayError>>,
    },
    SetMenu {
        id: IconId,
        entries: Option<Vec<MenuEntry>>,
        reply: Sender<Result<(), TrayError>>,
    },
    SetVisible {
        id: IconId,
        visible: bool,
        reply: Sender<Result<(), TrayError>>,
    },
    Destroy {
        id: IconId,
    },
}

#[derive(Clone)]
pub(super) struct HostHandle {
    commands: Sender<HostCommand>,
}

static HOST: OnceCell<Result<HostHandle, String>> = OnceCell::new();

/// Returns the process-wide host, starting it on first use. A host that
/// failed to start stays failed for the process lifetime.
pub(super) fn handle() -> Result<HostHandle, BindFailure> {
    match HOST.get_or_init(start) {
        Ok(handle) => Ok(handle.clone()),
        Err(reason) => Err(BindFailure::unavailable(reason.clone())),
    }
}

fn start() -> Result<HostHandle, String> {
    let (command_tx, command_rx) = mpsc::channel();
    let (ready_tx, ready_rx) = mpsc::channel();

    std::thread::Builder::new()
        .name("systray-host".into())
        .spawn(move || run(command_rx, ready_tx))
        .map_err(|e| format!("failed to spawn tray host thread: {e}"))?;

    match ready_rx.recv() {
        Ok(Ok(())) => {
            log::debug!("tray host thread started");
            Ok(HostHandle {
                commands: command_tx,
            })
        }
        Ok(Err(reason)) => Err(reason),
        Err(_) => Err("tray host thread exited during startup".into()),
    }
}

impl HostHandle {
    pub(super) fn create(
        &self,
        request: &IconRequest,
        shared: Arc<IconShared>,
    ) -> Result<(), BindFailure> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let command = HostCommand::Create {
            id: request.id,
            image: request.image.clone(),
            tooltip: request.tooltip.clone(),
            menu: request.menu.as_ref().map(|m| m.entries().to_vec()),
            shared,
            reply: reply_tx,
        };
        self.commands
            .send(command)
            .map_err(|_| BindFailure::unavailable("tray host thread is gone"))?;
        reply_rx
            .recv()
            .map_err(|_| BindFailure::unavailable("tray host thread is gone"))?
    }

    pub(super) fn set_image(&self, id: IconId, image: TrayImage) -> Result<(), TrayError> {
        self.call(move |reply| HostCommand::SetImage { id, image, reply })
    }

    pub(super) fn set_tooltip(
        &self,
        id: IconId,
        tooltip: Option<String>,
    ) -> Result<(), TrayError> {
        self.call(move |reply| HostCommand::SetTooltip { id, tooltip, reply })
    }

    pub(super) fn set_menu(
        &self,
        id: IconId,
        entries: Option<Vec<MenuEntry>>,
    ) -> Result<(), TrayError> {
        self.call(move |reply| HostCommand::SetMenu { id, entries, reply })
    }

    pub(super) fn set_visible(&self, id: IconId, visible: bool) -> Result<(), TrayError> {
        self.call(move |reply| HostCommand::SetVisible { id, visible, reply })
    }

    pub(super) fn destroy(&self, id: IconId) {
        let _ = self.commands.send(HostCommand::Destroy { id });
    }

    fn call(
        &self,
        command: impl FnOnce(Sender<Result<(), TrayError>>) -> HostCommand,
    ) -> Result<(), TrayError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(command(reply_tx))
            .map_err(|_| host_gone())?;
        reply_rx.recv().unwrap_or_else(|_| Err(host_gone()))
    }
}

fn host_gone() -> TrayError {
    TrayError::Native("tray host thread is gone".into())
}

struct HostIcon {
    tray: tray_icon::TrayIcon,
    shared: Arc<IconShared>,
}

#[cfg(target_os = "linux")]
fn run(commands: Receiver<HostCommand>, ready: Sender<Result<(), String>>) {
    use gtk::glib;

    if gtk::init().is_err() {
        let _ = ready.send(Err("failed to initialize GTK".into()));
        return;
    }
    let _ = ready.send(Ok(()));

    let mut icons: HashMap<IconId, HostIcon> = HashMap::new();
    glib::timeout_add_local(PUMP_INTERVAL, move || {
        while let Ok(command) = commands.try_recv() {
            apply(command, &mut icons);
        }
        drain_events(&icons);
        glib::ControlFlow::Continue
    });
    gtk::main();
}

#[cfg(not(target_os = "linux"))]
fn run(commands: Receiver<HostCommand>, ready: Sender<Result<(), String>>) {
    let _ = ready.send(Ok(()));

    let mut icons: HashMap<IconId, HostIcon> = HashMap::new();
    loop {
        match commands.recv_timeout(PUMP_INTERVAL) {
            Ok(command) => apply(command, &mut icons),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        drain_events(&icons);
    }
}

fn apply(command: HostCommand, icons: &mut HashMap<IconId, HostIcon>) {
    match command {
        HostCommand::Create {
            id,
            image,
            tooltip,
            menu,
            shared,
            reply,
        } => {
            let _ = reply.send(create(id, image, tooltip, menu, shared, icons));
        }
        HostCommand::SetImage { id, image, reply } => {
            let _ = reply.send(with_icon(icons, id, |icon| {
                let native = native_icon(&image)?;
                icon.tray
                    .set_icon(Some(native))
                    .map_err(|e| TrayError::Native(format!("failed to update tray image: {e}")))
            }));
        }
        HostCommand::SetTooltip { id, tooltip, reply } => {
            let _ = reply.send(with_icon(icons, id, |icon| {
                icon.tray
                    .set_tooltip(tooltip.as_deref())
                    .map_err(|e| TrayError::Native(format!("failed to update tooltip: {e}")))
            }));
        }
        HostCommand::SetMenu { id, entries, reply } => {
            let _ = reply.send(with_icon(icons, id, |icon| {
                icon.tray.set_menu(
                    entries
                        .as_deref()
                        .map(|e| Box::new(build_menu(e)) as Box<dyn tray_icon::menu::ContextMenu>),
                );
                Ok(())
            }));
        }
        HostCommand::SetVisible { id, visible, reply } => {
            let _ = reply.send(with_icon(icons, id, |icon| {
                icon.tray.set_visible(visible).map_err(|e| {
                    TrayError::Native(format!("failed to toggle tray icon visibility: {e}"))
                })
            }));
        }
        HostCommand::Destroy { id } => {
            if icons.remove(&id).is_some() {
                log::debug!("destroyed native tray icon {}", id);
            }
        }
    }
}

fn with_icon(
    icons: &mut HashMap<IconId, HostIcon>,
    id: IconId,
    op: impl FnOnce(&mut HostIcon) -> Result<(), TrayError>,
) -> Result<(), TrayError> {
    match icons.get_mut(&id) {
        Some(icon) => op(icon),
        None => Err(TrayError::Native(format!("unknown tray icon {id}"))),
    }
}

fn create(
    id: IconId,
    image: TrayImage,
    tooltip: Option<String>,
    menu: Option<Vec<MenuEntry>>,
    shared: Arc<IconShared>,
    icons: &mut HashMap<IconId, HostIcon>,
) -> Result<(), BindFailure> {
    let native = native_icon(&image).map_err(BindFailure::Fault)?;

    let mut builder = TrayIconBuilder::new()
        .with_id(id.to_string())
        .with_icon(native);
    if let Some(tooltip) = &tooltip {
        builder = builder.with_tooltip(tooltip);
    }
    if let Some(entries) = &menu {
        builder = builder.with_menu(Box::new(build_menu(entries)));
    }

    let tray = builder
        .build()
        .map_err(|e| BindFailure::unavailable(format!("failed to create native tray icon: {e}")))?;

    // Icons become visible when added to the container, not at
    // construction.
    if let Err(e) = tray.set_visible(false) {
        log::warn!("could not hide newly created tray icon {}: {}", id, e);
    }

    icons.insert(id, HostIcon { tray, shared });
    log::debug!("created native tray icon {}", id);
    Ok(())
}

fn native_icon(image: &TrayImage) -> Result<tray_icon::Icon, TrayError> {
    tray_icon::Icon::from_rgba(image.rgba().to_vec(), image.width(), image.height())
        .map_err(|e| TrayError::InvalidArgument(format!("invalid tray image: {e}")))
}

fn build_menu(entries: &[MenuEntry]) -> tray_icon::menu::Menu {
    use tray_icon::menu::{Menu, MenuItem, PredefinedMenuItem};

    let menu = Menu::new();
    for entry in entries {
        let appended = match entry {
            MenuEntry::Item(label) => menu.append(&MenuItem::new(label, true, None)),
            MenuEntry::Separator => menu.append(&PredefinedMenuItem::separator()),
        };
        if let Err(e) = appended {
            log::warn!("failed to append tray menu entry: {}", e);
        }
    }
    menu
}

fn drain_events(icons: &HashMap<IconId, HostIcon>) {
    while let Ok(event) = TrayIconEvent::receiver().try_recv() {
        dispatch(event, icons);
    }
}

fn dispatch(event: TrayIconEvent, icons: &HashMap<IconId, HostIcon>) {
    let Some(id) = event.id().0.parse::<u64>().ok().map(IconId) else {
        return;
    };
    let Some(icon) = icons.get(&id) else {
        return;
    };

    match event {
        TrayIconEvent::Click {
            position,
            button,
            button_state,
            ..
        } => {
            if matches!(button_state, tray_icon::MouseButtonState::Down) {
                icon.shared.mouse.notify(&MouseEvent {
                    x: position.x,
                    y: position.y,
                    button: translate_button(button),
                });
            }
        }
        TrayIconEvent::DoubleClick { button, .. } => {
            if matches!(button, tray_icon::MouseButton::Left) {
                let command = icon.shared.action_command.read().unwrap().clone();
                icon.shared.action.notify(&ActionEvent { command });
            }
        }
        TrayIconEvent::Move { position, .. } => {
            icon.shared.motion.notify(&MouseMotionEvent {
                x: position.x,
                y: position.y,
            });
        }
        // Enter and leave are not part of the delivered event set.
        _ => {}
    }
}

fn translate_button(button: tray_icon::MouseButton) -> MouseButton {
    match button {
        tray_icon::MouseButton::Left => MouseButton::Left,
        tray_icon::MouseButton::Middle => MouseButton::Middle,
        tray_icon::MouseButton::Right => MouseButton::Right,
    }
}
