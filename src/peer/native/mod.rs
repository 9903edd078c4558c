//! Built-in backend over the `tray-icon` crate.
//!
//! Native tray handles are not `Send`, and on Linux they only work on the
//! thread running the GTK main loop. Every native object therefore lives
//! on a single host thread (see [`host`]); the peer types here talk to it
//! over a command channel with blocking replies, which keeps the peer
//! surface `Send + Sync` while every call stays synchronous.

mod host;

use std::sync::{Arc, RwLock};

use crate::binding::TrayBackend;
use crate::error::{BindFailure, TrayError};
use crate::event::{ActionEvent, MouseEvent, MouseMotionEvent, PropertyChangeEvent};
use crate::image::{Dimensions, TrayImage};
use crate::listener::{Listener, ListenerId, ListenerSet};
use crate::menu::PopupMenu;
use crate::peer::{
    IconId, IconRegistry, IconRequest, MessageKind, SystemTrayPeer, TrayIconPeer,
};

/// The backend selected by default when the `native` feature is enabled.
pub static NATIVE_BACKEND: TrayBackend = TrayBackend {
    name: "tray-icon",
    probe,
    container,
    icon,
};

fn probe() -> Result<bool, BindFailure> {
    Ok(display_available())
}

#[cfg(target_os = "linux")]
fn display_available() -> bool {
    std::env::var_os("WAYLAND_DISPLAY").is_some() || std::env::var_os("DISPLAY").is_some()
}

#[cfg(not(target_os = "linux"))]
fn display_available() -> bool {
    true
}

fn container() -> Result<Box<dyn SystemTrayPeer>, BindFailure> {
    if !display_available() {
        return Err(BindFailure::unavailable("no display connection"));
    }
    let host = host::handle()?;
    Ok(Box::new(NativeSystemTray {
        _host: host,
        registry: IconRegistry::new(),
    }))
}

fn icon(request: IconRequest) -> Result<Arc<dyn TrayIconPeer>, BindFailure> {
    request.image.validate().map_err(BindFailure::Fault)?;
    let host = host::handle()?;
    let shared = Arc::new(IconShared::new());
    host.create(&request, Arc::clone(&shared))?;
    Ok(Arc::new(NativeTrayIcon {
        id: request.id,
        host,
        shared,
        state: RwLock::new(IconState {
            image: request.image,
            tooltip: request.tooltip,
            menu: request.menu,
            auto_size: false,
        }),
    }))
}

/// Listener fan-out for one icon, shared with the host thread's event
/// pump.
struct IconShared {
    mouse: ListenerSet<MouseEvent>,
    motion: ListenerSet<MouseMotionEvent>,
    action: ListenerSet<ActionEvent>,
    action_command: RwLock<Option<String>>,
}

impl IconShared {
    fn new() -> Self {
        Self {
            mouse: ListenerSet::new(),
            motion: ListenerSet::new(),
            action: ListenerSet::new(),
            action_command: RwLock::new(None),
        }
    }
}

/// Last-set state mirrored for the getters; the native facility has no
/// read API of its own.
struct IconState {
    image: TrayImage,
    tooltip: Option<String>,
    menu: Option<PopupMenu>,
    auto_size: bool,
}

struct NativeSystemTray {
    _host: host::HostHandle,
    registry: IconRegistry,
}

impl SystemTrayPeer for NativeSystemTray {
    fn add(&self, icon: Arc<dyn TrayIconPeer>) -> Result<(), TrayError> {
        self.registry.add(icon)
    }

    fn remove(&self, icon: &Arc<dyn TrayIconPeer>) {
        self.registry.remove(icon);
    }

    fn icons(&self) -> Vec<Arc<dyn TrayIconPeer>> {
        self.registry.snapshot()
    }

    fn icon_size(&self) -> Dimensions {
        preferred_icon_size()
    }

    fn add_property_listener(
        &self,
        property: &str,
        listener: Listener<PropertyChangeEvent>,
    ) -> ListenerId {
        self.registry.properties().add(property, listener)
    }

    fn remove_property_listener(&self, property: &str, id: ListenerId) {
        self.registry.properties().remove(property, id);
    }

    fn property_listeners(&self, property: &str) -> Vec<Listener<PropertyChangeEvent>> {
        self.registry.properties().listeners(property)
    }
}

struct NativeTrayIcon {
    id: IconId,
    host: host::HostHandle,
    shared: Arc<IconShared>,
    state: RwLock<IconState>,
}

impl TrayIconPeer for NativeTrayIcon {
    fn id(&self) -> IconId {
        self.id
    }

    fn set_image(&self, image: TrayImage) -> Result<(), TrayError> {
        image.validate()?;
        self.host.set_image(self.id, image.clone())?;
        self.state.write().unwrap().image = image;
        Ok(())
    }

    fn image(&self) -> TrayImage {
        self.state.read().unwrap().image.clone()
    }

    fn set_tooltip(&self, tooltip: Option<String>) -> Result<(), TrayError> {
        self.host.set_tooltip(self.id, tooltip.clone())?;
        self.state.write().unwrap().tooltip = tooltip;
        Ok(())
    }

    fn tooltip(&self) -> Option<String> {
        self.state.read().unwrap().tooltip.clone()
    }

    fn set_menu(&self, menu: Option<PopupMenu>) -> Result<(), TrayError> {
        self.host
            .set_menu(self.id, menu.as_ref().map(|m| m.entries().to_vec()))?;
        self.state.write().unwrap().menu = menu;
        Ok(())
    }

    fn menu(&self) -> Option<PopupMenu> {
        self.state.read().unwrap().menu.clone()
    }

    fn set_auto_size(&self, auto_size: bool) {
        // The native facility always fits the image to the tray slot;
        // only the flag itself is recorded.
        self.state.write().unwrap().auto_size = auto_size;
    }

    fn is_auto_size(&self) -> bool {
        self.state.read().unwrap().auto_size
    }

    fn set_action_command(&self, command: Option<String>) {
        *self.shared.action_command.write().unwrap() = command;
    }

    fn action_command(&self) -> Option<String> {
        self.shared.action_command.read().unwrap().clone()
    }

    fn add_mouse_listener(&self, listener: Listener<MouseEvent>) -> ListenerId {
        self.shared.mouse.add(listener)
    }

    fn remove_mouse_listener(&self, id: ListenerId) {
        self.shared.mouse.remove(id);
    }

    fn mouse_listeners(&self) -> Vec<Listener<MouseEvent>> {
        self.shared.mouse.snapshot()
    }

    fn add_motion_listener(&self, listener: Listener<MouseMotionEvent>) -> ListenerId {
        self.shared.motion.add(listener)
    }

    fn remove_motion_listener(&self, id: ListenerId) {
        self.shared.motion.remove(id);
    }

    fn motion_listeners(&self) -> Vec<Listener<MouseMotionEvent>> {
        self.shared.motion.snapshot()
    }

    fn add_action_listener(&self, listener: Listener<ActionEvent>) -> ListenerId {
        self.shared.action.add(listener)
    }

    fn remove_action_listener(&self, id: ListenerId) {
        self.shared.action.remove(id);
    }

    fn action_listeners(&self) -> Vec<Listener<ActionEvent>> {
        self.shared.action.snapshot()
    }

    fn display_message(
        &self,
        caption: Option<&str>,
        text: Option<&str>,
        kind: MessageKind,
    ) -> Result<(), TrayError> {
        let mut notification = notify_rust::Notification::new();
        notification.summary(caption.unwrap_or(""));
        if let Some(text) = text {
            notification.body(text);
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            notification.urgency(urgency_for(kind));
            if let Some(icon) = theme_icon_for(kind) {
                notification.icon(icon);
            }
        }
        #[cfg(not(all(unix, not(target_os = "macos"))))]
        let _ = kind;
        match notification.show() {
            Ok(_) => {}
            // Message display is best-effort; a desktop without a
            // notification service just drops it.
            Err(e) => log::debug!("tray message not shown: {}", e),
        }
        Ok(())
    }

    fn size(&self) -> Dimensions {
        preferred_icon_size()
    }

    fn attach(&self) -> Result<(), TrayError> {
        self.host.set_visible(self.id, true)
    }

    fn detach(&self) {
        if let Err(e) = self.host.set_visible(self.id, false) {
            log::warn!("could not hide tray icon {}: {}", self.id, e);
        }
    }
}

impl Drop for NativeTrayIcon {
    fn drop(&mut self) {
        self.host.destroy(self.id);
    }
}

fn preferred_icon_size() -> Dimensions {
    if cfg!(target_os = "windows") {
        Dimensions {
            width: 16,
            height: 16,
        }
    } else if cfg!(target_os = "macos") {
        Dimensions {
            width: 22,
            height: 22,
        }
    } else {
        Dimensions {
            width: 24,
            height: 24,
        }
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn urgency_for(kind: MessageKind) -> notify_rust::Urgency {
    match kind {
        MessageKind::Error => notify_rust::Urgency::Critical,
        MessageKind::Warning => notify_rust::Urgency::Normal,
        MessageKind::Info => notify_rust::Urgency::Normal,
        MessageKind::None => notify_rust::Urgency::Low,
    }
}

#[cfg(all(unix, not(target_os = "macos")))]
fn theme_icon_for(kind: MessageKind) -> Option<&'static str> {
    match kind {
        MessageKind::Error => Some("dialog-error"),
        MessageKind::Warning => Some("dialog-warning"),
        MessageKind::Info => Some("dialog-information"),
        MessageKind::None => None,
    }
}
