use std::sync::Arc;

use crate::binding;
use crate::error::TrayError;
use crate::event::{ActionEvent, MouseEvent, MouseMotionEvent};
use crate::image::{Dimensions, TrayImage};
use crate::listener::{Listener, ListenerId};
use crate::menu::PopupMenu;
use crate::peer::{IconId, IconRequest, TrayIconPeer};

/// The urgency and iconography of a transient tray message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    /// An error message.
    Error,
    /// An informational message.
    Info,
    /// A plain message with no urgency attached.
    None,
    /// A warning message.
    Warning,
}

/// One icon in the desktop tray: an image plus tooltip, popup menu,
/// action command and listeners.
///
/// Construction binds a fresh native peer; the peer reference never
/// changes afterwards. The icon shows up on the desktop only once added
/// to [`crate::SystemTray`].
pub struct TrayIcon {
    peer: Arc<dyn TrayIconPeer>,
}

impl TrayIcon {
    /// Creates a tray icon from `image`.
    ///
    /// Fails with [`TrayError::Unsupported`] when the platform has no
    /// tray, and with [`TrayError::InvalidArgument`] when the backend
    /// rejects the image.
    pub fn new(image: TrayImage) -> Result<Self, TrayError> {
        Self::build(image, None, None)
    }

    /// Creates a tray icon with a tooltip.
    pub fn with_tooltip(image: TrayImage, tooltip: impl Into<String>) -> Result<Self, TrayError> {
        Self::build(image, Some(tooltip.into()), None)
    }

    /// Creates a tray icon with an optional tooltip and a popup menu.
    pub fn with_menu(
        image: TrayImage,
        tooltip: Option<String>,
        menu: PopupMenu,
    ) -> Result<Self, TrayError> {
        Self::build(image, tooltip, Some(menu))
    }

    fn build(
        image: TrayImage,
        tooltip: Option<String>,
        menu: Option<PopupMenu>,
    ) -> Result<Self, TrayError> {
        let id = IconId::next();
        if let Some(menu) = &menu {
            menu.attach(id)?;
        }
        let request = IconRequest {
            id,
            image,
            tooltip,
            menu: menu.clone(),
        };
        match binding::resolve_icon(request) {
            Ok(peer) => Ok(Self { peer }),
            Err(err) => {
                if let Some(menu) = &menu {
                    menu.release(id);
                }
                Err(err)
            }
        }
    }

    pub(crate) fn from_peer(peer: Arc<dyn TrayIconPeer>) -> Self {
        Self { peer }
    }

    pub(crate) fn peer(&self) -> &Arc<dyn TrayIconPeer> {
        &self.peer
    }

    pub fn set_image(&self, image: TrayImage) -> Result<(), TrayError> {
        self.peer.set_image(image)
    }

    pub fn image(&self) -> TrayImage {
        self.peer.image()
    }

    /// Sets or clears the tooltip shown when the pointer rests on the
    /// icon.
    pub fn set_tooltip(&self, tooltip: Option<&str>) -> Result<(), TrayError> {
        self.peer.set_tooltip(tooltip.map(str::to_string))
    }

    pub fn tooltip(&self) -> Option<String> {
        self.peer.tooltip()
    }

    /// Sets or clears the popup menu.
    ///
    /// A menu belongs to at most one icon: attaching one that another
    /// icon still owns is an error, and a replaced menu is released for
    /// reuse elsewhere. Re-setting the menu this icon already owns is a
    /// no-op.
    pub fn set_popup_menu(&self, menu: Option<PopupMenu>) -> Result<(), TrayError> {
        let id = self.peer.id();
        if let Some(menu) = &menu {
            menu.attach(id)?;
        }
        let previous = self.peer.menu();
        if let Err(err) = self.peer.set_menu(menu.clone()) {
            if let Some(menu) = &menu {
                if previous.as_ref() != Some(menu) {
                    menu.release(id);
                }
            }
            return Err(err);
        }
        if let Some(previous) = previous {
            if menu.as_ref() != Some(&previous) {
                previous.release(id);
            }
        }
        Ok(())
    }

    pub fn popup_menu(&self) -> Option<PopupMenu> {
        self.peer.menu()
    }

    /// Auto-size stretches or shrinks the image to fit the tray slot.
    /// Defaults to `false`.
    pub fn set_image_auto_size(&self, auto_size: bool) {
        self.peer.set_auto_size(auto_size);
    }

    pub fn is_image_auto_size(&self) -> bool {
        self.peer.is_auto_size()
    }

    /// The command string carried by action events from this icon.
    pub fn set_action_command(&self, command: Option<&str>) {
        self.peer.set_action_command(command.map(str::to_string));
    }

    pub fn action_command(&self) -> Option<String> {
        self.peer.action_command()
    }

    /// Registers a listener for pointer clicks on the icon. Coordinates
    /// delivered to it are screen-relative.
    pub fn add_mouse_listener(
        &self,
        listener: impl Fn(&MouseEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.peer.add_mouse_listener(Arc::new(listener))
    }

    /// Removes a mouse listener. Unknown ids are ignored.
    pub fn remove_mouse_listener(&self, id: ListenerId) {
        self.peer.remove_mouse_listener(id);
    }

    pub fn mouse_listeners(&self) -> Vec<Listener<MouseEvent>> {
        self.peer.mouse_listeners()
    }

    /// Registers a listener for pointer movement over the icon.
    pub fn add_mouse_motion_listener(
        &self,
        listener: impl Fn(&MouseMotionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.peer.add_motion_listener(Arc::new(listener))
    }

    /// Removes a mouse-motion listener. Unknown ids are ignored.
    pub fn remove_mouse_motion_listener(&self, id: ListenerId) {
        self.peer.remove_motion_listener(id);
    }

    pub fn mouse_motion_listeners(&self) -> Vec<Listener<MouseMotionEvent>> {
        self.peer.motion_listeners()
    }

    /// Registers a listener for the icon's activation gesture. Which
    /// gesture activates an icon is platform-dependent.
    pub fn add_action_listener(
        &self,
        listener: impl Fn(&ActionEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.peer.add_action_listener(Arc::new(listener))
    }

    /// Removes an action listener. Unknown ids are ignored.
    pub fn remove_action_listener(&self, id: ListenerId) {
        self.peer.remove_action_listener(id);
    }

    pub fn action_listeners(&self) -> Vec<Listener<ActionEvent>> {
        self.peer.action_listeners()
    }

    /// Shows a transient message near the icon. At least one of `caption`
    /// and `text` must be given; whether the message actually appears is
    /// up to the platform.
    pub fn display_message(
        &self,
        caption: Option<&str>,
        text: Option<&str>,
        severity: MessageSeverity,
    ) -> Result<(), TrayError> {
        if caption.is_none() && text.is_none() {
            return Err(TrayError::InvalidArgument(
                "a message needs a caption or a text".into(),
            ));
        }
        self.peer.display_message(caption, text, severity.into())
    }

    /// The pixel footprint the icon occupies in the tray; equal to
    /// [`crate::SystemTray::icon_size`] for an icon that has not been
    /// added yet.
    pub fn size(&self) -> Dimensions {
        self.peer.size()
    }
}
