//! The public wrapper types.

pub mod icon;

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::binding;
use crate::error::TrayError;
use crate::event::PropertyChangeEvent;
use crate::image::Dimensions;
use crate::listener::{Listener, ListenerId};
use crate::peer::SystemTrayPeer;

use icon::TrayIcon;

static INSTANCE: OnceCell<Result<SystemTray, TrayError>> = OnceCell::new();

/// The desktop's tray area.
///
/// One instance exists per process, created lazily by
/// [`SystemTray::instance`]. Both success and failure of that first
/// resolution are final: the facility's absence is a permanent property
/// of the running platform, not a transient condition.
pub struct SystemTray {
    peer: Box<dyn SystemTrayPeer>,
}

impl SystemTray {
    /// Returns the process-wide tray instance, binding a peer on first
    /// call. Fails with [`TrayError::Unsupported`] when the platform has
    /// no tray; use [`SystemTray::is_supported`] to branch cheaply before
    /// committing.
    pub fn instance() -> Result<&'static SystemTray, TrayError> {
        let slot =
            INSTANCE.get_or_init(|| binding::resolve_container().map(|peer| SystemTray { peer }));
        match slot {
            Ok(tray) => Ok(tray),
            Err(err) => Err(err.clone()),
        }
    }

    /// Whether the platform offers a tray at all, without binding one.
    /// `Ok(false)` covers every ordinary kind of absence; an `Err` is a
    /// genuine backend fault, never a missing facility.
    pub fn is_supported() -> Result<bool, TrayError> {
        binding::probe()
    }

    /// Makes `icon` visible in the tray. Adding the same icon twice is an
    /// error and leaves the tray unchanged.
    pub fn add(&self, icon: &TrayIcon) -> Result<(), TrayError> {
        self.peer.add(Arc::clone(icon.peer()))
    }

    /// Removes `icon` from the tray. Icons that are not currently in the
    /// tray are ignored.
    pub fn remove(&self, icon: &TrayIcon) {
        self.peer.remove(icon.peer());
    }

    /// A snapshot of the icons currently in the tray. The returned vector
    /// is caller-owned; mutating it does not touch the tray.
    pub fn icons(&self) -> Vec<TrayIcon> {
        self.peer
            .icons()
            .into_iter()
            .map(TrayIcon::from_peer)
            .collect()
    }

    /// The platform's preferred pixel size for icon images, usable before
    /// any icon exists.
    pub fn icon_size(&self) -> Dimensions {
        self.peer.icon_size()
    }

    /// Registers a listener for changes to `property`. The one property
    /// this tray fires is [`crate::peer::PROPERTY_TRAY_ICONS`]; other
    /// names register but never see an event.
    pub fn add_property_change_listener(
        &self,
        property: &str,
        listener: impl Fn(&PropertyChangeEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.peer.add_property_listener(property, Arc::new(listener))
    }

    /// Removes a property listener. Unknown names and ids are ignored.
    pub fn remove_property_change_listener(&self, property: &str, id: ListenerId) {
        self.peer.remove_property_listener(property, id);
    }

    /// The listeners registered for `property`; empty for unknown names.
    pub fn property_change_listeners(
        &self,
        property: &str,
    ) -> Vec<Listener<PropertyChangeEvent>> {
        self.peer.property_listeners(property)
    }
}
