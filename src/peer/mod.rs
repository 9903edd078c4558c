//! Peer contracts between the wrappers and a tray backend.
//!
//! A peer is the live binding between a wrapper object and its underlying
//! native object. The traits mirror the wrapper surface one to one and
//! every wrapper operation is a single forward; the only bookkeeping that
//! lives here is [`IconRegistry`], shared so that every backend reports
//! identical add/remove semantics for the container.

#[cfg(feature = "native")]
pub mod native;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::TrayError;
use crate::event::{ActionEvent, MouseEvent, MouseMotionEvent, PropertyChangeEvent};
use crate::image::{Dimensions, TrayImage};
use crate::listener::{Listener, ListenerId, ListenerSet};
use crate::menu::PopupMenu;
use crate::tray::icon::MessageSeverity;

/// The container property fired whenever the registered icon set changes.
pub const PROPERTY_TRAY_ICONS: &str = "tray_icons";

static NEXT_ICON_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one tray icon peer, stable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconId(pub(crate) u64);

impl IconId {
    pub(crate) fn next() -> Self {
        IconId(NEXT_ICON_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for IconId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything needed to construct one icon peer.
#[derive(Debug, Clone)]
pub struct IconRequest {
    pub id: IconId,
    pub image: TrayImage,
    pub tooltip: Option<String>,
    pub menu: Option<PopupMenu>,
}

/// Message severity vocabulary on the peer side.
///
/// Mirrors [`MessageSeverity`] variant for variant; the pair is translated
/// by exhaustive `match` in both directions so a change to either
/// vocabulary fails to compile instead of failing at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Error,
    Info,
    None,
    Warning,
}

impl From<MessageSeverity> for MessageKind {
    fn from(severity: MessageSeverity) -> Self {
        match severity {
            MessageSeverity::Error => MessageKind::Error,
            MessageSeverity::Info => MessageKind::Info,
            MessageSeverity::None => MessageKind::None,
            MessageSeverity::Warning => MessageKind::Warning,
        }
    }
}

impl From<MessageKind> for MessageSeverity {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Error => MessageSeverity::Error,
            MessageKind::Info => MessageSeverity::Info,
            MessageKind::None => MessageSeverity::None,
            MessageKind::Warning => MessageSeverity::Warning,
        }
    }
}

/// Container-side peer operations.
pub trait SystemTrayPeer: Send + Sync {
    fn add(&self, icon: Arc<dyn TrayIconPeer>) -> Result<(), TrayError>;
    fn remove(&self, icon: &Arc<dyn TrayIconPeer>);
    fn icons(&self) -> Vec<Arc<dyn TrayIconPeer>>;
    fn icon_size(&self) -> Dimensions;
    fn add_property_listener(
        &self,
        property: &str,
        listener: Listener<PropertyChangeEvent>,
    ) -> ListenerId;
    fn remove_property_listener(&self, property: &str, id: ListenerId);
    fn property_listeners(&self, property: &str) -> Vec<Listener<PropertyChangeEvent>>;
}

/// Icon-side peer operations, one implementor instance per native icon.
pub trait TrayIconPeer: Send + Sync {
    fn id(&self) -> IconId;
    fn set_image(&self, image: TrayImage) -> Result<(), TrayError>;
    fn image(&self) -> TrayImage;
    fn set_tooltip(&self, tooltip: Option<String>) -> Result<(), TrayError>;
    fn tooltip(&self) -> Option<String>;
    fn set_menu(&self, menu: Option<PopupMenu>) -> Result<(), TrayError>;
    fn menu(&self) -> Option<PopupMenu>;
    fn set_auto_size(&self, auto_size: bool);
    fn is_auto_size(&self) -> bool;
    fn set_action_command(&self, command: Option<String>);
    fn action_command(&self) -> Option<String>;
    fn add_mouse_listener(&self, listener: Listener<MouseEvent>) -> ListenerId;
    fn remove_mouse_listener(&self, id: ListenerId);
    fn mouse_listeners(&self) -> Vec<Listener<MouseEvent>>;
    fn add_motion_listener(&self, listener: Listener<MouseMotionEvent>) -> ListenerId;
    fn remove_motion_listener(&self, id: ListenerId);
    fn motion_listeners(&self) -> Vec<Listener<MouseMotionEvent>>;
    fn add_action_listener(&self, listener: Listener<ActionEvent>) -> ListenerId;
    fn remove_action_listener(&self, id: ListenerId);
    fn action_listeners(&self) -> Vec<Listener<ActionEvent>>;
    fn display_message(
        &self,
        caption: Option<&str>,
        text: Option<&str>,
        kind: MessageKind,
    ) -> Result<(), TrayError>;
    fn size(&self) -> Dimensions;
    /// Makes the icon visible; called by the container on add.
    fn attach(&self) -> Result<(), TrayError>;
    /// Hides the icon; called by the container on remove.
    fn detach(&self);
}

/// Property-change listener lists, keyed by property name.
///
/// Unknown names register but never fire; removal with an unknown name or
/// id is a no-op.
pub struct PropertySupport {
    sets: RwLock<HashMap<String, Arc<ListenerSet<PropertyChangeEvent>>>>,
}

impl PropertySupport {
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(HashMap::new()),
        }
    }

    pub fn add(&self, property: &str, listener: Listener<PropertyChangeEvent>) -> ListenerId {
        let set = {
            let mut sets = self.sets.write().unwrap();
            Arc::clone(sets.entry(property.to_string()).or_default())
        };
        set.add(listener)
    }

    pub fn remove(&self, property: &str, id: ListenerId) {
        if let Some(set) = self.sets.read().unwrap().get(property) {
            set.remove(id);
        }
    }

    pub fn listeners(&self, property: &str) -> Vec<Listener<PropertyChangeEvent>> {
        match self.sets.read().unwrap().get(property) {
            Some(set) => set.snapshot(),
            None => Vec::new(),
        }
    }

    pub fn fire(&self, event: &PropertyChangeEvent) {
        let set = self.sets.read().unwrap().get(&event.property).cloned();
        if let Some(set) = set {
            set.notify(event);
        }
    }
}

impl Default for PropertySupport {
    fn default() -> Self {
        Self::new()
    }
}

/// Container bookkeeping shared by backends: the registered icon set plus
/// the property fan-out that accompanies every change to it.
pub struct IconRegistry {
    icons: RwLock<Vec<Arc<dyn TrayIconPeer>>>,
    properties: PropertySupport,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self {
            icons: RwLock::new(Vec::new()),
            properties: PropertySupport::new(),
        }
    }

    /// Registers an icon and makes it visible. Registering the same icon
    /// twice is a caller error and leaves the set unchanged.
    pub fn add(&self, icon: Arc<dyn TrayIconPeer>) -> Result<(), TrayError> {
        {
            let mut icons = self.icons.write().unwrap();
            if icons.iter().any(|existing| existing.id() == icon.id()) {
                return Err(TrayError::InvalidArgument(
                    "tray icon is already added".into(),
                ));
            }
            icon.attach()?;
            icons.push(Arc::clone(&icon));
        }
        self.fire_icons_changed();
        Ok(())
    }

    /// Unregisters an icon. Icons that were never added are ignored.
    pub fn remove(&self, icon: &Arc<dyn TrayIconPeer>) {
        let removed = {
            let mut icons = self.icons.write().unwrap();
            match icons.iter().position(|existing| existing.id() == icon.id()) {
                Some(index) => {
                    icons.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            icon.detach();
            self.fire_icons_changed();
        }
    }

    pub fn snapshot(&self) -> Vec<Arc<dyn TrayIconPeer>> {
        self.icons.read().unwrap().clone()
    }

    pub fn properties(&self) -> &PropertySupport {
        &self.properties
    }

    fn fire_icons_changed(&self) {
        let icon_count = self.icons.read().unwrap().len();
        self.properties.fire(&PropertyChangeEvent {
            property: PROPERTY_TRAY_ICONS.to_string(),
            icon_count,
        });
    }
}

impl Default for IconRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct StubIcon {
        id: IconId,
        attached: AtomicBool,
        mouse: ListenerSet<MouseEvent>,
        motion: ListenerSet<MouseMotionEvent>,
        action: ListenerSet<ActionEvent>,
    }

    impl StubIcon {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: IconId::next(),
                attached: AtomicBool::new(false),
                mouse: ListenerSet::new(),
                motion: ListenerSet::new(),
                action: ListenerSet::new(),
            })
        }

        fn is_attached(&self) -> bool {
            self.attached.load(Ordering::SeqCst)
        }
    }

    impl TrayIconPeer for StubIcon {
        fn id(&self) -> IconId {
            self.id
        }

        fn set_image(&self, _image: TrayImage) -> Result<(), TrayError> {
            Ok(())
        }

        fn image(&self) -> TrayImage {
            TrayImage::from_rgba(vec![0; 4], 1, 1)
        }

        fn set_tooltip(&self, _tooltip: Option<String>) -> Result<(), TrayError> {
            Ok(())
        }

        fn tooltip(&self) -> Option<String> {
            None
        }

        fn set_menu(&self, _menu: Option<PopupMenu>) -> Result<(), TrayError> {
            Ok(())
        }

        fn menu(&self) -> Option<PopupMenu> {
            None
        }

        fn set_auto_size(&self, _auto_size: bool) {}

        fn is_auto_size(&self) -> bool {
            false
        }

        fn set_action_command(&self, _command: Option<String>) {}

        fn action_command(&self) -> Option<String> {
            None
        }

        fn add_mouse_listener(&self, listener: Listener<MouseEvent>) -> ListenerId {
            self.mouse.add(listener)
        }

        fn remove_mouse_listener(&self, id: ListenerId) {
            self.mouse.remove(id);
        }

        fn mouse_listeners(&self) -> Vec<Listener<MouseEvent>> {
            self.mouse.snapshot()
        }

        fn add_motion_listener(&self, listener: Listener<MouseMotionEvent>) -> ListenerId {
            self.motion.add(listener)
        }

        fn remove_motion_listener(&self, id: ListenerId) {
            self.motion.remove(id);
        }

        fn motion_listeners(&self) -> Vec<Listener<MouseMotionEvent>> {
            self.motion.snapshot()
        }

        fn add_action_listener(&self, listener: Listener<ActionEvent>) -> ListenerId {
            self.action.add(listener)
        }

        fn remove_action_listener(&self, id: ListenerId) {
            self.action.remove(id);
        }

        fn action_listeners(&self) -> Vec<Listener<ActionEvent>> {
            self.action.snapshot()
        }

        fn display_message(
            &self,
            _caption: Option<&str>,
            _text: Option<&str>,
            _kind: MessageKind,
        ) -> Result<(), TrayError> {
            Ok(())
        }

        fn size(&self) -> Dimensions {
            Dimensions {
                width: 16,
                height: 16,
            }
        }

        fn attach(&self) -> Result<(), TrayError> {
            self.attached.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn detach(&self) {
            self.attached.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn severity_translation_round_trips() {
        let severities = [
            MessageSeverity::Error,
            MessageSeverity::Info,
            MessageSeverity::None,
            MessageSeverity::Warning,
        ];

        for severity in severities {
            let kind: MessageKind = severity.into();
            assert_eq!(MessageSeverity::from(kind), severity, "{:?}", severity);
        }

        let kinds = [
            MessageKind::Error,
            MessageKind::Info,
            MessageKind::None,
            MessageKind::Warning,
        ];

        for kind in kinds {
            let severity: MessageSeverity = kind.into();
            assert_eq!(MessageKind::from(severity), kind, "{:?}", kind);
        }
    }

    #[test]
    fn registry_attaches_on_add_and_detaches_on_remove() {
        let registry = IconRegistry::new();
        let icon = StubIcon::new();
        let peer: Arc<dyn TrayIconPeer> = icon.clone();

        registry.add(Arc::clone(&peer)).unwrap();
        assert!(icon.is_attached());
        assert_eq!(registry.snapshot().len(), 1);

        registry.remove(&peer);
        assert!(!icon.is_attached());
        assert!(registry.snapshot().is_empty());
    }

    #[test]
    fn registry_rejects_duplicate_add() {
        let registry = IconRegistry::new();
        let peer: Arc<dyn TrayIconPeer> = StubIcon::new();

        registry.add(Arc::clone(&peer)).unwrap();
        let second = registry.add(Arc::clone(&peer));

        assert!(matches!(second, Err(TrayError::InvalidArgument(_))));
        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn registry_ignores_removal_of_unknown_icons() {
        let registry = IconRegistry::new();
        let registered: Arc<dyn TrayIconPeer> = StubIcon::new();
        let stranger: Arc<dyn TrayIconPeer> = StubIcon::new();

        registry.add(Arc::clone(&registered)).unwrap();
        registry.remove(&stranger);

        assert_eq!(registry.snapshot().len(), 1);
    }

    #[test]
    fn registry_fires_icon_set_property() {
        let registry = IconRegistry::new();
        let changes = Arc::new(AtomicUsize::new(0));
        let last_count = Arc::new(AtomicUsize::new(usize::MAX));

        let changes_seen = Arc::clone(&changes);
        let count_seen = Arc::clone(&last_count);
        registry.properties().add(
            PROPERTY_TRAY_ICONS,
            Arc::new(move |event: &PropertyChangeEvent| {
                changes_seen.fetch_add(1, Ordering::SeqCst);
                count_seen.store(event.icon_count, Ordering::SeqCst);
            }),
        );

        let peer: Arc<dyn TrayIconPeer> = StubIcon::new();
        registry.add(Arc::clone(&peer)).unwrap();
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(last_count.load(Ordering::SeqCst), 1);

        registry.remove(&peer);
        assert_eq!(changes.load(Ordering::SeqCst), 2);
        assert_eq!(last_count.load(Ordering::SeqCst), 0);

        // A failed duplicate add fires nothing.
        registry.add(Arc::clone(&peer)).unwrap();
        let _ = registry.add(Arc::clone(&peer));
        assert_eq!(changes.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn property_support_tolerates_unknown_names() {
        let properties = PropertySupport::new();

        assert!(properties.listeners("anything").is_empty());

        let id = properties.add("custom", Arc::new(|_| {}));
        properties.remove("other", id);
        assert_eq!(properties.listeners("custom").len(), 1);

        // Firing a property nobody listens to is a no-op.
        properties.fire(&PropertyChangeEvent {
            property: "silent".into(),
            icon_count: 0,
        });

        properties.remove("custom", id);
        assert!(properties.listeners("custom").is_empty());
    }
}
