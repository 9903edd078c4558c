//! Popup menus for tray icons.
//!
//! The shim only carries a menu's shape; rendering and item activation
//! belong to the host GUI toolkit that the backend drives.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::TrayError;
use crate::peer::IconId;

/// One entry of a popup menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuEntry {
    Item(String),
    Separator,
}

/// A popup menu shown for a tray icon.
///
/// Clones share identity: a menu belongs to at most one icon at a time,
/// and that ownership travels with every clone. Attaching an owned menu
/// to a second icon is an [`TrayError::InvalidArgument`] error.
#[derive(Clone)]
pub struct PopupMenu {
    inner: Arc<MenuInner>,
}

struct MenuInner {
    entries: Vec<MenuEntry>,
    owner: Mutex<Option<IconId>>,
}

impl PopupMenu {
    pub fn builder() -> PopupMenuBuilder {
        PopupMenuBuilder {
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.inner.entries
    }

    /// The icon currently owning the menu, if any.
    pub fn owner(&self) -> Option<IconId> {
        *self.inner.owner.lock().unwrap()
    }

    /// Claims the menu for `icon`. Claiming a menu the icon already owns
    /// is a no-op; claiming one owned by a different icon is an error.
    pub(crate) fn attach(&self, icon: IconId) -> Result<(), TrayError> {
        let mut owner = self.inner.owner.lock().unwrap();
        match *owner {
            Some(existing) if existing != icon => Err(TrayError::InvalidArgument(
                "popup menu is already attached to another tray icon".into(),
            )),
            _ => {
                *owner = Some(icon);
                Ok(())
            }
        }
    }

    /// Releases the menu if `icon` currently owns it.
    pub(crate) fn release(&self, icon: IconId) {
        let mut owner = self.inner.owner.lock().unwrap();
        if *owner == Some(icon) {
            *owner = None;
        }
    }
}

impl PartialEq for PopupMenu {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for PopupMenu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupMenu")
            .field("entries", &self.inner.entries)
            .field("owner", &self.owner())
            .finish()
    }
}

pub struct PopupMenuBuilder {
    entries: Vec<MenuEntry>,
}

impl PopupMenuBuilder {
    pub fn item(mut self, label: impl Into<String>) -> Self {
        self.entries.push(MenuEntry::Item(label.into()));
        self
    }

    pub fn separator(mut self) -> Self {
        self.entries.push(MenuEntry::Separator);
        self
    }

    pub fn build(self) -> PopupMenu {
        PopupMenu {
            inner: Arc::new(MenuInner {
                entries: self.entries,
                owner: Mutex::new(None),
            }),
        }
    }
}
