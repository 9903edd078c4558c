//! Runtime-probed system tray shim.
//!
//! The desktop tray is optional equipment: headless hosts, stripped-down
//! sessions and some compositors simply do not have one. This crate exposes
//! a stable [`SystemTray`]/[`TrayIcon`] surface that binds to a real backend
//! on first use and degrades to a predictable [`TrayError::Unsupported`]
//! where none exists, instead of failing at load time.
//!
//! The wrappers delegate every call to a peer (see [`peer`]); which peer
//! gets bound is decided once per process by [`binding`]. The default
//! backend (cargo feature `native`, enabled by default) drives the
//! `tray-icon` crate. An alternate backend can be bound with
//! [`binding::install`] before first use.
//!
//! ```no_run
//! use systray_shim::{SystemTray, TrayIcon, TrayImage};
//!
//! # fn main() -> Result<(), systray_shim::TrayError> {
//! if SystemTray::is_supported()? {
//!     let tray = SystemTray::instance()?;
//!     let size = tray.icon_size();
//!     let pixels = vec![0xff; (size.width * size.height * 4) as usize];
//!     let icon = TrayIcon::with_tooltip(
//!         TrayImage::from_rgba(pixels, size.width, size.height),
//!         "example",
//!     )?;
//!     tray.add(&icon)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod error;
pub mod event;
pub mod image;
pub mod listener;
pub mod menu;
pub mod peer;
pub mod tray;

pub use error::TrayError;
pub use event::{ActionEvent, MouseButton, MouseEvent, MouseMotionEvent, PropertyChangeEvent};
pub use image::{Dimensions, TrayImage};
pub use listener::ListenerId;
pub use menu::{MenuEntry, PopupMenu, PopupMenuBuilder};
pub use tray::icon::{MessageSeverity, TrayIcon};
pub use tray::SystemTray;
