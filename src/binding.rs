//! Backend discovery and the binding contracts used by the wrappers.
//!
//! Nothing in the crate references a tray backend at compile time except
//! the built-in one behind the `native` feature. Selection happens once
//! per process, on first use: an installed backend wins, then the
//! built-in backend, then nothing, in which case every resolution
//! reports [`TrayError::Unsupported`].
//!
//! Failures inside a backend are split in two (see
//! [`BindFailure`]): every way the facility can be *absent* collapses to
//! `Unsupported` here at the resolution boundary, while a genuine fault
//! raised inside a native call passes through unchanged so callers see
//! the real cause.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{BindFailure, TrayError};
use crate::peer::{IconRequest, SystemTrayPeer, TrayIconPeer};

/// A tray backend: a capability probe plus factories for the two peer
/// kinds.
///
/// The probe answers "does the facility exist" without constructing
/// anything. The container factory binds the process-wide tray area; the
/// icon factory runs once per icon because each icon is a distinct native
/// object.
pub struct TrayBackend {
    pub name: &'static str,
    pub probe: fn() -> Result<bool, BindFailure>,
    pub container: fn() -> Result<Box<dyn SystemTrayPeer>, BindFailure>,
    pub icon: fn(IconRequest) -> Result<Arc<dyn TrayIconPeer>, BindFailure>,
}

/// Returned by [`install`] when a backend was already selected.
#[derive(Debug, thiserror::Error)]
#[error("a tray backend is already installed")]
pub struct AlreadyInstalled;

static SELECTED: OnceCell<Option<&'static TrayBackend>> = OnceCell::new();

/// Binds `backend` as the process-wide tray backend.
///
/// The first selection wins: a second call, or a call after the default
/// selection already happened, reports [`AlreadyInstalled`].
pub fn install(backend: &'static TrayBackend) -> Result<(), AlreadyInstalled> {
    SELECTED.set(Some(backend)).map_err(|_| AlreadyInstalled)?;
    log::debug!("tray backend installed: {}", backend.name);
    Ok(())
}

fn selected() -> Option<&'static TrayBackend> {
    *SELECTED.get_or_init(|| {
        let backend = default_backend();
        match backend {
            Some(backend) => log::debug!("tray backend selected: {}", backend.name),
            None => log::debug!("no tray backend compiled in"),
        }
        backend
    })
}

#[cfg(feature = "native")]
fn default_backend() -> Option<&'static TrayBackend> {
    Some(&crate::peer::native::NATIVE_BACKEND)
}

#[cfg(not(feature = "native"))]
fn default_backend() -> Option<&'static TrayBackend> {
    None
}

/// Resolves the container peer.
///
/// The caller ([`crate::SystemTray::instance`]) caches the outcome, so
/// the discovery cost is paid at most once per process.
pub(crate) fn resolve_container() -> Result<Box<dyn SystemTrayPeer>, TrayError> {
    let Some(backend) = selected() else {
        return Err(TrayError::Unsupported);
    };
    normalize((backend.container)(), "tray container")
}

/// Cheap support probe. Never errors for ordinary absence.
pub(crate) fn probe() -> Result<bool, TrayError> {
    let Some(backend) = selected() else {
        return Ok(false);
    };
    match (backend.probe)() {
        Ok(supported) => Ok(supported),
        Err(BindFailure::Unavailable(reason)) => {
            log::debug!("tray probe unavailable: {}", reason);
            Ok(false)
        }
        Err(BindFailure::Fault(err)) => Err(err),
    }
}

/// Resolves one icon peer. Runs on every icon construction; icon peers
/// are never memoized because each icon is a distinct native object.
pub(crate) fn resolve_icon(request: IconRequest) -> Result<Arc<dyn TrayIconPeer>, TrayError> {
    let Some(backend) = selected() else {
        return Err(TrayError::Unsupported);
    };
    normalize((backend.icon)(request), "tray icon")
}

fn normalize<T>(outcome: Result<T, BindFailure>, what: &str) -> Result<T, TrayError> {
    match outcome {
        Ok(value) => Ok(value),
        Err(BindFailure::Unavailable(reason)) => {
            log::debug!("{} unavailable: {}", what, reason);
            Err(TrayError::Unsupported)
        }
        Err(BindFailure::Fault(err)) => Err(err),
    }
}
