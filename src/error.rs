/// Errors surfaced by the tray wrappers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrayError {
    /// The desktop tray facility does not exist or could not be bound.
    /// Permanent for the process lifetime; never a caller mistake.
    #[error("system tray is not supported on this platform")]
    Unsupported,

    /// The caller violated a stated precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A fault raised by the native facility itself.
    #[error("native tray fault: {0}")]
    Native(String),
}

/// Failure inside the binding layer, before it is normalized for callers.
///
/// `Unavailable` covers every way the facility can be absent and collapses
/// to [`TrayError::Unsupported`] at the resolution boundary. `Fault`
/// carries an error that originated inside a native call and must reach
/// the caller unchanged.
#[derive(Debug, Clone)]
pub enum BindFailure {
    Unavailable(String),
    Fault(TrayError),
}

impl BindFailure {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        BindFailure::Unavailable(reason.into())
    }
}

impl From<TrayError> for BindFailure {
    fn from(err: TrayError) -> Self {
        BindFailure::Fault(err)
    }
}
