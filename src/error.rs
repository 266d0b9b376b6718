//! Error taxonomy shared by every subsystem
//!
//! Construction errors are returned before any state is touched, invariant
//! violations abort the tick that hit them, and sink failures stop the loop.

/// Result alias carrying [`StripError`].
pub type Result<T> = std::result::Result<T, StripError>;

/// Errors raised by effect builders, the physics engine and the controller.
#[derive(Debug, thiserror::Error)]
pub enum StripError {
    /// Invalid or missing parameter while building an effect, body or behavior.
    #[error("invalid {what}: {reason}")]
    Construction { what: &'static str, reason: String },

    /// Programmer error such as a buffer/sink length mismatch.
    #[error("invariant violated: {0}")]
    Invariant(String),

    /// An external resource (audio feed, stream) ended or failed.
    #[error("resource exhausted: {0}")]
    Exhausted(String),

    /// The pixel sink failed while flushing a frame.
    #[error("pixel sink failure: {0}")]
    Sink(#[source] std::io::Error),

    /// A command was sent after the controller was dropped.
    #[error("controller has shut down")]
    ControllerGone,

    /// Settings file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Settings file could not be parsed.
    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl StripError {
    /// Build a [`StripError::Construction`] value.
    pub fn construction(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Construction {
            what,
            reason: reason.into(),
        }
    }

    /// Build a [`StripError::Invariant`] value.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Build a [`StripError::Exhausted`] value.
    pub fn exhausted(msg: impl Into<String>) -> Self {
        Self::Exhausted(msg.into())
    }
}

/// Reject non-finite or zero durations (periods, wavelengths, half lives).
pub(crate) fn nonzero_finite(what: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value == 0.0 {
        return Err(StripError::construction(
            what,
            format!("{value} must be a finite, non-zero number"),
        ));
    }
    Ok(value)
}

/// Reject negative or non-finite values.
pub(crate) fn non_negative(what: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(StripError::construction(
            what,
            format!("{value} must be a finite, non-negative number"),
        ));
    }
    Ok(value)
}

/// Reject non-finite values.
pub(crate) fn finite(what: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(StripError::construction(what, format!("{value} is not finite")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_message() {
        let err = StripError::construction("period", "0 must be non-zero");
        assert_eq!(format!("{err}"), "invalid period: 0 must be non-zero");
    }

    #[test]
    fn test_validators() {
        assert!(nonzero_finite("period", 0.0).is_err());
        assert!(nonzero_finite("period", f64::NAN).is_err());
        assert_eq!(nonzero_finite("period", -2.0).unwrap(), -2.0);
        assert!(non_negative("fuse", -0.1).is_err());
        assert_eq!(non_negative("fuse", 0.0).unwrap(), 0.0);
        assert!(finite("impulse", f64::INFINITY).is_err());
    }
}
