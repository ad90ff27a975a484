//! Error taxonomy shared by every stage of the label pipeline.

use core::fmt;

/// Failure raised while composing, encoding, or delivering a label.
///
/// Errors are local to one print job. Every variant carries enough context to
/// produce a single human-readable notification.
#[derive(Clone, Debug, PartialEq)]
pub enum LabelError {
    /// The label surface to capture could not be located.
    ElementNotFound { id: String },
    /// A stage received a zero or otherwise unusable size.
    InvalidDimensions {
        stage: &'static str,
        width: u32,
        height: u32,
    },
    /// The label does not fit on the chosen paper with the given margin.
    IncompatibleSizing {
        axis: &'static str,
        paper_in: f64,
        label_in: f64,
        margin_in: f64,
    },
    /// The print agent accepted the connection but the transfer failed.
    DeviceCommunicationFailure { message: String },
    /// A preview or print surface could not be opened.
    PopupBlocked { hint: String },
    /// Structural validation rejected a label field.
    InvalidLabel { field: &'static str, reason: String },
    /// Structural validation rejected a job configuration field.
    InvalidConfig { field: &'static str, reason: String },
    /// Writing an output artifact failed.
    Io { context: &'static str, message: String },
}

impl LabelError {
    pub(crate) fn dimensions(stage: &'static str, width: u32, height: u32) -> Self {
        Self::InvalidDimensions {
            stage,
            width,
            height,
        }
    }

    /// Short machine-stable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "element-not-found",
            Self::InvalidDimensions { .. } => "invalid-dimensions",
            Self::IncompatibleSizing { .. } => "incompatible-sizing",
            Self::DeviceCommunicationFailure { .. } => "device-communication-failure",
            Self::PopupBlocked { .. } => "popup-blocked",
            Self::InvalidLabel { .. } => "invalid-label",
            Self::InvalidConfig { .. } => "invalid-config",
            Self::Io { .. } => "io",
        }
    }
}

impl fmt::Display for LabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementNotFound { id } => write!(f, "label element '{}' was not found", id),
            Self::InvalidDimensions {
                stage,
                width,
                height,
            } => write!(
                f,
                "invalid dimensions at {}: {}x{} (width and height must be positive)",
                stage, width, height
            ),
            Self::IncompatibleSizing {
                axis,
                paper_in,
                label_in,
                margin_in,
            } => write!(
                f,
                "label {} of {:.3}in does not fit paper {} of {:.3}in with {:.3}in margins",
                axis, label_in, axis, paper_in, margin_in
            ),
            Self::DeviceCommunicationFailure { message } => {
                write!(f, "printer communication failed: {}", message)
            }
            Self::PopupBlocked { hint } => {
                write!(f, "print surface could not be opened; {}", hint)
            }
            Self::InvalidLabel { field, reason } => {
                write!(f, "invalid label field '{}': {}", field, reason)
            }
            Self::InvalidConfig { field, reason } => {
                write!(f, "invalid print setting '{}': {}", field, reason)
            }
            Self::Io { context, message } => write!(f, "{} failed: {}", context, message),
        }
    }
}

impl std::error::Error for LabelError {}
