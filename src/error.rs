//! Error types and the diagnostics collaborator used by the embed pipeline.

use log::warn;

/// Reasons an embed request could not produce a viewer element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EmbedError {
    /// The document URL was not a usable string.
    InvalidInput,
    /// The requested target could not be resolved to a node.
    TargetNotFound {
        /// Selector that failed to match, if the target was given as one.
        selector: Option<String>,
    },
    /// No rendering strategy applies to the host.
    UnsupportedHost {
        /// Whether fallback markup was written into the target.
        fallback_written: bool,
    },
    /// The document accepted the viewer markup but the element is not there.
    ElementMissing,
}

impl std::fmt::Display for EmbedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "URL is not valid"),
            Self::TargetNotFound { selector: Some(selector) } => {
                write!(f, "Target element cannot be determined from '{selector}'")
            }
            Self::TargetNotFound { selector: None } => {
                write!(f, "Target element cannot be determined")
            }
            Self::UnsupportedHost { .. } => {
                write!(f, "This browser does not support embedded PDFs")
            }
            Self::ElementMissing => {
                write!(f, "Viewer element was not created in the target")
            }
        }
    }
}

impl std::error::Error for EmbedError {}

/// Errors raised while reading [`crate::options::EmbedOptions`] from JSON.
#[derive(Debug)]
pub enum OptionsError {
    /// The input was not valid JSON.
    Parse(serde_json::Error),
    /// The JSON value was not an object.
    NotAnObject,
}

impl From<serde_json::Error> for OptionsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

impl std::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse embed options: {err}"),
            Self::NotAnObject => write!(f, "Embed options must be a JSON object"),
        }
    }
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::NotAnObject => None,
        }
    }
}

/// Receives a report for every failed embed request.
pub trait Diagnostics {
    /// Records a failure. Implementations must not panic.
    fn report(&self, error: &EmbedError);
}

/// Default diagnostics that forward failures to the [`log`] facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, error: &EmbedError) {
        warn!("[PDFObject] {}", error);
    }
}

impl<F> Diagnostics for F
where
    F: Fn(&EmbedError),
{
    fn report(&self, error: &EmbedError) {
        self(error)
    }
}
