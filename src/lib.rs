//! Core entry point for the pdf_embed crate.
//!
//! Detects whether a browser host can display PDF documents inline and
//! places the matching viewer (`<embed>`, `<iframe>` or a PDF.js frame) into
//! a document tree, falling back to a download link when nothing can render
//! the file.

pub mod capability;
pub mod document;
pub mod embed;
pub mod error;
pub mod host;
pub mod markup;
pub mod options;
pub mod params;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use capability::CapabilityReport;
pub use document::{HostDocument, MemoryDocument, NodeId, Target};
pub use embed::{PdfObject, Strategy};
pub use error::{Diagnostics, EmbedError, LogDiagnostics, OptionsError};
pub use host::{HostSignals, StaticHost};
pub use options::{EmbedOptions, FallbackLink};
pub use params::OpenParams;

/// Version of the library, informational only.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
