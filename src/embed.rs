//! Rendering strategy selection and viewer markup.

use log::debug;
use serde_json::Value;

use crate::capability::CapabilityReport;
use crate::document::{append_class, HostDocument, Target};
use crate::error::{Diagnostics, EmbedError, LogDiagnostics};
use crate::host::{HostSignals, PDF_MIME_TYPE};
use crate::markup::{Element, Markup};
use crate::options::EmbedOptions;
use crate::params::encode_component;

/// Class added to the node that receives the viewer.
pub const CONTAINER_CLASS: &str = "pdfobject-container";

/// Class carried by native `<embed>` and `<iframe>` viewers.
pub const VIEWER_CLASS: &str = "pdfobject";

const FULL_BLEED: &str = "position: absolute; top: 0; right: 0; bottom: 0; left: 0;";
const TOUCH_SCROLL: &str = "-webkit-overflow-scrolling: touch; overflow-y: scroll; ";
const HIDDEN_OVERFLOW: &str = "overflow: hidden; ";

/// The way a document ends up being displayed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// PDF.js iframe requested explicitly through `forcePDFJS`.
    ForcedPdfJs,
    /// Native `<embed>` element.
    NativeEmbed,
    /// Native viewer inside an `<iframe>`, used for redirect-safe Safari.
    NativeIframe,
    /// PDF.js iframe used because the host has no native viewer.
    PdfJsFallback,
    /// Nothing can display the document.
    Unsupported,
}

impl Strategy {
    /// Picks the strategy for `options` on a host described by `report`.
    pub fn select(report: &CapabilityReport, options: &EmbedOptions) -> Self {
        let pdfjs = options.pdfjs_url().is_some();
        if options.force_pdfjs() && pdfjs {
            return Self::ForcedPdfJs;
        }

        // Assumption mode never upgrades a negative verdict.
        let native = report.supports_pdfs()
            || (options.assumption_mode()
                && report.is_modern()
                && report.supports_pdfs()
                && !report.is_ios());
        if native {
            return if options.support_redirect() && report.is_safari_desktop() {
                Self::NativeIframe
            } else {
                Self::NativeEmbed
            };
        }

        if pdfjs {
            Self::PdfJsFallback
        } else {
            Self::Unsupported
        }
    }
}

/// Entry point that places PDF viewers into host documents.
///
/// Holds the capability report computed once for the host and the
/// collaborator that receives failure diagnostics.
#[derive(Clone, Debug)]
pub struct PdfObject<G = LogDiagnostics> {
    report: CapabilityReport,
    diagnostics: G,
}

impl PdfObject<LogDiagnostics> {
    /// Creates an embedder for a host described by `report`.
    pub fn new(report: CapabilityReport) -> Self {
        Self::with_diagnostics(report, LogDiagnostics)
    }

    /// Runs capability detection against `host` and creates an embedder.
    pub fn detect(host: &(impl HostSignals + ?Sized)) -> Self {
        Self::new(CapabilityReport::detect(host))
    }
}

impl<G: Diagnostics> PdfObject<G> {
    /// Creates an embedder that reports failures to `diagnostics`.
    pub fn with_diagnostics(report: CapabilityReport, diagnostics: G) -> Self {
        Self {
            report,
            diagnostics,
        }
    }

    /// Returns the library version.
    pub fn version() -> &'static str {
        crate::LIBRARY_VERSION
    }

    /// Returns the capability report in use.
    pub fn report(&self) -> &CapabilityReport {
        &self.report
    }

    /// Returns the collaborator that receives failure diagnostics.
    pub fn diagnostics(&self) -> &G {
        &self.diagnostics
    }

    /// Returns whether the host can render PDFs inline.
    pub fn supports_inline_rendering(&self) -> bool {
        self.report.supports_pdfs()
    }

    /// Embeds the PDF at `url` into `target`.
    ///
    /// Returns the created `<embed>` or `<iframe>` element. Failures are
    /// reported to the diagnostics collaborator before being returned; when no
    /// renderer exists the target may still receive fallback markup.
    pub fn embed<D: HostDocument>(
        &self,
        document: &mut D,
        url: &str,
        target: Target<'_, D::Node>,
        options: &EmbedOptions,
    ) -> Result<D::Node, EmbedError> {
        if url.trim().is_empty() {
            return self.fail(EmbedError::InvalidInput);
        }

        let Some(node) = target.resolve(document) else {
            return self.fail(EmbedError::TargetNotFound {
                selector: target.selector().map(str::to_owned),
            });
        };

        let fragment = options.effective_open_params().to_fragment();
        let strategy = Strategy::select(&self.report, options);
        debug!("[PDFObject] embedding {url} using {strategy:?}");

        let created = match strategy {
            Strategy::ForcedPdfJs | Strategy::PdfJsFallback => {
                let Some(pdfjs_url) = options.pdfjs_url() else {
                    return self.fail(EmbedError::UnsupportedHost {
                        fallback_written: false,
                    });
                };
                let source = format!("{}?file={}{}", pdfjs_url, encode_component(url), fragment);
                self.place_pdfjs(document, &node, &source, options.id())
            }
            Strategy::NativeEmbed | Strategy::NativeIframe => {
                let source = format!("{url}{fragment}");
                let fill_body = document.body().as_ref() == Some(&node);
                let size = if fill_body {
                    format!("{FULL_BLEED} width: 100%; height: 100%;")
                } else {
                    format!("width: {}; height: {};", options.width(), options.height())
                };
                let (tag, style) = if strategy == Strategy::NativeIframe {
                    ("iframe", format!("border: none; {size}"))
                } else {
                    ("embed", format!("overflow: auto; {size}"))
                };
                let viewer = Element::new(tag)
                    .attr_opt("id", options.id())
                    .attr("class", VIEWER_CLASS)
                    .attr("src", source)
                    .attr("type", PDF_MIME_TYPE)
                    .attr("style", style);
                append_class(document, &node, CONTAINER_CLASS);
                document.replace_children(&node, &viewer.into());
                document.first_element_by_tag(&node, tag)
            }
            Strategy::Unsupported => {
                let fallback = options.fallback_link().render(url);
                let fallback_written = fallback.is_some();
                if let Some(html) = fallback {
                    document.replace_children(&node, &Markup::Raw(html));
                }
                return self.fail(EmbedError::UnsupportedHost { fallback_written });
            }
        };

        match created {
            Some(element) => Ok(element),
            None => self.fail(EmbedError::ElementMissing),
        }
    }

    /// Embeds a document whose URL arrives as an untyped value.
    ///
    /// Anything but a JSON string fails with [`EmbedError::InvalidInput`].
    pub fn embed_value<D: HostDocument>(
        &self,
        document: &mut D,
        url: &Value,
        target: Target<'_, D::Node>,
        options: &EmbedOptions,
    ) -> Result<D::Node, EmbedError> {
        match url {
            Value::String(url) => self.embed(document, url, target, options),
            _ => self.fail(EmbedError::InvalidInput),
        }
    }

    fn place_pdfjs<D: HostDocument>(
        &self,
        document: &mut D,
        node: &D::Node,
        source: &str,
        id: Option<&str>,
    ) -> Option<D::Node> {
        let scroll = if self.report.is_ios() {
            TOUCH_SCROLL
        } else {
            HIDDEN_OVERFLOW
        };
        let wrapper = Element::new("div")
            .attr("style", format!("{scroll}{FULL_BLEED}"))
            .child(
                Element::new("iframe")
                    .attr_opt("id", id)
                    .attr("src", source)
                    .attr("style", "border: none; width: 100%; height: 100%;")
                    .attr("frameborder", "0"),
            );

        append_class(document, node, CONTAINER_CLASS);
        document.set_style_property(node, "position", "relative");
        document.set_style_property(node, "overflow", "auto");
        document.replace_children(node, &wrapper.into());
        document.first_element_by_tag(node, "iframe")
    }

    fn fail<T>(&self, error: EmbedError) -> Result<T, EmbedError> {
        self.diagnostics.report(&error);
        Err(error)
    }
}
