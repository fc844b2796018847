//! One-shot detection of inline PDF support.

use log::debug;
use serde::Serialize;

use crate::host::{self, HostSignals, PDF_MIME_TYPE};

/// Minimum Firefox release that bundles PDF.js, exclusive.
const FIREFOX_PDFJS_AFTER: u64 = 18;

/// ActiveX controls registered by Adobe Reader, probed in order.
const PDF_ACTIVE_X_CONTROLS: [&str; 2] = ["AcroPDF.PDF", "PDF.PdfCtrl"];

/// Snapshot of the host signals relevant to inline PDF rendering.
///
/// The report is built once by the embedding application and passed to
/// [`crate::PdfObject`]. Signals that detection never needed to inspect
/// (detection short-circuits on the first conclusive one) are recorded as
/// `false`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    is_ios: bool,
    is_firefox_with_pdfjs: bool,
    has_pdf_mime_type: bool,
    is_modern: bool,
    is_legacy_ie: bool,
    has_active_x_support: bool,
    is_safari_desktop: bool,
    supports_pdfs: bool,
}

impl CapabilityReport {
    /// Evaluates the host signals and returns the resulting report.
    pub fn detect(host: &(impl HostSignals + ?Sized)) -> Self {
        let user_agent = host.user_agent();
        let is_ios = host::is_ios(user_agent);
        let is_modern = host.has_promise();
        let is_safari_desktop =
            !is_ios && host.vendor().contains("Apple") && user_agent.contains("Safari");

        let mut report = Self {
            is_ios,
            is_modern,
            is_safari_desktop,
            ..Self::default()
        };

        report.supports_pdfs = !is_ios && report.probe_support(host);
        debug!(
            "[PDFObject] inline PDF support: {} (user agent: {})",
            report.supports_pdfs, user_agent
        );
        report
    }

    fn probe_support(&mut self, host: &(impl HostSignals + ?Sized)) -> bool {
        let user_agent = host.user_agent();
        self.is_firefox_with_pdfjs = host::is_firefox(user_agent)
            && host::release_version(user_agent)
                .map_or(false, |version| version > FIREFOX_PDFJS_AFTER);
        if self.is_firefox_with_pdfjs {
            return true;
        }

        self.has_pdf_mime_type = host.has_mime_type(PDF_MIME_TYPE);
        if self.has_pdf_mime_type {
            return true;
        }

        self.is_legacy_ie = host.has_active_x();
        if self.is_legacy_ie {
            self.has_active_x_support = PDF_ACTIVE_X_CONTROLS
                .iter()
                .any(|control| host.create_active_x(control));
        }
        self.has_active_x_support
    }

    /// Returns whether the host is an iOS device.
    pub fn is_ios(&self) -> bool {
        self.is_ios
    }

    /// Returns whether the host is a Firefox release with bundled PDF.js.
    pub fn is_firefox_with_pdfjs(&self) -> bool {
        self.is_firefox_with_pdfjs
    }

    /// Returns whether the plugin registry lists `application/pdf`.
    pub fn has_pdf_mime_type(&self) -> bool {
        self.has_pdf_mime_type
    }

    /// Returns whether the host exposes modern language features.
    pub fn is_modern(&self) -> bool {
        self.is_modern
    }

    /// Returns whether the host exposes the ActiveX mechanism.
    pub fn is_legacy_ie(&self) -> bool {
        self.is_legacy_ie
    }

    /// Returns whether a PDF ActiveX control could be instantiated.
    pub fn has_active_x_support(&self) -> bool {
        self.has_active_x_support
    }

    /// Returns whether the host is desktop Safari.
    pub fn is_safari_desktop(&self) -> bool {
        self.is_safari_desktop
    }

    /// Returns the final verdict: whether PDFs can be rendered inline.
    pub fn supports_pdfs(&self) -> bool {
        self.supports_pdfs
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::host::StaticHost;

    const CHROME: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0 Safari/537.36";
    const FIREFOX_18: &str = "Mozilla/5.0 (Windows NT 6.1; rv:18.0) Gecko/20100101 Firefox/18.0";
    const FIREFOX_19: &str = "Mozilla/5.0 (Windows NT 6.1; rv:19.0) Gecko/20100101 Firefox/19.0";
    const IPAD: &str = "Mozilla/5.0 (iPad; CPU OS 12_0 like Mac OS X) AppleWebKit/605.1.15 Safari/604.1";
    const IE11: &str = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";

    /// Records every ActiveX probe so tests can assert on laziness.
    struct ProbingHost {
        inner: StaticHost,
        probes: RefCell<Vec<String>>,
    }

    impl HostSignals for ProbingHost {
        fn user_agent(&self) -> &str {
            self.inner.user_agent()
        }

        fn vendor(&self) -> &str {
            self.inner.vendor()
        }

        fn has_mime_type(&self, mime_type: &str) -> bool {
            self.inner.has_mime_type(mime_type)
        }

        fn has_promise(&self) -> bool {
            self.inner.has_promise()
        }

        fn has_active_x(&self) -> bool {
            self.inner.has_active_x()
        }

        fn create_active_x(&self, prog_id: &str) -> bool {
            self.probes.borrow_mut().push(prog_id.to_owned());
            self.inner.create_active_x(prog_id)
        }
    }

    #[test]
    fn ios_overrides_every_other_signal() {
        let host = StaticHost::new(IPAD)
            .with_vendor("Apple Computer, Inc.")
            .with_pdf_plugin()
            .with_promise(true)
            .with_active_x(PDF_ACTIVE_X_CONTROLS);
        let report = CapabilityReport::detect(&host);

        assert!(report.is_ios());
        assert!(!report.supports_pdfs());
        assert!(!report.is_safari_desktop());
    }

    #[test]
    fn firefox_after_18_bundles_pdfjs() {
        let report = CapabilityReport::detect(&StaticHost::new(FIREFOX_19));
        assert!(report.is_firefox_with_pdfjs());
        assert!(report.supports_pdfs());

        let report = CapabilityReport::detect(&StaticHost::new(FIREFOX_18));
        assert!(!report.is_firefox_with_pdfjs());
        assert!(!report.supports_pdfs());

        let report =
            CapabilityReport::detect(&StaticHost::new("Mozilla/5.0 (rv:99999999999.0) Firefox/99"));
        assert!(report.is_firefox_with_pdfjs());
        assert!(report.supports_pdfs());
    }

    #[test]
    fn mime_type_registry_grants_support() {
        let report = CapabilityReport::detect(&StaticHost::new(CHROME).with_pdf_plugin());
        assert!(report.has_pdf_mime_type());
        assert!(report.supports_pdfs());
    }

    #[test]
    fn active_x_controls_are_probed_lazily() {
        let host = ProbingHost {
            inner: StaticHost::new(IE11).with_active_x(["PDF.PdfCtrl"]),
            probes: RefCell::new(Vec::new()),
        };
        let report = CapabilityReport::detect(&host);

        assert!(report.is_legacy_ie());
        assert!(report.has_active_x_support());
        assert!(report.supports_pdfs());
        assert_eq!(*host.probes.borrow(), ["AcroPDF.PDF", "PDF.PdfCtrl"]);

        let host = ProbingHost {
            inner: StaticHost::new(IE11)
                .with_pdf_plugin()
                .with_active_x(["AcroPDF.PDF"]),
            probes: RefCell::new(Vec::new()),
        };
        let report = CapabilityReport::detect(&host);
        assert!(report.supports_pdfs());
        assert!(!report.is_legacy_ie());
        assert!(host.probes.borrow().is_empty());
    }

    #[test]
    fn active_x_without_pdf_controls_is_unsupported() {
        let report =
            CapabilityReport::detect(&StaticHost::new(IE11).with_active_x(["ShockwaveFlash"]));
        assert!(report.is_legacy_ie());
        assert!(!report.has_active_x_support());
        assert!(!report.supports_pdfs());
    }

    #[test]
    fn modern_host_without_evidence_is_unsupported() {
        let report = CapabilityReport::detect(&StaticHost::new(CHROME).with_promise(true));
        assert!(report.is_modern());
        assert!(!report.supports_pdfs());
    }

    #[test]
    fn desktop_safari_requires_apple_vendor() {
        let safari = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14) AppleWebKit/605.1.15 Version/12.0 Safari/605.1.15";
        let report =
            CapabilityReport::detect(&StaticHost::new(safari).with_vendor("Apple Computer, Inc."));
        assert!(report.is_safari_desktop());

        let report = CapabilityReport::detect(&StaticHost::new(CHROME).with_vendor("Google Inc."));
        assert!(!report.is_safari_desktop());
    }

    #[test]
    fn detection_is_deterministic() {
        let host = StaticHost::new(CHROME).with_pdf_plugin().with_promise(true);
        assert_eq!(CapabilityReport::detect(&host), CapabilityReport::detect(&host));
    }
}
