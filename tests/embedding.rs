use std::cell::RefCell;

use pdf_embed::markup::Markup;
use pdf_embed::{
    CapabilityReport, Diagnostics, EmbedError, EmbedOptions, FallbackLink, HostDocument,
    MemoryDocument, NodeId, OpenParams, PdfObject, StaticHost, Target,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const URL: &str = "/docs/sample report.pdf";
const CHROME: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.77 Safari/537.36";
const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X) AppleWebKit/605.1.15 Version/12.0 Mobile/15E148 Safari/604.1";

type Recorder = RefCell<Vec<EmbedError>>;

fn capable_host() -> CapabilityReport {
    CapabilityReport::detect(&StaticHost::new(CHROME).with_pdf_plugin().with_promise(true))
}

fn incapable_host() -> CapabilityReport {
    CapabilityReport::detect(&StaticHost::new(CHROME).with_promise(true))
}

fn embedder(
    report: CapabilityReport,
    recorder: &Recorder,
) -> PdfObject<impl Fn(&EmbedError) + '_> {
    PdfObject::with_diagnostics(report, move |error: &EmbedError| {
        recorder.borrow_mut().push(error.clone())
    })
}

fn document_with_box() -> (MemoryDocument, NodeId) {
    let mut document = MemoryDocument::new();
    let body = document.body_node();
    let target = document.create_element("div");
    document.set_attribute(&target, "id", "box");
    document.append_child(&body, &target);
    (document, target)
}

#[test]
fn rejects_non_string_url() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let mut document = MemoryDocument::new();

    let result = pdf.embed_value(&mut document, &json!(42), Target::Body, &EmbedOptions::new());

    assert_eq!(result, Err(EmbedError::InvalidInput));
    assert_eq!(*recorder.borrow(), vec![EmbedError::InvalidInput]);
    assert_eq!(document.inner_html(&document.body_node()), "");
}

#[test]
fn rejects_blank_url() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let mut document = MemoryDocument::new();

    let result = pdf.embed(&mut document, "  ", Target::Body, &EmbedOptions::new());
    assert_eq!(result, Err(EmbedError::InvalidInput));
}

#[test]
fn unresolved_target_fails() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let (mut document, _) = document_with_box();

    let result = pdf.embed(
        &mut document,
        URL,
        Target::Selector("#nonexistent-id"),
        &EmbedOptions::new(),
    );

    let expected = EmbedError::TargetNotFound {
        selector: Some("#nonexistent-id".to_owned()),
    };
    assert_eq!(result, Err(expected.clone()));
    assert_eq!(*recorder.borrow(), vec![expected]);
}

#[test]
fn empty_collection_target_fails() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let mut document = MemoryDocument::new();

    let result = pdf.embed(
        &mut document,
        URL,
        Target::Collection(Vec::new()),
        &EmbedOptions::new(),
    );
    assert_eq!(result, Err(EmbedError::TargetNotFound { selector: None }));
}

#[test]
fn forced_pdfjs_builds_renderer_iframe() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let mut document = MemoryDocument::new();
    let options = EmbedOptions::new()
        .with_force_pdfjs(true)
        .with_pdfjs_url("https://viewer.example/v")
        .with_page(2);

    let iframe = pdf
        .embed(&mut document, URL, Target::Body, &options)
        .expect("forced renderer");

    let body = document.body_node();
    assert_eq!(document.tag(&iframe), Some("iframe"));
    assert_eq!(
        document.attribute(&iframe, "src"),
        Some("https://viewer.example/v?file=%2Fdocs%2Fsample%20report.pdf#page=2")
    );
    assert_eq!(document.class_name(&body), "pdfobject-container");
    assert_eq!(document.style_property(&body, "position").as_deref(), Some("relative"));
    assert_eq!(document.style_property(&body, "overflow").as_deref(), Some("auto"));
    assert_eq!(
        document.inner_html(&body),
        "<div style='overflow: hidden; position: absolute; top: 0; right: 0; bottom: 0; left: 0;'>\
         <iframe src='https://viewer.example/v?file=%2Fdocs%2Fsample%20report.pdf#page=2' \
         style='border: none; width: 100%; height: 100%;' frameborder='0'></iframe></div>"
    );
    assert!(recorder.borrow().is_empty());
}

#[test]
fn native_embed_carries_page_fragment() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    assert!(pdf.supports_inline_rendering());
    let mut document = MemoryDocument::new();

    let embed = pdf
        .embed(
            &mut document,
            URL,
            Target::Body,
            &EmbedOptions::new().with_page(5),
        )
        .expect("native embed");

    assert_eq!(document.tag(&embed), Some("embed"));
    let src = document.attribute(&embed, "src").unwrap_or_default();
    assert!(src.ends_with("#page=5"), "unexpected src {src}");
    assert_eq!(document.attribute(&embed, "type"), Some("application/pdf"));
    assert_eq!(
        document.attribute(&embed, "style"),
        Some("overflow: auto; position: absolute; top: 0; right: 0; bottom: 0; left: 0; width: 100%; height: 100%;")
    );
}

#[test]
fn non_body_target_uses_configured_size_and_id() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let (mut document, target) = document_with_box();
    let options = EmbedOptions::new()
        .with_id("viewer")
        .with_width("50%")
        .with_height("600px")
        .with_pdf_open_params(OpenParams::new().with("zoom", 75).with("page", 1))
        .with_page(3);

    let embed = pdf
        .embed(&mut document, URL, Target::Selector("#box"), &options)
        .expect("native embed");

    assert_eq!(
        document.inner_html(&target),
        "<embed id='viewer' class='pdfobject' src='/docs/sample report.pdf#zoom=75&amp;page=3' \
         type='application/pdf' style='overflow: auto; width: 50%; height: 600px;'/>"
    );
    assert_eq!(document.query_selector("#viewer"), Some(embed));
    assert_eq!(document.class_name(&target), "pdfobject-container");
    assert_eq!(options.pdf_open_params().get("page"), Some("1"));
}

#[test]
fn safari_with_redirect_support_gets_iframe() {
    let safari = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14) AppleWebKit/605.1.15 Version/12.0 Safari/605.1.15";
    let report = CapabilityReport::detect(
        &StaticHost::new(safari)
            .with_vendor("Apple Computer, Inc.")
            .with_pdf_plugin(),
    );
    let recorder = Recorder::default();
    let pdf = embedder(report, &recorder);
    let (mut document, _) = document_with_box();

    let iframe = pdf
        .embed(
            &mut document,
            URL,
            Target::Selector("#box"),
            &EmbedOptions::new().with_support_redirect(true),
        )
        .expect("native iframe");

    assert_eq!(document.tag(&iframe), Some("iframe"));
    assert_eq!(document.attribute(&iframe, "class"), Some("pdfobject"));
    assert_eq!(
        document.attribute(&iframe, "style"),
        Some("border: none; width: 100%; height: 100%;")
    );
}

#[test]
fn unsupported_host_writes_default_fallback() {
    let recorder = Recorder::default();
    let pdf = embedder(incapable_host(), &recorder);
    assert!(!pdf.supports_inline_rendering());
    let (mut document, target) = document_with_box();
    let options = EmbedOptions::new().with_width("50%").with_height("50%");

    let result = pdf.embed(&mut document, URL, Target::Selector("#box"), &options);

    let expected = EmbedError::UnsupportedHost {
        fallback_written: true,
    };
    assert_eq!(result, Err(expected.clone()));
    assert_eq!(*recorder.borrow(), vec![expected]);
    let html = document.inner_html(&target);
    assert!(html.contains("This browser does not support inline PDFs"));
    assert!(html.contains(URL));
}

#[test]
fn custom_fallback_and_disabled_fallback() {
    let recorder = Recorder::default();
    let pdf = embedder(incapable_host(), &recorder);
    let (mut document, target) = document_with_box();

    let custom = EmbedOptions::new()
        .with_fallback_link(FallbackLink::Custom("<a href='[url]'>[url]</a>".into()));
    let _ = pdf.embed(&mut document, "a.pdf", Target::Node(target), &custom);
    assert_eq!(document.inner_html(&target), "<a href='a.pdf'>a.pdf</a>");

    let disabled = EmbedOptions::new().with_fallback_link(FallbackLink::Enabled(false));
    let (mut document, target) = document_with_box();
    let result = pdf.embed(&mut document, "a.pdf", Target::Node(target), &disabled);
    assert_eq!(
        result,
        Err(EmbedError::UnsupportedHost {
            fallback_written: false
        })
    );
    assert_eq!(document.inner_html(&target), "");
}

#[test]
fn unsupported_host_falls_back_to_pdfjs() {
    let recorder = Recorder::default();
    let pdf = embedder(incapable_host(), &recorder);
    let (mut document, _) = document_with_box();

    let iframe = pdf
        .embed(
            &mut document,
            URL,
            Target::Selector("#box"),
            &EmbedOptions::new().with_pdfjs_url("/pdfjs/web/viewer.html"),
        )
        .expect("renderer fallback");

    let src = document.attribute(&iframe, "src").unwrap_or_default();
    assert!(src.starts_with("/pdfjs/web/viewer.html?file="));
}

#[test]
fn ios_uses_touch_scrolling_for_renderer() {
    let report = CapabilityReport::detect(
        &StaticHost::new(IPHONE)
            .with_vendor("Apple Computer, Inc.")
            .with_pdf_plugin()
            .with_promise(true),
    );
    let recorder = Recorder::default();
    let pdf = embedder(report, &recorder);
    assert!(!pdf.supports_inline_rendering());
    let mut document = MemoryDocument::new();

    let iframe = pdf
        .embed(
            &mut document,
            URL,
            Target::Body,
            &EmbedOptions::new().with_pdfjs_url("/viewer.html"),
        )
        .expect("renderer fallback");

    let wrapper = document.parent(&iframe).expect("wrapper div");
    assert_eq!(
        document.attribute(&wrapper, "style"),
        Some("-webkit-overflow-scrolling: touch; overflow-y: scroll; position: absolute; top: 0; right: 0; bottom: 0; left: 0;")
    );
}

#[test]
fn repeated_embeds_replace_content() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let (mut document, target) = document_with_box();
    let options = EmbedOptions::new();

    let first = pdf
        .embed(&mut document, URL, Target::Selector("#box"), &options)
        .expect("first embed");
    let second = pdf
        .embed(&mut document, URL, Target::Selector("#box"), &options)
        .expect("second embed");

    assert_ne!(first, second);
    assert_eq!(document.children(&target), &[second]);
    assert_eq!(document.query_selector_all("embed"), vec![second]);
    assert_eq!(document.class_name(&target), "pdfobject-container");
}

#[test]
fn options_from_json_drive_embedding() {
    let recorder = Recorder::default();
    let pdf = embedder(incapable_host(), &recorder);
    let (mut document, _) = document_with_box();
    let options = EmbedOptions::from_json_value(&json!({
        "forcePDFJS": true,
        "PDFJS_URL": "https://viewer.example/v",
        "pdfOpenParams": {"a": "x y", "b": 1}
    }))
    .expect("options");

    let iframe = pdf
        .embed(&mut document, "doc.pdf", Target::Selector("#box"), &options)
        .expect("forced renderer");

    assert_eq!(
        document.attribute(&iframe, "src"),
        Some("https://viewer.example/v?file=doc.pdf#a=x%20y&b=1")
    );
}

#[test]
fn detect_shortcut_uses_log_diagnostics() {
    let pdf = PdfObject::detect(&StaticHost::new(CHROME).with_pdf_plugin());
    assert!(pdf.supports_inline_rendering());
    assert_eq!(pdf_embed::LIBRARY_VERSION, env!("CARGO_PKG_VERSION"));

    let mut document = MemoryDocument::new();
    assert!(pdf
        .embed(&mut document, URL, Target::Selector("#missing"), &EmbedOptions::new())
        .is_err());
}

#[test]
fn css_selectors_resolve_targets() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);

    for selector in ["div[data-viewer]", "body > div", "div:first-child", "[data-viewer='1']"] {
        let mut document = MemoryDocument::new();
        let body = document.body_node();
        let target = document.create_element("div");
        document.set_attribute(&target, "data-viewer", "1");
        document.append_child(&body, &target);

        let embed = pdf
            .embed(&mut document, URL, Target::Selector(selector), &EmbedOptions::new())
            .unwrap_or_else(|err| panic!("{selector}: {err}"));

        assert_eq!(document.parent(&embed), Some(target), "{selector}");
    }
    assert!(recorder.borrow().is_empty());
}

#[test]
fn renderer_keeps_existing_target_styles() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let (mut document, target) = document_with_box();
    document.set_attribute(
        &target,
        "style",
        "background: url(\"data:image/png;base64,AAAA\"); color: red",
    );
    let options = EmbedOptions::new()
        .with_force_pdfjs(true)
        .with_pdfjs_url("/viewer.html");

    pdf.embed(&mut document, URL, Target::Node(target), &options)
        .expect("forced renderer");

    assert_eq!(
        document.attribute(&target, "style"),
        Some(
            "background: url(\"data:image/png;base64,AAAA\"); color: red; position: relative; overflow: auto;"
        )
    );
}

/// Document that accepts viewer markup but never hands the viewer back.
struct ViewerlessDocument(MemoryDocument);

impl HostDocument for ViewerlessDocument {
    type Node = NodeId;

    fn body(&self) -> Option<NodeId> {
        self.0.body()
    }

    fn query_selector(&self, selector: &str) -> Option<NodeId> {
        self.0.query_selector(selector)
    }

    fn class_name(&self, node: &NodeId) -> String {
        self.0.class_name(node)
    }

    fn set_class_name(&mut self, node: &NodeId, class_name: &str) {
        self.0.set_class_name(node, class_name)
    }

    fn set_style_property(&mut self, node: &NodeId, property: &str, value: &str) {
        self.0.set_style_property(node, property, value)
    }

    fn replace_children(&mut self, node: &NodeId, markup: &Markup) {
        self.0.replace_children(node, markup)
    }

    fn first_element_by_tag(&self, _node: &NodeId, _tag: &str) -> Option<NodeId> {
        None
    }
}

#[test]
fn missing_viewer_element_is_reported() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let mut document = ViewerlessDocument(MemoryDocument::new());

    let result = pdf.embed(&mut document, URL, Target::Body, &EmbedOptions::new());

    assert_eq!(result, Err(EmbedError::ElementMissing));
    assert_eq!(*recorder.borrow(), vec![EmbedError::ElementMissing]);
    let body = document.0.body_node();
    assert_eq!(document.0.query_selector_all("embed").len(), 1);
    assert_eq!(document.0.class_name(&body), "pdfobject-container");

    let options = EmbedOptions::new().with_force_pdfjs(true).with_pdfjs_url("/viewer.html");
    let result = pdf.embed(&mut document, URL, Target::Body, &options);
    assert_eq!(result, Err(EmbedError::ElementMissing));
    assert_eq!(recorder.borrow().len(), 2);
}

#[test]
fn diagnostics_accept_failures_raised_outside_embed() {
    let recorder = Recorder::default();
    let pdf = embedder(capable_host(), &recorder);
    let error = EmbedError::TargetNotFound {
        selector: Some("#viewer".to_owned()),
    };

    pdf.diagnostics().report(&error);

    assert_eq!(*recorder.borrow(), vec![error]);
}
