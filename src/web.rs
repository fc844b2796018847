//! Browser bindings: live host signals, the live DOM, and a JS-facing facade.
//!
//! Only compiled for `wasm32`. Host signals are read through `Reflect` so
//! that legacy globals (`ActiveXObject`, `navigator.mimeTypes`) can be probed
//! without failing on hosts that lack them.

use js_sys::{Array, Function, Object, Reflect};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement};

use crate::capability::CapabilityReport;
use crate::document::{HostDocument, Target};
use crate::embed::PdfObject;
use crate::error::{Diagnostics, EmbedError};
use crate::host::HostSignals;
use crate::markup::Markup;
use crate::options::EmbedOptions;

fn property(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

fn string_property(target: &JsValue, key: &str) -> String {
    property(target, key).as_string().unwrap_or_default()
}

/// Host signals read from the global object and `navigator`.
#[derive(Clone, Debug)]
pub struct NavigatorSignals {
    global: Object,
    navigator: JsValue,
    user_agent: String,
    vendor: String,
}

impl NavigatorSignals {
    /// Captures the current global scope. Returns `None` outside a browser.
    pub fn from_global() -> Option<Self> {
        let global = js_sys::global();
        let navigator = property(&global, "navigator");
        if navigator.is_undefined() || property(&global, "window").is_undefined() {
            return None;
        }

        Some(Self {
            user_agent: string_property(&navigator, "userAgent"),
            vendor: string_property(&navigator, "vendor"),
            navigator,
            global,
        })
    }
}

impl HostSignals for NavigatorSignals {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn has_mime_type(&self, mime_type: &str) -> bool {
        let registry = property(&self.navigator, "mimeTypes");
        !registry.is_undefined() && !registry.is_null() && !property(&registry, mime_type).is_undefined()
    }

    fn has_promise(&self) -> bool {
        !property(&self.global, "Promise").is_undefined()
    }

    fn has_active_x(&self) -> bool {
        Reflect::has(&self.global, &JsValue::from_str("ActiveXObject")).unwrap_or(false)
    }

    fn create_active_x(&self, prog_id: &str) -> bool {
        let Ok(constructor) = property(&self.global, "ActiveXObject").dyn_into::<Function>() else {
            return false;
        };
        let arguments = Array::of1(&JsValue::from_str(prog_id));
        Reflect::construct(&constructor, &arguments)
            .map(|control| !control.is_null() && !control.is_undefined())
            .unwrap_or(false)
    }
}

/// [`HostDocument`] backed by the live DOM.
#[derive(Clone, Debug)]
pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    /// Wraps an existing document.
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// Wraps `window.document`, if available.
    pub fn from_window() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self::new(document))
    }
}

impl HostDocument for WebDocument {
    type Node = Element;

    fn body(&self) -> Option<Element> {
        self.document
            .body()
            .map(|body| body.unchecked_into::<Element>())
    }

    fn query_selector(&self, selector: &str) -> Option<Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn class_name(&self, node: &Element) -> String {
        node.class_name()
    }

    fn set_class_name(&mut self, node: &Element, class_name: &str) {
        node.set_class_name(class_name);
    }

    fn set_style_property(&mut self, node: &Element, property: &str, value: &str) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            log::warn!("[PDFObject] cannot style <{}>: not an HTML element", node.tag_name());
            return;
        };
        if let Err(err) = element.style().set_property(property, value) {
            log::warn!("[PDFObject] setting {property}: {value} failed: {err:?}");
        }
    }

    fn replace_children(&mut self, node: &Element, markup: &Markup) {
        node.set_inner_html(&markup.to_html());
    }

    fn first_element_by_tag(&self, node: &Element, tag: &str) -> Option<Element> {
        node.get_elements_by_tag_name(tag).item(0)
    }
}

/// Diagnostics written to the browser console.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleDiagnostics;

impl Diagnostics for ConsoleDiagnostics {
    fn report(&self, error: &EmbedError) {
        web_sys::console::log_1(&JsValue::from_str(&format!("[PDFObject] {error}")));
    }
}

/// JavaScript facade mirroring the classic `PDFObject` global.
#[wasm_bindgen(js_name = PDFObject)]
pub struct WebPdfObject {
    inner: PdfObject<ConsoleDiagnostics>,
}

#[wasm_bindgen(js_class = PDFObject)]
impl WebPdfObject {
    /// Detects host capabilities once; hosts without `window` are unsupported.
    #[wasm_bindgen(constructor)]
    pub fn new() -> WebPdfObject {
        let report = NavigatorSignals::from_global()
            .map(|signals| CapabilityReport::detect(&signals))
            .unwrap_or_default();
        Self {
            inner: PdfObject::with_diagnostics(report, ConsoleDiagnostics),
        }
    }

    /// Embeds `url` into `target`; returns the created element or `false`.
    pub fn embed(&self, url: JsValue, target: JsValue, options: JsValue) -> JsValue {
        let Some(mut document) = WebDocument::from_window() else {
            self.inner.diagnostics().report(&EmbedError::TargetNotFound {
                selector: target.as_string(),
            });
            return JsValue::FALSE;
        };

        let url = url.as_string().map(Value::String).unwrap_or(Value::Null);
        let options = read_options(&options);
        let selector = target.as_string();
        let target = match &selector {
            Some(selector) => Target::Selector(selector.as_str()),
            None => element_target(&target),
        };

        match self.inner.embed_value(&mut document, &url, target, &options) {
            Ok(element) => element.into(),
            Err(_) => JsValue::FALSE,
        }
    }

    #[wasm_bindgen(getter, js_name = pdfobjectversion)]
    pub fn pdfobjectversion(&self) -> String {
        crate::LIBRARY_VERSION.to_owned()
    }

    #[wasm_bindgen(getter, js_name = supportsPDFs)]
    pub fn supports_pdfs(&self) -> bool {
        self.inner.supports_inline_rendering()
    }
}

impl Default for WebPdfObject {
    fn default() -> Self {
        Self::new()
    }
}

fn read_options(options: &JsValue) -> EmbedOptions {
    if options.is_undefined() || options.is_null() {
        return EmbedOptions::default();
    }
    let json = js_sys::JSON::stringify(options)
        .ok()
        .and_then(|json| json.as_string())
        .unwrap_or_default();
    EmbedOptions::from_json_str(&json).unwrap_or_else(|err| {
        log::warn!("[PDFObject] ignoring options: {err}");
        EmbedOptions::default()
    })
}

/// Interprets a non-string target: nothing means the body, an element is used
/// directly, and an array-like wrapper contributes its first element.
fn element_target<'a>(target: &JsValue) -> Target<'a, Element> {
    if target.is_undefined() || target.is_null() || target.as_bool() == Some(false) {
        return Target::Body;
    }
    if let Some(element) = target.dyn_ref::<Element>() {
        return Target::Node(element.clone());
    }

    let first = Reflect::get_u32(target, 0)
        .ok()
        .and_then(|first| first.dyn_into::<Element>().ok());
    Target::Collection(first.into_iter().collect())
}
