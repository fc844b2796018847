//! Per-call configuration of the embed pipeline.
//!
//! Options can be assembled with the builder-style `with_*` methods or read
//! from the JSON object a page script would pass (`{"page": 2, "PDFJS_URL":
//! "/pdfjs/web/viewer.html"}`). JSON input is read leniently: a value of the
//! wrong type falls back to the option's default instead of failing, and
//! falsy values (`0`, `""`, `null`) count as absent.

use serde::de::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::OptionsError;
use crate::params::{json_display, OpenParams};

/// Width and height applied when the caller does not size the viewer.
pub const DEFAULT_DIMENSION: &str = "100%";

/// Markup written into the target when no renderer is available.
pub const DEFAULT_FALLBACK_HTML: &str = "<p>This browser does not support inline PDFs. Please download the PDF to view it: <a href='[url]'>Download PDF</a></p>";

/// Placeholder replaced by the document URL in fallback markup.
pub const URL_PLACEHOLDER: &str = "[url]";

/// Controls what the target shows when the PDF cannot be displayed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FallbackLink {
    /// Show the built-in download message, or nothing when `false`.
    Enabled(bool),
    /// Show this HTML; every `[url]` is replaced by the document URL.
    Custom(String),
}

impl Default for FallbackLink {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

impl FallbackLink {
    /// Returns the fallback HTML for `url`, or `None` when disabled.
    pub fn render(&self, url: &str) -> Option<String> {
        let template = match self {
            Self::Enabled(false) => return None,
            Self::Enabled(true) => DEFAULT_FALLBACK_HTML,
            Self::Custom(html) if html.is_empty() => return None,
            Self::Custom(html) => html.as_str(),
        };
        Some(template.replace(URL_PLACEHOLDER, url))
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::String(html) => Self::Custom(html.clone()),
            other => Self::Enabled(is_truthy(other)),
        }
    }
}

/// Options accepted by [`crate::PdfObject::embed`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmbedOptions {
    id: Option<String>,
    page: Option<String>,
    pdf_open_params: OpenParams,
    fallback_link: FallbackLink,
    width: String,
    height: String,
    assumption_mode: bool,
    force_pdfjs: bool,
    support_redirect: bool,
    pdfjs_url: Option<String>,
}

impl Default for EmbedOptions {
    fn default() -> Self {
        Self {
            id: None,
            page: None,
            pdf_open_params: OpenParams::default(),
            fallback_link: FallbackLink::default(),
            width: DEFAULT_DIMENSION.to_owned(),
            height: DEFAULT_DIMENSION.to_owned(),
            assumption_mode: true,
            force_pdfjs: false,
            support_redirect: false,
            pdfjs_url: None,
        }
    }
}

impl EmbedOptions {
    /// Creates options with every value at its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from a JSON string.
    pub fn from_json_str(input: &str) -> Result<Self, OptionsError> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json_value(&value)
    }

    /// Reads options from a JSON value. `null` yields the defaults.
    pub fn from_json_value(value: &Value) -> Result<Self, OptionsError> {
        match value {
            Value::Object(map) => Ok(Self::from_json_map(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(OptionsError::NotAnObject),
        }
    }

    fn from_json_map(map: &Map<String, Value>) -> Self {
        let defaults = Self::default();
        let bool_or = |key: &str, default: bool| map.get(key).and_then(Value::as_bool).unwrap_or(default);

        Self {
            id: map
                .get("id")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
                .map(str::to_owned),
            page: map.get("page").and_then(page_from_json),
            pdf_open_params: match map.get("pdfOpenParams") {
                Some(Value::Object(params)) => OpenParams::from_json_map(params),
                _ => OpenParams::default(),
            },
            fallback_link: map
                .get("fallbackLink")
                .map(FallbackLink::from_json)
                .unwrap_or_default(),
            width: map.get("width").and_then(dimension_from_json).unwrap_or(defaults.width),
            height: map
                .get("height")
                .and_then(dimension_from_json)
                .unwrap_or(defaults.height),
            assumption_mode: bool_or("assumptionMode", defaults.assumption_mode),
            force_pdfjs: bool_or("forcePDFJS", defaults.force_pdfjs),
            support_redirect: bool_or("supportRedirect", defaults.support_redirect),
            pdfjs_url: map
                .get("PDFJS_URL")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_owned),
        }
    }

    /// Returns the `id` attribute given to the created element.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the page the viewer should open at, as written into the
    /// fragment.
    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    /// Returns the PDF open parameters as supplied by the caller.
    pub fn pdf_open_params(&self) -> &OpenParams {
        &self.pdf_open_params
    }

    /// Returns the fallback configuration.
    pub fn fallback_link(&self) -> &FallbackLink {
        &self.fallback_link
    }

    /// Returns the CSS width used for non-body targets.
    pub fn width(&self) -> &str {
        &self.width
    }

    /// Returns the CSS height used for non-body targets.
    pub fn height(&self) -> &str {
        &self.height
    }

    /// Returns whether modern hosts may be assumed capable.
    pub fn assumption_mode(&self) -> bool {
        self.assumption_mode
    }

    /// Returns whether the external renderer is forced.
    pub fn force_pdfjs(&self) -> bool {
        self.force_pdfjs
    }

    /// Returns whether desktop Safari gets an iframe instead of `<embed>`.
    pub fn support_redirect(&self) -> bool {
        self.support_redirect
    }

    /// Returns the external renderer (PDF.js viewer) URL.
    pub fn pdfjs_url(&self) -> Option<&str> {
        self.pdfjs_url.as_deref()
    }

    /// Returns the open parameters with `page` merged in.
    ///
    /// The stored parameters are left untouched.
    pub fn effective_open_params(&self) -> OpenParams {
        let mut params = self.pdf_open_params.clone();
        if let Some(page) = &self.page {
            params.set("page", page.as_str());
        }
        params
    }

    /// Sets the element `id` and returns the updated options.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.id = (!id.is_empty()).then_some(id);
        self
    }

    /// Sets the page and returns the updated options. Page `0` clears it.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = (page > 0).then(|| page.to_string());
        self
    }

    /// Sets the open parameters and returns the updated options.
    pub fn with_pdf_open_params(mut self, params: OpenParams) -> Self {
        self.pdf_open_params = params;
        self
    }

    /// Sets the fallback configuration and returns the updated options.
    pub fn with_fallback_link(mut self, fallback_link: FallbackLink) -> Self {
        self.fallback_link = fallback_link;
        self
    }

    /// Sets the viewer width and returns the updated options.
    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = non_empty_or_default(width.into());
        self
    }

    /// Sets the viewer height and returns the updated options.
    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = non_empty_or_default(height.into());
        self
    }

    /// Sets assumption mode and returns the updated options.
    pub fn with_assumption_mode(mut self, assumption_mode: bool) -> Self {
        self.assumption_mode = assumption_mode;
        self
    }

    /// Forces the external renderer and returns the updated options.
    pub fn with_force_pdfjs(mut self, force_pdfjs: bool) -> Self {
        self.force_pdfjs = force_pdfjs;
        self
    }

    /// Sets redirect support and returns the updated options.
    pub fn with_support_redirect(mut self, support_redirect: bool) -> Self {
        self.support_redirect = support_redirect;
        self
    }

    /// Sets the external renderer URL and returns the updated options.
    pub fn with_pdfjs_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.pdfjs_url = (!url.is_empty()).then_some(url);
        self
    }
}

impl<'de> Deserialize<'de> for EmbedOptions {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_json_value(&value).map_err(serde::de::Error::custom)
    }
}

fn non_empty_or_default(value: String) -> String {
    if value.is_empty() {
        DEFAULT_DIMENSION.to_owned()
    } else {
        value
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(false, |n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Any truthy page is kept verbatim, so `"3"` and `2.5` both reach the
/// fragment.
fn page_from_json(value: &Value) -> Option<String> {
    is_truthy(value).then(|| json_display(value))
}

fn dimension_from_json(value: &Value) -> Option<String> {
    is_truthy(value).then(|| json_display(value))
}
