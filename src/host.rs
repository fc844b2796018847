//! Host environment signals consumed by capability detection.
//!
//! Detection never talks to a browser directly. Instead it reads the raw
//! identification strings and feature flags through [`HostSignals`], so the
//! same logic runs against the live `navigator` object on `wasm32`, against a
//! description supplied on the command line, or against fixtures in tests.

/// MIME type registered by PDF plugins.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Source of the raw signals inspected by [`crate::capability::CapabilityReport`].
pub trait HostSignals {
    /// Platform identification string (`navigator.userAgent`).
    fn user_agent(&self) -> &str;

    /// Browser vendor string (`navigator.vendor`), empty when unknown.
    fn vendor(&self) -> &str;

    /// Returns whether the plugin MIME type registry lists `mime_type`.
    fn has_mime_type(&self, mime_type: &str) -> bool;

    /// Returns whether the host exposes a `Promise` implementation.
    fn has_promise(&self) -> bool;

    /// Returns whether the legacy `ActiveXObject` mechanism is present.
    fn has_active_x(&self) -> bool;

    /// Attempts to instantiate the named ActiveX control.
    ///
    /// Must return `false` instead of failing when instantiation throws.
    fn create_active_x(&self, prog_id: &str) -> bool;
}

/// Fixed set of host signals.
///
/// Useful for tests, for rendering markup on behalf of a known client, and
/// as the backing store of the command line front end.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StaticHost {
    user_agent: String,
    vendor: String,
    mime_types: Vec<String>,
    promise: bool,
    active_x: bool,
    active_x_controls: Vec<String>,
}

impl StaticHost {
    /// Creates a host with the given user agent and no other capabilities.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    /// Sets the vendor string and returns the updated host.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Registers a MIME type and returns the updated host.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_types.push(mime_type.into());
        self
    }

    /// Convenience shorthand that registers [`PDF_MIME_TYPE`].
    pub fn with_pdf_plugin(self) -> Self {
        self.with_mime_type(PDF_MIME_TYPE)
    }

    /// Sets whether `Promise` is available and returns the updated host.
    pub fn with_promise(mut self, promise: bool) -> Self {
        self.promise = promise;
        self
    }

    /// Enables the ActiveX mechanism with the given installable controls.
    pub fn with_active_x<I, S>(mut self, controls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.active_x = true;
        self.active_x_controls
            .extend(controls.into_iter().map(Into::into));
        self
    }
}

impl HostSignals for StaticHost {
    fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn has_mime_type(&self, mime_type: &str) -> bool {
        self.mime_types.iter().any(|known| known == mime_type)
    }

    fn has_promise(&self) -> bool {
        self.promise
    }

    fn has_active_x(&self) -> bool {
        self.active_x
    }

    fn create_active_x(&self, prog_id: &str) -> bool {
        self.active_x && self.active_x_controls.iter().any(|known| known == prog_id)
    }
}

/// Returns whether the user agent identifies an iPhone, iPad or iPod.
pub fn is_ios(user_agent: &str) -> bool {
    let lowered = user_agent.to_ascii_lowercase();
    ["iphone", "ipad", "ipod"]
        .iter()
        .any(|device| lowered.contains(device))
}

/// Returns whether the user agent names the Firefox family.
pub fn is_firefox(user_agent: &str) -> bool {
    user_agent.contains("irefox")
}

/// Parses the major release number that follows `rv:` in the user agent.
///
/// Leading digits are read the way `parseInt` does, so `rv:57.0` yields 57.
/// Numbers too large to represent saturate at `u64::MAX`.
pub fn release_version(user_agent: &str) -> Option<u64> {
    let (_, rest) = user_agent.split_once("rv:")?;
    let major = rest.split('.').next()?.trim_start();
    let digits: String = major.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(u64::MAX))
}
