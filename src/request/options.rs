use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

/// Request method passed on to the transport
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport configuration for a retrieval
///
/// The controller never looks inside the options, they are passed through verbatim to the
/// transport. Options are watched by identity: sharing the same `Arc<Options>` between renders
/// keeps the dependency stable, while building new options on every render triggers a new
/// activation each time.
///
/// Options can be deserialized, which allows to keep request presets in configuration files
///
/// ```rust
/// use fetch_state::request::{Method, Options};
///
/// let opts: Options = serde_json::from_str(r#"{
///     "method": "POST",
///     "headers": { "accept": "application/json" },
///     "body": "{}"
/// }"#).unwrap();
///
/// assert_eq!(opts.method(), Method::Post);
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    method: Method,
    headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// The empty options shared by every configuration that does not provide its own
    pub fn shared_default() -> Arc<Options> {
        static DEFAULT: OnceLock<Arc<Options>> = OnceLock::new();
        DEFAULT.get_or_init(|| Arc::new(Options::default())).clone()
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn with_method(self, method: Method) -> Self {
        let mut opts = self;
        opts.method = method;
        opts
    }

    /// Add a header, replacing any previous value for the same name
    pub fn with_header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut opts = self;
        opts.headers.insert(name.into(), value.into());
        opts
    }

    pub fn with_body(self, body: impl Into<String>) -> Self {
        let mut opts = self;
        opts.body = Some(body.into());
        opts
    }
}
