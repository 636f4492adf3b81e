//! Provider redirects and the authorization callback

use std::fmt;
use url::Url;

/// A browser navigation the caller must perform.
///
/// `login` and `logout` return this instead of navigating, which leaves the
/// page teardown to the host and lets tests inspect the target.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a redirect does nothing until the host navigates to it"]
pub struct Redirect {
    url: Url,
}

impl Redirect {
    pub(crate) const fn new(url: Url) -> Self {
        Self { url }
    }

    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Value of a query parameter on the target URL
    pub fn param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn into_url(self) -> Url {
        self.url
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

const CALLBACK_PARAMS: [&str; 6] = [
    "code",
    "state",
    "session_state",
    "iss",
    "error",
    "error_description",
];

/// Query parameters the provider appends when sending the browser back
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    pub fn from_url(url: &Url) -> Self {
        let mut params = Self::default();
        for (key, value) in url.query_pairs() {
            let slot = match &*key {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Whether the URL is a provider callback at all
    pub const fn is_callback(&self) -> bool {
        self.code.is_some() || self.error.is_some()
    }
}

/// The URL with provider callback parameters removed.
///
/// Other query parameters and the fragment are kept. Replacing the history
/// entry with this prevents a reload from resubmitting a spent code.
pub fn strip_callback_params(url: &Url) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !CALLBACK_PARAMS.contains(&&**key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut cleaned = url.clone();
    if kept.is_empty() {
        cleaned.set_query(None);
    } else {
        cleaned.query_pairs_mut().clear().extend_pairs(kept);
    }
    cleaned
}

/// Origin plus path of the current page, the default redirect URI
pub fn page_redirect_uri(url: &Url) -> Url {
    let mut uri = url.clone();
    uri.set_query(None);
    uri.set_fragment(None);
    uri
}
