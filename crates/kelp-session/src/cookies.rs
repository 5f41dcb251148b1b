//! Session cookie jar
//!
//! Cookies are keyed by name only. Domain and path attributes are not
//! tracked, so every cookie is sent to every host the session talks to.

use cookie::Cookie;
use http::HeaderValue;
use parking_lot::RwLock;
use reqwest::cookie::CookieStore;
use reqwest::Url;
use std::collections::BTreeMap;
use time::{Duration, OffsetDateTime};
use tracing::trace;

/// Name/value cookie store shared by a session and its transport client
#[derive(Debug, Default)]
pub struct CookieJar {
    cookies: RwLock<BTreeMap<String, String>>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a cookie
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.read().get(name).cloned()
    }

    /// Set a cookie, replacing any previous value
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.write().insert(name.into(), value.into());
    }

    /// Set several cookies at once
    pub fn set_all<I, K, V>(&self, cookies: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut jar = self.cookies.write();
        for (name, value) in cookies {
            jar.insert(name.into(), value.into());
        }
    }

    /// Remove a cookie
    pub fn remove(&self, name: &str) -> Option<String> {
        self.cookies.write().remove(name)
    }

    /// Whether a cookie is set
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.read().contains_key(name)
    }

    /// Remove every cookie
    pub fn clear(&self) {
        self.cookies.write().clear();
    }

    /// Number of cookies
    pub fn len(&self) -> usize {
        self.cookies.read().len()
    }

    /// Whether the jar is empty
    pub fn is_empty(&self) -> bool {
        self.cookies.read().is_empty()
    }

    /// Snapshot of all cookies
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.cookies.read().clone()
    }

    /// `Cookie` request header for the current contents
    pub fn header_value(&self) -> Option<HeaderValue> {
        let cookies = self.cookies.read();
        if cookies.is_empty() {
            return None;
        }

        let header = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        HeaderValue::from_str(&header).ok()
    }

    fn store(&self, raw: &str) {
        let cookie = match Cookie::parse(raw) {
            Ok(cookie) => cookie,
            Err(e) => {
                trace!(header = raw, error = %e, "ignoring malformed Set-Cookie");
                return;
            }
        };

        let mut cookies = self.cookies.write();
        if is_expired(&cookie, OffsetDateTime::now_utc()) {
            cookies.remove(cookie.name());
        } else {
            cookies.insert(cookie.name().to_string(), cookie.value().to_string());
        }
    }
}

/// Whether a `Set-Cookie` asks for removal. `Max-Age` wins over `Expires`.
fn is_expired(cookie: &Cookie<'_>, now: OffsetDateTime) -> bool {
    match cookie.max_age() {
        Some(max_age) => max_age <= Duration::ZERO,
        None => cookie.expires_datetime().is_some_and(|at| at <= now),
    }
}

impl CookieStore for CookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {
        for header in cookie_headers {
            if let Ok(raw) = header.to_str() {
                self.store(raw);
            }
        }
    }

    fn cookies(&self, _url: &Url) -> Option<HeaderValue> {
        self.header_value()
    }
}
