//! Non-durable mirror of the access token as an `AccessToken` cookie.
//!
//! The jar lives only as long as the process; the durable copy is the
//! persistence adapter. The HTTP transport shares the same jar so the cookie
//! rides along with every request to the backend.

use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::Jar;

pub const ACCESS_COOKIE_NAME: &str = "AccessToken";

/// `Set-Cookie` value carrying the access token.
#[must_use]
pub fn access_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!("{ACCESS_COOKIE_NAME}={token}; Path=/; SameSite=Strict");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the mirrored token.
#[must_use]
pub fn expired_access_cookie() -> String {
    format!("{ACCESS_COOKIE_NAME}=; Path=/; Expires=Thu, 01 Jan 1970 00:00:00 GMT; SameSite=Strict")
}

#[derive(Debug, Clone)]
pub struct CookieMirror {
    jar: Arc<Jar>,
    url: Url,
    secure: bool,
}

impl CookieMirror {
    /// Mirror cookies for `url`; `secure` marks them https-only.
    #[must_use]
    pub fn new(jar: Arc<Jar>, url: Url, secure: bool) -> Self {
        Self { jar, url, secure }
    }

    #[must_use]
    pub fn jar(&self) -> &Arc<Jar> {
        &self.jar
    }

    pub(crate) fn set(&self, token: &str) {
        self.jar.add_cookie_str(&access_cookie(token, self.secure), &self.url);
    }

    pub(crate) fn clear(&self) {
        self.jar.add_cookie_str(&expired_access_cookie(), &self.url);
    }
}

#[cfg(test)]
#[path = "cookie_test.rs"]
mod tests;
