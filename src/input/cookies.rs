//! Browser-exported cookie files
//!
//! Accepts the JSON array written by common cookie-export extensions and
//! normalises it into cookies the browser will take.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::{Error, Result};

/// SameSite policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    /// Map an exported `sameSite` value onto the browser's vocabulary.
    ///
    /// `lax` and `strict` keep their meaning in any case; `no_restriction`,
    /// null, missing and unrecognised values become `None`.
    pub fn normalize(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("strict") => SameSite::Strict,
            Some("lax") => SameSite::Lax,
            _ => SameSite::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie ready to install into a browser context
#[derive(Debug, Clone, PartialEq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    /// Seconds since the epoch; `None` for session cookies
    pub expires: Option<f64>,
}

/// One entry of the exported file
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportedCookie {
    name: String,
    #[serde(default)]
    value: String,
    domain: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    secure: bool,
    #[serde(default)]
    http_only: bool,
    #[serde(default)]
    same_site: Option<String>,
    #[serde(default, alias = "expires")]
    expiration_date: Option<f64>,
    #[serde(default)]
    session: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl From<ExportedCookie> for Cookie {
    fn from(raw: ExportedCookie) -> Self {
        let expires = if raw.session {
            None
        } else {
            // Negative expiry marks a session cookie in some exports
            raw.expiration_date.filter(|expires| *expires > 0.0)
        };

        Cookie {
            same_site: SameSite::normalize(raw.same_site.as_deref()),
            name: raw.name,
            value: raw.value,
            domain: raw.domain,
            path: raw.path,
            secure: raw.secure,
            http_only: raw.http_only,
            expires,
        }
    }
}

/// Parse an exported cookie array
pub fn parse_cookies(json: &str) -> Result<Vec<Cookie>> {
    let exported: Vec<ExportedCookie> = serde_json::from_str(json)
        .map_err(|e| Error::invalid_input(format!("cookie file is not a cookie array: {}", e)))?;
    Ok(exported.into_iter().map(Cookie::from).collect())
}

/// Read and parse a cookie file
pub fn load_cookies<P: AsRef<Path>>(path: P) -> Result<Vec<Cookie>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::invalid_input(format!("cannot read cookies from {}: {}", path.display(), e)))?;

    let cookies = parse_cookies(&json)?;
    debug!("Loaded {} cookies from {}", cookies.len(), path.display());
    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_normalization() {
        assert_eq!(SameSite::normalize(Some("lax")), SameSite::Lax);
        assert_eq!(SameSite::normalize(Some("strict")), SameSite::Strict);
        assert_eq!(SameSite::normalize(Some("Strict")), SameSite::Strict);
        assert_eq!(SameSite::normalize(Some("no_restriction")), SameSite::None);
        assert_eq!(SameSite::normalize(None), SameSite::None);
        assert_eq!(SameSite::normalize(Some("unspecified")), SameSite::None);
        assert_eq!(SameSite::normalize(Some("None")), SameSite::None);
    }

    #[test]
    fn test_parse_exported_cookies() {
        let json = r#"[
            {
                "domain": ".facebook.com",
                "expirationDate": 1767225600.5,
                "hostOnly": false,
                "httpOnly": true,
                "name": "xs",
                "path": "/",
                "sameSite": "no_restriction",
                "secure": true,
                "session": false,
                "storeId": "0",
                "value": "abc"
            },
            {
                "domain": ".facebook.com",
                "name": "c_user",
                "value": "42",
                "sameSite": null,
                "session": true
            },
            {
                "domain": "www.facebook.com",
                "name": "wd",
                "value": "1280x720",
                "sameSite": "lax",
                "expires": -1
            }
        ]"#;

        let cookies = parse_cookies(json).unwrap();
        assert_eq!(cookies.len(), 3);

        assert_eq!(cookies[0].name, "xs");
        assert!(cookies[0].http_only);
        assert!(cookies[0].secure);
        assert_eq!(cookies[0].same_site, SameSite::None);
        assert_eq!(cookies[0].expires, Some(1767225600.5));

        assert_eq!(cookies[1].path, "/");
        assert_eq!(cookies[1].same_site, SameSite::None);
        assert_eq!(cookies[1].expires, None);

        assert_eq!(cookies[2].same_site, SameSite::Lax);
        assert_eq!(cookies[2].expires, None);
    }

    #[test]
    fn test_rejects_non_array() {
        let result = parse_cookies(r#"{"cookies": []}"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_cookies("/nonexistent/authen.json");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
