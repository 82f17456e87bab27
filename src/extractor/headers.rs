//! Security and freshness signals read from HTTP response headers.

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use url::Url;

use crate::domain::models::{SecurityHeaderFlags, SslGrade};

/// Freshness assumed when `Last-Modified` is missing or unparsable.
pub const DEFAULT_FRESHNESS_DAYS: u32 = 30;

/// Response headers with lower-cased names, repeated headers kept in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    entries: Vec<(String, String)>,
}

impl ResponseHeaders {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
        }
    }

    /// Headers reported by the browser as a JSON object. Multi-valued headers
    /// arrive newline-joined and are split back apart.
    pub fn from_json_object(value: &serde_json::Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };
        let mut entries = Vec::new();
        for (name, raw) in object {
            let Some(raw) = raw.as_str() else { continue };
            for line in raw.split('\n').filter(|l| !l.is_empty()) {
                entries.push((name.to_ascii_lowercase(), line.to_string()));
            }
        }
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let name = name.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(move |(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

impl From<&HeaderMap> for ResponseHeaders {
    fn from(map: &HeaderMap) -> Self {
        Self::from_pairs(map.iter().filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        }))
    }
}

pub struct HeaderExtractor;

impl HeaderExtractor {
    pub fn hsts_present(headers: &ResponseHeaders) -> bool {
        headers.contains("strict-transport-security")
    }

    pub fn csp_present(headers: &ResponseHeaders) -> bool {
        headers.contains("content-security-policy")
    }

    pub fn security_header_flags(headers: &ResponseHeaders) -> SecurityHeaderFlags {
        SecurityHeaderFlags {
            x_frame_options: headers.contains("x-frame-options"),
            x_content_type_options: headers.contains("x-content-type-options"),
            referrer_policy: headers.contains("referrer-policy"),
            permissions_policy: headers.contains("permissions-policy"),
        }
    }

    /// Percent of `Set-Cookie` headers carrying the `Secure` attribute. 100 when none are set.
    pub fn cookies_secure_pct(headers: &ResponseHeaders) -> u8 {
        let mut total = 0u32;
        let mut secure = 0u32;
        for cookie in headers.get_all("set-cookie") {
            total += 1;
            let is_secure = cookie
                .split(';')
                .skip(1)
                .any(|attr| attr.trim().eq_ignore_ascii_case("secure"));
            if is_secure {
                secure += 1;
            }
        }
        if total == 0 {
            return 100;
        }
        (100.0 * secure as f64 / total as f64).round() as u8
    }

    /// Whole days since `Last-Modified`. Future dates count as 0.
    pub fn content_freshness_days(headers: &ResponseHeaders, now: DateTime<Utc>) -> u32 {
        let Some(raw) = headers.get("last-modified") else {
            return DEFAULT_FRESHNESS_DAYS;
        };
        match DateTime::parse_from_rfc2822(raw.trim()) {
            Ok(modified) => {
                let days = (now - modified.with_timezone(&Utc)).num_days();
                days.clamp(0, u32::MAX as i64) as u32
            }
            Err(e) => {
                log::debug!("[EXTRACT] Unparsable Last-Modified '{}': {}", raw, e);
                DEFAULT_FRESHNESS_DAYS
            }
        }
    }

    /// A when served over https with readable headers, B when https but the
    /// header fetch failed, F without https.
    pub fn ssl_grade(url: &Url, headers_fetched: bool) -> SslGrade {
        match (url.scheme() == "https", headers_fetched) {
            (true, true) => SslGrade::A,
            (true, false) => SslGrade::B,
            (false, _) => SslGrade::F,
        }
    }
}
