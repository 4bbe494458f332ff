//! Locale negotiation and embedded message bundles.
//!
//! Bundles are JSON objects compiled into the binary. Lookups take dotted
//! keys (`feed.title`) and fall back to the default locale, then to the key.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde_json::{Map, Value};

/// Name of the cookie remembering the chosen locale.
pub const LOCALE_COOKIE: &str = "locale";

/// Supported interface locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    /// All supported locales, default first.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Zh];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }

    /// Match a BCP 47 tag on its primary language subtag (`zh-CN` → `zh`).
    pub fn from_tag(tag: &str) -> Option<Self> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|locale| locale.as_str() == primary)
    }

    /// Parsed message bundle for this locale.
    pub fn messages(self) -> &'static Map<String, Value> {
        match self {
            Self::En => &EN,
            Self::Zh => &ZH,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a tag names no supported locale.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}'")]
pub struct UnsupportedLocale(pub String);

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| UnsupportedLocale(s.to_owned()))
    }
}

fn parse_bundle(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::error!("embedded message bundle is not a JSON object");
            Map::new()
        }
    }
}

static EN: LazyLock<Map<String, Value>> =
    LazyLock::new(|| parse_bundle(include_str!("../../messages/en.json")));
static ZH: LazyLock<Map<String, Value>> =
    LazyLock::new(|| parse_bundle(include_str!("../../messages/zh.json")));

/// Pick a locale from the request signals in priority order: explicit query
/// parameter, `locale` cookie, `Accept-Language`, then the default.
///
/// # Examples
/// ```
/// use codetok::domain::{negotiate_locale, Locale};
///
/// assert_eq!(negotiate_locale(None, None, Some("zh-CN,en;q=0.8")), Locale::Zh);
/// assert_eq!(negotiate_locale(Some("en"), Some("zh"), None), Locale::En);
/// ```
pub fn negotiate_locale(
    query: Option<&str>,
    cookie: Option<&str>,
    accept_language: Option<&str>,
) -> Locale {
    query
        .and_then(Locale::from_tag)
        .or_else(|| cookie.and_then(Locale::from_tag))
        .or_else(|| accept_language.and_then(from_accept_language))
        .unwrap_or_default()
}

/// Choose the best supported locale from an `Accept-Language` header.
///
/// Entries are ranked by their `q` weight; ties keep header order.
pub fn from_accept_language(header: &str) -> Option<Locale> {
    let mut ranked: Vec<(f32, usize, Locale)> = header
        .split(',')
        .enumerate()
        .filter_map(|(index, entry)| {
            let mut parts = entry.split(';');
            let locale = Locale::from_tag(parts.next()?)?;
            let weight = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (weight > 0.0).then_some((weight, index, locale))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.first().map(|(_, _, locale)| *locale)
}

/// Resolve a dotted key in `locale`, falling back to the default locale and
/// finally to the key itself.
pub fn translate(locale: Locale, key: &str) -> String {
    lookup(locale.messages(), key)
        .or_else(|| lookup(Locale::default().messages(), key))
        .map_or_else(|| key.to_owned(), str::to_owned)
}

fn lookup<'a>(bundle: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    let mut segments = key.split('.');
    let mut current = bundle.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    current.as_str()
}

/// Merge the default bundle under `locale` so clients receive every key.
pub fn messages_with_fallback(locale: Locale) -> Value {
    let mut merged = Value::Object(Locale::default().messages().clone());
    if locale != Locale::default() {
        merge(&mut merged, &Value::Object(locale.messages().clone()));
    }
    merged
}

fn merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Accept only same-site relative redirect targets; anything else yields `/`.
pub fn safe_redirect(target: Option<&str>) -> String {
    match target.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_owned()
        }
        _ => "/".to_owned(),
    }
}
