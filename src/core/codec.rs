//! Conversion between stored attribute values and [`DirectiveSet`].
//!
//! Four on-disk shapes are readable, detected in this order:
//!
//! 1. an already structured sequence (form submissions, decoded JSON),
//! 2. JSON text holding an array of `{value, bot, modification}` objects
//!    or of plain keyword strings,
//! 3. a legacy integer code (see [`LEGACY_CODES`]),
//! 4. a legacy colon-delimited string such as `googlebot:noindex`.
//!
//! Decoding never fails: anything unrecognised becomes the empty set so
//! that storage drift cannot break page rendering. Encoding only ever
//! produces the canonical structured JSON array.

use crate::core::directive::{Directive, DirectiveSet, is_advanced_name};
use serde_json::Value as JsonValue;
use tracing::debug;

/// No override; the caller falls back to its global default.
pub const USE_DEFAULT: i64 = 0;
/// Product directive inherits the category's own directive.
pub const USE_CATEGORY_ROBOTS: i64 = -1;

/// Legacy integer codes and the keyword sets they stand for.
pub const LEGACY_CODES: [(i64, &[&str]); 8] = [
    (1, &["noindex", "nofollow"]),
    (2, &["noindex", "follow"]),
    (3, &["index", "nofollow"]),
    (4, &["index", "follow"]),
    (5, &["noindex", "nofollow", "noarchive"]),
    (6, &["noindex", "follow", "noarchive"]),
    (7, &["index", "nofollow", "noarchive"]),
    (8, &["index", "follow", "noarchive"]),
];

pub fn legacy_keywords(code: i64) -> Option<&'static [&'static str]> {
    LEGACY_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, keywords)| *keywords)
}

/// Reserved integer codes that are never part of a resolved set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    UseDefault,
    UseCategoryRobots,
}

/// One element of an already structured sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEntry {
    Keyword(String),
    Triple {
        value: Option<String>,
        bot: Option<String>,
        modification: Option<String>,
    },
}

impl RawEntry {
    fn into_directive(self) -> Directive {
        match self {
            RawEntry::Keyword(value) => Directive::keyword(value),
            RawEntry::Triple {
                value,
                bot,
                modification,
            } => Directive::new(
                value.unwrap_or_default(),
                bot.unwrap_or_default(),
                modification.unwrap_or_default(),
            ),
        }
    }
}

/// An attribute value as handed over by storage or by a form submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RawValue {
    #[default]
    Absent,
    Int(i64),
    Text(String),
    Entries(Vec<RawEntry>),
}

impl RawValue {
    pub fn text(value: impl Into<String>) -> Self {
        RawValue::Text(value.into())
    }

    /// Absent, `null`, blank text and empty arrays all mean "not set".
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Absent => true,
            RawValue::Int(_) => false,
            RawValue::Text(s) => {
                let s = s.trim();
                s.is_empty() || s == "null" || s == "[]" || s == "\"\""
            }
            RawValue::Entries(entries) => entries.is_empty(),
        }
    }

    pub fn sentinel(&self) -> Option<Sentinel> {
        let code = match self {
            RawValue::Int(code) => *code,
            RawValue::Text(s) => parse_integral(s)?,
            _ => return None,
        };
        match code {
            USE_DEFAULT => Some(Sentinel::UseDefault),
            USE_CATEGORY_ROBOTS => Some(Sentinel::UseCategoryRobots),
            _ => None,
        }
    }

    /// Boolean toggle reading; `None` when unset or not a recognised
    /// boolean spelling.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            RawValue::Int(n) => Some(*n != 0),
            RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" => Some(true),
                "false" | "no" | "off" => Some(false),
                other => parse_integral(other).map(|n| n != 0),
            },
            RawValue::Absent => None,
            RawValue::Entries(entries) => Some(!entries.is_empty()),
        }
    }
}

impl From<Option<String>> for RawValue {
    fn from(value: Option<String>) -> Self {
        value.map(RawValue::Text).unwrap_or(RawValue::Absent)
    }
}

fn parse_integral(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn decode(raw: &RawValue) -> DirectiveSet {
    match raw {
        RawValue::Absent => DirectiveSet::new(),
        RawValue::Entries(entries) => entries
            .iter()
            .cloned()
            .map(RawEntry::into_directive)
            .collect(),
        RawValue::Int(code) => decode_code(*code),
        RawValue::Text(text) => decode_text(text),
    }
}

pub fn decode_code(code: i64) -> DirectiveSet {
    match legacy_keywords(code) {
        Some(keywords) => DirectiveSet::from_keywords(keywords),
        None => {
            if code != USE_DEFAULT && code != USE_CATEGORY_ROBOTS {
                debug!(code, "unknown legacy robots code");
            }
            DirectiveSet::new()
        }
    }
}

fn decode_text(text: &str) -> DirectiveSet {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return DirectiveSet::new();
    }

    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(JsonValue::Array(items)) => decode_json_items(items),
        Ok(JsonValue::Number(n)) => match n.as_i64().or_else(|| parse_integral(&n.to_string())) {
            Some(code) => decode_code(code),
            None => DirectiveSet::new(),
        },
        Ok(JsonValue::String(inner)) => decode_legacy_string(&inner),
        Ok(JsonValue::Null) => DirectiveSet::new(),
        Ok(other) => {
            debug!(value = %other, "unsupported JSON shape for robots directives");
            DirectiveSet::new()
        }
        Err(_) => match parse_integral(trimmed) {
            Some(code) => decode_code(code),
            None if trimmed.starts_with(['[', '{', '"']) => {
                debug!(value = trimmed, "unparseable robots directive JSON");
                DirectiveSet::new()
            }
            None => decode_legacy_string(trimmed),
        },
    }
}

fn json_field(object: &serde_json::Map<String, JsonValue>, key: &str) -> Option<String> {
    match object.get(key)? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn decode_json_items(items: Vec<JsonValue>) -> DirectiveSet {
    items
        .into_iter()
        .filter_map(|item| match item {
            JsonValue::String(keyword) => Some(RawEntry::Keyword(keyword)),
            JsonValue::Object(object) => Some(RawEntry::Triple {
                value: json_field(&object, "value"),
                bot: json_field(&object, "bot"),
                modification: json_field(&object, "modification"),
            }),
            _ => None,
        })
        .map(RawEntry::into_directive)
        .collect()
}

/// Parses one `bot:value:modification`-style legacy string.
pub fn decode_legacy_string(text: &str) -> DirectiveSet {
    let parts: Vec<&str> = text.trim().split(':').map(str::trim).collect();
    let directive = match parts.as_slice() {
        [] => return DirectiveSet::new(),
        [value] => Directive::keyword(*value),
        [first, second] if is_advanced_name(first) => Directive::new(*first, "", *second),
        [bot, value] => Directive::for_bot(*bot, *value),
        [bot, value, rest @ ..] => Directive::new(*value, *bot, rest.join(":")),
    };
    std::iter::once(directive).collect()
}

/// Canonical storage form; `None` stands for "no value stored".
pub fn encode(set: &DirectiveSet) -> Option<String> {
    let items: Vec<JsonValue> = set
        .iter()
        .filter(|d| !d.value.trim().is_empty())
        .map(|d| {
            serde_json::json!({
                "value": d.value.trim(),
                "bot": d.bot.trim(),
                "modification": d.modification.trim(),
            })
        })
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(JsonValue::Array(items).to_string())
    }
}
