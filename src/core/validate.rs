//! Write-path validation of directive sets.
//!
//! Validation collects every violation instead of stopping at the first
//! one, so the persistence adapter can refuse a write with a single
//! message listing all problems. Reads never validate.

use crate::core::directive::{
    Directive, DirectiveSet, FOLLOW, INDEX, KNOWN_DIRECTIVES, NOFOLLOW, NOINDEX,
};
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::LazyLock;

/// Crawlers recognised when no allow-list is configured.
pub const DEFAULT_BOTS: &[&str] = &[
    "googlebot",
    "googlebot-news",
    "googlebot-image",
    "googlebot-video",
    "bingbot",
    "msnbot",
    "slurp",
    "duckduckbot",
    "baiduspider",
    "yandexbot",
    "applebot",
    "otherbot",
];

static NUMERIC_LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?\d+$").expect("numeric limit pattern"));

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}([T ]\d{2}:\d{2}(:\d{2})?(Z|[+-]\d{2}:?\d{2}| ?[A-Z]{2,4})?)?$")
        .expect("iso date pattern")
});

static RFC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]+,? )?\d{1,2}[ -][A-Za-z]{3}[ -]\d{2,4}( \d{2}:\d{2}(:\d{2})?( [A-Z]{2,4}|[+-]\d{4})?)?$")
        .expect("rfc date pattern")
});

/// Capability answering whether a bot token may scope a directive.
pub trait BotAllowList {
    fn allows(&self, bot: &str) -> bool;
}

/// Case-insensitive allow-list of bot tokens.
#[derive(Debug, Clone)]
pub struct KnownBots {
    bots: FxHashSet<String>,
}

impl KnownBots {
    pub fn new<I, S>(bots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            bots: bots
                .into_iter()
                .map(|b| b.as_ref().trim().to_ascii_lowercase())
                .filter(|b| !b.is_empty())
                .collect(),
        }
    }
}

impl Default for KnownBots {
    fn default() -> Self {
        Self::new(DEFAULT_BOTS.iter())
    }
}

impl BotAllowList for KnownBots {
    fn allows(&self, bot: &str) -> bool {
        self.bots.contains(&bot.trim().to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

fn label(directive: &Directive) -> String {
    if directive.bot.is_empty() {
        directive.value.clone()
    } else {
        format!("{}:{}", directive.bot, directive.value)
    }
}

fn check_modification(directive: &Directive, errors: &mut Vec<String>) {
    let value = directive.value.to_ascii_lowercase();
    let modification = directive.modification.as_str();

    if !directive.is_advanced() {
        if !modification.is_empty() {
            errors.push(format!(
                "Directive \"{}\" does not take a modification (got \"{}\")",
                label(directive),
                modification
            ));
        }
        return;
    }

    if modification.is_empty() {
        errors.push(format!("Directive \"{}\" requires a value", label(directive)));
        return;
    }

    let ok = match value.as_str() {
        "max-snippet" | "max-video-preview" => {
            NUMERIC_LIMIT.is_match(modification)
                && modification.parse::<i64>().is_ok_and(|n| n >= -1)
        }
        "max-image-preview" => matches!(
            modification.to_ascii_lowercase().as_str(),
            "none" | "standard" | "large"
        ),
        "unavailable_after" => ISO_DATE.is_match(modification) || RFC_DATE.is_match(modification),
        _ => true,
    };
    if !ok {
        errors.push(format!(
            "Invalid value \"{}\" for directive \"{}\"",
            modification,
            label(directive)
        ));
    }
}

/// Checks a normalized set. An empty set is valid.
pub fn validate(set: &DirectiveSet, bots: &dyn BotAllowList) -> ValidationReport {
    let mut errors = Vec::new();
    let mut seen: FxHashSet<(String, String)> = FxHashSet::default();
    let mut unknown_bots: FxHashSet<String> = FxHashSet::default();

    for directive in set {
        let value = directive.value.to_ascii_lowercase();
        let bot = directive.bot.to_ascii_lowercase();

        if !KNOWN_DIRECTIVES.contains(&value.as_str()) {
            errors.push(format!("Unknown directive \"{}\"", directive.value));
        }

        if !bot.is_empty() && !bots.allows(&bot) && unknown_bots.insert(bot.clone()) {
            errors.push(format!("Unknown bot \"{}\"", directive.bot));
        }

        if !seen.insert((value, bot)) {
            errors.push(format!("Duplicate directive \"{}\"", label(directive)));
        }

        check_modification(directive, &mut errors);
    }

    // Contradictions are only meaningful within one bot scope.
    let mut scopes: Vec<&str> = set.iter().map(|d| d.bot.as_str()).collect();
    scopes.dedup();
    let mut reported: FxHashSet<(String, &str)> = FxHashSet::default();
    for scope in scopes {
        let has = |name: &str| {
            set.iter()
                .any(|d| d.bot.eq_ignore_ascii_case(scope) && d.value.eq_ignore_ascii_case(name))
        };
        for (positive, negative) in [(INDEX, NOINDEX), (FOLLOW, NOFOLLOW)] {
            if has(positive)
                && has(negative)
                && reported.insert((scope.to_ascii_lowercase(), positive))
            {
                let suffix = if scope.is_empty() {
                    String::new()
                } else {
                    format!(" for {}", scope)
                };
                errors.push(format!(
                    "Conflicting directives \"{}\" and \"{}\"{}",
                    positive, negative, suffix
                ));
            }
        }
    }

    ValidationReport::from_errors(errors)
}
