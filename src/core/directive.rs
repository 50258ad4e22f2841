//! Canonical robots directive value objects.
//!
//! A [`Directive`] is a single crawler instruction such as `noindex`,
//! optionally scoped to one bot and optionally carrying a modification
//! (the limit of `max-snippet`, the date of `unavailable_after`, ...).
//! A [`DirectiveSet`] is the ordered collection the resolution engine
//! produces and the formatter renders.

use serde::{Deserialize, Serialize};

pub const INDEX: &str = "index";
pub const NOINDEX: &str = "noindex";
pub const FOLLOW: &str = "follow";
pub const NOFOLLOW: &str = "nofollow";
pub const NOARCHIVE: &str = "noarchive";

/// Directives whose second colon segment is a modification, not a directive.
pub const ADVANCED_DIRECTIVES: [&str; 4] = [
    "max-snippet",
    "max-image-preview",
    "max-video-preview",
    "unavailable_after",
];

/// Directive values crawlers are known to honour.
pub const KNOWN_DIRECTIVES: &[&str] = &[
    "all",
    INDEX,
    NOINDEX,
    FOLLOW,
    NOFOLLOW,
    "none",
    NOARCHIVE,
    "nocache",
    "nosnippet",
    "noimageindex",
    "notranslate",
    "indexifembedded",
    "noodp",
    "noydir",
    "max-snippet",
    "max-image-preview",
    "max-video-preview",
    "unavailable_after",
];

pub fn is_advanced_name(name: &str) -> bool {
    let lowered = name.trim().to_ascii_lowercase();
    ADVANCED_DIRECTIVES.contains(&lowered.as_str())
}

/// A single crawler instruction.
///
/// An empty `bot` applies to every crawler. A directive with both `bot`
/// and `modification` empty is a plain keyword, the only form the legacy
/// storage formats could express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Directive {
    pub value: String,
    #[serde(default)]
    pub bot: String,
    #[serde(default)]
    pub modification: String,
}

impl Directive {
    pub fn new(
        value: impl Into<String>,
        bot: impl Into<String>,
        modification: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            bot: bot.into(),
            modification: modification.into(),
        }
    }

    pub fn keyword(value: impl Into<String>) -> Self {
        Self::new(value, "", "")
    }

    pub fn for_bot(bot: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(value, bot, "")
    }

    pub fn is_keyword(&self) -> bool {
        self.bot.is_empty() && self.modification.is_empty()
    }

    pub fn is_advanced(&self) -> bool {
        is_advanced_name(&self.value)
    }

    /// True for an unscoped `noindex`, the directive that dominates product aggregation.
    pub fn is_noindex(&self) -> bool {
        self.bot.is_empty() && self.value.eq_ignore_ascii_case(NOINDEX)
    }

    /// Trims every field; `None` when nothing is left of the value.
    pub(crate) fn normalized(self) -> Option<Self> {
        let value = self.value.trim();
        if value.is_empty() {
            return None;
        }
        Some(Self {
            value: value.to_string(),
            bot: self.bot.trim().to_string(),
            modification: self.modification.trim().to_string(),
        })
    }
}

/// Ordered set of directives. Insertion order is the render order.
///
/// Entries with an empty value never make it in; duplicate detection is
/// left to the validator so that read paths stay tolerant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectiveSet(Vec<Directive>);

impl DirectiveSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_keywords(keywords: &[&str]) -> Self {
        keywords.iter().map(|k| Directive::keyword(*k)).collect()
    }

    pub fn push(&mut self, directive: Directive) {
        if let Some(directive) = directive.normalized() {
            self.0.push(directive);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directive> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Directive] {
        &self.0
    }

    pub fn contains_noindex(&self) -> bool {
        self.0.iter().any(Directive::is_noindex)
    }

    pub fn into_vec(self) -> Vec<Directive> {
        self.0
    }
}

impl FromIterator<Directive> for DirectiveSet {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        let mut set = DirectiveSet::new();
        for directive in iter {
            set.push(directive);
        }
        set
    }
}

impl<'a> IntoIterator for &'a DirectiveSet {
    type Item = &'a Directive;
    type IntoIter = std::slice::Iter<'a, Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for DirectiveSet {
    type Item = Directive;
    type IntoIter = std::vec::IntoIter<Directive>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
