//! Rendering of directive sets for the robots meta tag and the
//! `X-Robots-Tag` header. Both use the same text.
//!
//! Each directive renders as `[bot:]value[:modification]`, entries are
//! joined with `", "`. This is the syntax crawlers read and the syntax
//! the legacy string decoder accepts. An advanced directive with no bot
//! therefore renders with a single colon (`max-snippet:20`), never as
//! `max-snippet::20` with an empty bot slot.

use crate::core::directive::{Directive, DirectiveSet};

pub fn format_directive(directive: &Directive) -> String {
    let mut out = String::new();
    if !directive.bot.is_empty() {
        out.push_str(&directive.bot);
        out.push(':');
    }
    out.push_str(&directive.value);
    if !directive.modification.is_empty() {
        out.push(':');
        out.push_str(&directive.modification);
    }
    out
}

/// Empty set renders as the empty string.
pub fn format(set: &DirectiveSet) -> String {
    set.iter()
        .map(format_directive)
        .collect::<Vec<_>>()
        .join(", ")
}
