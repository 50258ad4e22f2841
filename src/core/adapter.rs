//! Persistence hooks for directive attributes.
//!
//! `on_write` runs before a value is saved and `on_read` after it is
//! loaded. Writes are validated and always stored in the canonical JSON
//! form; a rejected write stores nothing at all. Both sentinels are kept
//! as written: at a store scope they mask the default scope's value.

use crate::core::codec::{self, RawValue, Sentinel, USE_CATEGORY_ROBOTS, USE_DEFAULT};
use crate::core::directive::DirectiveSet;
use crate::core::error::RobotsError;
use crate::core::schemas;
use crate::core::validate::{BotAllowList, validate};

/// Storage value to persist for `raw` on the directive attribute
/// `attribute`; `None` means delete the stored value.
pub fn on_write(
    raw: &RawValue,
    attribute: &str,
    bots: &dyn BotAllowList,
) -> Result<Option<String>, RobotsError> {
    if raw.is_blank() {
        return Ok(None);
    }
    match raw.sentinel() {
        Some(Sentinel::UseDefault) => return Ok(Some(USE_DEFAULT.to_string())),
        Some(Sentinel::UseCategoryRobots) if attribute == schemas::PRODUCT_ROBOTS_META_TAG => {
            return Ok(Some(USE_CATEGORY_ROBOTS.to_string()));
        }
        Some(Sentinel::UseCategoryRobots) => {
            return Err(RobotsError::InvalidDirectives(vec![format!(
                "\"{}\" (use category robots) only applies to {}, not {}",
                USE_CATEGORY_ROBOTS,
                schemas::PRODUCT_ROBOTS_META_TAG,
                attribute
            )]));
        }
        None => {}
    }

    let set = codec::decode(raw);
    let report = validate(&set, bots);
    if !report.valid {
        return Err(RobotsError::InvalidDirectives(report.errors));
    }
    Ok(codec::encode(&set))
}

pub fn on_read(stored: Option<&str>) -> DirectiveSet {
    match stored {
        Some(text) => codec::decode(&RawValue::text(text)),
        None => DirectiveSet::new(),
    }
}
