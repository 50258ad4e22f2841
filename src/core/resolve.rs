//! Per-category directive resolution.
//!
//! Each [`ResolutionTarget`] reads its own source attribute and toggles.
//! The product targets can defer to the category targets, and the
//! category header can defer to the category meta:
//!
//! ```text
//! ProductMeta   --(stored -1)-----------------------> CategoryMeta
//! ProductHeader --(use_category_x_robots_for_products)--> CategoryHeader
//! CategoryHeader --(use_meta_for_x_robots)-----------> CategoryMeta
//! ```
//!
//! Resolution is a pure function of the row and the target. Sentinel codes
//! never leave this module: `USE_DEFAULT` becomes the empty set and
//! `USE_CATEGORY_ROBOTS` is replaced by the category's own directives.

use crate::core::codec::{self, RawValue, Sentinel};
use crate::core::directive::DirectiveSet;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

pub type CategoryId = i64;
pub type ProductId = i64;
pub type StoreId = i64;

/// Scope id of the default (fallback) layer.
pub const DEFAULT_STORE_ID: StoreId = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionTarget {
    CategoryMeta,
    CategoryHeader,
    ProductMeta,
    ProductHeader,
}

impl ResolutionTarget {
    pub const ALL: [ResolutionTarget; 4] = [
        ResolutionTarget::CategoryMeta,
        ResolutionTarget::CategoryHeader,
        ResolutionTarget::ProductMeta,
        ResolutionTarget::ProductHeader,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionTarget::CategoryMeta => "category-meta",
            ResolutionTarget::CategoryHeader => "category-header",
            ResolutionTarget::ProductMeta => "product-meta",
            ResolutionTarget::ProductHeader => "product-header",
        }
    }

    pub fn is_product(self) -> bool {
        matches!(
            self,
            ResolutionTarget::ProductMeta | ResolutionTarget::ProductHeader
        )
    }
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResolutionTarget::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| {
                format!(
                    "unknown target '{}' (expected category-meta, category-header, product-meta or product-header)",
                    s
                )
            })
    }
}

/// One category's attribute values, already collapsed to a single
/// effective value per store scope by the attribute store.
///
/// Toggles are `None` when unset; the accessor methods apply the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAttributeRow {
    pub category_id: CategoryId,
    pub robots: RawValue,
    pub product_robots: RawValue,
    pub x_robots: RawValue,
    pub product_x_robots: RawValue,
    pub apply_robots_to_products: Option<bool>,
    pub apply_x_robots_to_products: Option<bool>,
    pub use_meta_for_x_robots: Option<bool>,
    pub use_category_robots_for_products: Option<bool>,
    pub use_category_x_robots_for_products: Option<bool>,
}

impl RawAttributeRow {
    pub fn new(category_id: CategoryId) -> Self {
        Self {
            category_id,
            ..Self::default()
        }
    }

    pub fn applies_robots_to_products(&self) -> bool {
        self.apply_robots_to_products.unwrap_or(false)
    }

    pub fn applies_x_robots_to_products(&self) -> bool {
        self.apply_x_robots_to_products.unwrap_or(false)
    }

    pub fn uses_meta_for_x_robots(&self) -> bool {
        self.use_meta_for_x_robots.unwrap_or(true)
    }

    pub fn uses_category_robots_for_products(&self) -> bool {
        self.use_category_robots_for_products.unwrap_or(true)
    }

    pub fn uses_category_x_robots_for_products(&self) -> bool {
        self.use_category_x_robots_for_products.unwrap_or(true)
    }

    /// Whether this category takes part in product resolution for `target`.
    pub fn applies_to_products(&self, target: ResolutionTarget) -> bool {
        match target {
            ResolutionTarget::ProductMeta => self.applies_robots_to_products(),
            ResolutionTarget::ProductHeader => self.applies_x_robots_to_products(),
            _ => false,
        }
    }
}

/// Decodes a directive attribute, erasing both sentinels.
fn decode_own(raw: &RawValue) -> DirectiveSet {
    if raw.is_blank() || raw.sentinel().is_some() {
        return DirectiveSet::new();
    }
    codec::decode(raw)
}

fn category_meta(row: &RawAttributeRow) -> DirectiveSet {
    decode_own(&row.robots)
}

fn category_header(row: &RawAttributeRow) -> DirectiveSet {
    if row.uses_meta_for_x_robots() {
        trace!(category_id = row.category_id, "header mirrors meta");
        return category_meta(row);
    }
    decode_own(&row.x_robots)
}

fn product_meta(row: &RawAttributeRow) -> DirectiveSet {
    if !row.applies_robots_to_products() {
        return DirectiveSet::new();
    }
    match row.product_robots.sentinel() {
        Some(Sentinel::UseCategoryRobots) => {
            trace!(category_id = row.category_id, "product meta inherits category");
            category_meta(row)
        }
        Some(Sentinel::UseDefault) => DirectiveSet::new(),
        None => decode_own(&row.product_robots),
    }
}

fn product_header(row: &RawAttributeRow) -> DirectiveSet {
    if !row.applies_x_robots_to_products() {
        return DirectiveSet::new();
    }
    if row.uses_category_x_robots_for_products() {
        trace!(category_id = row.category_id, "product header inherits category header");
        return category_header(row);
    }
    decode_own(&row.product_x_robots)
}

/// Effective directives `row` contributes to `target`. An empty result
/// means "no override"; the caller applies its global default.
pub fn resolve(target: ResolutionTarget, row: &RawAttributeRow) -> DirectiveSet {
    match target {
        ResolutionTarget::CategoryMeta => category_meta(row),
        ResolutionTarget::CategoryHeader => category_header(row),
        ResolutionTarget::ProductMeta => product_meta(row),
        ResolutionTarget::ProductHeader => product_header(row),
    }
}
