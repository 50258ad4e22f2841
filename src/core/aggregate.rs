//! Merging per-category resolutions into one result per product.
//!
//! A product's categories are inspected in the order the caller supplies
//! them. The first category resolving to an unscoped `noindex` wins
//! outright and stops the scan. Without any `noindex`, the first
//! non-empty set wins. Category order therefore decides between competing
//! permissive settings; no notion of "most specific category" applies.
//!
//! Products are evaluated in parallel, but never the rows of one product:
//! the short-circuit depends on their order.

use crate::core::directive::DirectiveSet;
use crate::core::resolve::{ProductId, RawAttributeRow, ResolutionTarget, resolve};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::debug;

/// A category row tagged with the product it was fetched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductCategoryRow {
    pub product_id: ProductId,
    pub row: RawAttributeRow,
}

impl ProductCategoryRow {
    pub fn new(product_id: ProductId, row: RawAttributeRow) -> Self {
        Self { product_id, row }
    }
}

/// Resolves one product from its category rows, in iteration order.
pub fn resolve_product<'a, I>(target: ResolutionTarget, rows: I) -> DirectiveSet
where
    I: IntoIterator<Item = &'a RawAttributeRow>,
{
    let mut first_found: Option<DirectiveSet> = None;
    for row in rows {
        let set = resolve(target, row);
        if set.contains_noindex() {
            debug!(
                category_id = row.category_id,
                %target,
                "noindex short-circuits product resolution"
            );
            return set;
        }
        if first_found.is_none() && !set.is_empty() {
            first_found = Some(set);
        }
    }
    first_found.unwrap_or_default()
}

/// Groups `rows` by product and resolves each product.
///
/// Every product that appears in `rows` gets an entry, empty when none of
/// its categories contributed anything.
pub fn resolve_products_across_categories(
    target: ResolutionTarget,
    rows: &[ProductCategoryRow],
) -> BTreeMap<ProductId, DirectiveSet> {
    let mut order: Vec<ProductId> = Vec::new();
    let mut groups: FxHashMap<ProductId, Vec<&RawAttributeRow>> = FxHashMap::default();
    for entry in rows {
        groups
            .entry(entry.product_id)
            .or_insert_with(|| {
                order.push(entry.product_id);
                Vec::new()
            })
            .push(&entry.row);
    }

    let grouped: Vec<(ProductId, Vec<&RawAttributeRow>)> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id).map(|g| (id, g)))
        .collect();

    grouped
        .into_par_iter()
        .map(|(product_id, product_rows)| {
            (
                product_id,
                resolve_product(target, product_rows.into_iter()),
            )
        })
        .collect()
}
