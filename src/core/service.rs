//! Entry point answering "which robots text applies here?".
//!
//! `RobotsService` ties an [`AttributeStore`] to the pure engine and the
//! module configuration. Every lookup degrades to `None` ("no directive
//! found, use your default") when the module is disabled, when the store
//! fails, or when nothing resolves. Store failures are logged, never
//! propagated to the page renderer.

use crate::core::aggregate::{ProductCategoryRow, resolve_product, resolve_products_across_categories};
use crate::core::config::RobotsConfig;
use crate::core::directive::DirectiveSet;
use crate::core::format::format;
use crate::core::resolve::{CategoryId, ProductId, ResolutionTarget, StoreId, resolve};
use crate::core::store::{AttributeStore, dedup_ids};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::warn;

pub struct RobotsService<S: AttributeStore> {
    store: S,
    config: RobotsConfig,
}

fn non_empty(set: DirectiveSet) -> Option<String> {
    if set.is_empty() { None } else { Some(format(&set)) }
}

impl<S: AttributeStore> RobotsService<S> {
    pub fn new(store: S, config: RobotsConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RobotsConfig {
        &self.config
    }

    /// Resolved set for a category target; `None` when disabled or unreadable.
    pub fn category_directives(
        &self,
        target: ResolutionTarget,
        category_id: CategoryId,
        store_id: StoreId,
    ) -> Option<DirectiveSet> {
        if !self.config.enabled || target.is_product() {
            return None;
        }
        match self.store.category_rows(&[category_id], store_id) {
            Ok(rows) => rows.first().map(|row| resolve(target, row)),
            Err(e) => {
                warn!(category_id, store_id, error = %e, "category robots lookup failed");
                None
            }
        }
    }

    /// Resolved set for one product given its categories in listing order.
    pub fn product_directives(
        &self,
        target: ResolutionTarget,
        category_ids: &[CategoryId],
        store_id: StoreId,
    ) -> Option<DirectiveSet> {
        if !self.config.enabled || !target.is_product() || category_ids.is_empty() {
            return None;
        }
        match self.store.product_rows(category_ids, store_id, target) {
            Ok(rows) => Some(resolve_product(target, rows.iter())),
            Err(e) => {
                warn!(store_id, error = %e, "product robots lookup failed");
                None
            }
        }
    }

    pub fn category_meta(&self, category_id: CategoryId, store_id: StoreId) -> Option<String> {
        self.category_directives(ResolutionTarget::CategoryMeta, category_id, store_id)
            .and_then(non_empty)
    }

    pub fn category_header(&self, category_id: CategoryId, store_id: StoreId) -> Option<String> {
        self.category_directives(ResolutionTarget::CategoryHeader, category_id, store_id)
            .and_then(non_empty)
    }

    pub fn product_meta(&self, category_ids: &[CategoryId], store_id: StoreId) -> Option<String> {
        self.product_directives(ResolutionTarget::ProductMeta, category_ids, store_id)
            .and_then(non_empty)
    }

    pub fn product_header(&self, category_ids: &[CategoryId], store_id: StoreId) -> Option<String> {
        self.product_directives(ResolutionTarget::ProductHeader, category_ids, store_id)
            .and_then(non_empty)
    }

    /// Batch variant of [`RobotsService::product_meta`] / [`RobotsService::product_header`]
    /// reading all categories of all products with a single store call.
    pub fn products(
        &self,
        target: ResolutionTarget,
        products: &[(ProductId, Vec<CategoryId>)],
        store_id: StoreId,
    ) -> BTreeMap<ProductId, Option<String>> {
        let none = || -> BTreeMap<ProductId, Option<String>> {
            products.iter().map(|(id, _)| (*id, None)).collect()
        };
        if !self.config.enabled || !target.is_product() {
            return none();
        }

        let all_ids: Vec<CategoryId> =
            dedup_ids(&products.iter().flat_map(|(_, c)| c.iter().copied()).collect::<Vec<_>>());
        let rows = match self.store.product_rows(&all_ids, store_id, target) {
            Ok(rows) => rows,
            Err(e) => {
                warn!(store_id, products = products.len(), error = %e, "batch robots lookup failed");
                return none();
            }
        };
        let by_category: FxHashMap<CategoryId, _> =
            rows.into_iter().map(|row| (row.category_id, row)).collect();

        let tagged: Vec<ProductCategoryRow> = products
            .iter()
            .flat_map(|(product_id, categories)| {
                dedup_ids(categories)
                    .into_iter()
                    .filter_map(|c| by_category.get(&c))
                    .map(|row| ProductCategoryRow::new(*product_id, row.clone()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut resolved = resolve_products_across_categories(target, &tagged);
        products
            .iter()
            .map(|(id, _)| (*id, resolved.remove(id).and_then(non_empty)))
            .collect()
    }

    /// Applies the configured global default to a lookup result.
    pub fn or_default(&self, target: ResolutionTarget, resolved: Option<String>) -> Option<String> {
        resolved.or_else(|| match target {
            ResolutionTarget::CategoryMeta | ResolutionTarget::ProductMeta => {
                self.config.default_meta.clone()
            }
            ResolutionTarget::CategoryHeader | ResolutionTarget::ProductHeader => {
                self.config.default_header.clone()
            }
        })
    }
}
