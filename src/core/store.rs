//! Attribute store abstraction.
//!
//! The store hands the resolution engine one [`RawAttributeRow`] per
//! category with store-scope fallback already applied: the value of the
//! requested store when present, the default scope (0) otherwise.
//! Resolution itself never touches storage.

use crate::core::codec::RawValue;
use crate::core::error::RobotsError;
use crate::core::resolve::{CategoryId, DEFAULT_STORE_ID, RawAttributeRow, ResolutionTarget, StoreId};
use crate::core::schemas::{self, BackendType};
use rusqlite::Connection;
use rustc_hash::{FxHashMap, FxHashSet};

/// Batch read contract the resolution engine relies on.
pub trait AttributeStore {
    /// One row per known category, in the order of `category_ids`.
    fn category_rows(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
    ) -> Result<Vec<RawAttributeRow>, RobotsError>;

    /// Like [`AttributeStore::category_rows`], restricted to categories whose
    /// apply-to-products toggle for `target` is on.
    fn product_rows(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
        target: ResolutionTarget,
    ) -> Result<Vec<RawAttributeRow>, RobotsError> {
        Ok(self
            .category_rows(category_ids, store_id)?
            .into_iter()
            .filter(|row| row.applies_to_products(target))
            .collect())
    }
}

/// First-seen order, duplicates dropped.
pub(crate) fn dedup_ids(category_ids: &[CategoryId]) -> Vec<CategoryId> {
    let mut seen = FxHashSet::default();
    category_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

/// Copies `value` into the row field named by `code`.
pub(crate) fn assign(row: &mut RawAttributeRow, code: &str, value: RawValue) {
    match code {
        schemas::ROBOTS_META_TAG => row.robots = value,
        schemas::PRODUCT_ROBOTS_META_TAG => row.product_robots = value,
        schemas::X_ROBOTS_HEADER => row.x_robots = value,
        schemas::PRODUCT_X_ROBOTS_HEADER => row.product_x_robots = value,
        schemas::APPLY_ROBOTS_TO_PRODUCTS => row.apply_robots_to_products = value.as_flag(),
        schemas::APPLY_X_ROBOTS_TO_PRODUCTS => row.apply_x_robots_to_products = value.as_flag(),
        schemas::USE_META_FOR_X_ROBOTS => row.use_meta_for_x_robots = value.as_flag(),
        schemas::USE_CATEGORY_ROBOTS_FOR_PRODUCTS => {
            row.use_category_robots_for_products = value.as_flag()
        }
        schemas::USE_CATEGORY_X_ROBOTS_FOR_PRODUCTS => {
            row.use_category_x_robots_for_products = value.as_flag()
        }
        _ => {}
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub id: i64,
    pub backend: BackendType,
    pub default_value: Option<String>,
}

/// Attribute code to storage id lookup, read once from `eav_attribute`.
#[derive(Debug, Clone, Default)]
pub struct AttributeIds {
    by_code: FxHashMap<String, AttributeInfo>,
}

impl AttributeIds {
    pub fn load(conn: &Connection) -> Result<Self, RobotsError> {
        let mut stmt = conn.prepare(
            "SELECT attribute_id, attribute_code, backend_type, default_value FROM eav_attribute",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        let mut by_code = FxHashMap::default();
        for r in rows {
            let (id, code, backend, default_value) = r?;
            let backend = BackendType::parse(&backend).ok_or_else(|| {
                RobotsError::ConfigError(format!(
                    "attribute '{}' has unsupported backend type '{}'",
                    code, backend
                ))
            })?;
            by_code.insert(
                code,
                AttributeInfo {
                    id,
                    backend,
                    default_value,
                },
            );
        }
        Ok(Self { by_code })
    }

    pub fn get(&self, code: &str) -> Result<&AttributeInfo, RobotsError> {
        self.by_code
            .get(code)
            .ok_or_else(|| RobotsError::NotFound(format!("attribute '{}'", code)))
    }

    pub fn id(&self, code: &str) -> Result<i64, RobotsError> {
        Ok(self.get(code)?.id)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// In-process store with the same scope fallback as the SQLite store.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttributeStore {
    values: FxHashMap<(CategoryId, StoreId, &'static str), RawValue>,
    categories: FxHashSet<CategoryId>,
}

impl MemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` for `code`; unknown attribute codes are a `NotFound` error.
    pub fn set(
        &mut self,
        category_id: CategoryId,
        store_id: StoreId,
        code: &str,
        value: RawValue,
    ) -> Result<(), RobotsError> {
        let def = schemas::attribute_def(code)
            .ok_or_else(|| RobotsError::NotFound(format!("attribute '{}'", code)))?;
        self.categories.insert(category_id);
        if value.is_blank() {
            self.values.remove(&(category_id, store_id, def.code));
        } else {
            self.values.insert((category_id, store_id, def.code), value);
        }
        Ok(())
    }

    pub fn add_category(&mut self, category_id: CategoryId) {
        self.categories.insert(category_id);
    }

    fn scoped(&self, category_id: CategoryId, store_id: StoreId, code: &'static str) -> RawValue {
        self.values
            .get(&(category_id, store_id, code))
            .or_else(|| self.values.get(&(category_id, DEFAULT_STORE_ID, code)))
            .cloned()
            .unwrap_or_default()
    }
}

impl AttributeStore for MemoryAttributeStore {
    fn category_rows(
        &self,
        category_ids: &[CategoryId],
        store_id: StoreId,
    ) -> Result<Vec<RawAttributeRow>, RobotsError> {
        Ok(dedup_ids(category_ids)
            .into_iter()
            .filter(|id| self.categories.contains(id))
            .map(|id| {
                let mut row = RawAttributeRow::new(id);
                for def in schemas::ATTRIBUTES.iter() {
                    assign(&mut row, def.code, self.scoped(id, store_id, def.code));
                }
                row
            })
            .collect())
    }
}
