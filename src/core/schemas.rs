//! Database schema and attribute catalogue for category robots storage.
//!
//! Values live in EAV tables keyed by `(attribute_id, store_id, entity_id)`.
//! `store_id = 0` is the default scope every store falls back to.
//! Directive attributes were historically stored as integer codes in
//! `category_entity_int`; after migration they live as JSON text in
//! `category_entity_text`.

pub const EAV_ATTRIBUTE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS eav_attribute (
        attribute_id INTEGER PRIMARY KEY AUTOINCREMENT,
        attribute_code TEXT NOT NULL UNIQUE,
        backend_type TEXT NOT NULL,
        default_value TEXT
    )
";

pub const CATEGORY_ENTITY_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS category_entity (
        entity_id INTEGER PRIMARY KEY
    )
";

pub const CATEGORY_ENTITY_INT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS category_entity_int (
        attribute_id INTEGER NOT NULL,
        store_id INTEGER NOT NULL DEFAULT 0,
        entity_id INTEGER NOT NULL,
        value INTEGER,
        PRIMARY KEY (attribute_id, store_id, entity_id),
        FOREIGN KEY(attribute_id) REFERENCES eav_attribute(attribute_id),
        FOREIGN KEY(entity_id) REFERENCES category_entity(entity_id)
    )
";

pub const CATEGORY_ENTITY_TEXT_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS category_entity_text (
        attribute_id INTEGER NOT NULL,
        store_id INTEGER NOT NULL DEFAULT 0,
        entity_id INTEGER NOT NULL,
        value TEXT,
        PRIMARY KEY (attribute_id, store_id, entity_id),
        FOREIGN KEY(attribute_id) REFERENCES eav_attribute(attribute_id),
        FOREIGN KEY(entity_id) REFERENCES category_entity(entity_id)
    )
";

pub const MIGRATIONS_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS seo_robots_migrations (
        id TEXT PRIMARY KEY,
        description TEXT NOT NULL,
        applied_at TEXT NOT NULL
    )
";

pub const ALL_SCHEMAS: [&str; 5] = [
    EAV_ATTRIBUTE_SCHEMA,
    CATEGORY_ENTITY_SCHEMA,
    CATEGORY_ENTITY_INT_SCHEMA,
    CATEGORY_ENTITY_TEXT_SCHEMA,
    MIGRATIONS_SCHEMA,
];

// Attribute codes.
pub const ROBOTS_META_TAG: &str = "robots_meta_tag";
pub const PRODUCT_ROBOTS_META_TAG: &str = "product_robots_meta_tag";
pub const X_ROBOTS_HEADER: &str = "x_robots_header";
pub const PRODUCT_X_ROBOTS_HEADER: &str = "product_x_robots_header";
pub const APPLY_ROBOTS_TO_PRODUCTS: &str = "apply_robots_to_products";
pub const APPLY_X_ROBOTS_TO_PRODUCTS: &str = "apply_x_robots_to_products";
pub const USE_META_FOR_X_ROBOTS: &str = "use_meta_for_x_robots";
pub const USE_CATEGORY_ROBOTS_FOR_PRODUCTS: &str = "use_category_robots_for_products";
pub const USE_CATEGORY_X_ROBOTS_FOR_PRODUCTS: &str = "use_category_x_robots_for_products";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendType {
    Int,
    Text,
}

impl BackendType {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendType::Int => "int",
            BackendType::Text => "text",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "int" => Some(BackendType::Int),
            "text" => Some(BackendType::Text),
            _ => None,
        }
    }

    pub fn value_table(self) -> &'static str {
        match self {
            BackendType::Int => "category_entity_int",
            BackendType::Text => "category_entity_text",
        }
    }
}

/// Whether the attribute holds directives or a boolean toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Directives,
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    pub code: &'static str,
    pub backend: BackendType,
    pub kind: AttributeKind,
    pub default_value: Option<&'static str>,
}

/// Attributes as first installed. The two legacy directive attributes
/// start as integers; the directive storage migration moves them to text.
pub const ATTRIBUTES: [AttributeDef; 9] = [
    AttributeDef {
        code: ROBOTS_META_TAG,
        backend: BackendType::Int,
        kind: AttributeKind::Directives,
        default_value: Some("0"),
    },
    AttributeDef {
        code: PRODUCT_ROBOTS_META_TAG,
        backend: BackendType::Int,
        kind: AttributeKind::Directives,
        default_value: Some("0"),
    },
    AttributeDef {
        code: X_ROBOTS_HEADER,
        backend: BackendType::Text,
        kind: AttributeKind::Directives,
        default_value: None,
    },
    AttributeDef {
        code: PRODUCT_X_ROBOTS_HEADER,
        backend: BackendType::Text,
        kind: AttributeKind::Directives,
        default_value: None,
    },
    AttributeDef {
        code: APPLY_ROBOTS_TO_PRODUCTS,
        backend: BackendType::Int,
        kind: AttributeKind::Flag,
        default_value: Some("0"),
    },
    AttributeDef {
        code: APPLY_X_ROBOTS_TO_PRODUCTS,
        backend: BackendType::Int,
        kind: AttributeKind::Flag,
        default_value: Some("0"),
    },
    AttributeDef {
        code: USE_META_FOR_X_ROBOTS,
        backend: BackendType::Int,
        kind: AttributeKind::Flag,
        default_value: Some("1"),
    },
    AttributeDef {
        code: USE_CATEGORY_ROBOTS_FOR_PRODUCTS,
        backend: BackendType::Int,
        kind: AttributeKind::Flag,
        default_value: Some("1"),
    },
    AttributeDef {
        code: USE_CATEGORY_X_ROBOTS_FOR_PRODUCTS,
        backend: BackendType::Int,
        kind: AttributeKind::Flag,
        default_value: Some("1"),
    },
];

pub fn attribute_def(code: &str) -> Option<&'static AttributeDef> {
    ATTRIBUTES.iter().find(|def| def.code == code)
}
