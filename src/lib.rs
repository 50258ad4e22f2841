//! seo-robots: robots directive resolution for catalog categories and products.
//!
//! Decides which search-engine robots directives (`noindex`, `nofollow`,
//! `max-snippet:20`, ...) apply to a category page and to the products
//! listed in it, both for the robots meta tag and for the `X-Robots-Tag`
//! HTTP header.
//!
//! # Architecture
//!
//! ```text
//! attribute store -> codec -> resolve -> aggregate (products) -> format
//!                              ^
//!               validate <- adapter (write path only)
//! ```
//!
//! - **Codec** normalizes every stored shape (legacy integer codes, legacy
//!   `bot:value:modification` strings, JSON keyword arrays, JSON triples)
//!   into one [`DirectiveSet`]. Decoding never fails.
//! - **Resolution** applies inheritance and override toggles per
//!   [`ResolutionTarget`]; sentinel codes never escape it.
//! - **Aggregation** merges a product's categories: the first `noindex`
//!   wins, otherwise the first non-empty set.
//! - **Storage** is an [`AttributeStore`]; [`SqliteAttributeStore`] reads
//!   the EAV tables with store → default scope fallback.
//!
//! The engine is stateless and does no I/O; it is safe to call from any
//! number of threads.
//!
//! # Examples
//!
//! ```bash
//! seo-robots --db catalog.db init
//! seo-robots --db catalog.db migrate
//! seo-robots --db catalog.db set --category 12 --attribute robots_meta_tag --value '["noindex","follow"]'
//! seo-robots --db catalog.db resolve --category 12 --target category-header
//! seo-robots --db catalog.db product --categories 12,14 --target product-meta
//! ```

pub mod core;

pub use crate::core::aggregate::{ProductCategoryRow, resolve_product, resolve_products_across_categories};
pub use crate::core::codec::{RawEntry, RawValue, decode, encode};
pub use crate::core::directive::{Directive, DirectiveSet};
pub use crate::core::error::RobotsError;
pub use crate::core::format::format;
pub use crate::core::resolve::{RawAttributeRow, ResolutionTarget, resolve};
pub use crate::core::service::RobotsService;
pub use crate::core::sqlite_store::SqliteAttributeStore;
pub use crate::core::store::{AttributeStore, MemoryAttributeStore};
pub use crate::core::validate::{BotAllowList, KnownBots, ValidationReport, validate};

use crate::core::{
    adapter, codec, config, db, error, migration, schemas,
    resolve::{CategoryId, StoreId},
    time,
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "seo-robots",
    version = env!("CARGO_PKG_VERSION"),
    about = "Resolve robots meta and X-Robots-Tag directives for catalog categories"
)]
struct Cli {
    /// SQLite database holding the category attributes.
    #[clap(long, global = true, default_value = "seo-robots.db")]
    db: PathBuf,
    /// Config file (defaults to $SEO_ROBOTS_CONFIG or ./seo-robots.toml).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    /// Output format: 'text' or 'json'.
    #[clap(long, global = true, default_value = "text")]
    format: String,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the tables and register the robots attributes.
    Init,
    /// Apply pending data migrations.
    Migrate,
    /// Store an attribute value for a category (validated for directive attributes).
    Set {
        #[clap(long)]
        category: CategoryId,
        /// Store scope; 0 is the default scope.
        #[clap(long)]
        store: Option<StoreId>,
        #[clap(long)]
        attribute: String,
        /// JSON array, legacy code, legacy `bot:value` string, or 0/1 for toggles.
        #[clap(long, allow_hyphen_values = true)]
        value: String,
    },
    /// Remove a stored value so the scope falls back again.
    Unset {
        #[clap(long)]
        category: CategoryId,
        #[clap(long)]
        store: Option<StoreId>,
        #[clap(long)]
        attribute: String,
    },
    /// Resolve a category target.
    Resolve {
        #[clap(long)]
        category: CategoryId,
        #[clap(long)]
        store: Option<StoreId>,
        #[clap(long, default_value = "category-meta")]
        target: ResolutionTarget,
        /// Fall back to the configured default when nothing resolves.
        #[clap(long)]
        with_default: bool,
    },
    /// Resolve a product target from its categories, in listing order.
    Product {
        #[clap(long, value_delimiter = ',', required = true)]
        categories: Vec<CategoryId>,
        #[clap(long)]
        store: Option<StoreId>,
        #[clap(long, default_value = "product-meta")]
        target: ResolutionTarget,
        #[clap(long)]
        with_default: bool,
    },
    /// Show the scoped attribute row and every target for a category.
    Inspect {
        #[clap(long)]
        category: CategoryId,
        #[clap(long)]
        store: Option<StoreId>,
    },
    /// Decode a stored value and print the canonical form.
    Decode {
        #[clap(allow_hyphen_values = true)]
        raw: String,
    },
    /// Validate directives as the write path would.
    Validate {
        #[clap(allow_hyphen_values = true)]
        raw: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

struct Output {
    json: bool,
}

impl Output {
    fn parse(format: &str) -> Result<Self, error::RobotsError> {
        match format {
            "text" => Ok(Self { json: false }),
            "json" => Ok(Self { json: true }),
            other => Err(error::RobotsError::ConfigError(format!(
                "unknown output format '{}' (expected text or json)",
                other
            ))),
        }
    }

    fn emit(&self, cmd: &str, text: &str, extra: serde_json::Value) {
        if self.json {
            println!("{}", time::command_envelope(cmd, "ok", extra));
        } else {
            println!("{}", text);
        }
    }
}

fn directive_json(set: &DirectiveSet) -> Result<serde_json::Value, error::RobotsError> {
    Ok(serde_json::to_value(set)?)
}

fn row_json(row: &RawAttributeRow) -> serde_json::Value {
    let raw = |v: &RawValue| match v {
        RawValue::Absent => serde_json::Value::Null,
        RawValue::Int(n) => json!(n),
        RawValue::Text(s) => json!(s),
        RawValue::Entries(_) => json!(codec::encode(&codec::decode(v))),
    };
    let fields = [
        ("category_id", json!(row.category_id)),
        (schemas::ROBOTS_META_TAG, raw(&row.robots)),
        (schemas::PRODUCT_ROBOTS_META_TAG, raw(&row.product_robots)),
        (schemas::X_ROBOTS_HEADER, raw(&row.x_robots)),
        (schemas::PRODUCT_X_ROBOTS_HEADER, raw(&row.product_x_robots)),
        (schemas::APPLY_ROBOTS_TO_PRODUCTS, json!(row.applies_robots_to_products())),
        (schemas::APPLY_X_ROBOTS_TO_PRODUCTS, json!(row.applies_x_robots_to_products())),
        (schemas::USE_META_FOR_X_ROBOTS, json!(row.uses_meta_for_x_robots())),
        (
            schemas::USE_CATEGORY_ROBOTS_FOR_PRODUCTS,
            json!(row.uses_category_robots_for_products()),
        ),
        (
            schemas::USE_CATEGORY_X_ROBOTS_FOR_PRODUCTS,
            json!(row.uses_category_x_robots_for_products()),
        ),
    ];
    serde_json::Value::Object(
        fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn open_service(
    db_path: &std::path::Path,
    config: config::RobotsConfig,
) -> Result<RobotsService<SqliteAttributeStore>, error::RobotsError> {
    if !db_path.exists() {
        return Err(error::RobotsError::NotFound(format!(
            "database {} (run `seo-robots init`)",
            db_path.display()
        )));
    }
    Ok(RobotsService::new(SqliteAttributeStore::open(db_path)?, config))
}

pub fn run() -> Result<(), error::RobotsError> {
    init_logging();
    let cli = Cli::parse();
    let out = Output::parse(&cli.format)?;
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::config_path(&std::env::current_dir()?),
    };
    let config = config::load_config(&config_path)?;
    let default_store = config.store_id;

    match cli.command {
        Command::Init => {
            db::initialize_db(&cli.db)?;
            out.emit(
                "init",
                &format!("Robots attributes initialized at {}", cli.db.display()),
                json!({ "db": cli.db.display().to_string() }),
            );
        }
        Command::Migrate => {
            let mut conn = db::db_connect(&cli.db.to_string_lossy())?;
            let applied = migration::run_migrations(&mut conn)?;
            let text = if applied.is_empty() {
                format!("{} No pending migrations", "✓".bright_green())
            } else {
                applied
                    .iter()
                    .map(|m| {
                        format!(
                            "{} {} ({} rows)",
                            "●".bright_cyan(),
                            m.description.bright_white(),
                            m.rows
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            out.emit("migrate", &text, json!({ "applied": applied }));
        }
        Command::Set {
            category,
            store,
            attribute,
            value,
        } => {
            let def = schemas::attribute_def(&attribute)
                .ok_or_else(|| error::RobotsError::NotFound(format!("attribute '{}'", attribute)))?;
            let service = open_service(&cli.db, config)?;
            let store_id = store.unwrap_or(default_store);
            let stored = match def.kind {
                schemas::AttributeKind::Directives => adapter::on_write(
                    &RawValue::text(value),
                    def.code,
                    &service.config().known_bots(),
                )?,
                schemas::AttributeKind::Flag => {
                    let raw = RawValue::text(value.as_str());
                    if raw.is_blank() {
                        None
                    } else {
                        let on = raw.as_flag().ok_or_else(|| {
                            error::RobotsError::ConfigError(format!(
                                "{} expects 0/1, true/false, yes/no or on/off, got '{}'",
                                def.code, value
                            ))
                        })?;
                        Some(if on { "1" } else { "0" }.to_string())
                    }
                }
            };
            match &stored {
                Some(v) => service.store().set_value(category, store_id, def.code, v)?,
                None => service.store().clear_value(category, store_id, def.code)?,
            }
            out.emit(
                "set",
                &match &stored {
                    Some(v) => format!("{} = {}", def.code, v),
                    None => format!("{} cleared", def.code),
                },
                json!({
                    "category_id": category,
                    "store_id": store_id,
                    "attribute": def.code,
                    "value": stored,
                }),
            );
        }
        Command::Unset {
            category,
            store,
            attribute,
        } => {
            let service = open_service(&cli.db, config)?;
            let store_id = store.unwrap_or(default_store);
            service.store().clear_value(category, store_id, &attribute)?;
            out.emit(
                "unset",
                &format!("{} cleared", attribute),
                json!({ "category_id": category, "store_id": store_id, "attribute": attribute }),
            );
        }
        Command::Resolve {
            category,
            store,
            target,
            with_default,
        } => {
            if target.is_product() {
                return Err(error::RobotsError::ConfigError(format!(
                    "{} needs a product's categories; use `seo-robots product`",
                    target
                )));
            }
            let service = open_service(&cli.db, config)?;
            let store_id = store.unwrap_or(default_store);
            let set = service.category_directives(target, category, store_id);
            let mut content = set.as_ref().filter(|s| !s.is_empty()).map(format);
            if with_default {
                content = service.or_default(target, content);
            }
            out.emit(
                "resolve",
                content.as_deref().unwrap_or(""),
                json!({
                    "target": target,
                    "category_id": category,
                    "store_id": store_id,
                    "directives": set.as_ref().map(directive_json).transpose()?,
                    "content": content,
                }),
            );
        }
        Command::Product {
            categories,
            store,
            target,
            with_default,
        } => {
            if !target.is_product() {
                return Err(error::RobotsError::ConfigError(format!(
                    "{} is a category target; use `seo-robots resolve`",
                    target
                )));
            }
            let service = open_service(&cli.db, config)?;
            let store_id = store.unwrap_or(default_store);
            let set = service.product_directives(target, &categories, store_id);
            let mut content = set.as_ref().filter(|s| !s.is_empty()).map(format);
            if with_default {
                content = service.or_default(target, content);
            }
            out.emit(
                "product",
                content.as_deref().unwrap_or(""),
                json!({
                    "target": target,
                    "categories": categories,
                    "store_id": store_id,
                    "directives": set.as_ref().map(directive_json).transpose()?,
                    "content": content,
                }),
            );
        }
        Command::Inspect { category, store } => {
            let service = open_service(&cli.db, config)?;
            let store_id = store.unwrap_or(default_store);
            let row = service
                .store()
                .category_rows(&[category], store_id)?
                .into_iter()
                .next()
                .ok_or_else(|| error::RobotsError::NotFound(format!("category {}", category)))?;
            let resolved: serde_json::Map<String, serde_json::Value> = ResolutionTarget::ALL
                .into_iter()
                .map(|t| (t.to_string(), json!(format(&resolve(t, &row)))))
                .collect();
            let text = ResolutionTarget::ALL
                .into_iter()
                .map(|t| format!("{:<16} {}", t.as_str().bright_white(), format(&resolve(t, &row))))
                .collect::<Vec<_>>()
                .join("\n");
            out.emit(
                "inspect",
                &text,
                json!({ "store_id": store_id, "row": row_json(&row), "resolved": resolved }),
            );
        }
        Command::Decode { raw } => {
            let set = codec::decode(&RawValue::text(raw));
            out.emit(
                "decode",
                &format!(
                    "{}\n{}",
                    codec::encode(&set).unwrap_or_else(|| "null".to_string()),
                    format(&set)
                ),
                json!({ "directives": directive_json(&set)?, "content": format(&set) }),
            );
        }
        Command::Validate { raw } => {
            let set = codec::decode(&RawValue::text(raw));
            let report = validate(&set, &config.known_bots());
            if !report.valid {
                if !out.json {
                    for e in &report.errors {
                        eprintln!("{} {}", "✗".bright_red(), e);
                    }
                }
                return Err(error::RobotsError::InvalidDirectives(report.errors));
            }
            out.emit(
                "validate",
                &format!("{} {} directive(s) valid", "✓".bright_green(), set.len()),
                json!({ "valid": true, "directives": directive_json(&set)? }),
            );
        }
    }

    Ok(())
}
