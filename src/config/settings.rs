//! TOML-based configuration for vschema.
//!
//! Example configuration:
//! ```toml
//! [schema]
//! partition_column = "team_id"
//! person_on_events = false
//!
//! [resolution]
//! dialect = "clickhouse"   # clickhouse | postgres | duckdb
//! tenant_id = 2
//!
//! [schema.saved_queries.daily_pageviews]
//! query = "SELECT toDate(timestamp) AS day, count() AS c FROM events GROUP BY day"
//! columns = { day = "date", c = "integer" }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::ResolutionContext;
use crate::schema::{validate_saved_query_name, Database, DatabaseField, FieldType, DEFAULT_PARTITION_COLUMN};
use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// How the concrete schema is built.
    pub schema: SchemaSettings,

    /// Defaults for resolution passes.
    pub resolution: ResolutionSettings,
}

/// Schema construction settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Column every physical table is partitioned and tenant-guarded by.
    pub partition_column: String,

    /// Read person data from columns denormalized onto events instead of
    /// joining the persons table.
    pub person_on_events: bool,

    /// Saved query name → definition.
    pub saved_queries: BTreeMap<String, SavedQuerySettings>,
}

/// A saved query: its text and the columns it exposes, in output order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SavedQuerySettings {
    pub query: String,

    #[serde(default)]
    pub columns: IndexMap<String, ColumnType>,
}

impl SavedQuerySettings {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            columns: IndexMap::new(),
        }
    }

    pub fn with_column(mut self, name: &str, column_type: ColumnType) -> Self {
        self.columns.insert(name.to_string(), column_type);
        self
    }

    /// The declared columns as fields of the saved query table.
    pub fn fields(&self) -> Vec<DatabaseField> {
        self.columns
            .iter()
            .map(|(name, column_type)| DatabaseField::new(name, column_type.field_type()))
            .collect()
    }
}

/// Column types a saved query can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    String,
    Json,
    Array,
    Date,
    DateTime,
    Boolean,
}

impl ColumnType {
    pub fn field_type(self) -> FieldType {
        match self {
            ColumnType::Integer => FieldType::Integer,
            ColumnType::Float => FieldType::Float,
            ColumnType::String => FieldType::String,
            ColumnType::Json => FieldType::StringJson,
            ColumnType::Array => FieldType::StringArray,
            ColumnType::Date => FieldType::Date,
            ColumnType::DateTime => FieldType::DateTime,
            ColumnType::Boolean => FieldType::Boolean,
        }
    }
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            partition_column: DEFAULT_PARTITION_COLUMN.to_string(),
            person_on_events: false,
            saved_queries: BTreeMap::new(),
        }
    }
}

/// Resolution defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResolutionSettings {
    /// Target SQL dialect.
    pub dialect: Dialect,

    /// Tenant every query is restricted to, if any.
    pub tenant_id: Option<i64>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `VSCHEMA_CONFIG`
    /// 2. `./vschema.toml`
    /// 3. `~/.config/vschema/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("VSCHEMA_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("vschema.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("vschema").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject settings that would build a broken schema.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.schema.partition_column.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "schema.partition_column must not be empty".to_string(),
            ));
        }
        for (name, saved) in &self.schema.saved_queries {
            validate_saved_query_name(name)
                .map_err(|e| SettingsError::InvalidConfig(format!("schema.saved_queries: {}", e)))?;
            if saved.query.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "schema.saved_queries.{}: query must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Resolution context over `database` using the configured defaults.
    pub fn resolution_context<'a>(&self, database: &'a Database) -> ResolutionContext<'a> {
        let context = ResolutionContext::new(self.resolution.dialect).with_database(database);
        match self.resolution.tenant_id {
            Some(tenant_id) => context.with_tenant(tenant_id),
            None => context,
        }
    }
}
