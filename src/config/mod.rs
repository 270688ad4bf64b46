//! Configuration module for vschema.
//!
//! Handles schema construction and resolution settings.

mod settings;

pub use settings::{
    ColumnType, ResolutionSettings, SavedQuerySettings, SchemaSettings, Settings, SettingsError,
};
