//! The concrete analytics schema and the registry factory.

mod events;
mod heatmaps;
mod numbers;
mod persons;
mod sessions;

use std::sync::Arc;

use tracing::debug;

use crate::config::SchemaSettings;
use crate::error::SchemaResult;
use crate::schema::Database;

pub use events::events_table;
pub use heatmaps::heatmaps_table;
pub use numbers::numbers_table;
pub use persons::{persons_table, JoinToPersons};
pub use sessions::{raw_sessions_table, sessions_table, JoinToSessions, SessionsSelect};

/// Build the registry: every built-in table plus the configured saved queries.
pub fn create_database(settings: &SchemaSettings) -> SchemaResult<Database> {
    let partition_column = settings.partition_column.as_str();
    let persons = Arc::new(persons_table(partition_column));

    let mut database = Database::new();
    database.add_table("events", events_table(settings, Arc::clone(&persons)));
    database.add_table("persons", persons);
    database.add_table("sessions", sessions_table(partition_column));
    database.add_table("raw_sessions", raw_sessions_table(partition_column));
    database.add_table("heatmaps", heatmaps_table(partition_column));
    database.add_table("numbers", numbers_table());

    for (name, saved) in &settings.saved_queries {
        database.add_saved_query(name, &saved.query, saved.fields())?;
    }

    debug!(
        tables = database.len(),
        person_on_events = settings.person_on_events,
        "schema built"
    );
    Ok(database)
}
