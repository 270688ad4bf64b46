use std::sync::Arc;

use super::persons::JoinToPersons;
use super::sessions::JoinToSessions;
use crate::config::SchemaSettings;
use crate::schema::{chain, DatabaseField, FieldTraverser, LazyJoin, Table};
use crate::sql::{col, func};

/// Person columns denormalized onto the event row.
fn person_on_events_table() -> Table {
    Table::virtual_table("PersonOnEventsTable")
        .field("id", DatabaseField::string("person_id"))
        .field("created_at", DatabaseField::datetime("person_created_at"))
        .field("properties", DatabaseField::json("person_properties"))
        .build()
}

pub fn events_table(settings: &SchemaSettings, persons: Arc<Table>) -> Table {
    let partition_column = settings.partition_column.as_str();
    let builder = Table::builder("EventsTable")
        .printed("events")
        .field("uuid", DatabaseField::string("uuid"))
        .field("event", DatabaseField::string("event"))
        .field("properties", DatabaseField::json("properties"))
        .field("timestamp", DatabaseField::datetime("timestamp"))
        .field(partition_column, DatabaseField::integer(partition_column))
        .field("distinct_id", DatabaseField::string("distinct_id"))
        .field("elements_chain", DatabaseField::string("elements_chain").hidden())
        .field("person_id", DatabaseField::string("person_id"))
        .field("$session_id", DatabaseField::string("$session_id"))
        .field(
            "event_date",
            DatabaseField::expression("event_date", func("toDate", vec![col("timestamp")])),
        )
        .field(
            "session",
            LazyJoin::new(JoinToSessions, "sessions", chain(["$session_id"]))
                .with_to_field(chain(["session_id"])),
        )
        .partition_column(partition_column);

    let builder = if settings.person_on_events {
        builder
            .field("poe", person_on_events_table())
            .field("person", FieldTraverser::new(["poe"]))
    } else {
        builder.field(
            "person",
            LazyJoin::new(JoinToPersons, persons, chain(["person_id"])).with_to_field(chain(["id"])),
        )
    };
    builder.build()
}
