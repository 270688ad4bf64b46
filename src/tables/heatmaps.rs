use crate::schema::{DatabaseField, Table};

/// Heatmap interaction points recorded from the browser.
pub fn heatmaps_table(partition_column: &str) -> Table {
    Table::builder("HeatmapsTable")
        .printed("heatmaps")
        .field("session_id", DatabaseField::string("session_id"))
        .field(partition_column, DatabaseField::integer(partition_column))
        .field("x", DatabaseField::integer("x"))
        .field("y", DatabaseField::integer("y"))
        .field("scale_factor", DatabaseField::integer("scale_factor"))
        .field("viewport_width", DatabaseField::integer("viewport_width"))
        .field("viewport_height", DatabaseField::integer("viewport_height"))
        .field("pointer_target_fixed", DatabaseField::boolean("pointer_target_fixed"))
        .field("current_url", DatabaseField::string("current_url"))
        .field("timestamp", DatabaseField::datetime("timestamp"))
        .field("type", DatabaseField::string("type"))
        .partition_column(partition_column)
        .build()
}
