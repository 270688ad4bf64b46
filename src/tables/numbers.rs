use crate::schema::{DatabaseField, Table};

/// `numbers(n)` / `numbers(offset, n)`: a sequence of integers generated by the store.
pub fn numbers_table() -> Table {
    Table::function_call("numbers", Some(1), Some(2))
        .field("number", DatabaseField::integer("number"))
        .build()
}
