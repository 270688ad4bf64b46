//! Per-pass resolution context.

use crate::schema::Database;
use crate::sql::Dialect;

/// What a resolution pass may consult: the registry (optional), the target
/// dialect, and the tenant whose rows the query is restricted to.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionContext<'a> {
    pub database: Option<&'a Database>,
    pub dialect: Dialect,
    pub tenant_id: Option<i64>,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            database: None,
            dialect,
            tenant_id: None,
        }
    }

    pub fn with_database(mut self, database: &'a Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_tenant(mut self, tenant_id: i64) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}
