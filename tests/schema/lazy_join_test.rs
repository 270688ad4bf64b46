#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vschema::schema::{
        chain, Database, DatabaseField, JoinFunction, JoinTarget, LazyJoin, LazyJoinToAdd, Table,
    };
    use vschema::sql::{col, Join, Query, TableRef};
    use vschema::{Dialect, ResolutionContext, SchemaError, SchemaResult};

    #[derive(Debug)]
    struct PlainJoin;

    impl JoinFunction for PlainJoin {
        fn join(
            &self,
            join_to_add: &LazyJoinToAdd,
            _context: &ResolutionContext<'_>,
            _node: &Query,
        ) -> SchemaResult<Join> {
            Ok(Join::inner(
                TableRef::new("groups").with_alias(&join_to_add.to_table),
                join_to_add.from_expr.clone(),
            ))
        }
    }

    fn groups() -> Table {
        Table::builder("GroupsTable")
            .printed("groups")
            .field("key", DatabaseField::string("key"))
            .build()
    }

    #[test]
    fn test_embedded_table_is_returned_without_registry() {
        let held = Arc::new(groups());
        let join = LazyJoin::new(PlainJoin, Arc::clone(&held), chain(["group_key"]));
        let ctx = ResolutionContext::new(Dialect::ClickHouse);

        let resolved = join.resolve_table(&ctx).unwrap();
        assert!(Arc::ptr_eq(&held, &resolved));
    }

    #[test]
    fn test_embedded_table_ignores_registry() {
        let held = Arc::new(groups());
        let join = LazyJoin::new(PlainJoin, Arc::clone(&held), chain(["group_key"]));

        let mut db = Database::new();
        db.add_table("groups", groups());
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);

        let resolved = join.resolve_table(&ctx).unwrap();
        assert!(Arc::ptr_eq(&held, &resolved));
        assert!(!Arc::ptr_eq(&db.get_table("groups").unwrap(), &resolved));
    }

    #[test]
    fn test_named_table_without_registry() {
        let join = LazyJoin::new(PlainJoin, "groups", chain(["group_key"]));
        let ctx = ResolutionContext::new(Dialect::ClickHouse);
        let err = join.resolve_table(&ctx).unwrap_err();
        assert_eq!(err.to_string(), "Database is not set");
    }

    #[test]
    fn test_named_table_with_registry() {
        let join = LazyJoin::new(PlainJoin, "groups", chain(["group_key"]));
        let mut db = Database::new();
        db.add_table("groups", groups());
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);

        let first = join.resolve_table(&ctx).unwrap();
        let second = join.resolve_table(&ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.type_name(), "GroupsTable");
    }

    #[test]
    fn test_named_table_missing_from_registry() {
        let join = LazyJoin::new(PlainJoin, "groups", chain(["group_key"]));
        let db = Database::new();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        assert_eq!(
            join.resolve_table(&ctx).unwrap_err(),
            SchemaError::TableNotFound("groups".into())
        );
    }

    #[test]
    fn test_target_conversions() {
        assert!(matches!(JoinTarget::from("groups"), JoinTarget::Named(_)));
        assert!(matches!(JoinTarget::from(groups()), JoinTarget::Table(_)));
    }

    #[test]
    fn test_join_passes_accumulated_request() {
        let join = LazyJoin::new(PlainJoin, groups(), chain(["group_key"])).with_to_field(chain(["key"]));
        let mut to_add = LazyJoinToAdd::new("events", "events__group", join.clone(), col("group_key"));
        to_add.fields_accessed.record_chain(&chain(["key"])).unwrap();

        let ctx = ResolutionContext::new(Dialect::ClickHouse);
        let fragment = join.join(&to_add, &ctx, &Query::new()).unwrap();
        assert_eq!(fragment.alias(), Some("events__group"));
        assert_eq!(join.to_field(), chain(["key"]).as_slice());
    }
}
