#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlparser::dialect::ClickHouseDialect;
    use sqlparser::parser::Parser;
    use vschema::config::{ColumnType, SavedQuerySettings, SchemaSettings};
    use vschema::resolver::{join_subquery, ResolutionPass};
    use vschema::schema::{
        chain, ChainSegment, Database, DatabaseField, JoinFunction, LazyJoin, LazyJoinToAdd, Table,
    };
    use vschema::sql::{count_star, lit_int, star, table_col, ExprExt, Join, Query};
    use vschema::tables::create_database;
    use vschema::{Dialect, ResolutionContext, SchemaError, SchemaResult};

    fn assert_valid_clickhouse(sql: &str) {
        if let Err(e) = Parser::parse_sql(&ClickHouseDialect {}, sql) {
            panic!("invalid SQL: {e}\n{sql}");
        }
    }

    fn default_db() -> Database {
        create_database(&SchemaSettings::default()).unwrap()
    }

    #[test]
    fn test_plain_column_with_tenant_guard() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(1);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let event = pass.resolve(&chain(["event"])).unwrap();
        let query = pass.finish(Query::new().select(vec![event])).unwrap();

        let sql = query.to_sql(Dialect::ClickHouse);
        assert_eq!(
            sql,
            "SELECT `events`.`event` FROM `events` AS `events` WHERE `events`.`team_id` = 1"
        );
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_expression_field_is_inlined() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "e");
        let expr = pass.resolve(&chain(["event_date"])).unwrap();
        assert_eq!(expr.to_sql(Dialect::ClickHouse), "toDate(`e`.`timestamp`)");
    }

    #[test]
    fn test_json_property_access() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let expr = pass.resolve(&chain(["properties", "$browser"])).unwrap();
        assert_eq!(
            expr.to_sql(Dialect::ClickHouse),
            "JSONExtractString(`events`.`properties`, '$browser')"
        );
        assert_eq!(
            expr.to_sql(Dialect::Postgres),
            "(\"events\".\"properties\"::json ->> '$browser')"
        );
    }

    #[test]
    fn test_person_join_through_lazy_join() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(1);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let email = pass.resolve(&chain(["person", "properties", "email"])).unwrap();
        assert_eq!(email, table_col("events__person", "properties___email"));

        let query = pass.finish(Query::new().select(vec![email])).unwrap();
        let sql = query.to_sql(Dialect::ClickHouse);
        assert_eq!(
            sql,
            "SELECT `events__person`.`properties___email` FROM `events` AS `events` \
             LEFT JOIN (SELECT JSONExtractString(`events__person`.`properties`, 'email') AS `properties___email`, \
             `events__person`.`id` AS `id` FROM `person` AS `events__person` \
             WHERE `events__person`.`team_id` = 1 AND `events__person`.`is_deleted` = false) AS `events__person` \
             ON `events`.`person_id` = `events__person`.`id` \
             WHERE `events`.`team_id` = 1"
        );
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_one_join_per_lazy_join() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let a = pass.resolve(&chain(["person", "properties", "email"])).unwrap();
        let b = pass.resolve(&chain(["person", "created_at"])).unwrap();
        let c = pass.resolve(&chain(["person", "properties", "email"])).unwrap();
        assert_eq!(a, c);

        let join = &pass.lazy_joins()["events__person"];
        let keys: Vec<&str> = join.fields_accessed.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["properties___email", "created_at"]);

        let query = pass.finish(Query::new().select(vec![a, b])).unwrap();
        assert_eq!(query.joins.len(), 1);
        assert_valid_clickhouse(&query.to_sql(Dialect::ClickHouse));
    }

    #[test]
    fn test_untouched_joins_are_not_materialized() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let uuid = pass.resolve(&chain(["uuid"])).unwrap();
        let query = pass.finish(Query::new().select(vec![uuid])).unwrap();
        assert!(query.joins.is_empty());
    }

    #[test]
    fn test_person_on_events_reads_the_event_row() {
        let settings = SchemaSettings {
            person_on_events: true,
            ..SchemaSettings::default()
        };
        let db = create_database(&settings).unwrap();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");

        assert_eq!(
            pass.resolve(&chain(["person", "id"])).unwrap(),
            table_col("events", "person_id")
        );
        assert_eq!(
            pass.resolve(&chain(["person", "properties", "email"]))
                .unwrap()
                .to_sql(Dialect::ClickHouse),
            "JSONExtractString(`events`.`person_properties`, 'email')"
        );
        assert!(pass.lazy_joins().is_empty());
    }

    #[test]
    fn test_session_join_uses_named_table() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(3);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let duration = pass.resolve(&chain(["session", "$session_duration"])).unwrap();
        assert_eq!(duration, table_col("events__session", "$session_duration"));

        let query = pass.finish(Query::new().select(vec![duration])).unwrap();
        let sql = query.to_sql(Dialect::ClickHouse);
        assert!(sql.contains("FROM `raw_sessions` AS `raw_sessions` WHERE `raw_sessions`.`team_id` = 3 GROUP BY `raw_sessions`.`session_id`"));
        assert!(sql.contains("ON `events`.`$session_id` = `events__session`.`session_id`"));
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_session_join_without_registry_fails() {
        let db = default_db();
        let events = db.get_table("events").unwrap();
        let ctx = ResolutionContext::new(Dialect::ClickHouse);
        let mut pass = ResolutionPass::new(ctx, events, "events");
        assert_eq!(
            pass.resolve(&chain(["session", "session_id"])).unwrap_err(),
            SchemaError::Resolution("Database is not set".into())
        );
    }

    #[test]
    fn test_lazy_root_becomes_subquery() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(2);
        let mut pass = ResolutionPass::new(ctx, db.get_table("sessions").unwrap(), "sessions");
        let count = pass.resolve(&chain(["$pageview_count"])).unwrap();
        let query = pass.finish(Query::new().select(vec![count])).unwrap();

        let sql = query.to_sql(Dialect::ClickHouse);
        assert_eq!(
            sql,
            "SELECT `sessions`.`$pageview_count` FROM (SELECT sum(`raw_sessions`.`pageview_count`) AS `$pageview_count` \
             FROM `raw_sessions` AS `raw_sessions` WHERE `raw_sessions`.`team_id` = 2 \
             GROUP BY `raw_sessions`.`session_id`) AS `sessions`"
        );
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_lazy_root_unknown_field() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("sessions").unwrap(), "sessions");
        assert!(matches!(
            pass.resolve(&chain(["nope"])),
            Err(SchemaError::FieldNotFound { .. })
        ));
    }

    #[test]
    fn test_function_call_root() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(9);
        let mut pass = ResolutionPass::new(ctx, db.get_table("numbers").unwrap(), "numbers")
            .with_function_args(vec![lit_int(10)]);
        let number = pass.resolve(&chain(["number"])).unwrap();
        let query = pass.finish(Query::new().select(vec![number])).unwrap();
        assert_eq!(
            query.to_sql(Dialect::ClickHouse),
            "SELECT `numbers`.`number` FROM numbers(10) AS `numbers`"
        );
    }

    #[test]
    fn test_function_call_arity() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let pass = ResolutionPass::new(ctx, db.get_table("numbers").unwrap(), "numbers");
        let err = pass.finish(Query::new().select(vec![star()])).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidArguments { .. }));
    }

    fn saved_query_db() -> Database {
        let mut settings = SchemaSettings::default();
        settings.saved_queries.insert(
            "recent".into(),
            SavedQuerySettings::new("SELECT event, properties FROM events WHERE team_id = 4")
                .with_column("event", ColumnType::String)
                .with_column("properties", ColumnType::Json),
        );
        create_database(&settings).unwrap()
    }

    #[test]
    fn test_saved_query_root_is_its_query_text() {
        let db = saved_query_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(4);
        let mut pass = ResolutionPass::new(ctx, db.get_table("recent").unwrap(), "recent");
        let event = pass.resolve(&chain(["event"])).unwrap();
        let browser = pass.resolve(&chain(["properties", "$browser"])).unwrap();
        let query = pass.finish(Query::new().select(vec![event, browser])).unwrap();

        let sql = query.to_sql(Dialect::ClickHouse);
        assert_eq!(
            sql,
            "SELECT `recent`.`event`, JSONExtractString(`recent`.`properties`, '$browser') \
             FROM (SELECT event, properties FROM events WHERE team_id = 4) AS `recent`"
        );
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_saved_query_root_has_no_guard() {
        let db = saved_query_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(4);
        let pass = ResolutionPass::new(ctx, db.get_table("recent").unwrap(), "recent");
        let query = pass.finish(Query::new().select(vec![count_star()])).unwrap();
        assert_eq!(
            query.to_sql(Dialect::ClickHouse),
            "SELECT count(*) FROM (SELECT event, properties FROM events WHERE team_id = 4) AS `recent`"
        );
    }

    #[test]
    fn test_saved_query_unknown_column() {
        let db = saved_query_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("recent").unwrap(), "recent");
        assert_eq!(
            pass.resolve(&chain(["timestamp"])).unwrap_err(),
            SchemaError::FieldNotFound {
                field: "timestamp".into(),
                table: "SavedQuery".into(),
            }
        );
    }

    #[test]
    fn test_or_filter_cannot_escape_the_tenant_guard() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse)
            .with_database(&db)
            .with_tenant(7);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let event = pass.resolve(&chain(["event"])).unwrap();
        let either = event.clone().eq("a").or(event.clone().eq("b"));
        let query = pass.finish(Query::new().select(vec![event]).filter(either)).unwrap();

        let sql = query.to_sql(Dialect::ClickHouse);
        assert_eq!(
            sql,
            "SELECT `events`.`event` FROM `events` AS `events` \
             WHERE (`events`.`event` = 'a' OR `events`.`event` = 'b') AND `events`.`team_id` = 7"
        );
        assert_valid_clickhouse(&sql);
    }

    #[test]
    fn test_json_array_position() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let first = pass
            .resolve(&[ChainSegment::from("properties"), ChainSegment::from("$tags"), ChainSegment::Index(1)])
            .unwrap();
        assert_eq!(
            first.to_sql(Dialect::ClickHouse),
            "JSONExtractString(`events`.`properties`, '$tags', 1)"
        );
        assert_eq!(
            first.to_sql(Dialect::DuckDb),
            "JSON_EXTRACT_STRING(\"events\".\"properties\", '$.\"$tags\"[0]')"
        );
    }

    #[test]
    fn test_selecting_structure_fails() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        assert!(matches!(
            pass.resolve(&chain(["person"])),
            Err(SchemaError::Resolution(_))
        ));
        assert!(matches!(
            pass.resolve(&chain(["uuid", "nested"])),
            Err(SchemaError::Resolution(_))
        ));
        assert!(pass.resolve(&[]).is_err());
    }

    #[test]
    fn test_asterisk_on_events() {
        let db = default_db();
        let ctx = ResolutionContext::new(Dialect::ClickHouse).with_database(&db);
        let mut pass = ResolutionPass::new(ctx, db.get_table("events").unwrap(), "events");
        let items = pass.resolve_asterisk().unwrap();
        let names: Vec<&str> = items.iter().filter_map(|i| i.alias.as_deref()).collect();
        assert_eq!(
            names,
            vec!["uuid", "event", "properties", "timestamp", "distinct_id", "person_id", "$session_id", "event_date"]
        );
    }

    // Three-level chain: orders → customer → account.

    #[derive(Debug)]
    struct KeyJoin;

    impl JoinFunction for KeyJoin {
        fn join(
            &self,
            join_to_add: &LazyJoinToAdd,
            context: &ResolutionContext<'_>,
            _node: &Query,
        ) -> SchemaResult<Join> {
            join_subquery(join_to_add, context)
        }
    }

    fn orders() -> Arc<Table> {
        let accounts = Table::builder("AccountsTable")
            .printed("accounts")
            .field("id", DatabaseField::integer("id"))
            .field("tier", DatabaseField::string("tier"))
            .build();
        let customers = Table::builder("CustomersTable")
            .printed("customers")
            .field("id", DatabaseField::integer("id"))
            .field("account_id", DatabaseField::integer("account_id"))
            .field(
                "account",
                LazyJoin::new(KeyJoin, accounts, chain(["account_id"])).with_to_field(chain(["id"])),
            )
            .build();
        Arc::new(
            Table::builder("OrdersTable")
                .printed("orders")
                .field("id", DatabaseField::integer("id"))
                .field("customer_id", DatabaseField::integer("customer_id"))
                .field(
                    "customer",
                    LazyJoin::new(KeyJoin, customers, chain(["customer_id"])).with_to_field(chain(["id"])),
                )
                .build(),
        )
    }

    #[test]
    fn test_nested_join_follows_its_parent() {
        let ctx = ResolutionContext::new(Dialect::ClickHouse);
        let mut pass = ResolutionPass::new(ctx, orders(), "orders");
        let tier = pass.resolve(&chain(["customer", "account", "tier"])).unwrap();
        assert_eq!(tier, table_col("orders__customer__account", "tier"));

        let parent = &pass.lazy_joins()["orders__customer"];
        assert!(parent.fields_accessed.contains("account_id"));
        let child = &pass.lazy_joins()["orders__customer__account"];
        assert_eq!(child.from_table, "orders__customer");
        assert_eq!(child.from_expr, table_col("orders__customer", "account_id"));

        let query = pass.finish(Query::new().select(vec![tier])).unwrap();
        let aliases: Vec<_> = query.joins.iter().filter_map(Join::alias).collect();
        assert_eq!(aliases, vec!["orders__customer", "orders__customer__account"]);
        assert_valid_clickhouse(&query.to_sql(Dialect::ClickHouse));
    }
}
