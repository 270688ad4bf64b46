#[cfg(test)]
mod tests {
    use sqlparser::dialect::DuckDbDialect;
    use sqlparser::parser::Parser;
    use vschema::resolver::ResolutionPass;
    use vschema::schema::FieldType;
    use vschema::sql::{ExprExt, Query};
    use vschema::tables::heatmaps_table;
    use vschema::{Dialect, ResolutionContext, SchemaError};

    #[test]
    fn test_heatmaps_asterisk_is_the_ten_data_fields() {
        let table = heatmaps_table("team_id");
        let asterisk = table.get_asterisk().unwrap();
        let names: Vec<&str> = asterisk.keys().copied().collect();
        assert_eq!(
            names,
            vec![
                "session_id",
                "x",
                "y",
                "scale_factor",
                "viewport_width",
                "viewport_height",
                "pointer_target_fixed",
                "current_url",
                "timestamp",
                "type",
            ]
        );
        assert_eq!(asterisk["pointer_target_fixed"].field_type, FieldType::Boolean);
        assert_eq!(asterisk["timestamp"].field_type, FieldType::DateTime);
    }

    #[test]
    fn test_heatmaps_printing() {
        let table = heatmaps_table("team_id");
        let ctx = ResolutionContext::new(Dialect::ClickHouse);
        assert_eq!(table.to_printed_store_reference(&ctx).unwrap(), "heatmaps");
        assert_eq!(table.to_printed_logical_name().unwrap(), "heatmaps");
    }

    #[test]
    fn test_heatmaps_lookup() {
        let table = heatmaps_table("team_id");
        assert!(table.has_field("team_id"));
        assert!(table.has_field("viewport_width"));
        assert!(!table.has_field("pointer_target"));
        assert_eq!(
            table.get_field("pointer_target").unwrap_err(),
            SchemaError::FieldNotFound {
                field: "pointer_target".into(),
                table: "HeatmapsTable".into(),
            }
        );
    }

    #[test]
    fn test_heatmaps_query_in_duckdb() {
        let table = std::sync::Arc::new(heatmaps_table("team_id"));
        let ctx = ResolutionContext::new(Dialect::DuckDb).with_tenant(5);
        let mut pass = ResolutionPass::new(ctx, table, "heatmaps");
        let x = pass.resolve(&["x".into()]).unwrap();
        let scale = pass.resolve(&["scale_factor".into()]).unwrap();
        let query = pass
            .finish(Query::new().select(vec![x.clone()]).filter(scale.gt(1)))
            .unwrap();

        let sql = query.to_sql(Dialect::DuckDb);
        assert_eq!(
            sql,
            "SELECT \"heatmaps\".\"x\" FROM \"heatmaps\" AS \"heatmaps\" \
             WHERE \"heatmaps\".\"scale_factor\" > 1 AND \"heatmaps\".\"team_id\" = 5"
        );
        assert!(Parser::parse_sql(&DuckDbDialect {}, &sql).is_ok());
    }

    #[test]
    fn test_other_partition_column() {
        let table = heatmaps_table("org_id");
        assert!(table.has_field("org_id"));
        assert!(!table.has_field("team_id"));
        assert_eq!(table.get_asterisk().unwrap().len(), 10);
    }
}
