/// ドライバーレジストリのテスト
///
/// ソースロケーターのスキームから適切なインスペクターが選ばれること、
/// 未対応のスキームが必ず UnsupportedDialect になることを確認します。

#[cfg(test)]
mod driver_registry_tests {
    use async_trait::async_trait;
    use schemalens::core::config::{ConnectionSettings, Dialect};
    use schemalens::core::error::InspectError;
    use schemalens::core::inspector::{InspectContext, SchemaInspector};
    use schemalens::core::schema::{SchemaSnapshot, TableDescriptor};
    use schemalens::services::driver_registry::DriverRegistry;
    use std::sync::Arc;

    /// 固定のテーブル名を返すテスト用インスペクター
    #[derive(Debug)]
    struct FixedInspector {
        table: String,
    }

    #[async_trait]
    impl SchemaInspector for FixedInspector {
        fn dialect(&self) -> Dialect {
            Dialect::LiteralDdl
        }

        fn schema_name(&self) -> Option<&str> {
            None
        }

        async fn inspect(
            &self,
            _ctx: &InspectContext,
            _include_tables: &[String],
        ) -> Result<SchemaSnapshot, InspectError> {
            let mut snapshot = SchemaSnapshot::new(Dialect::LiteralDdl, None);
            snapshot.tables.push(TableDescriptor::new(self.table.clone()));
            Ok(snapshot)
        }
    }

    fn registry() -> DriverRegistry {
        DriverRegistry::with_defaults(ConnectionSettings::default())
    }

    /// 各スキームが対応する方言に解決される
    #[test]
    fn test_resolve_each_default_scheme() {
        let registry = registry();
        let cases = [
            ("mysql://root:pw@127.0.0.1:3306/shop", Dialect::MySQL),
            ("MYSQL://root@tcp(127.0.0.1:3306)/shop", Dialect::MySQL),
            ("postgres://app@localhost/app", Dialect::PostgreSQL),
            ("postgresql://app@localhost/app?search_path=sales", Dialect::PostgreSQL),
            ("sqlite://./app.db", Dialect::SQLite),
            ("text://CREATE TABLE t (id INT)", Dialect::LiteralDdl),
            ("file://./schema.sql", Dialect::LiteralDdl),
        ];

        for (locator, dialect) in cases {
            let inspector = registry.resolve(locator).unwrap();
            assert_eq!(inspector.dialect(), dialect, "locator: {}", locator);
        }
    }

    /// search_path の先頭がスキーマ名になる
    #[test]
    fn test_postgres_schema_from_search_path() {
        let registry = registry();
        let inspector = registry
            .resolve("postgres://app@localhost/app?search_path=sales,public")
            .unwrap();
        assert_eq!(inspector.schema_name(), Some("sales"));

        let inspector = registry.resolve("postgres://app@localhost/app").unwrap();
        assert_eq!(inspector.schema_name(), Some("public"));
    }

    /// 未対応スキームは必ず UnsupportedDialect
    #[test]
    fn test_unsupported_schemes() {
        let registry = registry();
        for locator in [
            "oracle://scott:tiger@db/orcl",
            "mssql://sa:pw@localhost/master",
            "redis://localhost",
            "no-separator-here",
            "",
        ] {
            let err = registry.resolve(locator).unwrap_err();
            assert!(err.is_unsupported_dialect(), "locator: {:?}", locator);
            assert!(!err.to_string().contains("tiger"));
        }
    }

    /// 不正なDSNは InvalidLocator として方言付きで返る
    #[test]
    fn test_invalid_dsn_keeps_dialect() {
        let err = registry().resolve("mysql://root@localhost").unwrap_err();
        assert!(err.is_invalid_locator());
        assert_eq!(err.dialect(), Some(Dialect::MySQL));
    }

    /// 独立したレジストリにカスタムのファクトリを登録できる
    #[tokio::test]
    async fn test_custom_factory() {
        let mut registry = DriverRegistry::new();
        registry.register(&["fixed", "FIXED2"], |remainder| {
            Ok(Box::new(FixedInspector {
                table: remainder.to_string(),
            }) as Box<dyn SchemaInspector>)
        });

        assert!(registry.is_registered("fixed2"));
        assert!(!registry.is_registered("mysql"));
        assert_eq!(registry.schemes(), vec!["fixed", "fixed2"]);

        let inspector = registry.resolve("Fixed://accounts").unwrap();
        let snapshot = inspector.inspect(&InspectContext::new(), &[]).await.unwrap();
        assert_eq!(snapshot.table_names(), vec!["accounts"]);
    }

    /// 構築後のレジストリは複数スレッドから同時に解決できる
    #[test]
    fn test_concurrent_resolve() {
        let registry = Arc::new(registry());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let locator = if i % 2 == 0 {
                        "mysql://u@localhost/db"
                    } else {
                        "oracle://u@localhost/db"
                    };
                    registry.resolve(locator).map(|inspector| inspector.dialect())
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let result = handle.join().unwrap();
            if i % 2 == 0 {
                assert_eq!(result.unwrap(), Dialect::MySQL);
            } else {
                assert!(result.unwrap_err().is_unsupported_dialect());
            }
        }
    }
}
