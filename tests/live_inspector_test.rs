/// ライブインスペクションの統合テスト
///
/// testcontainersを使用して実際のデータベースのカタログを読み取り、
/// DDLテキストと同じ TableDescriptor が得られることを確認します。
///
/// 注意: Docker必須のテストは #[ignore] アトリビュートでマークされています。
/// SQLiteのテストは一時ディレクトリのファイルを使うため常に実行されます。

#[cfg(test)]
mod live_inspector_tests {
    use schemalens::core::config::{ConnectionSettings, Dialect};
    use schemalens::core::inspector::InspectContext;
    use schemalens::core::schema::NormalizedType;
    use schemalens::services::schema_assembler::TableFilter;
    use schemalens::services::schema_engine::SchemaEngine;
    use sqlx::Executor;
    use std::time::Duration;
    use tempfile::TempDir;
    use testcontainers::{runners::AsyncRunner, ContainerAsync, ImageExt};
    use testcontainers_modules::mysql::Mysql as MysqlImage;
    use testcontainers_modules::postgres::Postgres as PostgresImage;

    fn engine() -> SchemaEngine {
        SchemaEngine::with_defaults(ConnectionSettings::default())
    }

    fn ctx() -> InspectContext {
        InspectContext::with_timeout(Duration::from_secs(60))
    }

    // ==========================================
    // PostgreSQL
    // ==========================================

    /// PostgreSQLコンテナを起動して接続文字列を返す
    async fn setup_postgres_container(
    ) -> Result<(ContainerAsync<PostgresImage>, String), Box<dyn std::error::Error>> {
        let container = PostgresImage::default()
            .with_tag("16-alpine")
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

        Ok((container, url))
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_catalog() {
        let (_container, url) = setup_postgres_container().await.unwrap();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        pool.execute(
            r#"
            CREATE SCHEMA sales;
            CREATE TABLE sales.customers (
                id BIGSERIAL PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                score REAL,
                active BOOLEAN NOT NULL DEFAULT TRUE,
                tags TEXT[],
                created_at TIMESTAMPTZ DEFAULT now()
            );
            COMMENT ON TABLE sales.customers IS 'registered customers';
            COMMENT ON COLUMN sales.customers.email IS 'login address';
            CREATE TABLE sales.orders (
                id SERIAL PRIMARY KEY,
                customer_id BIGINT NOT NULL REFERENCES sales.customers (id),
                total NUMERIC(10,2) NOT NULL
            );
            CREATE INDEX orders_customer_idx ON sales.orders (customer_id);
            CREATE TABLE public.ignored (id INT);
            "#,
        )
        .await
        .unwrap();
        pool.close().await;

        let schema = engine()
            .load(
                &format!("{}?search_path=sales", url),
                &TableFilter::new(),
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(schema.dialect, Dialect::PostgreSQL);
        assert_eq!(schema.schema_name.as_deref(), Some("sales"));
        assert_eq!(schema.table_names(), vec!["customers", "orders"]);

        let customers = schema.get_table("customers").unwrap();
        assert_eq!(customers.comment.as_deref(), Some("registered customers"));
        let ty = |name: &str| customers.get_column(name).unwrap().normalized_type;
        assert_eq!(ty("id"), NormalizedType::Int64);
        assert_eq!(ty("email"), NormalizedType::String);
        assert_eq!(ty("score"), NormalizedType::Float);
        assert_eq!(ty("active"), NormalizedType::Bool);
        assert_eq!(ty("tags"), NormalizedType::String);
        assert!(customers.get_column("id").unwrap().auto_increment);
        assert_eq!(
            customers.get_column("email").unwrap().comment.as_deref(),
            Some("login address")
        );
        assert_eq!(customers.primary_key_columns, vec!["id"]);
        assert!(customers.indexes.iter().any(|i| i.unique && i.columns == vec!["email"]));

        let orders = schema.get_table("orders").unwrap();
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].referenced_table, "customers");
        assert_eq!(orders.foreign_keys[0].columns, vec!["customer_id"]);
        assert!(orders.indexes.iter().any(|i| i.name == "orders_customer_idx"));
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_include_tables() {
        let (_container, url) = setup_postgres_container().await.unwrap();

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        pool.execute("CREATE TABLE a (id INT PRIMARY KEY); CREATE TABLE b (id INT PRIMARY KEY);")
            .await
            .unwrap();
        pool.close().await;

        let schema = engine()
            .load(&url, &TableFilter::new().include(["b"]), &ctx())
            .await
            .unwrap();
        assert_eq!(schema.schema_name.as_deref(), Some("public"));
        assert_eq!(schema.table_names(), vec!["b"]);
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_postgres_wrong_password() {
        let (_container, url) = setup_postgres_container().await.unwrap();
        let url = url.replace("postgres:postgres@", "postgres:wrong-pass@");

        let err = engine()
            .load(&url, &TableFilter::new(), &ctx())
            .await
            .unwrap_err();
        assert!(err.is_inspection_failed());
        assert!(!err.to_string().contains("wrong-pass"));
    }

    // ==========================================
    // MySQL
    // ==========================================

    /// MySQLコンテナを起動して接続文字列を返す
    async fn setup_mysql_container(
    ) -> Result<(ContainerAsync<MysqlImage>, String), Box<dyn std::error::Error>> {
        let container = MysqlImage::default().with_tag("8.0").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(3306).await?;
        let url = format!("mysql://root@{}:{}/test", host, port);

        // MySQL起動待ち
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;

        Ok((container, url))
    }

    #[tokio::test]
    #[ignore] // Docker必須
    async fn test_mysql_catalog() {
        let (_container, url) = setup_mysql_container().await.unwrap();

        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        for statement in [
            "CREATE TABLE users (
                id INT UNSIGNED NOT NULL AUTO_INCREMENT,
                email VARCHAR(255) NOT NULL COMMENT 'login address',
                flag TINYINT(1) NOT NULL DEFAULT 0,
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                PRIMARY KEY (id),
                UNIQUE KEY uk_users_email (email)
            ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4 COMMENT='user accounts'",
            "CREATE TABLE roles (id INT NOT NULL PRIMARY KEY, name VARCHAR(50) NOT NULL)",
            "CREATE TABLE user_roles (
                user_id INT UNSIGNED NOT NULL,
                role_id INT NOT NULL,
                PRIMARY KEY (user_id, role_id),
                CONSTRAINT fk_ur_user FOREIGN KEY (user_id) REFERENCES users (id),
                CONSTRAINT fk_ur_role FOREIGN KEY (role_id) REFERENCES roles (id)
            )",
        ] {
            pool.execute(statement).await.unwrap();
        }
        pool.close().await;

        // Go ドライバー形式のDSNでも同じ接続先になる
        let go_dsn = url.replace("root@", "root@tcp(").replace("/test", ")/test");

        for locator in [url.as_str(), go_dsn.as_str()] {
            let schema = engine()
                .load(locator, &TableFilter::new(), &ctx())
                .await
                .unwrap();

            assert_eq!(schema.dialect, Dialect::MySQL);
            assert_eq!(schema.schema_name.as_deref(), Some("test"));
            // 中間テーブルは除外される
            assert_eq!(schema.table_names(), vec!["roles", "users"]);

            let users = schema.get_table("users").unwrap();
            assert_eq!(users.comment.as_deref(), Some("user accounts"));
            let id = users.get_column("id").unwrap();
            assert_eq!(id.normalized_type, NormalizedType::Uint32);
            assert!(id.auto_increment);
            assert!(id.is_primary_key);
            assert_eq!(
                users.get_column("flag").unwrap().normalized_type,
                NormalizedType::Int32
            );
            assert_eq!(
                users.get_column("status").unwrap().default_value.as_deref(),
                Some("active")
            );
            assert_eq!(
                users.get_column("email").unwrap().comment.as_deref(),
                Some("login address")
            );
            assert!(users
                .indexes
                .iter()
                .any(|i| i.name == "uk_users_email" && i.unique));
        }

        let schema = engine()
            .load(&url, &TableFilter::new().keep_join_tables(true), &ctx())
            .await
            .unwrap();
        let user_roles = schema.get_table("user_roles").unwrap();
        assert!(user_roles.is_join_table());
        assert_eq!(user_roles.foreign_keys.len(), 2);
    }

    // ==========================================
    // SQLite
    // ==========================================

    #[tokio::test]
    async fn test_sqlite_catalog() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());

        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        pool.execute(
            r#"
            CREATE TABLE authors (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                rating REAL DEFAULT 0.0,
                avatar BLOB,
                extra
            );
            CREATE TABLE books (
                id INTEGER PRIMARY KEY,
                author_id INTEGER NOT NULL REFERENCES authors (id),
                isbn VARCHAR(13) NOT NULL UNIQUE,
                title TEXT
            );
            CREATE INDEX books_title_idx ON books (title);
            "#,
        )
        .await
        .unwrap();
        pool.close().await;

        let schema = engine()
            .load(
                &format!("sqlite://{}", path.display()),
                &TableFilter::new(),
                &ctx(),
            )
            .await
            .unwrap();

        assert_eq!(schema.dialect, Dialect::SQLite);
        assert_eq!(schema.schema_name.as_deref(), Some("main"));
        assert_eq!(schema.table_names(), vec!["authors", "books"]);

        let authors = schema.get_table("authors").unwrap();
        let ty = |name: &str| authors.get_column(name).unwrap().normalized_type;
        assert_eq!(ty("id"), NormalizedType::Int64);
        assert_eq!(ty("name"), NormalizedType::String);
        assert_eq!(ty("rating"), NormalizedType::Double);
        assert_eq!(ty("avatar"), NormalizedType::Bytes);
        assert!(authors.get_column("id").unwrap().auto_increment);

        let books = schema.get_table("books").unwrap();
        assert_eq!(books.foreign_keys.len(), 1);
        assert_eq!(books.foreign_keys[0].name, "fk_books_0");
        assert_eq!(books.foreign_keys[0].referenced_table, "authors");
        // UNIQUE制約の自動インデックスは含まれない
        assert_eq!(books.indexes.len(), 1);
        assert_eq!(books.indexes[0].name, "books_title_idx");
    }
}
