// ライブインスペクター
//
// 稼働中のデータベースのカタログを読み取り、SchemaSnapshot を組み立てます。
// 接続プールは inspect 呼び出しの内部で作成し、成功・失敗のどちらでも必ず閉じます。

use crate::adapters::connection_string::ConnectionTarget;
use crate::adapters::database::ConnectionPoolService;
use crate::adapters::database_introspector::{
    create_introspector, CatalogRows, DatabaseIntrospector, RawColumnInfo, RawTableInfo,
};
use crate::adapters::type_mapping::normalize_column;
use crate::core::config::{ConnectionSettings, Dialect};
use crate::core::error::{Diagnostic, DiagnosticKind, InspectError};
use crate::core::inspector::{InspectContext, SchemaInspector};
use crate::core::schema::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SchemaSnapshot, TableDescriptor,
};
use async_trait::async_trait;
use sqlx::AnyPool;
use std::future::Future;
use tracing::{debug, info, warn};

/// デッドライン付きでカタログ処理を実行
///
/// デッドライン超過は DeadlineExceeded、sqlxエラーは InspectionFailed に変換します。
pub async fn run_with_deadline<T, F>(
    ctx: &InspectContext,
    dialect: Dialect,
    stage: &str,
    future: F,
) -> Result<T, InspectError>
where
    F: Future<Output = Result<T, InspectError>>,
{
    match ctx.deadline() {
        Some(deadline) => tokio::time::timeout_at(deadline, future)
            .await
            .map_err(|_| InspectError::DeadlineExceeded {
                dialect,
                stage: stage.to_string(),
            })?,
        None => future.await,
    }
}

/// ライブインスペクター
///
/// 方言ごとの DatabaseIntrospector を使ってカタログを読み取ります。
pub struct LiveInspector {
    target: ConnectionTarget,
    pool_service: ConnectionPoolService,
    introspector: Box<dyn DatabaseIntrospector>,
}

impl std::fmt::Debug for LiveInspector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveInspector")
            .field("dialect", &self.target.dialect)
            .field("url", &self.target.redacted_url())
            .field("schema_name", &self.target.schema_name)
            .finish()
    }
}

impl LiveInspector {
    /// 新しいLiveInspectorを作成
    ///
    /// 接続はまだ開きません（inspect 時に開きます）。
    pub fn new(target: ConnectionTarget, settings: ConnectionSettings) -> Result<Self, InspectError> {
        let introspector =
            create_introspector(target.dialect).ok_or_else(|| InspectError::InvalidLocator {
                dialect: target.dialect,
                reason: "dialect has no live catalog".to_string(),
            })?;

        Ok(Self {
            target,
            pool_service: ConnectionPoolService::new(settings),
            introspector,
        })
    }

    /// ロケーターのスキームを除いた部分から作成
    pub fn from_locator(
        dialect: Dialect,
        remainder: &str,
        settings: ConnectionSettings,
    ) -> Result<Self, InspectError> {
        Self::new(ConnectionTarget::parse(dialect, remainder)?, settings)
    }

    /// 接続先を取得
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    /// カタログ処理を1段階実行
    async fn stage<T, F>(
        &self,
        ctx: &InspectContext,
        stage: &str,
        future: F,
    ) -> Result<T, InspectError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        let dialect = self.target.dialect;
        run_with_deadline(ctx, dialect, stage, async {
            future
                .await
                .map_err(|e| InspectError::inspection_failed(dialect, stage, e))
        })
        .await
    }

    /// スキップした行を診断情報として記録
    fn collect_malformed<T>(
        &self,
        rows: CatalogRows<T>,
        table: Option<&str>,
        stage: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<T> {
        for cause in &rows.malformed {
            warn!(
                dialect = %self.target.dialect,
                table = table.unwrap_or(""),
                stage = stage,
                cause = %cause,
                "Skipped unreadable catalog row"
            );
            diagnostics.push(Diagnostic::malformed_row(table, stage, cause));
        }
        rows.items
    }

    /// プールを使ってスナップショットを組み立てる
    async fn read_catalog(
        &self,
        pool: &AnyPool,
        ctx: &InspectContext,
        include_tables: &[String],
    ) -> Result<SchemaSnapshot, InspectError> {
        let schema = self.target.schema_name.as_str();
        let introspector = self.introspector.as_ref();
        let mut snapshot =
            SchemaSnapshot::new(self.target.dialect, Some(self.target.schema_name.clone()));
        let mut diagnostics = Vec::new();

        let tables = self
            .stage(ctx, "tables", introspector.get_tables(pool, schema))
            .await?;
        let tables = self.collect_malformed(tables, None, "tables", &mut diagnostics);

        // 対象外のテーブルはテーブル単位のクエリを発行する前に除外
        let tables: Vec<RawTableInfo> = tables
            .into_iter()
            .filter(|t| include_tables.is_empty() || include_tables.contains(&t.name))
            .collect();

        debug!(
            dialect = %self.target.dialect,
            schema = schema,
            table_count = tables.len(),
            "Reading table catalogs"
        );

        for raw_table in tables {
            let table = self
                .read_table(pool, ctx, schema, raw_table, &mut diagnostics)
                .await?;
            snapshot.upsert_table(table);
        }

        snapshot.diagnostics = diagnostics;
        Ok(snapshot)
    }

    /// 1テーブル分のカタログを読み取る
    async fn read_table(
        &self,
        pool: &AnyPool,
        ctx: &InspectContext,
        schema: &str,
        raw_table: RawTableInfo,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<TableDescriptor, InspectError> {
        let introspector = self.introspector.as_ref();
        let name = raw_table.name.as_str();
        let table_ref = Some(name);

        let columns = self
            .stage(ctx, "columns", introspector.get_columns(pool, schema, name))
            .await?;
        let columns = self.collect_malformed(columns, table_ref, "columns", diagnostics);

        let primary_key = self
            .stage(ctx, "primary key", introspector.get_primary_key(pool, schema, name))
            .await?;
        let primary_key =
            self.collect_malformed(primary_key, table_ref, "primary key", diagnostics);

        let indexes = self
            .stage(ctx, "indexes", introspector.get_indexes(pool, schema, name))
            .await?;
        let indexes = self.collect_malformed(indexes, table_ref, "indexes", diagnostics);

        let foreign_keys = self
            .stage(ctx, "foreign keys", introspector.get_foreign_keys(pool, schema, name))
            .await?;
        let foreign_keys =
            self.collect_malformed(foreign_keys, table_ref, "foreign keys", diagnostics);

        let mut table = TableDescriptor::new(raw_table.name.clone());
        table.comment = raw_table.comment;
        table.charset = raw_table.charset;
        table.collation = raw_table.collation;
        table.columns = columns
            .into_iter()
            .map(|raw| self.build_column(name, raw, diagnostics))
            .collect();

        for column_name in &primary_key {
            table.mark_primary_key(column_name);
        }

        table.indexes = indexes
            .into_iter()
            .map(|raw| IndexDescriptor::new(raw.name, raw.columns, raw.unique))
            .collect();

        table.foreign_keys = foreign_keys
            .into_iter()
            .map(|raw| ForeignKeyDescriptor {
                name: raw.name,
                owner_table: table.name.clone(),
                columns: raw.columns,
                referenced_table: raw.referenced_table,
                referenced_columns: raw.referenced_columns,
            })
            .collect();

        Ok(table)
    }

    /// 生のカラム情報から ColumnDescriptor を作成
    fn build_column(
        &self,
        table: &str,
        raw: RawColumnInfo,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> ColumnDescriptor {
        let normalized = normalize_column(
            self.target.dialect,
            table,
            &raw.name,
            &raw.column_type,
            diagnostics,
        );
        let mut column = ColumnDescriptor::new(raw.name, raw.column_type, normalized);
        column.nullable = raw.is_nullable;
        column.default_value = raw.default_value;
        column.comment = raw.comment;
        column.auto_increment = raw.auto_increment;
        column
    }
}

#[async_trait]
impl SchemaInspector for LiveInspector {
    fn dialect(&self) -> Dialect {
        self.target.dialect
    }

    fn schema_name(&self) -> Option<&str> {
        Some(&self.target.schema_name)
    }

    async fn inspect(
        &self,
        ctx: &InspectContext,
        include_tables: &[String],
    ) -> Result<SchemaSnapshot, InspectError> {
        let dialect = self.target.dialect;

        let pool = run_with_deadline(
            ctx,
            dialect,
            "connect",
            self.pool_service.connect(&self.target),
        )
        .await?;

        let result = self.read_catalog(&pool, ctx, include_tables).await;

        // 成功・失敗にかかわらず接続を解放する
        self.pool_service.close(pool).await;

        match &result {
            Ok(snapshot) => {
                let malformed = snapshot
                    .diagnostics
                    .iter()
                    .filter(|d| d.kind == DiagnosticKind::MalformedRow)
                    .count();
                if malformed > 0 {
                    warn!(
                        dialect = %dialect,
                        skipped_rows = malformed,
                        "Catalog inspection completed with unreadable rows"
                    );
                }
                info!(
                    dialect = %dialect,
                    schema = %self.target.schema_name,
                    tables = snapshot.tables.len(),
                    "Live inspection completed"
                );
            }
            Err(e) => {
                debug!(dialect = %dialect, error = %e, "Live inspection failed");
            }
        }

        result
    }
}
