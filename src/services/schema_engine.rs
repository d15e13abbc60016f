// スキーマエンジン
//
// ソースロケーターの解決 → インスペクション → 組み立て までを1回の呼び出しで行う窓口。

use crate::adapters::connection_string::{redact, split_scheme};
use crate::core::config::ConnectionSettings;
use crate::core::error::InspectError;
use crate::core::inspector::{InspectContext, SchemaInspector};
use crate::services::ddl_parser::DdlTextInspector;
use crate::services::driver_registry::DriverRegistry;
use crate::services::schema_assembler::{assemble, AssembledSchema, TableFilter};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// ソースロケーター
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocator {
    /// スキーム付きの接続文字列（`mysql://...`, `text://...` など）
    Dsn(String),
    /// スキームを持たない値（DDLテキストまたはDDLファイルのパス）
    LiteralDdl(String),
}

impl SourceLocator {
    /// 文字列を分類
    ///
    /// 最初の `://` より前が有効なスキームであればDSN、それ以外はDDLとして扱います。
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if split_scheme(trimmed).is_some() {
            SourceLocator::Dsn(trimmed.to_string())
        } else {
            SourceLocator::LiteralDdl(value.to_string())
        }
    }

    pub fn is_dsn(&self) -> bool {
        matches!(self, SourceLocator::Dsn(_))
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocator::Dsn(dsn) => write!(f, "{}", redact(dsn)),
            SourceLocator::LiteralDdl(value) => {
                if value.contains('\n') || value.len() > 80 {
                    write!(f, "<inline DDL, {} bytes>", value.len())
                } else {
                    write!(f, "{}", value)
                }
            }
        }
    }
}

/// スキーマエンジン
///
/// レジストリは起動時に一度だけ構築し、複数の呼び出しで共有します。
#[derive(Debug, Clone)]
pub struct SchemaEngine {
    registry: Arc<DriverRegistry>,
}

impl SchemaEngine {
    pub fn new(registry: Arc<DriverRegistry>) -> Self {
        Self { registry }
    }

    /// 標準のスキームを登録したエンジンを作成
    pub fn with_defaults(settings: ConnectionSettings) -> Self {
        Self::new(Arc::new(DriverRegistry::with_defaults(settings)))
    }

    pub fn registry(&self) -> &DriverRegistry {
        &self.registry
    }

    /// ロケーターに対応するインスペクターを作成
    ///
    /// スキームを持たない値はレジストリを経由せずDDLテキストインスペクターに渡します。
    pub fn open(&self, locator: &SourceLocator) -> Result<Box<dyn SchemaInspector>, InspectError> {
        match locator {
            SourceLocator::Dsn(dsn) => self.registry.resolve(dsn),
            SourceLocator::LiteralDdl(value) => Ok(Box::new(DdlTextInspector::new(value.as_str()))),
        }
    }

    /// ソースを読み取り、フィルター適用済みのスキーマを返す
    ///
    /// # Errors
    ///
    /// ロケーターの解決、インスペクション、DDL解析のいずれかが失敗した場合
    pub async fn load(
        &self,
        locator: &str,
        filter: &TableFilter,
        ctx: &InspectContext,
    ) -> Result<AssembledSchema, InspectError> {
        let locator = SourceLocator::parse(locator);
        let inspector = self.open(&locator)?;

        info!(
            dialect = %inspector.dialect(),
            source = %locator,
            "Inspecting schema source"
        );

        let snapshot = inspector.inspect(ctx, &filter.include).await?;
        Ok(assemble(snapshot, filter))
    }
}
