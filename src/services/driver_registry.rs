// ドライバーレジストリ
//
// ソースロケーターのスキームと、インスペクターを生成するファクトリを対応付けます。
// 登録は起動時に一度だけ行い、以降は読み取り専用として扱います。

use crate::adapters::connection_string::{redact, split_scheme};
use crate::core::config::{ConnectionSettings, Dialect};
use crate::core::error::InspectError;
use crate::core::inspector::SchemaInspector;
use crate::services::ddl_parser::DdlTextInspector;
use crate::services::live_inspector::LiveInspector;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// エラーメッセージに含めるロケーターの最大文字数
const MAX_LOCATOR_DISPLAY: usize = 80;

/// インスペクターファクトリ
///
/// ロケーターからスキームと `://` を除いた残りを受け取ります。
pub type InspectorFactory =
    dyn Fn(&str) -> Result<Box<dyn SchemaInspector>, InspectError> + Send + Sync;

/// ドライバーレジストリ
#[derive(Default)]
pub struct DriverRegistry {
    factories: HashMap<String, Arc<InspectorFactory>>,
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl DriverRegistry {
    /// 空のレジストリを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 標準のスキームを登録したレジストリを作成
    ///
    /// - `mysql` → MySQL ライブインスペクター
    /// - `postgres`, `postgresql` → PostgreSQL ライブインスペクター
    /// - `sqlite` → SQLite ライブインスペクター
    /// - `text` → DDLテキスト（読み取り可能なファイルならパス）
    /// - `file` → DDLファイル
    pub fn with_defaults(settings: ConnectionSettings) -> Self {
        let mut registry = Self::new();

        for (schemes, dialect) in [
            (&["mysql"][..], Dialect::MySQL),
            (&["postgres", "postgresql"][..], Dialect::PostgreSQL),
            (&["sqlite"][..], Dialect::SQLite),
        ] {
            let settings = settings.clone();
            registry.register(schemes, move |remainder| {
                let inspector = LiveInspector::from_locator(dialect, remainder, settings.clone())?;
                Ok(Box::new(inspector) as Box<dyn SchemaInspector>)
            });
        }

        registry.register(&["text"], |remainder| {
            Ok(Box::new(DdlTextInspector::new(remainder)) as Box<dyn SchemaInspector>)
        });
        registry.register(&["file"], |remainder| {
            Ok(Box::new(DdlTextInspector::from_file(remainder)) as Box<dyn SchemaInspector>)
        });

        registry
    }

    /// スキームにファクトリを登録
    ///
    /// スキームは大文字小文字を区別しません。既存の登録は上書きされます。
    pub fn register<F>(&mut self, schemes: &[&str], factory: F)
    where
        F: Fn(&str) -> Result<Box<dyn SchemaInspector>, InspectError> + Send + Sync + 'static,
    {
        let factory: Arc<InspectorFactory> = Arc::new(factory);
        for scheme in schemes {
            self.factories
                .insert(scheme.to_ascii_lowercase(), Arc::clone(&factory));
        }
    }

    /// スキームが登録済みかどうか
    pub fn is_registered(&self, scheme: &str) -> bool {
        self.factories.contains_key(&scheme.to_ascii_lowercase())
    }

    /// 登録済みのスキーム一覧（昇順）
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// ロケーターからインスペクターを解決
    ///
    /// # Errors
    ///
    /// `://` を含まない、または未登録のスキームの場合は `UnsupportedDialect`。
    /// ファクトリが返したエラー（不正なDSNなど）はそのまま返します。
    pub fn resolve(&self, locator: &str) -> Result<Box<dyn SchemaInspector>, InspectError> {
        let (scheme, remainder) =
            split_scheme(locator).ok_or_else(|| InspectError::UnsupportedDialect {
                scheme: String::new(),
                locator: display_locator(locator),
            })?;

        let factory = self
            .factories
            .get(&scheme.to_ascii_lowercase())
            .ok_or_else(|| InspectError::UnsupportedDialect {
                scheme: scheme.to_string(),
                locator: display_locator(locator),
            })?;

        factory(remainder)
    }
}

/// エラー表示用にロケーターを秘匿化・短縮
fn display_locator(locator: &str) -> String {
    let redacted = redact(locator.trim());
    let first_line = redacted.lines().next().unwrap_or("");
    if first_line.chars().count() > MAX_LOCATOR_DISPLAY || first_line.len() < redacted.len() {
        let truncated: String = first_line.chars().take(MAX_LOCATOR_DISPLAY).collect();
        format!("{}...", truncated)
    } else {
        first_line.to_string()
    }
}
