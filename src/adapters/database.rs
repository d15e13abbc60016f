// データベース接続アダプター
//
// SQLxの AnyPool を使用して、インスペクション用の接続プールを作成・解放します。
// PostgreSQL、MySQL、SQLiteに対応した統一されたインターフェースを提供します。

use crate::adapters::connection_string::ConnectionTarget;
use crate::core::config::ConnectionSettings;
use crate::core::error::InspectError;
use sqlx::pool::PoolOptions;
use sqlx::{Any, AnyPool};
use std::time::Duration;
use tracing::debug;

/// 接続プールサービス
///
/// 接続設定からプールを作成し、インスペクション終了時に閉じます。
#[derive(Debug, Clone, Default)]
pub struct ConnectionPoolService {
    settings: ConnectionSettings,
}

impl ConnectionPoolService {
    /// 新しいConnectionPoolServiceを作成
    pub fn new(settings: ConnectionSettings) -> Self {
        Self { settings }
    }

    /// 接続設定を取得
    pub fn settings(&self) -> &ConnectionSettings {
        &self.settings
    }

    /// 接続設定からプールオプションを作成
    ///
    /// max_connections, min_connections, acquire_timeout, idle_timeout を反映します。
    pub fn pool_options(&self) -> PoolOptions<Any> {
        let mut opts = PoolOptions::new()
            .max_connections(self.settings.max_connections)
            .acquire_timeout(Duration::from_secs(self.settings.acquire_timeout));

        if let Some(min_conn) = self.settings.min_connections {
            opts = opts.min_connections(min_conn);
        }

        if let Some(idle_secs) = self.settings.idle_timeout {
            opts = opts.idle_timeout(Duration::from_secs(idle_secs));
        }

        opts
    }

    /// 接続プールを作成
    ///
    /// 接続・認証の失敗は stage "connect" の InspectionFailed になります。
    /// エラーメッセージにはパスワードを含めません。
    pub async fn connect(&self, target: &ConnectionTarget) -> Result<AnyPool, InspectError> {
        sqlx::any::install_default_drivers();

        debug!(
            dialect = %target.dialect,
            url = %target.redacted_url(),
            max_connections = self.settings.max_connections,
            "Opening connection pool"
        );

        self.pool_options()
            .connect(&target.url)
            .await
            .map_err(|e| {
                InspectError::inspection_failed(
                    target.dialect,
                    "connect",
                    scrub(&e.to_string(), &target.url, &target.redacted_url()),
                )
            })
    }

    /// 接続プールを閉じる
    pub async fn close(&self, pool: AnyPool) {
        pool.close().await;
        debug!("Connection pool closed");
    }
}

/// ドライバーのエラーメッセージに接続URLが含まれていた場合に秘匿化する
fn scrub(message: &str, url: &str, redacted_url: &str) -> String {
    message.replace(url, redacted_url)
}
