// インスペクター契約
//
// ライブDB・DDLテキストのどちらのソースも、同じ SchemaInspector トレイトを実装します。
// InspectContext は呼び出し全体に渡されるデッドライン（キャンセル）トークンです。

use crate::core::config::Dialect;
use crate::core::error::InspectError;
use crate::core::schema::SchemaSnapshot;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// インスペクション実行コンテキスト
///
/// デッドラインが設定されている場合、ライブインスペクターは
/// ネットワーク待ちのたびにこれを確認します。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InspectContext {
    deadline: Option<Instant>,
}

impl InspectContext {
    /// デッドラインなしのコンテキストを作成
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// 現在時刻からのタイムアウトを設定したコンテキストを作成
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    /// デッドラインを指定してコンテキストを作成
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    /// デッドラインを取得
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// デッドラインを過ぎているかどうか
    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// デッドラインまでの残り時間
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// スキーマインスペクター
///
/// 1回の `inspect` 呼び出しごとに新しい SchemaSnapshot を作成します。
/// 失敗時に部分的なスナップショットを返すことはありません。
#[async_trait]
pub trait SchemaInspector: Send + Sync + std::fmt::Debug {
    /// ソースの方言
    fn dialect(&self) -> Dialect;

    /// 対象スキーマ名（DDLテキストの場合は None）
    fn schema_name(&self) -> Option<&str>;

    /// スキーマを取得
    ///
    /// `include_tables` が空でない場合、ソースが対応していればその集合に絞り込みます。
    async fn inspect(
        &self,
        ctx: &InspectContext,
        include_tables: &[String],
    ) -> Result<SchemaSnapshot, InspectError>;
}
