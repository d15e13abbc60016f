// schemalensライブラリのエントリーポイント
//
// モジュール構造:
// - cli: CLIレイヤー（ユーザー入力の受付とコマンドルーティング）
// - core: コアドメインモデル（スキーマ表現、方言、エラー、インスペクター契約）
// - adapters: データベース接続、カタログ読み取り、型マッピング
// - services: DDL解析、ドライバーレジストリ、スキーマ組み立て

pub mod adapters;
pub mod cli;
pub mod core;
pub mod services;
