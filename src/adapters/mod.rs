// Adapters
// データベース接続、カタログクエリ、接続文字列、型マッピングなど方言ごとの差異を吸収する層

pub mod connection_string;
pub mod database;
pub mod database_introspector;
pub mod type_mapping;
