// Services Layer
// ソースの解決、インスペクション、DDL解析、組み立てを行うサービス層

pub mod config_loader;
pub mod ddl_parser;
pub mod driver_registry;
pub mod live_inspector;
pub mod schema_assembler;
pub mod schema_engine;
pub mod sql_splitter;
