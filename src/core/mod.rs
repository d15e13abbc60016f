// Core Domain
// 方言、設定、エラー、インスペクター契約、スキーマモデルなど、I/Oを持たない純粋なドメイン型

pub mod config;
pub mod error;
pub mod inspector;
pub mod schema;
