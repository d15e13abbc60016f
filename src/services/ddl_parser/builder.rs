// スナップショットビルダー
//
// 構文木を SchemaSnapshot に変換します。
// 制約が参照するカラムはテーブル内のカラム定義に解決し、
// 解決できない名前は診断情報として記録して制約から除外します。

use super::ast::{
    ColumnConstraint, ColumnDef, CreateTable, DefaultValue, Statement, TableConstraint,
    TableElement, TableOption,
};
use crate::adapters::type_mapping::{normalize_column, NativeTypeSpec};
use crate::core::config::Dialect;
use crate::core::error::{Diagnostic, DiagnosticKind};
use crate::core::schema::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SchemaSnapshot, TableDescriptor,
};
use tracing::debug;

/// 自動採番を意味する型（serial系）
const SERIAL_TYPES: &[&str] = &[
    "SERIAL",
    "SMALLSERIAL",
    "BIGSERIAL",
    "SERIAL2",
    "SERIAL4",
    "SERIAL8",
];

/// ステートメントを順に適用してスナップショットを組み立てる
pub(super) struct SnapshotBuilder {
    snapshot: SchemaSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: SchemaSnapshot::new(Dialect::LiteralDdl, None),
        }
    }

    pub fn apply(&mut self, statement_index: usize, statement: Statement) {
        match statement {
            Statement::CreateTable(create) => self.apply_create_table(statement_index, create),
            Statement::DerivedTable { name, form } => {
                let table = name.name().to_string();
                debug!(
                    statement_index = statement_index,
                    table = %table,
                    form = %form,
                    "Ignored CREATE TABLE without column definitions"
                );
                self.snapshot.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::IgnoredStatement,
                        format!(
                            "statement {}: CREATE TABLE ... {} has no column definitions",
                            statement_index, form
                        ),
                    )
                    .with_table(&table),
                );
            }
            Statement::Ignored { keyword } => {
                debug!(
                    statement_index = statement_index,
                    keyword = %keyword,
                    "Ignored non-table statement"
                );
            }
        }
    }

    fn apply_create_table(&mut self, statement_index: usize, create: CreateTable) {
        let mut diagnostics = Vec::new();
        let table = build_table(create, &mut diagnostics);
        let name = table.name.clone();

        let replaced = self.snapshot.get_table(&name).is_some();
        if replaced {
            // 置き換えられる定義の診断は残さない
            self.snapshot
                .diagnostics
                .retain(|d| d.table.as_deref() != Some(name.as_str()));
        }

        self.snapshot.diagnostics.extend(diagnostics);
        self.snapshot.upsert_table(table);

        if replaced {
            debug!(
                statement_index = statement_index,
                table = %name,
                "Duplicate table definition replaced the earlier one"
            );
            self.snapshot.diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::IgnoredStatement,
                    format!(
                        "statement {}: table is defined more than once, the earlier definition was replaced",
                        statement_index
                    ),
                )
                .with_table(&name),
            );
        }
    }

    pub fn finish(self) -> SchemaSnapshot {
        self.snapshot
    }
}

/// CREATE TABLE から TableDescriptor を作成
fn build_table(create: CreateTable, diagnostics: &mut Vec<Diagnostic>) -> TableDescriptor {
    let mut table = TableDescriptor::new(create.name.name());

    for option in create.options {
        match option {
            TableOption::Comment(comment) => table.comment = Some(comment),
            TableOption::Charset(charset) => table.charset = Some(charset),
            TableOption::Collate(collation) => table.collation = Some(collation),
        }
    }

    let mut primary_key = Vec::new();
    let mut table_constraints = Vec::new();

    for element in create.elements {
        match element {
            TableElement::Column(def) => add_column(&mut table, def, &mut primary_key, diagnostics),
            TableElement::Constraint(constraint) => table_constraints.push(constraint),
        }
    }

    // テーブル制約はすべてのカラムが揃ってから解決する
    for constraint in table_constraints {
        match constraint {
            TableConstraint::PrimaryKey { columns, .. } => {
                primary_key.extend(resolve_columns(&table, &columns, "primary key", diagnostics));
            }
            TableConstraint::ForeignKey {
                name,
                columns,
                reference,
            } => {
                let columns = resolve_columns(&table, &columns, "foreign key", diagnostics);
                if columns.is_empty() {
                    continue;
                }
                let name = name.unwrap_or_else(|| foreign_key_name(&table.name, &columns));
                table.foreign_keys.push(ForeignKeyDescriptor {
                    name,
                    owner_table: table.name.clone(),
                    columns,
                    referenced_table: reference.table.name().to_string(),
                    referenced_columns: reference.columns,
                });
            }
            TableConstraint::Unique { name, columns } => {
                add_index(&mut table, name, &columns, true, diagnostics);
            }
            TableConstraint::Index { name, columns, .. } => {
                add_index(&mut table, name, &columns, false, diagnostics);
            }
            TableConstraint::Check { .. } | TableConstraint::Other => {}
        }
    }

    for column_name in &primary_key {
        table.mark_primary_key(column_name);
    }

    table
}

/// カラム定義を追加（インライン制約もここで反映）
fn add_column(
    table: &mut TableDescriptor,
    def: ColumnDef,
    primary_key: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let normalized = normalize_column(
        Dialect::LiteralDdl,
        &table.name,
        &def.name,
        &def.data_type,
        diagnostics,
    );
    let mut column = ColumnDescriptor::new(def.name.clone(), def.data_type.clone(), normalized);
    column.auto_increment = is_serial_type(&def.data_type);

    for constraint in def.constraints {
        match constraint {
            ColumnConstraint::NotNull => column.nullable = false,
            ColumnConstraint::Null => column.nullable = true,
            ColumnConstraint::Default(DefaultValue::Null) => column.default_value = None,
            ColumnConstraint::Default(DefaultValue::Literal(value))
            | ColumnConstraint::Default(DefaultValue::Expression(value)) => {
                column.default_value = Some(value)
            }
            ColumnConstraint::Comment(comment) => column.comment = Some(comment),
            ColumnConstraint::PrimaryKey => primary_key.push(def.name.clone()),
            ColumnConstraint::Unique => table.indexes.push(IndexDescriptor::new(
                def.name.clone(),
                vec![def.name.clone()],
                true,
            )),
            ColumnConstraint::AutoIncrement => column.auto_increment = true,
            ColumnConstraint::References(reference) => {
                let columns = vec![def.name.clone()];
                table.foreign_keys.push(ForeignKeyDescriptor {
                    name: foreign_key_name(&table.name, &columns),
                    owner_table: table.name.clone(),
                    columns,
                    referenced_table: reference.table.name().to_string(),
                    referenced_columns: reference.columns,
                });
            }
            ColumnConstraint::Generated
            | ColumnConstraint::Check
            | ColumnConstraint::Collate(_)
            | ColumnConstraint::CharacterSet(_)
            | ColumnConstraint::OnUpdate(_) => {}
        }
    }

    table.columns.push(column);
}

/// インデックス・ユニーク制約を追加
///
/// 名前がない場合は先頭カラム名を使います。
fn add_index(
    table: &mut TableDescriptor,
    name: Option<String>,
    columns: &[String],
    unique: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let context = if unique { "unique constraint" } else { "index" };
    let columns = resolve_columns(table, columns, context, diagnostics);
    let Some(first) = columns.first() else {
        return;
    };
    let name = name.unwrap_or_else(|| first.clone());
    table.indexes.push(IndexDescriptor::new(name, columns, unique));
}

/// 制約のカラム名をカラム定義に解決（大文字小文字を無視）
fn resolve_columns(
    table: &TableDescriptor,
    names: &[String],
    context: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        match table.resolve_column_name(name) {
            Some(column) => resolved.push(column.to_string()),
            None => diagnostics.push(
                Diagnostic::new(
                    DiagnosticKind::UnresolvedColumn,
                    format!("{} references unknown column '{}'", context, name),
                )
                .with_table(&table.name)
                .with_column(name),
            ),
        }
    }
    resolved
}

fn foreign_key_name(table: &str, columns: &[String]) -> String {
    format!("{}_{}_fkey", table, columns.join("_"))
}

fn is_serial_type(data_type: &str) -> bool {
    let spec = NativeTypeSpec::parse(data_type);
    SERIAL_TYPES.contains(&spec.base.as_str())
}
