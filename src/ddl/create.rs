use tracing::debug;

use crate::names::quote_ident;
use crate::schema::{Table, View};

/// `CREATE TABLE` for a table spec
///
/// Columns follow declaration order, regular fields first. Excluded fields
/// are not stored. Declared constraints are appended verbatim.
pub fn create_table_sql(table: &Table) -> String {
    let mut columns: Vec<String> = table
        .stored_columns()
        .map(|(name, sql_type, required)| {
            if required {
                format!("{} {} NOT NULL", quote_ident(name), sql_type)
            } else {
                format!("{} {}", quote_ident(name), sql_type)
            }
        })
        .collect();

    columns.extend(table.constraints.iter().cloned());

    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        table.table.quoted_full_name,
        columns.join(",\n    ")
    );
    debug!("rendered create table for {}", table.names.ref_name);
    sql
}

/// `CREATE OR REPLACE VIEW` for a view spec
pub fn create_view_sql(view: &View) -> String {
    let body = view.sql.trim().trim_end_matches(';').trim_end();
    format!("CREATE OR REPLACE VIEW {} AS\n{}", view.names.sql_full_name, body)
}
