use crate::schema::{Table, View};

/// `DROP TABLE IF EXISTS` for a table spec
///
/// No `CASCADE`: dependents are dropped first by the drop order.
pub fn drop_table_sql(table: &Table) -> String {
    format!("DROP TABLE IF EXISTS {}", table.table.quoted_full_name)
}

pub fn drop_view_sql(view: &View) -> String {
    format!("DROP VIEW IF EXISTS {}", view.names.sql_full_name)
}
