//! DDL rendering for ordered targets
//!
//! Turns an ordering result into the statements that provision or tear down
//! each target, one statement per target, in the same order:
//! - **tables**: `CREATE TABLE IF NOT EXISTS` / `DROP TABLE IF EXISTS`
//! - **views**: `CREATE OR REPLACE VIEW` / `DROP VIEW IF EXISTS`

pub mod create;
pub mod drop;

pub use create::{create_table_sql, create_view_sql};
pub use drop::{drop_table_sql, drop_view_sql};

use crate::error::SpecGenResult;
use crate::project::{Project, Target};

/// Create statements for `order`, typically a create order
pub fn create_statements(project: &Project, order: &[String]) -> SpecGenResult<Vec<String>> {
    order
        .iter()
        .map(|name| {
            Ok(match project.target(name)? {
                Target::Table(t) => create_table_sql(t),
                Target::View(v) => create_view_sql(v),
            })
        })
        .collect()
}

/// Drop statements for `order`, typically a drop order
pub fn drop_statements(project: &Project, order: &[String]) -> SpecGenResult<Vec<String>> {
    order
        .iter()
        .map(|name| {
            Ok(match project.target(name)? {
                Target::Table(t) => drop_table_sql(t),
                Target::View(v) => drop_view_sql(v),
            })
        })
        .collect()
}
