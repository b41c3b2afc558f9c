//! Name Resolution: canonical identities for tables and views
//!
//! Every spec file names exactly one object through its base name:
//!
//! - `schema.object.yaml` - schema given explicitly
//! - `object.yaml` - schema taken from the configured default
//!
//! The resulting [`Names::ref_name`] is the vertex key used by the dependency
//! graph. It is the full `schema.object` name when the schema was explicit and
//! the bare `object` name otherwise, so a `dependsOn` entry resolves against
//! whichever form the depended-upon object names itself with.

use std::path::Path;

use serde::Serialize;

use crate::error::{SpecGenError, SpecGenResult};

/// Resolved names of one schema object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Names {
    pub name: String,
    pub schema_name: String,
    pub full_name: String,
    pub sql_full_name: String,
    pub ref_name: String,
}

impl Names {
    /// Resolve names from a spec file path
    ///
    /// # Errors
    /// `MalformedName` when the base name has neither two nor three
    /// dot-separated components, or when any component is empty.
    pub fn from_path(path: &Path, default_schema: &str) -> SpecGenResult<Self> {
        let malformed = || SpecGenError::MalformedName {
            path: path.display().to_string(),
        };

        let base = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(malformed)?;
        let parts: Vec<&str> = base.split('.').collect();

        if parts.iter().any(|p| p.is_empty()) {
            return Err(malformed());
        }

        let (schema_name, name, explicit) = match parts.as_slice() {
            [schema, name, _ext] => (*schema, *name, true),
            [name, _ext] => (default_schema, *name, false),
            _ => return Err(malformed()),
        };

        let full_name = format!("{schema_name}.{name}");
        let ref_name = if explicit { full_name.clone() } else { name.to_string() };

        Ok(Self {
            name: name.to_string(),
            schema_name: schema_name.to_string(),
            sql_full_name: format!("{}.{}", quote_ident(schema_name), quote_ident(name)),
            full_name,
            ref_name,
        })
    }
}

/// Target table identifier of a table spec (`schema.table` or `table`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableIdent {
    pub name: String,
    pub schema_name: Option<String>,
    pub table_name: String,
    pub quoted_full_name: String,
}

impl TableIdent {
    /// Parse a table identifier; `Err` carries the violated rule
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("table name required".to_string());
        }

        let parts: Vec<&str> = s.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(format!("invalid table name: {s}"));
        }

        match parts.as_slice() {
            [schema, table] => Ok(Self {
                name: s.to_string(),
                schema_name: Some((*schema).to_string()),
                table_name: (*table).to_string(),
                quoted_full_name: format!("{}.{}", quote_ident(schema), quote_ident(table)),
            }),
            [table] => Ok(Self {
                name: s.to_string(),
                schema_name: None,
                table_name: (*table).to_string(),
                quoted_full_name: quote_ident(table),
            }),
            _ => Err(format!("invalid table name: {s}")),
        }
    }
}

/// Double-quote an identifier for generated SQL
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
