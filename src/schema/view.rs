use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SchemaObject;
use crate::error::{SpecGenError, SpecGenResult};
use crate::names::Names;

/// View spec as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewRecord {
    pub depends_on: Vec<String>,
    /// If set, the view's rows are exported to this destination
    pub export: String,
    pub sql: String,
}

/// Validated view spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub names: Names,
    pub spec_file: PathBuf,
    pub depends_on: Vec<String>,
    pub export: Option<String>,
    pub sql: String,
}

impl View {
    pub fn new(spec_file: &Path, default_schema: &str, record: ViewRecord) -> SpecGenResult<Self> {
        let names = Names::from_path(spec_file, default_schema)?;

        if record.sql.trim().is_empty() {
            return Err(SpecGenError::schema(
                spec_file.display().to_string(),
                "sql cannot be empty",
            ));
        }

        let export = if record.export.trim().is_empty() {
            None
        } else {
            Some(record.export)
        };

        debug!("view spec {}: depends on {:?}", names.ref_name, record.depends_on);

        Ok(Self {
            names,
            spec_file: spec_file.to_path_buf(),
            depends_on: record.depends_on,
            export,
            sql: record.sql,
        })
    }

    pub fn has_export(&self) -> bool {
        self.export.is_some()
    }
}

impl SchemaObject for View {
    fn ref_name(&self) -> &str {
        &self.names.ref_name
    }

    fn depends_on(&self) -> &[String] {
        &self.depends_on
    }

    fn spec_file(&self) -> &Path {
        &self.spec_file
    }
}
