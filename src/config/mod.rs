use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{SpecGenError, SpecGenResult};

/// Schema assigned to objects whose spec file name omits one
pub const DEFAULT_SCHEMA: &str = "public";

/// Directory (under the project root) holding table specs
pub const TABLES_DIR: &str = "tables";

/// Directory (under the project root) holding view specs
pub const VIEWS_DIR: &str = "views";

/// File extensions recognised as spec files
pub const SPEC_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Longest cycle spelled out in a `CyclicDependency` error
pub const MAX_REPORTED_CYCLE_LEN: usize = 32;

/// Generator settings, usually read from a YAML file next to the specs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Import path of the generated code's root package
    pub base_import_path: String,
    /// Directory containing `tables/` and `views/`
    pub root_dir: PathBuf,
    /// Schema for spec files named `object.yaml`
    pub default_schema: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_import_path: String::new(),
            root_dir: PathBuf::from("."),
            default_schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl GeneratorConfig {
    /// Read a config file; missing keys take their defaults
    pub fn from_yaml_file(path: &Path) -> SpecGenResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| SpecGenError::SpecLoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&path.display().to_string(), &contents)
    }

    pub fn from_yaml_str(source: &str, contents: &str) -> SpecGenResult<Self> {
        serde_yaml::from_str(contents).map_err(|e| SpecGenError::SpecLoadFailed {
            path: source.to_string(),
            reason: e.to_string(),
        })
    }

    /// Configured default schema, falling back to [`DEFAULT_SCHEMA`] when blank
    pub fn effective_default_schema(&self) -> &str {
        if self.default_schema.trim().is_empty() {
            DEFAULT_SCHEMA
        } else {
            &self.default_schema
        }
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.root_dir.join(TABLES_DIR)
    }

    pub fn views_dir(&self) -> PathBuf {
        self.root_dir.join(VIEWS_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.effective_default_schema(), "public");
        assert_eq!(cfg.tables_dir(), PathBuf::from("./tables"));
        assert_eq!(cfg.views_dir(), PathBuf::from("./views"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = GeneratorConfig::from_yaml_str(
            "gen.yaml",
            "baseImportPath: github.com/acme/warehouse\nrootDir: specs\n",
        )
        .unwrap();

        assert_eq!(cfg.base_import_path, "github.com/acme/warehouse");
        assert_eq!(cfg.root_dir, PathBuf::from("specs"));
        assert_eq!(cfg.effective_default_schema(), "public");
    }

    #[test]
    fn test_blank_default_schema_falls_back() {
        let cfg = GeneratorConfig::from_yaml_str("gen.yaml", "defaultSchema: ''\n").unwrap();
        assert_eq!(cfg.effective_default_schema(), DEFAULT_SCHEMA);

        let cfg = GeneratorConfig::from_yaml_str("gen.yaml", "defaultSchema: staging\n").unwrap();
        assert_eq!(cfg.effective_default_schema(), "staging");
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("specgen.yaml");
        std::fs::write(&path, "rootDir: warehouse\ndefaultSchema: raw\n").unwrap();

        let cfg = GeneratorConfig::from_yaml_file(&path).unwrap();
        assert_eq!(cfg.tables_dir(), PathBuf::from("warehouse/tables"));
        assert_eq!(cfg.effective_default_schema(), "raw");

        let missing = GeneratorConfig::from_yaml_file(&dir.path().join("absent.yaml"));
        let err = missing.unwrap_err();
        assert_eq!(err.sqlstate(), "58030");
        assert!(err.to_string().contains("absent.yaml"));
    }

    #[test]
    fn test_bad_yaml_reports_source() {
        let err = GeneratorConfig::from_yaml_str("gen.yaml", "rootDir: [unterminated").unwrap_err();
        assert_eq!(err.sqlstate(), "58030");
        assert!(err.to_string().starts_with("gen.yaml"));
    }
}
