use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use super::{Table, TableRecord, View, ViewRecord};
use crate::config::SPEC_EXTENSIONS;
use crate::error::{SpecGenError, SpecGenResult};

/// List spec files under `root`, recursively, sorted by path
///
/// A missing `root` yields no files.
pub fn list_spec_files(root: &Path) -> SpecGenResult<Vec<PathBuf>> {
    if !root.exists() {
        warn!("spec directory {} does not exist, treating as empty", root.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| SpecGenError::SpecLoadFailed {
            path: e
                .path()
                .map_or_else(|| root.display().to_string(), |p| p.display().to_string()),
            reason: e.to_string(),
        })?;

        let is_spec = entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SPEC_EXTENSIONS.contains(&ext));
        if is_spec {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn read_spec(path: &Path) -> SpecGenResult<String> {
    std::fs::read_to_string(path).map_err(|e| SpecGenError::SpecLoadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn decode<T: serde::de::DeserializeOwned + Default>(path: &Path, contents: &str) -> SpecGenResult<T> {
    // An empty document decodes to YAML null
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(contents).map_err(|e| SpecGenError::SpecLoadFailed {
        path: path.display().to_string(),
        reason: format!("YAML decode error: {e}"),
    })
}

impl Table {
    /// Decode and validate a table spec from YAML text
    pub fn from_yaml(spec_file: &Path, contents: &str, default_schema: &str) -> SpecGenResult<Self> {
        let record: TableRecord = decode(spec_file, contents)?;
        Self::new(spec_file, default_schema, record)
    }

    pub fn from_file(spec_file: &Path, default_schema: &str) -> SpecGenResult<Self> {
        let contents = read_spec(spec_file)?;
        Self::from_yaml(spec_file, &contents, default_schema)
    }
}

impl View {
    /// Decode and validate a view spec from YAML text
    pub fn from_yaml(spec_file: &Path, contents: &str, default_schema: &str) -> SpecGenResult<Self> {
        let record: ViewRecord = decode(spec_file, contents)?;
        Self::new(spec_file, default_schema, record)
    }

    pub fn from_file(spec_file: &Path, default_schema: &str) -> SpecGenResult<Self> {
        let contents = read_spec(spec_file)?;
        Self::from_yaml(spec_file, &contents, default_schema)
    }
}

/// Load every table spec under `dir`; stops at the first invalid one
pub fn load_tables(dir: &Path, default_schema: &str) -> SpecGenResult<Vec<Table>> {
    let tables = list_spec_files(dir)?
        .iter()
        .map(|f| Table::from_file(f, default_schema))
        .collect::<SpecGenResult<Vec<_>>>()?;
    info!("loaded {} table specs from {}", tables.len(), dir.display());
    Ok(tables)
}

/// Load every view spec under `dir`; stops at the first invalid one
pub fn load_views(dir: &Path, default_schema: &str) -> SpecGenResult<Vec<View>> {
    let views = list_spec_files(dir)?
        .iter()
        .map(|f| View::from_file(f, default_schema))
        .collect::<SpecGenResult<Vec<_>>>()?;
    info!("loaded {} view specs from {}", views.len(), dir.display());
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::testing::{assert_error_contains, assert_error_sqlstate};
    use crate::schema::SchemaObject;
    use std::fs;

    const ORDERS: &str = "
source: data/orders.csv
separator: ','
table: sales.orders
dependsOn: [customers]
fields:
  - name: id
    type: integer
    required: true
  - name: placed
    type: date
    timeFormat: '%Y-%m-%d'
  - name: note
    type: text
    length: 80
computedFields:
  - name: year
    type: smallint
    computeFn: PlacedYear
constraints:
  - PRIMARY KEY (id)
";

    #[test]
    fn test_table_from_yaml() {
        let t = Table::from_yaml(Path::new("tables/orders.yaml"), ORDERS, "public").unwrap();

        assert_eq!(t.ref_name(), "orders");
        assert_eq!(t.depends_on(), ["customers".to_string()]);
        assert_eq!(t.fields.len(), 3);
        assert_eq!(t.fields[2].length, Some(80));
        assert_eq!(t.computed_fields[0].compute_fn, "PlacedYear");
        assert_eq!(t.constraints, vec!["PRIMARY KEY (id)".to_string()]);
    }

    #[test]
    fn test_yaml_errors_name_the_file() {
        let result = Table::from_yaml(Path::new("tables/orders.yaml"), "fields: [", "public");
        assert_error_sqlstate(result, "58030");

        let result = View::from_yaml(Path::new("views/v.yaml"), "sql: [1, 2", "public");
        assert_error_contains(result, "views/v.yaml");
    }

    #[test]
    fn test_empty_view_file_fails_validation() {
        let result = View::from_yaml(Path::new("views/v.yaml"), "", "public");
        assert_error_contains(result, "sql cannot be empty");
    }

    #[test]
    fn test_list_and_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        let tables = dir.path().join("tables");
        let nested = tables.join("sales");
        fs::create_dir_all(&nested).unwrap();

        fs::write(tables.join("customers.yml"), "separator: ';'\ntable: customers\n").unwrap();
        fs::write(nested.join("orders.yaml"), ORDERS).unwrap();
        fs::write(tables.join("README.md"), "not a spec").unwrap();

        let files = list_spec_files(&tables).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("customers.yml"));
        assert!(files[1].ends_with("sales/orders.yaml"));

        let loaded = load_tables(&tables, "public").unwrap();
        let names: Vec<&str> = loaded.iter().map(|t| t.ref_name()).collect();
        assert_eq!(names, vec!["customers", "orders"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let views = load_views(&dir.path().join("views"), "public").unwrap();
        assert!(views.is_empty());
    }
}
