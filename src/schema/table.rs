use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{FieldType, ValueKind};
use super::SchemaObject;
use crate::error::{SpecGenError, SpecGenResult};
use crate::names::{Names, TableIdent};

/// Field of a table spec as written in YAML
///
/// Several fields may read the same source `column` under different names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldRecord {
    pub name: String,
    /// Column name in the source file; defaults to `name`
    pub column: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub required: bool,
    /// chrono strftime layout; required for date/time types
    pub time_format: String,
    /// Read the value (e.g. for computed fields) but do not store it
    pub exclude: bool,
    /// Function applied to this field's own value, `fn(T) -> T`
    pub compute_fn: String,
    pub validation: Vec<String>,
    /// `varchar(length)` instead of `text`
    pub length: Option<u32>,
}

/// Computed field of a table spec as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedFieldRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    /// Function computing the value from the whole row
    pub compute_fn: String,
    pub required: bool,
    pub exclude: bool,
    pub validation: Vec<String>,
}

/// Table spec as written in YAML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableRecord {
    pub source: String,
    pub separator: String,
    pub fields: Vec<FieldRecord>,
    /// Package providing the `computeFn` functions
    pub compute_package: String,
    pub computed_fields: Vec<ComputedFieldRecord>,
    /// Target table, `schema.table` or `table`
    pub table: String,
    pub depends_on: Vec<String>,
    /// Table constraints in `CREATE TABLE` syntax
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    pub column: String,
    pub field_type: FieldType,
    pub required: bool,
    pub time_format: Option<String>,
    pub exclude: bool,
    pub compute_fn: Option<String>,
    pub validation: Vec<String>,
    pub length: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedField {
    pub name: String,
    pub field_type: FieldType,
    pub compute_fn: String,
    pub required: bool,
    pub exclude: bool,
    pub validation: Vec<String>,
}

/// What a compute function receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ComputeInput {
    /// The field's own value
    Value { kind: ValueKind, nullable: bool },
    /// The whole row, keyed by field name
    Row,
}

/// Signature a compute function must have, shared by all its uses in a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeFn {
    pub name: String,
    pub input: ComputeInput,
    pub output: ValueKind,
    pub output_nullable: bool,
}

/// Validated table spec
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub names: Names,
    pub spec_file: PathBuf,
    pub source: String,
    pub separator: char,
    pub fields: Vec<Field>,
    pub compute_package: Option<String>,
    pub computed_fields: Vec<ComputedField>,
    pub compute_fns: Vec<ComputeFn>,
    pub table: TableIdent,
    pub depends_on: Vec<String>,
    pub constraints: Vec<String>,
}

impl Table {
    /// Build a table from its decoded spec record
    ///
    /// Checks, in order: name, separator, fields, computed fields, duplicate
    /// names, compute function signatures, target table.
    ///
    /// # Errors
    /// `MalformedName` for a bad spec file name, `SchemaValidation` for any
    /// rule violation. Both name the spec file.
    pub fn new(spec_file: &Path, default_schema: &str, record: TableRecord) -> SpecGenResult<Self> {
        let names = Names::from_path(spec_file, default_schema)?;
        let spec = spec_file.display().to_string();
        let invalid = |rule: String| SpecGenError::schema(spec.clone(), rule);

        if names.name.is_empty() {
            return Err(invalid("name is required".to_string()));
        }

        let separator = single_char(&record.separator)
            .ok_or_else(|| invalid("separator must be a single character".to_string()))?;

        let fields = record
            .fields
            .into_iter()
            .map(validate_field)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let computed_fields = record
            .computed_fields
            .into_iter()
            .map(validate_computed_field)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        check_duplicate_field_names(&fields, &computed_fields).map_err(invalid)?;
        let compute_fns = collect_compute_fns(&fields, &computed_fields).map_err(invalid)?;

        let table = TableIdent::parse(&record.table).map_err(invalid)?;

        debug!(
            "table spec {}: {} fields, {} computed, depends on {:?}",
            names.ref_name,
            fields.len(),
            computed_fields.len(),
            record.depends_on
        );

        Ok(Self {
            names,
            spec_file: spec_file.to_path_buf(),
            source: record.source,
            separator,
            fields,
            compute_package: non_empty(record.compute_package),
            computed_fields,
            compute_fns,
            table,
            depends_on: record.depends_on,
            constraints: record.constraints,
        })
    }

    /// Fields and computed fields stored in the table, in declaration order
    pub fn stored_columns(&self) -> impl Iterator<Item = (&str, String, bool)> + '_ {
        let regular = self
            .fields
            .iter()
            .filter(|f| !f.exclude)
            .map(|f| (f.name.as_str(), f.field_type.sql_type(f.length), f.required));
        let computed = self
            .computed_fields
            .iter()
            .filter(|f| !f.exclude)
            .map(|f| (f.name.as_str(), f.field_type.sql_type(None), f.required));
        regular.chain(computed)
    }

    pub fn has_validation(&self) -> bool {
        self.fields.iter().any(|f| !f.validation.is_empty())
            || self.computed_fields.iter().any(|f| !f.validation.is_empty())
    }
}

impl SchemaObject for Table {
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

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn parse_type(field: &str, raw: &str, what: &str) -> Result<FieldType, String> {
    if raw.trim().is_empty() {
        return Err(format!("validating {what} '{field}': type required"));
    }
    FieldType::parse(raw).ok_or_else(|| format!("validating {what} '{field}': invalid type '{raw}'"))
}

/// A layout is usable if it has at least one specifier and no bad ones
fn valid_time_format(layout: &str) -> bool {
    let items: Vec<Item<'_>> = StrftimeItems::new(layout).collect();
    let has_specifier = items
        .iter()
        .any(|i| matches!(i, Item::Numeric(..) | Item::Fixed(..)));
    has_specifier && !items.iter().any(|i| matches!(i, Item::Error))
}

fn validate_field(f: FieldRecord) -> Result<Field, String> {
    if f.name.is_empty() {
        return Err("name is required".to_string());
    }

    let field_type = parse_type(&f.name, &f.field_type, "field")?;

    let time_format = non_empty(f.time_format);
    if field_type.requires_time_format() {
        match &time_format {
            None => {
                return Err(format!("validating field '{}': timeFormat must not be empty", f.name));
            }
            Some(layout) if !valid_time_format(layout) => {
                return Err(format!(
                    "validating field '{}': invalid timeFormat '{}'",
                    f.name, layout
                ));
            }
            Some(_) => {}
        }
    }

    if f.length.is_some() && !field_type.accepts_length() {
        return Err(format!(
            "validating field '{}': length is only allowed on text types, not '{}'",
            f.name, field_type
        ));
    }
    if let (Some(length), Some(declared)) = (f.length, field_type.declared_length()) {
        return Err(format!(
            "validating field '{}': length {} conflicts with type '{}' which already declares {}",
            f.name, length, field_type, declared
        ));
    }

    let column = if f.column.is_empty() { f.name.clone() } else { f.column };

    Ok(Field {
        name: f.name,
        column,
        field_type,
        required: f.required,
        time_format,
        exclude: f.exclude,
        compute_fn: non_empty(f.compute_fn),
        validation: f.validation,
        length: f.length,
    })
}

fn validate_computed_field(f: ComputedFieldRecord) -> Result<ComputedField, String> {
    if f.name.is_empty() {
        return Err("name is required".to_string());
    }

    let field_type = parse_type(&f.name, &f.field_type, "computed field")?;

    if f.compute_fn.trim().is_empty() {
        return Err(format!(
            "validating computed field '{}': computeFn is required",
            f.name
        ));
    }

    Ok(ComputedField {
        name: f.name,
        field_type,
        compute_fn: f.compute_fn,
        required: f.required,
        exclude: f.exclude,
        validation: f.validation,
    })
}

fn check_duplicate_field_names(fields: &[Field], computed: &[ComputedField]) -> Result<(), String> {
    let mut seen = HashSet::new();

    for f in fields {
        if !seen.insert(f.name.as_str()) {
            return Err(format!("duplicate field name: '{}'", f.name));
        }
    }

    for f in computed {
        if !seen.insert(f.name.as_str()) {
            return Err(format!("duplicate computed field name: '{}'", f.name));
        }
    }

    Ok(())
}

/// Collect compute functions, rejecting a function used with two signatures
fn collect_compute_fns(fields: &[Field], computed: &[ComputedField]) -> Result<Vec<ComputeFn>, String> {
    let mut fns: Vec<ComputeFn> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();

    let regular = fields.iter().filter_map(|f| {
        f.compute_fn.as_ref().map(|name| {
            let kind = f.field_type.value_kind();
            let nullable = !f.required;
            let sig = ComputeFn {
                name: name.clone(),
                input: ComputeInput::Value { kind, nullable },
                output: kind,
                output_nullable: nullable,
            };
            ("field", f.name.as_str(), sig)
        })
    });

    let rows = computed.iter().map(|f| {
        let sig = ComputeFn {
            name: f.compute_fn.clone(),
            input: ComputeInput::Row,
            output: f.field_type.value_kind(),
            output_nullable: !f.required,
        };
        ("computed field", f.name.as_str(), sig)
    });

    for (what, field, sig) in regular.chain(rows) {
        match by_name.get(&sig.name) {
            Some(&idx) if fns[idx] != sig => {
                return Err(format!(
                    "{what} '{field}': computeFn '{}' already used with a different type",
                    sig.name
                ));
            }
            Some(_) => {}
            None => {
                by_name.insert(sig.name.clone(), fns.len());
                fns.push(sig);
            }
        }
    }

    Ok(fns)
}
