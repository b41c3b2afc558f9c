use std::fmt;

pub mod testing;

/// Main error type for pg_specgen
#[derive(Debug, Clone, PartialEq)]
pub enum SpecGenError {
    // ============ Naming Errors (42602) ============
    /// Spec file base name is neither `schema.object.ext` nor `object.ext`
    MalformedName {
        path: String,
    },

    // ============ Schema Errors (42P16) ============
    /// A table or view spec violates a schema rule
    SchemaValidation {
        spec: String,
        rule: String,
    },

    /// Two objects resolve to the same target name
    DuplicateTarget {
        name: String,
        spec: String,
    },

    /// Two tables provision the same database table
    DuplicateTableName {
        table: String,
        spec: String,
    },

    // ============ Dependency Errors (55xxx / 42704) ============
    /// Edge or scoped query references a name outside the vertex universe
    UnknownTarget {
        name: String,
    },

    /// Dependency declarations do not form a DAG
    CyclicDependency {
        cycle: Vec<String>,
    },

    // ============ I/O and System Errors (58xxx / XX000) ============
    /// Reading or decoding a spec file failed
    SpecLoadFailed {
        path: String,
        reason: String,
    },

    /// Serialization of a plan failed
    SerializationError {
        message: String,
    },

    /// Internal error (bug in pg_specgen)
    InternalError {
        message: String,
        file: &'static str,
        line: u32,
    },
}

impl SpecGenError {
    /// Get PostgreSQL SQLSTATE code for this error
    pub fn sqlstate(&self) -> &'static str {
        use SpecGenError::*;
        match self {
            MalformedName { .. } => "42602", // Invalid name

            SchemaValidation { .. } => "42P16", // Invalid table definition
            DuplicateTarget { .. } => "42710", // Duplicate object
            DuplicateTableName { .. } => "42P07", // Duplicate table

            UnknownTarget { .. } => "42704", // Undefined object
            CyclicDependency { .. } => "55P03", // Lock not available (cycle)

            SpecLoadFailed { .. } => "58030", // I/O error
            SerializationError { .. } => "XX000",
            InternalError { .. } => "XX000",
        }
    }

    /// Create internal error with file/line info
    pub fn internal(message: String, file: &'static str, line: u32) -> Self {
        SpecGenError::InternalError { message, file, line }
    }

    /// Shorthand for a schema rule violation in `spec`
    pub fn schema(spec: impl Into<String>, rule: impl Into<String>) -> Self {
        SpecGenError::SchemaValidation {
            spec: spec.into(),
            rule: rule.into(),
        }
    }
}

impl fmt::Display for SpecGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SpecGenError::*;
        match self {
            MalformedName { path } => {
                write!(
                    f,
                    "{}: table/view spec file must be named 'schema_name.object_name.yaml' or 'object_name.yaml'",
                    path
                )
            }
            SchemaValidation { spec, rule } => {
                write!(f, "{}: {}", spec, rule)
            }
            DuplicateTarget { name, spec } => {
                write!(f, "duplicate name '{}' in '{}'", name, spec)
            }
            DuplicateTableName { table, spec } => {
                write!(f, "duplicate table name '{}' in '{}'", table, spec)
            }
            UnknownTarget { name } => {
                write!(f, "unknown target: {}", name)
            }
            CyclicDependency { cycle } => {
                write!(f, "Circular dependency detected: {}", cycle.join(" → "))
            }
            SpecLoadFailed { path, reason } => {
                write!(f, "{}: {}", path, reason)
            }
            SerializationError { message } => {
                write!(f, "Serialization error: {}", message)
            }
            InternalError { message, file, line } => {
                write!(f, "Internal error at {}:{}: {}\nPlease report this bug.",
                       file, line, message)
            }
        }
    }
}

impl std::error::Error for SpecGenError {}

/// Result type for pg_specgen operations
pub type SpecGenResult<T> = Result<T, SpecGenError>;

/// Convert serde_json::Error to SpecGenError
impl From<serde_json::Error> for SpecGenError {
    fn from(e: serde_json::Error) -> Self {
        SpecGenError::SerializationError {
            message: format!("JSON serialization error: {}", e),
        }
    }
}

/// Convert std::io::Error to SpecGenError
impl From<std::io::Error> for SpecGenError {
    fn from(e: std::io::Error) -> Self {
        SpecGenError::SpecLoadFailed {
            path: "<unknown>".to_string(),
            reason: format!("I/O error: {}", e),
        }
    }
}

/// Helper macro for creating internal errors with automatic file/line
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::error::SpecGenError::internal($msg.to_string(), file!(), line!())
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::SpecGenError::internal(format!($fmt, $($arg)*), file!(), line!())
    };
}

/// Helper macro for requiring a value or returning error
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}
