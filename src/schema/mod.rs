//! Schema Model: validated table and view specs
//!
//! Each spec file describes one object:
//! - **Tables** load delimited source files into a database table. They carry
//!   fields, computed fields, constraints and the target table identifier.
//! - **Views** are plain SQL over tables and other views, optionally exported.
//!
//! Both declare `dependsOn` lists of other objects' reference names. Those
//! lists are kept verbatim here; they are checked against the set of known
//! objects only when the dependency graph is built.
//!
//! ## Example
//!
//! ```rust
//! use std::path::Path;
//! use pg_specgen::schema::{SchemaObject, View, ViewRecord};
//!
//! let view = View::new(
//!     Path::new("views/sales.totals.yaml"),
//!     "public",
//!     ViewRecord {
//!         depends_on: vec!["orders".to_string()],
//!         sql: "SELECT count(*) FROM orders".to_string(),
//!         ..Default::default()
//!     },
//! )?;
//!
//! assert_eq!(view.ref_name(), "sales.totals");
//! # Ok::<(), pg_specgen::SpecGenError>(())
//! ```

pub mod loader;
pub mod table;
pub mod types;
pub mod view;

use std::path::Path;

pub use table::{ComputeFn, ComputeInput, ComputedField, ComputedFieldRecord, Field, FieldRecord, Table, TableRecord};
pub use types::{FieldType, ValueKind};
pub use view::{View, ViewRecord};

/// Common surface of tables and views seen by the dependency graph
pub trait SchemaObject {
    /// Vertex key of this object
    fn ref_name(&self) -> &str;

    /// Reference names this object must be created after, as declared
    fn depends_on(&self) -> &[String];

    /// Spec file the object was read from, for error messages
    fn spec_file(&self) -> &Path;
}
