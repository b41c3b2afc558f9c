//! pg_specgen: dependency-ordered provisioning for spec-driven tables and views
//!
//! Each table or view is described by one YAML spec file. Specs declare which
//! other objects they depend on; this crate validates the specs, links them
//! into a dependency graph and answers the ordering questions code generation
//! needs:
//!
//! - in which order can everything be created, or dropped?
//! - what must exist before a given target, and what must go before it is dropped?
//!
//! ```rust
//! use pg_specgen::dependency::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new(["customers", "orders", "daily_totals"])?;
//! graph.depends_on("orders", "customers")?;
//! graph.depends_on("daily_totals", "orders")?;
//! let graph = graph.finalize()?;
//!
//! assert_eq!(graph.create_order("daily_totals")?, ["customers", "orders", "daily_totals"]);
//! assert_eq!(graph.drop_order("customers")?, ["daily_totals", "orders", "customers"]);
//! # Ok::<(), pg_specgen::SpecGenError>(())
//! ```

pub mod config;
pub mod ddl;
pub mod dependency;
pub mod error;
pub mod metadata;
pub mod names;
pub mod project;
pub mod schema;

pub use error::{SpecGenError, SpecGenResult};
pub use metadata::TargetMeta;
pub use project::{Project, TargetPlan};
