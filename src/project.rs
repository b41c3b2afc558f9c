//! Linking loaded specs into one ordered project
//!
//! A [`Project`] owns every table and view of a generation run, the
//! finalized dependency graph built from their `dependsOn` lists, and the
//! metadata catalog used to annotate ordering results.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::GeneratorConfig;
use crate::dependency::{DependencyGraph, FinalizedGraph};
use crate::error::{SpecGenError, SpecGenResult};
use crate::metadata::{self, TargetCatalog, TargetMeta};
use crate::schema::loader::{load_tables, load_views};
use crate::schema::{SchemaObject, Table, View};

/// Borrowed view of one registered object
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Table(&'a Table),
    View(&'a View),
}

impl Target<'_> {
    pub fn ref_name(&self) -> &str {
        match self {
            Target::Table(t) => t.ref_name(),
            Target::View(v) => v.ref_name(),
        }
    }
}

/// Provisioning plan of a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPlan {
    pub ref_name: String,
    pub target_name: String,
    /// The target and everything it needs, target last
    pub create: Vec<TargetMeta>,
    /// Everything that needs the target, then the target
    pub drop: Vec<TargetMeta>,
    pub create_includes_table: bool,
    pub drop_includes_table: bool,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Table(usize),
    View(usize),
}

/// All specs of a run, linked and ordered
#[derive(Debug, Clone)]
pub struct Project {
    tables: Vec<Table>,
    views: Vec<View>,
    /// refName → object, in registration order (tables, then views)
    index: IndexMap<String, Slot>,
    graph: FinalizedGraph,
    catalog: TargetCatalog,
}

impl Project {
    /// Link tables and views into a finalized graph
    ///
    /// # Errors
    /// - `DuplicateTarget` if two objects share a refName or a generated identifier
    /// - `DuplicateTableName` if two tables provision the same table
    /// - `UnknownTarget` for a `dependsOn` entry naming no object
    /// - `CyclicDependency` if the declarations contain a cycle
    pub fn new(tables: Vec<Table>, views: Vec<View>) -> SpecGenResult<Self> {
        let mut index = IndexMap::new();
        let mut catalog = TargetCatalog::new();
        let mut identifiers: HashMap<String, String> = HashMap::new();
        let mut table_idents: HashMap<&str, &str> = HashMap::new();

        let objects = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (Slot::Table(i), t as &dyn SchemaObject))
            .chain(
                views
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (Slot::View(i), v as &dyn SchemaObject)),
            );

        for (slot, object) in objects {
            let ref_name = object.ref_name();
            let spec = object.spec_file().display().to_string();

            if index.contains_key(ref_name) {
                return Err(SpecGenError::DuplicateTarget {
                    name: ref_name.to_string(),
                    spec,
                });
            }

            let identifier = metadata::target_name(ref_name);
            if let Some(other) = identifiers.get(&identifier) {
                debug!("{} and {} both generate {}", other, ref_name, identifier);
                return Err(SpecGenError::DuplicateTarget { name: identifier, spec });
            }
            identifiers.insert(identifier, ref_name.to_string());

            index.insert(ref_name.to_string(), slot);
        }

        for table in &tables {
            let ident = table.table.quoted_full_name.as_str();
            if table_idents.insert(ident, table.ref_name()).is_some() {
                return Err(SpecGenError::DuplicateTableName {
                    table: ident.to_string(),
                    spec: table.spec_file.display().to_string(),
                });
            }
            catalog.add_table(table.ref_name());
        }
        for view in &views {
            catalog.add_view(view.ref_name(), view.has_export());
        }

        let mut builder = DependencyGraph::new(index.keys().cloned())?;
        for (name, slot) in &index {
            let deps = match *slot {
                Slot::Table(i) => tables[i].depends_on(),
                Slot::View(i) => views[i].depends_on(),
            };
            for dep in deps {
                builder.depends_on(name, dep)?;
            }
        }
        let graph = builder.finalize()?;

        info!(
            "linked project: {} tables, {} views, {} dependencies",
            tables.len(),
            views.len(),
            graph.edge_count()
        );

        Ok(Self {
            tables,
            views,
            index,
            graph,
            catalog,
        })
    }

    /// Load `<root>/tables` and `<root>/views` and link them
    pub fn load(config: &GeneratorConfig) -> SpecGenResult<Self> {
        let schema = config.effective_default_schema();
        let tables = load_tables(&config.tables_dir(), schema)?;
        let views = load_views(&config.views_dir(), schema)?;
        Self::new(tables, views)
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn graph(&self) -> &FinalizedGraph {
        &self.graph
    }

    pub fn catalog(&self) -> &TargetCatalog {
        &self.catalog
    }

    /// Look up an object by refName
    pub fn target(&self, ref_name: &str) -> SpecGenResult<Target<'_>> {
        let slot = self
            .index
            .get(ref_name)
            .ok_or_else(|| SpecGenError::UnknownTarget {
                name: ref_name.to_string(),
            })?;

        Ok(match *slot {
            Slot::Table(i) => Target::Table(crate::require!(
                self.tables.get(i),
                crate::internal_error!("table slot {} out of range", i)
            )),
            Slot::View(i) => Target::View(crate::require!(
                self.views.get(i),
                crate::internal_error!("view slot {} out of range", i)
            )),
        })
    }

    pub fn create_order_all(&self) -> SpecGenResult<Vec<TargetMeta>> {
        self.catalog.annotate(&self.graph.create_order_all()?)
    }

    pub fn drop_order_all(&self) -> SpecGenResult<Vec<TargetMeta>> {
        self.catalog.annotate(&self.graph.drop_order_all()?)
    }

    pub fn create_order(&self, target: &str) -> SpecGenResult<Vec<TargetMeta>> {
        self.catalog.annotate(&self.graph.create_order(target)?)
    }

    pub fn drop_order(&self, target: &str) -> SpecGenResult<Vec<TargetMeta>> {
        self.catalog.annotate(&self.graph.drop_order(target)?)
    }

    /// True if any view exports
    pub fn has_export(&self) -> bool {
        self.catalog.any_export()
    }

    pub fn target_plan(&self, target: &str) -> SpecGenResult<TargetPlan> {
        let create = self.create_order(target)?;
        let drop = self.drop_order(target)?;
        Ok(TargetPlan {
            ref_name: target.to_string(),
            target_name: metadata::target_name(target),
            create_includes_table: metadata::includes_table(&create),
            drop_includes_table: metadata::includes_table(&drop),
            create,
            drop,
        })
    }

    /// One plan per target, in registration order
    pub fn target_plans(&self) -> SpecGenResult<Vec<TargetPlan>> {
        self.index.keys().map(|name| self.target_plan(name)).collect()
    }

    /// Pretty-printed JSON array of every target plan
    pub fn plans_json(&self) -> SpecGenResult<String> {
        let plans = self.target_plans()?;
        Ok(serde_json::to_string_pretty(&plans)?)
    }
}
