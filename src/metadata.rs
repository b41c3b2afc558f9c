//! Target metadata attached to ordering results
//!
//! Graph queries return bare reference names. Code generation also needs to
//! know whether each name is a table or a view, whether it exports, and which
//! identifier to emit for it. [`TargetCatalog`] holds that membership and
//! turns a name sequence into [`TargetMeta`] records.

use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{SpecGenError, SpecGenResult};

/// One name of an ordering result, annotated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetMeta {
    pub ref_name: String,
    /// Identifier used in generated output
    pub target_name: String,
    pub is_table: bool,
    pub has_export: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Table,
    View { has_export: bool },
}

/// Membership of every registered target
#[derive(Debug, Clone, Default)]
pub struct TargetCatalog {
    kinds: IndexMap<String, TargetKind>,
}

/// Generated-output identifier for `ref_name`
///
/// `public.orders` becomes `PublicOrders`.
pub fn target_name(ref_name: &str) -> String {
    ref_name.to_upper_camel_case()
}

impl TargetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_table(&mut self, ref_name: &str) {
        self.kinds.insert(ref_name.to_string(), TargetKind::Table);
    }

    pub fn add_view(&mut self, ref_name: &str, has_export: bool) {
        self.kinds
            .insert(ref_name.to_string(), TargetKind::View { has_export });
    }

    pub fn is_table(&self, ref_name: &str) -> bool {
        matches!(self.kinds.get(ref_name), Some(TargetKind::Table))
    }

    pub fn has_export(&self, ref_name: &str) -> bool {
        matches!(
            self.kinds.get(ref_name),
            Some(TargetKind::View { has_export: true })
        )
    }

    /// True if any registered view exports
    pub fn any_export(&self) -> bool {
        self.kinds
            .values()
            .any(|k| matches!(k, TargetKind::View { has_export: true }))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Annotate one name
    pub fn describe(&self, ref_name: &str) -> SpecGenResult<TargetMeta> {
        let kind = self
            .kinds
            .get(ref_name)
            .ok_or_else(|| SpecGenError::UnknownTarget {
                name: ref_name.to_string(),
            })?;

        Ok(TargetMeta {
            ref_name: ref_name.to_string(),
            target_name: target_name(ref_name),
            is_table: *kind == TargetKind::Table,
            has_export: *kind == TargetKind::View { has_export: true },
        })
    }

    /// Annotate every name of an ordering result, order preserved
    pub fn annotate(&self, names: &[String]) -> SpecGenResult<Vec<TargetMeta>> {
        names.iter().map(|n| self.describe(n)).collect()
    }
}

/// True if the annotated order touches at least one table
pub fn includes_table(order: &[TargetMeta]) -> bool {
    order.iter().any(|t| t.is_table)
}

/// True if the annotated order contains an exporting view
pub fn includes_export(order: &[TargetMeta]) -> bool {
    order.iter().any(|t| t.has_export)
}
