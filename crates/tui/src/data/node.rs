// DBI - Debuggee Inspection Client
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! One node of an inspected variable tree.
//!
//! A node exclusively owns its children; the tree is walked by path
//! (the sequence of names from the scope root), never through parent
//! pointers, so there are no reference cycles to manage.

use dbi_common::types::{shape_value, Indicator, ShapedValue, VarKind, VariableTriple};

use crate::data::sort::sort_key;

// Leaf types rendered as methods of their parent. Materialized method
// entries sit beyond the parent's declared child count and extend the
// prune ceiling.
const METHOD_TYPES: &[&str] =
    &["function", "method", "builtin_function_or_method", "method_descriptor"];

/// One displayed variable.
#[derive(Debug, Clone)]
pub struct VariableItem {
    /// Display name, possibly carrying an identity suffix. Unique
    /// among siblings; the addressing key across snapshots.
    pub name: String,
    /// Numeric-aware ordering key derived from `name`.
    pub sort_key: String,
    /// Raw type tag as reported.
    pub type_tag: String,
    /// Closed classification of `type_tag`.
    pub kind: VarKind,
    /// Container shape hint.
    pub indicator: Indicator,
    /// Shaped value (short row text + full detail text).
    pub value: ShapedValue,
    /// Raw value payload, compared byte-for-byte across generations.
    pub raw_value: String,
    /// Whether this node can be expanded.
    pub has_children: bool,
    /// Declared container size, independent of how many children have
    /// actually been fetched. `None` when unknown.
    pub child_count: Option<usize>,
    /// Materialized method entries beyond `child_count`.
    pub method_count: usize,

    /// High-water mark of children materialized so far for the current
    /// generation. `None` means the node needs (re)population.
    pub current_count: Option<usize>,
    /// Child index just past the last entry merged in the current
    /// generation. On completion everything beyond it is stale and
    /// gets truncated; the declared ceiling cannot cover nodes that
    /// never report a count.
    pub merge_extent: Option<usize>,
    /// All pages for the current generation have arrived.
    pub populated: bool,
    /// The node has completed at least one full population since its
    /// creation. Distinguishes first reveal from refresh.
    pub was_populated: bool,
    /// A fetch for this node is in flight; suppresses duplicates.
    pub pending_fetch: bool,

    /// Construction counter assigned by the owning model. Stable for
    /// the node's whole life; merge updates values in place rather
    /// than rebuilding, so an unchanged entry keeps its serial.
    pub serial: u64,

    /// Children, exclusively owned, always sorted by `sort_key`.
    pub children: Vec<VariableItem>,
}

impl VariableItem {
    /// Build a node from a reported triple.
    pub fn from_triple(triple: &VariableTriple, serial: u64) -> Self {
        let kind = VarKind::classify(&triple.type_tag);
        let value = shape_value(kind, &triple.type_tag, &triple.value);
        Self {
            sort_key: sort_key(&triple.name),
            name: triple.name.clone(),
            type_tag: triple.type_tag.clone(),
            kind,
            indicator: kind.indicator(),
            value,
            raw_value: triple.value.clone(),
            has_children: kind.has_children(),
            child_count: kind.declared_count(&triple.value),
            method_count: 0,
            current_count: None,
            merge_extent: None,
            populated: false,
            was_populated: false,
            pending_fetch: false,
            serial,
            children: Vec::new(),
        }
    }

    /// Apply a changed value in place, invalidating any previously
    /// fetched grandchildren so they are refetched lazily.
    pub fn update_value(&mut self, triple: &VariableTriple) {
        debug_assert_eq!(self.name, triple.name);
        self.value = shape_value(self.kind, &triple.type_tag, &triple.value);
        self.raw_value = triple.value.clone();
        self.child_count = self.kind.declared_count(&triple.value);
        self.current_count = None;
        self.merge_extent = None;
        self.populated = false;
    }

    /// Whether this node renders as a method entry of its parent.
    pub fn is_method(&self) -> bool {
        METHOD_TYPES.contains(&self.type_tag.as_str())
    }

    /// Prune ceiling for this node's current generation.
    pub fn count_ceiling(&self) -> Option<usize> {
        self.child_count.map(|c| c + self.method_count)
    }

    /// Locate a direct child by name.
    pub fn child(&self, name: &str) -> Option<&VariableItem> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Locate a direct child by name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut VariableItem> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    /// Resolve a descendant by path relative to this node.
    pub fn resolve(&self, path: &[String]) -> Option<&VariableItem> {
        let mut node = self;
        for name in path {
            node = node.child(name)?;
        }
        Some(node)
    }

    /// Resolve a descendant by path relative to this node, mutably.
    pub fn resolve_mut(&mut self, path: &[String]) -> Option<&mut VariableItem> {
        let mut node = self;
        for name in path {
            node = node.child_mut(name)?;
        }
        Some(node)
    }

    /// Row label: name plus container indicator.
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.indicator.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_construction_classifies_and_shapes() {
        let item =
            VariableItem::from_triple(&VariableTriple::new("items", "list", "4"), 0);
        assert_eq!(item.kind, VarKind::Array);
        assert_eq!(item.label(), "items[]");
        assert_eq!(item.child_count, Some(4));
        assert_eq!(item.value.short, "4 items");
        assert!(item.has_children);
        assert!(!item.populated);
        assert_eq!(item.current_count, None);
    }

    #[test]
    fn value_update_invalidates_population() {
        let mut item =
            VariableItem::from_triple(&VariableTriple::new("d", "dict", "2"), 0);
        item.populated = true;
        item.was_populated = true;
        item.current_count = Some(2);

        item.update_value(&VariableTriple::new("d", "dict", "3"));
        assert_eq!(item.child_count, Some(3));
        assert_eq!(item.current_count, None);
        assert!(!item.populated);
        // First population already completed; that history survives.
        assert!(item.was_populated);
    }

    #[test]
    fn resolve_walks_paths() {
        let mut root = VariableItem::from_triple(&VariableTriple::new("root", "dict", "1"), 0);
        let mut child = VariableItem::from_triple(&VariableTriple::new("a", "dict", "1"), 1);
        child
            .children
            .push(VariableItem::from_triple(&VariableTriple::new("b", "int", "7"), 2));
        root.children.push(child);

        let path = vec!["a".to_string(), "b".to_string()];
        assert_eq!(root.resolve(&path).map(|n| n.raw_value.as_str()), Some("7"));
        assert!(root.resolve(&["a".to_string(), "missing".to_string()]).is_none());
    }
}
