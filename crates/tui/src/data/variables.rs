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

//! Incremental variable-tree synchronization.
//!
//! [`VariablesModel`] owns one scope tree (globals or locals) and
//! merges successive partial snapshot batches into it without
//! discarding unrelated state. The merge is a lock-step sort-merge
//! over sibling lists, which preserves node identity for unchanged
//! entries; identity preservation is what keeps expansion state,
//! in-flight fetches, and visual continuity alive across generations.
//!
//! Batches addressed to a path that no longer resolves are dropped
//! silently: under rapid stepping a stale in-flight response routinely
//! arrives after its node was pruned, and that is expected, not an
//! error.

use std::collections::HashSet;
use std::sync::Arc;

use dbi_common::types::{BackendId, ControlMarker, VariableBatch, VariableTriple};
use tracing::{debug, trace};

use crate::data::node::VariableItem;
use crate::session::SessionClient;

/// Presentation order applied when flattening a tree for display.
/// Never touches the stored children, which stay sorted ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Ascending by sort key (storage order).
    #[default]
    Ascending,
    /// Descending by sort key.
    Descending,
}

/// One display row produced by flattening a scope tree.
#[derive(Debug, Clone)]
pub struct VisibleRow {
    /// Path of the node from the scope root.
    pub path: Vec<String>,
    /// Nesting depth (0 for top-level variables).
    pub depth: usize,
    /// Whether the node is currently expanded.
    pub expanded: bool,
}

/// Per-scope variable tree, the sync engine of the front end.
pub struct VariablesModel {
    /// Scope selector: true for globals, false for locals.
    globals: bool,
    /// Backend whose data this model currently displays. Batches
    /// tagged for any other backend are discarded.
    backend: Option<BackendId>,
    /// Frame the tree currently displays.
    frame: usize,
    /// Scope root; never removed. Its children are the top-level
    /// variables of the scope.
    root: VariableItem,
    /// Paths the user expanded; survives full resets.
    open_paths: HashSet<Vec<String>>,
    /// Paths the user explicitly collapsed.
    closed_paths: HashSet<Vec<String>>,
    /// Nodes first revealed in the current generation.
    new_paths: HashSet<Vec<String>>,
    /// Nodes inserted into or changed within an already-stable list.
    changed_paths: HashSet<Vec<String>>,
    /// Construction counter for node serials.
    next_serial: u64,
    /// Bumped on every mutation; lets the viewer skip re-flattening.
    revision: u64,
    /// Injected session boundary for fetch requests.
    session: Arc<dyn SessionClient>,
}

impl VariablesModel {
    /// Create an empty scope tree.
    pub fn new(globals: bool, session: Arc<dyn SessionClient>) -> Self {
        let mut model = Self {
            globals,
            backend: None,
            frame: 0,
            root: Self::make_root(globals, 0),
            open_paths: HashSet::new(),
            closed_paths: HashSet::new(),
            new_paths: HashSet::new(),
            changed_paths: HashSet::new(),
            next_serial: 1,
            revision: 0,
            session,
        };
        model.root.has_children = true;
        model
    }

    fn make_root(globals: bool, serial: u64) -> VariableItem {
        let name = if globals { "globals" } else { "locals" };
        let mut root = VariableItem::from_triple(
            &VariableTriple::new(name, "instance", ""),
            serial,
        );
        root.has_children = true;
        root
    }

    /// Scope selector of this model.
    pub fn is_globals(&self) -> bool {
        self.globals
    }

    /// Currently displayed frame.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Currently selected backend.
    pub fn backend(&self) -> Option<&BackendId> {
        self.backend.as_ref()
    }

    /// Mutation counter for cheap change detection by the viewer.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Scope root (read-only; all mutation goes through batches).
    pub fn root(&self) -> &VariableItem {
        &self.root
    }

    /// Select the backend whose data this model displays. Switching
    /// discards the current tree; correlation of node identities
    /// across backends is meaningless.
    pub fn set_backend(&mut self, backend: BackendId) {
        if self.backend.as_ref() == Some(&backend) {
            return;
        }
        debug!(scope = self.scope_name(), %backend, "switching backend, resetting tree");
        self.backend = Some(backend);
        self.full_reset(0);
        self.request_root();
    }

    /// Display a different stack frame. Triggers a full reset and a
    /// root reload at that frame (driven by stack frame selection).
    pub fn set_frame(&mut self, frame: usize) {
        if frame == self.frame && self.root.populated {
            return;
        }
        self.full_reset(frame);
        self.request_root();
    }

    /// User-initiated full refresh: resets the tree (clearing every
    /// pending flag with it) and reloads the root. The remedy for a
    /// transport that stopped answering.
    pub fn refresh(&mut self) {
        self.full_reset(self.frame);
        self.request_root();
    }

    fn scope_name(&self) -> &'static str {
        if self.globals {
            "globals"
        } else {
            "locals"
        }
    }

    /// Drop the whole tree, keeping expansion state. Nodes re-appear
    /// on the next population and recorded open paths re-expand
    /// without explicit user action.
    fn full_reset(&mut self, frame: usize) {
        self.frame = frame;
        let serial = self.bump_serial();
        self.root = Self::make_root(self.globals, serial);
        self.new_paths.clear();
        self.changed_paths.clear();
        self.revision += 1;
    }

    fn bump_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Issue the initial root fetch, unless one is already in flight.
    fn request_root(&mut self) {
        let Some(backend) = self.backend.clone() else { return };
        if self.root.pending_fetch {
            return;
        }
        self.root.pending_fetch = true;
        self.session.request_variables(&backend, self.globals, &[], 0, self.frame);
    }

    // ---------------------------------------------------------------
    // Batch application
    // ---------------------------------------------------------------

    /// Merge one snapshot batch into the tree.
    ///
    /// Batches for the wrong backend or scope, and batches addressed
    /// to a path that no longer resolves, are dropped without error.
    pub fn apply_batch(&mut self, batch: &VariableBatch) {
        if Some(&batch.backend) != self.backend.as_ref() {
            trace!(backend = %batch.backend, "dropping batch for non-selected backend");
            return;
        }
        if batch.globals != self.globals {
            return;
        }

        match batch.marker {
            ControlMarker::NewGeneration { frame } => {
                if frame != self.frame {
                    // Execution moved to a different call; node
                    // identities cannot be correlated across it.
                    debug!(
                        scope = self.scope_name(),
                        old = self.frame,
                        new = frame,
                        "generation moved to a different frame, full reset"
                    );
                    self.full_reset(frame);
                }
                self.merge_at(&batch.path, &batch.items, 0);
            }
            ControlMarker::Continuation { offset } => {
                self.merge_at(&batch.path, &batch.items, offset);
            }
            ControlMarker::Complete => {
                if !batch.items.is_empty() {
                    let start = self
                        .root
                        .resolve(&batch.path)
                        .and_then(|n| n.current_count)
                        .unwrap_or(0);
                    self.merge_at(&batch.path, &batch.items, start);
                }
                self.complete_at(&batch.path);
            }
            ControlMarker::Gone => {
                self.remove_at(&batch.path);
            }
        }
    }

    /// Merge a page of triples into the parent addressed by `path`,
    /// starting at child position `offset`.
    fn merge_at(&mut self, path: &[String], items: &[VariableTriple], offset: usize) {
        // Sort the incoming page up front so the walk below is a
        // sort-merge rather than a quadratic search.
        let mut incoming: Vec<&VariableTriple> = items.iter().collect();
        incoming.sort_by(|a, b| {
            let ka = crate::data::sort::sort_key(&a.name);
            let kb = crate::data::sort::sort_key(&b.name);
            (ka, &a.name).cmp(&(kb, &b.name))
        });

        let mut serial = self.next_serial;
        let mut new_paths = Vec::new();
        let mut changed_paths = Vec::new();

        let Some(parent) = self.root.resolve_mut(path) else {
            // Expected under rapid stepping: the addressed node was
            // pruned before this response arrived.
            debug!(scope = self.scope_name(), ?path, "dropping batch for unresolvable path");
            return;
        };

        let was_populated = parent.was_populated;
        let mut i = offset.min(parent.children.len());
        let mut j = 0usize;

        while j < incoming.len() {
            let triple = incoming[j];
            let in_key = (crate::data::sort::sort_key(&triple.name), triple.name.clone());

            if i >= parent.children.len() {
                // Past the end of the existing list: plain insertion.
                let node = VariableItem::from_triple(triple, serial);
                serial += 1;
                let child_path = child_path(path, &triple.name);
                if was_populated {
                    changed_paths.push(child_path);
                } else {
                    new_paths.push(child_path);
                }
                parent.children.push(node);
                i += 1;
                j += 1;
                continue;
            }

            let ex_key =
                (parent.children[i].sort_key.clone(), parent.children[i].name.clone());

            if in_key < ex_key {
                // Incoming entry the existing list does not have.
                let node = VariableItem::from_triple(triple, serial);
                serial += 1;
                let child_path = child_path(path, &triple.name);
                if was_populated {
                    // Mid-generation insertion into a stable list is a
                    // change; "new" is reserved for first reveal.
                    changed_paths.push(child_path);
                } else {
                    new_paths.push(child_path);
                }
                parent.children.insert(i, node);
                i += 1;
                j += 1;
            } else if in_key == ex_key {
                let existing = &mut parent.children[i];
                if existing.type_tag != triple.type_tag {
                    // Same name, different type: the old node's
                    // subtree is meaningless now. Remove it; the next
                    // iteration inserts the replacement.
                    parent.children.remove(i);
                } else {
                    if existing.raw_value != triple.value {
                        existing.update_value(triple);
                        changed_paths.push(child_path(path, &triple.name));
                    }
                    i += 1;
                    j += 1;
                }
            } else {
                // Existing entry with no incoming counterpart inside
                // this page's window: it no longer exists.
                parent.children.remove(i);
            }
        }

        let high_water = offset + incoming.len();
        parent.current_count =
            Some(parent.current_count.map_or(high_water, |c| c.max(high_water)));
        // Pages arrive in order, so the final page leaves `i` just
        // past the last entry of this generation.
        parent.merge_extent = Some(i);
        parent.method_count = parent.children.iter().filter(|c| c.is_method()).count();

        self.next_serial = serial;
        self.new_paths.extend(new_paths);
        self.changed_paths.extend(changed_paths);
        self.revision += 1;
    }

    /// Handle a "population complete" sentinel for the addressed node:
    /// mark it populated for this generation and prune surplus
    /// trailing children beyond the declared ceiling.
    fn complete_at(&mut self, path: &[String]) {
        let Some(parent) = self.root.resolve_mut(path) else {
            debug!(scope = self.scope_name(), ?path, "completion for unresolvable path");
            return;
        };

        match parent.count_ceiling() {
            Some(ceiling) => {
                while parent.children.len() > ceiling {
                    parent.children.pop();
                }
                parent.merge_extent = None;
            }
            None => {
                // No declared count: children the generation stopped
                // reporting sit past the merged extent and are stale.
                if let Some(extent) = parent.merge_extent.take() {
                    parent.children.truncate(extent);
                }
            }
        }

        parent.populated = true;
        parent.was_populated = true;
        parent.pending_fetch = false;
        parent.current_count = Some(parent.children.len());
        self.revision += 1;
    }

    /// Handle a "node no longer exists" sentinel: remove the addressed
    /// node from its parent immediately.
    fn remove_at(&mut self, path: &[String]) {
        let Some((name, parent_path)) = path.split_last() else {
            // The scope root itself is never removed.
            return;
        };
        let Some(parent) = self.root.resolve_mut(parent_path) else {
            debug!(scope = self.scope_name(), ?path, "removal for unresolvable path");
            return;
        };
        let before = parent.children.len();
        parent.children.retain(|c| &c.name != name);
        if parent.children.len() != before {
            self.revision += 1;
        }
    }

    // ---------------------------------------------------------------
    // Expansion state
    // ---------------------------------------------------------------

    /// Whether a node is currently expanded. The scope root always is.
    pub fn is_expanded(&self, path: &[String]) -> bool {
        path.is_empty() || self.open_paths.contains(path)
    }

    /// Record a user expansion. The recorded path survives full
    /// resets, so re-expansion after stepping is automatic.
    pub fn expand(&mut self, path: Vec<String>) {
        self.closed_paths.remove(&path);
        self.open_paths.insert(path);
        self.revision += 1;
    }

    /// Record a user collapse and drop already-fetched grandchildren
    /// of the path to reclaim memory; they are refetched lazily on
    /// re-expand.
    pub fn collapse(&mut self, path: Vec<String>) {
        self.open_paths.remove(&path);
        if let Some(node) = self.root.resolve_mut(&path) {
            for child in &mut node.children {
                child.children.clear();
                child.current_count = None;
                child.populated = false;
            }
        }
        self.closed_paths.insert(path);
        self.revision += 1;
    }

    /// Clear one-generation highlight markers. Called on the next
    /// user interaction with the owning panel.
    pub fn clear_highlights(&mut self) {
        if !self.new_paths.is_empty() || !self.changed_paths.is_empty() {
            self.new_paths.clear();
            self.changed_paths.clear();
            self.revision += 1;
        }
    }

    /// Whether the node at `path` was first revealed this generation.
    pub fn is_new(&self, path: &[String]) -> bool {
        self.new_paths.contains(path)
    }

    /// Whether the node at `path` changed this generation.
    pub fn is_changed(&self, path: &[String]) -> bool {
        self.changed_paths.contains(path)
    }

    /// Push a new filter pattern for this scope and reload under it.
    /// The pattern is opaque to the client; the debuggee interprets it.
    pub fn change_filter(&mut self, pattern: &str) {
        if let Some(backend) = &self.backend {
            self.session.request_filter_change(backend, self.globals, pattern);
        }
        self.refresh();
    }

    // ---------------------------------------------------------------
    // Display flattening and visibility-paced fetching
    // ---------------------------------------------------------------

    /// Flatten the tree to display rows, honoring expansion state.
    /// `order` only affects presentation; storage stays ascending.
    pub fn visible_rows(&self, order: SortOrder) -> Vec<VisibleRow> {
        let mut rows = Vec::new();
        self.flatten_into(&self.root, &mut Vec::new(), 0, order, &mut rows);
        rows
    }

    fn flatten_into(
        &self,
        node: &VariableItem,
        path: &mut Vec<String>,
        depth: usize,
        order: SortOrder,
        rows: &mut Vec<VisibleRow>,
    ) {
        let iter: Box<dyn Iterator<Item = &VariableItem>> = match order {
            SortOrder::Ascending => Box::new(node.children.iter()),
            SortOrder::Descending => Box::new(node.children.iter().rev()),
        };
        for child in iter {
            path.push(child.name.clone());
            let expanded = self.is_expanded(path);
            rows.push(VisibleRow { path: path.clone(), depth, expanded });
            if expanded {
                self.flatten_into(child, path, depth + 1, order, rows);
            }
            path.pop();
        }
    }

    /// Look up the node behind a display row.
    pub fn row_node(&self, row: &VisibleRow) -> Option<&VariableItem> {
        self.root.resolve(&row.path)
    }

    /// Issue at most one fetch for the first expanded-but-unpopulated
    /// node whose next child row falls inside the visible viewport.
    ///
    /// Re-invoked on every scroll and resize; a no-op when nothing
    /// unpopulated is visible, which bounds remote traffic to what the
    /// user can actually see. Returns whether a request was issued.
    pub fn request_more(&mut self, scroll_offset: usize, viewport_height: usize) -> bool {
        let Some(backend) = self.backend.clone() else { return false };
        let viewport = scroll_offset..scroll_offset + viewport_height;

        // The root is always "expanded"; it needs its own treatment
        // because it has no display row.
        if !self.root.populated && !self.root.pending_fetch {
            self.root.pending_fetch = true;
            let offset = self.root.current_count.unwrap_or(0);
            self.session.request_variables(&backend, self.globals, &[], offset, self.frame);
            return true;
        }

        let rows = self.visible_rows(SortOrder::Ascending);
        for (idx, row) in rows.iter().enumerate() {
            if !row.expanded {
                continue;
            }
            let Some(node) = self.root.resolve(&row.path) else { continue };
            if !node.has_children || node.populated || node.pending_fetch {
                continue;
            }

            // The row where the next fetched page would appear: right
            // after the node's current subtree.
            let next_row = rows[idx + 1..]
                .iter()
                .position(|r| !r.path.starts_with(&row.path))
                .map_or(rows.len(), |p| idx + 1 + p);

            if viewport.contains(&next_row) || viewport.contains(&next_row.saturating_sub(1)) {
                let offset = node.current_count.unwrap_or(0);
                let path = row.path.clone();
                if let Some(node) = self.root.resolve_mut(&path) {
                    node.pending_fetch = true;
                }
                self.session.request_variables(&backend, self.globals, &path, offset, self.frame);
                return true;
            }
        }
        false
    }
}

/// Append a child name to a parent path.
fn child_path(parent: &[String], name: &str) -> Vec<String> {
    let mut p = parent.to_vec();
    p.push(name.to_string());
    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Recorded, RecordingSession};
    use dbi_common::types::ControlMarker;

    const BACKEND: &str = "backend-1";

    fn model() -> (VariablesModel, Arc<RecordingSession>) {
        let session = Arc::new(RecordingSession::default());
        let mut model = VariablesModel::new(false, session.clone());
        model.set_backend(BACKEND.to_string());
        session.take(); // drop the initial root request
        (model, session)
    }

    fn batch(
        path: &[&str],
        items: &[(&str, &str, &str)],
        marker: ControlMarker,
    ) -> VariableBatch {
        VariableBatch {
            backend: BACKEND.to_string(),
            globals: false,
            path: path.iter().map(|s| s.to_string()).collect(),
            frame: 0,
            items: items
                .iter()
                .map(|(n, t, v)| VariableTriple::new(*n, *t, *v))
                .collect(),
            marker,
        }
    }

    fn populate_root(model: &mut VariablesModel, items: &[(&str, &str, &str)]) {
        model.apply_batch(&batch(&[], items, ControlMarker::Continuation { offset: 0 }));
        model.apply_batch(&batch(&[], &[], ControlMarker::Complete));
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn repeated_population_is_idempotent() {
        let (mut model, _session) = model();
        let items: &[(&str, &str, &str)] = &[("a", "int", "1"), ("b", "str", "'x'")];

        populate_root(&mut model, items);
        assert!(model.is_new(&path(&["a"])));

        model.clear_highlights();
        populate_root(&mut model, items);

        assert!(!model.is_new(&path(&["a"])));
        assert!(!model.is_changed(&path(&["a"])));
        assert!(!model.is_changed(&path(&["b"])));
        assert_eq!(model.root().children.len(), 2);
    }

    #[test]
    fn unchanged_nodes_keep_their_identity() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("a", "int", "1"), ("b", "int", "2"), ("c", "int", "3")]);

        let serial_a = model.root().child("a").unwrap().serial;
        let serial_c = model.root().child("c").unwrap().serial;

        // b changes, a and c do not.
        populate_root(&mut model, &[("a", "int", "1"), ("b", "int", "9"), ("c", "int", "3")]);

        assert_eq!(model.root().child("a").unwrap().serial, serial_a);
        assert_eq!(model.root().child("c").unwrap().serial, serial_c);
        assert_eq!(model.root().child("b").unwrap().raw_value, "9");
    }

    #[test]
    fn children_stay_sorted_numerically() {
        let (mut model, _session) = model();
        populate_root(
            &mut model,
            &[("10", "int", "10"), ("9", "int", "9"), ("100", "int", "100"), ("2", "int", "2")],
        );

        let names: Vec<&str> =
            model.root().children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["2", "9", "10", "100"]);
    }

    #[test]
    fn growth_inserts_at_end_marked_changed() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("0", "int", "1"), ("1", "int", "2")]);
        model.clear_highlights();

        populate_root(&mut model, &[("0", "int", "1"), ("1", "int", "2"), ("2", "int", "3")]);

        let names: Vec<&str> =
            model.root().children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["0", "1", "2"]);
        // Insertion into an already-stable list: changed, not new.
        assert!(model.is_changed(&path(&["2"])));
        assert!(!model.is_new(&path(&["2"])));
        assert!(!model.is_changed(&path(&["0"])));
    }

    #[test]
    fn shrink_prunes_surplus_trailing_children() {
        let (mut model, _session) = model();
        populate_root(
            &mut model,
            &[("box", "list", "5")],
        );
        model.apply_batch(&batch(
            &["box"],
            &[
                ("0", "int", "0"),
                ("1", "int", "1"),
                ("2", "int", "2"),
                ("3", "int", "3"),
                ("4", "int", "4"),
            ],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["box"], &[], ControlMarker::Complete));
        assert_eq!(model.root().child("box").unwrap().children.len(), 5);

        // Declared count drops to 3; next completion prunes the tail.
        populate_root(&mut model, &[("box", "list", "3")]);
        model.apply_batch(&batch(&["box"], &[], ControlMarker::Complete));

        let the_box = model.root().child("box").unwrap();
        let names: Vec<&str> = the_box.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["0", "1", "2"]);
    }

    #[test]
    fn same_frame_generation_drops_stale_trailing_locals() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("a", "int", "1"), ("b", "int", "2"), ("c", "int", "3")]);

        // Next stop in the same frame: c went out of scope. The scope
        // root never declares a count, so completion alone has to
        // retire the tail.
        model.apply_batch(&batch(
            &[],
            &[("a", "int", "1"), ("b", "int", "2")],
            ControlMarker::NewGeneration { frame: 0 },
        ));
        model.apply_batch(&batch(&[], &[], ControlMarker::Complete));

        let names: Vec<&str> =
            model.root().children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        let rows = model.visible_rows(SortOrder::Ascending);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn unknown_count_container_sheds_vanished_children() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("obj", "instance", "")]);
        model.apply_batch(&batch(
            &["obj"],
            &[("x", "int", "1"), ("y", "int", "2")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["obj"], &[], ControlMarker::Complete));
        assert_eq!(model.root().child("obj").unwrap().children.len(), 2);

        model.apply_batch(&batch(
            &["obj"],
            &[("x", "int", "1")],
            ControlMarker::NewGeneration { frame: 0 },
        ));
        model.apply_batch(&batch(&["obj"], &[], ControlMarker::Complete));

        let obj = model.root().child("obj").unwrap();
        let names: Vec<&str> = obj.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x"], "y existed last generation only");
    }

    #[test]
    fn count_ceiling_holds_after_completion() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("seq", "list", "2")]);
        model.apply_batch(&batch(
            &["seq"],
            &[("0", "int", "0"), ("1", "int", "1"), ("append", "method", "<method>")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["seq"], &[], ControlMarker::Complete));

        let seq = model.root().child("seq").unwrap();
        assert_eq!(seq.method_count, 1);
        assert!(seq.children.len() <= seq.count_ceiling().unwrap());
        assert_eq!(seq.children.len(), 3);
    }

    #[test]
    fn value_change_updates_in_place_and_invalidates() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("x", "int", "1")]);
        let serial = model.root().child("x").unwrap().serial;
        model.clear_highlights();

        populate_root(&mut model, &[("x", "int", "2")]);

        let x = model.root().child("x").unwrap();
        assert_eq!(x.serial, serial, "same node instance after value change");
        assert_eq!(x.raw_value, "2");
        assert_eq!(x.current_count, None);
        assert!(!x.populated);
        assert!(model.is_changed(&path(&["x"])));
    }

    #[test]
    fn type_change_replaces_the_node() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("x", "int", "1")]);
        let serial = model.root().child("x").unwrap().serial;

        populate_root(&mut model, &[("x", "str", "'1'")]);

        let x = model.root().child("x").unwrap();
        assert_ne!(x.serial, serial, "type change must construct a fresh node");
        assert_eq!(x.type_tag, "str");
    }

    #[test]
    fn stale_response_is_dropped_silently() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("y", "dict", "1")]);

        // y disappears.
        model.apply_batch(&batch(&["y"], &[], ControlMarker::Gone));
        assert!(model.root().child("y").is_none());

        // A late page for y's old path arrives afterwards.
        let revision = model.revision();
        model.apply_batch(&batch(
            &["y"],
            &[("k", "int", "1")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["y"], &[], ControlMarker::Complete));

        assert_eq!(model.revision(), revision, "stale batch must not mutate the tree");
    }

    #[test]
    fn expansion_survives_full_reset() {
        let (mut model, session) = model();
        populate_root(&mut model, &[("obj", "dict", "1")]);
        model.expand(path(&["obj"]));
        model.apply_batch(&batch(
            &["obj"],
            &[("k", "int", "1")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["obj"], &[], ControlMarker::Complete));

        // Step to a different frame: full reset.
        model.apply_batch(&VariableBatch {
            backend: BACKEND.to_string(),
            globals: false,
            path: vec![],
            frame: 2,
            items: vec![VariableTriple::new("obj", "dict", "1")],
            marker: ControlMarker::NewGeneration { frame: 2 },
        });
        model.apply_batch(&batch(&[], &[], ControlMarker::Complete));

        // Path still expanded, without any explicit re-expand call.
        assert!(model.is_expanded(&path(&["obj"])));
        let rows = model.visible_rows(SortOrder::Ascending);
        assert!(rows.iter().any(|r| r.path == path(&["obj"]) && r.expanded));

        // Only visible unpopulated nodes are fetched, one at a time.
        session.take();
        assert!(model.request_more(0, 10));
        let recorded = session.take();
        assert_eq!(recorded.len(), 1);
        match &recorded[0] {
            Recorded::Variables { path: p, offset, frame, .. } => {
                assert_eq!(p, &path(&["obj"]));
                assert_eq!(*offset, 0);
                assert_eq!(*frame, 2);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn collapsed_paths_are_not_fetched() {
        let (mut model, session) = model();
        populate_root(&mut model, &[("open", "dict", "1"), ("shut", "dict", "1")]);
        model.expand(path(&["open"]));
        // "shut" was never expanded; nothing may be requested for it.

        session.take();
        while model.request_more(0, 10) {}
        let recorded = session.take();
        assert!(recorded.iter().all(|r| !matches!(
            r,
            Recorded::Variables { path: p, .. } if p == &path(&["shut"])
        )));
    }

    #[test]
    fn collapse_drops_grandchildren() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("obj", "dict", "1")]);
        model.expand(path(&["obj"]));
        model.apply_batch(&batch(
            &["obj"],
            &[("inner", "dict", "1")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["obj"], &[], ControlMarker::Complete));
        model.apply_batch(&batch(
            &["obj", "inner"],
            &[("leaf", "int", "1")],
            ControlMarker::Continuation { offset: 0 },
        ));
        model.apply_batch(&batch(&["obj", "inner"], &[], ControlMarker::Complete));

        model.collapse(path(&["obj"]));

        let inner = model.root().resolve(&path(&["obj", "inner"])).unwrap();
        assert!(inner.children.is_empty());
        assert!(!inner.populated);
        assert_eq!(inner.current_count, None);
    }

    #[test]
    fn pagination_requests_carry_the_high_water_offset() {
        let (mut model, session) = model();
        populate_root(&mut model, &[("big", "list", "100")]);
        model.expand(path(&["big"]));
        model.apply_batch(&batch(
            &["big"],
            &[("0", "int", "0"), ("1", "int", "1")],
            ControlMarker::Continuation { offset: 0 },
        ));

        session.take();
        assert!(model.request_more(0, 20));
        let recorded = session.take();
        match &recorded[0] {
            Recorded::Variables { path: p, offset, .. } => {
                assert_eq!(p, &path(&["big"]));
                assert_eq!(*offset, 2);
            }
            other => panic!("unexpected request: {other:?}"),
        }

        // The fetch is pending now; no duplicate request is issued.
        assert!(!model.request_more(0, 20));
    }

    #[test]
    fn wrong_backend_batches_are_discarded() {
        let (mut model, _session) = model();
        populate_root(&mut model, &[("a", "int", "1")]);

        let mut foreign = batch(&[], &[("b", "int", "2")], ControlMarker::Continuation {
            offset: 0,
        });
        foreign.backend = "other".to_string();
        model.apply_batch(&foreign);

        assert!(model.root().child("b").is_none());
    }
}
