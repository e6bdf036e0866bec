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

//! Variable snapshot batches and the value/type shaping applied to them.
//!
//! A debuggee reports variables as flat (name, type, value) triples,
//! one batch per addressed parent node. The shaping performed here is
//! purely cosmetic: container values become an item-count caption,
//! string literals get their quoting normalized, and oversized or
//! multi-line values are collapsed for single-row display. None of it
//! is correctness-critical; parse failures fall back to the raw text.

use serde::{Deserialize, Serialize};

use crate::types::BackendId;

/// Hard ceiling on displayed value length, in characters.
pub const MAX_DISPLAY_VALUE_LEN: usize = 2048;

/// One variable as reported by the debuggee: name, raw type tag, raw value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableTriple {
    /// Display name, possibly suffixed with an identity token (e.g. an
    /// object id) when the debuggee reports one. This is the key used
    /// to match nodes across snapshots.
    pub name: String,
    /// Raw type tag as reported by the debuggee.
    pub type_tag: String,
    /// Raw value payload. For containers this is the declared element
    /// count, not materialized children.
    pub value: String,
}

impl VariableTriple {
    /// Create a new triple.
    pub fn new(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), type_tag: type_tag.into(), value: value.into() }
    }
}

/// Out-of-band control signal embedded in the batch stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMarker {
    /// Execution moved to frame `frame`; if it differs from the frame
    /// currently displayed, the whole tree must be reset before the
    /// batch is merged.
    NewGeneration {
        /// 0-based frame number the batch belongs to.
        frame: usize,
    },
    /// Continuation page for a container whose previous page ended at
    /// `offset`. Not a reset.
    Continuation {
        /// Child offset at which this page starts.
        offset: usize,
    },
    /// The addressed parent is fully populated for this generation;
    /// surplus trailing children must be pruned.
    Complete,
    /// The addressed node's backing object disappeared between stops;
    /// remove it from its parent immediately.
    Gone,
}

/// A snapshot batch addressed to one parent node of one scope tree.
///
/// Batches for a given path must be delivered in the order the
/// debuggee produced them; the model applies them as they arrive and
/// never reorders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableBatch {
    /// Backend this batch belongs to.
    pub backend: BackendId,
    /// Whether the batch targets the globals tree (otherwise locals).
    pub globals: bool,
    /// Address of the parent being populated: node names from the
    /// scope root down. Empty means the scope root itself.
    pub path: Vec<String>,
    /// Frame number the variables were captured at.
    pub frame: usize,
    /// The reported triples, in debuggee order.
    pub items: Vec<VariableTriple>,
    /// Control signal for this batch.
    pub marker: ControlMarker,
}

/// Closed classification of a raw type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// Sequence container with integer indices (list, tuple, array...).
    Array,
    /// Key/value container (dict, mapping...).
    Mapping,
    /// Unordered container (set, frozenset...).
    Set,
    /// Class/object instance; expandable by default.
    Instance,
    /// Known leaf type; never expandable.
    Leaf,
    /// Unknown type tag; treated as expandable so potentially
    /// inspectable data is never hidden.
    Unknown,
}

/// Shape hint shown next to a container name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Indicator {
    /// Sequence (`[]`).
    Brackets,
    /// Set (`{}`).
    Braces,
    /// Mapping (`{:}`).
    BracesColon,
    /// No indicator (leaves and plain instances).
    None,
}

impl Indicator {
    /// Suffix rendered after the variable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brackets => "[]",
            Self::Braces => "{}",
            Self::BracesColon => "{:}",
            Self::None => "",
        }
    }
}

// Classification tables. Keeping these as slices rather than matches on
// string literals scattered through the merge code keeps new debuggee
// type tags a one-line change.
const ARRAY_TYPES: &[&str] = &["list", "tuple", "array", "array.array", "deque", "bytearray"];
const MAPPING_TYPES: &[&str] =
    &["dict", "mappingproxy", "collections.OrderedDict", "collections.defaultdict"];
const SET_TYPES: &[&str] = &["set", "frozenset"];
// Host-object types that behave like containers even though their type
// tag does not say so.
const PSEUDO_CONTAINER_TYPES: &[&str] = &["numpy.ndarray", "Shiboken.EnumType", "sip.array"];
const LEAF_TYPES: &[&str] = &[
    "int",
    "float",
    "complex",
    "bool",
    "str",
    "bytes",
    "NoneType",
    "function",
    "method",
    "builtin_function_or_method",
    "method_descriptor",
    "wrapper_descriptor",
    "classmethod_descriptor",
    "generator",
    "module",
    "type",
    "code",
    "frame",
    "weakref",
    "EmptyType",
];

impl VarKind {
    /// Classify a raw type tag into its closed kind.
    pub fn classify(type_tag: &str) -> Self {
        if ARRAY_TYPES.contains(&type_tag) || PSEUDO_CONTAINER_TYPES.contains(&type_tag) {
            Self::Array
        } else if MAPPING_TYPES.contains(&type_tag) {
            Self::Mapping
        } else if SET_TYPES.contains(&type_tag) {
            Self::Set
        } else if LEAF_TYPES.contains(&type_tag) {
            Self::Leaf
        } else if type_tag == "instance" || type_tag == "class" {
            Self::Instance
        } else {
            Self::Unknown
        }
    }

    /// Whether nodes of this kind can have children.
    pub fn has_children(&self) -> bool {
        !matches!(self, Self::Leaf)
    }

    /// Whether this kind is a known container (declared count in the
    /// value payload rather than an actual value).
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Array | Self::Mapping | Self::Set)
    }

    /// Container shape hint for this kind.
    pub fn indicator(&self) -> Indicator {
        match self {
            Self::Array => Indicator::Brackets,
            Self::Mapping => Indicator::BracesColon,
            Self::Set => Indicator::Braces,
            Self::Instance | Self::Leaf | Self::Unknown => Indicator::None,
        }
    }

    /// Extract the declared child count from a container's raw value
    /// payload. Containers report their size as the value; anything
    /// unparseable counts as size unknown.
    pub fn declared_count(&self, raw_value: &str) -> Option<usize> {
        if !self.is_container() {
            return None;
        }
        raw_value.trim().parse::<usize>().ok()
    }
}

/// Display-ready value derived from a raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapedValue {
    /// Single-line, truncated rendition for the tree row.
    pub short: String,
    /// Full value kept for the on-demand details view.
    pub full: String,
    /// Whether `short` lost content to truncation or collapse.
    pub elided: bool,
}

/// Shape a raw value for display according to its kind.
///
/// Containers get an item-count caption; strings get a best-effort
/// quote normalization; everything is hard-truncated at
/// [`MAX_DISPLAY_VALUE_LEN`] and collapsed to one line.
pub fn shape_value(kind: VarKind, type_tag: &str, raw_value: &str) -> ShapedValue {
    if kind.is_container() {
        let caption = match kind.declared_count(raw_value) {
            Some(1) => "1 item".to_string(),
            Some(n) => format!("{n} items"),
            None => raw_value.to_string(),
        };
        return ShapedValue { short: caption.clone(), full: caption, elided: false };
    }

    let normalized =
        if type_tag == "str" { normalize_string_literal(raw_value) } else { raw_value.to_string() };

    let (mut short, mut elided) = collapse_multiline(&normalized);
    if short.chars().count() > MAX_DISPLAY_VALUE_LEN {
        short = short.chars().take(MAX_DISPLAY_VALUE_LEN).collect();
        short.push('…');
        elided = true;
    }

    ShapedValue { short, full: normalized, elided }
}

/// Best-effort re-parse of a quoted string literal so that values the
/// debuggee repr'd with escapes display with consistent quoting.
/// Failures are swallowed and the raw text used verbatim.
fn normalize_string_literal(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .or_else(|| trimmed.strip_prefix('"').and_then(|s| s.strip_suffix('"')));

    let Some(inner) = inner else {
        return raw.to_string();
    };

    // Re-parse through the JSON string grammar to resolve escapes.
    let quoted = format!("\"{}\"", inner.replace('\\', "\\\\").replace('"', "\\\""));
    match serde_json::from_str::<String>(&quoted) {
        Ok(parsed) => format!("'{parsed}'"),
        Err(_) => raw.to_string(),
    }
}

/// Collapse a multi-line value to its first non-blank line, marking
/// elision on either side with `…`.
fn collapse_multiline(value: &str) -> (String, bool) {
    if !value.contains('\n') {
        return (value.to_string(), false);
    }

    let lines: Vec<&str> = value.lines().collect();
    let first_content = lines.iter().position(|l| !l.trim().is_empty());

    let Some(idx) = first_content else {
        // Entirely blank lines; show nothing but flag the elision.
        return ("…".to_string(), true);
    };

    let mut short = String::new();
    if idx > 0 {
        short.push('…');
    }
    short.push_str(lines[idx]);
    if idx + 1 < lines.len() {
        short.push('…');
    }
    (short, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_containers() {
        assert_eq!(VarKind::classify("list"), VarKind::Array);
        assert_eq!(VarKind::classify("dict"), VarKind::Mapping);
        assert_eq!(VarKind::classify("frozenset"), VarKind::Set);
        assert_eq!(VarKind::classify("numpy.ndarray"), VarKind::Array);
    }

    #[test]
    fn classify_leaves_and_unknowns() {
        assert_eq!(VarKind::classify("int"), VarKind::Leaf);
        assert_eq!(VarKind::classify("method_descriptor"), VarKind::Leaf);
        assert!(!VarKind::classify("int").has_children());
        // Unknown types must stay expandable.
        assert_eq!(VarKind::classify("SomeUserClass"), VarKind::Unknown);
        assert!(VarKind::classify("SomeUserClass").has_children());
        assert_eq!(VarKind::classify("instance"), VarKind::Instance);
    }

    #[test]
    fn declared_count_only_for_containers() {
        assert_eq!(VarKind::Array.declared_count("12"), Some(12));
        assert_eq!(VarKind::Mapping.declared_count(" 3 "), Some(3));
        assert_eq!(VarKind::Leaf.declared_count("12"), None);
        assert_eq!(VarKind::Array.declared_count("not a number"), None);
    }

    #[test]
    fn shape_container_caption() {
        let shaped = shape_value(VarKind::Array, "list", "3");
        assert_eq!(shaped.short, "3 items");
        let shaped = shape_value(VarKind::Mapping, "dict", "1");
        assert_eq!(shaped.short, "1 item");
    }

    #[test]
    fn shape_collapses_multiline() {
        let shaped = shape_value(VarKind::Leaf, "str", "\nfirst\nsecond");
        assert!(shaped.short.starts_with('…'));
        assert!(shaped.short.contains("first"));
        assert!(shaped.short.ends_with('…'));
        assert!(shaped.elided);
        assert!(shaped.full.contains("second"));
    }

    #[test]
    fn shape_truncates_oversized() {
        let big = "x".repeat(MAX_DISPLAY_VALUE_LEN + 100);
        let shaped = shape_value(VarKind::Leaf, "str", &big);
        assert_eq!(shaped.short.chars().count(), MAX_DISPLAY_VALUE_LEN + 1);
        assert!(shaped.short.ends_with('…'));
        assert!(shaped.elided);
        assert_eq!(shaped.full, big);
    }

    #[test]
    fn normalize_bad_literal_falls_back() {
        // Unbalanced quote: used verbatim, no panic.
        let shaped = shape_value(VarKind::Leaf, "str", "'unterminated");
        assert_eq!(shaped.short, "'unterminated");
    }
}
