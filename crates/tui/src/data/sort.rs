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

//! Numeric-aware sort keys for variable names.
//!
//! Child indices of sequence containers are plain decimal strings;
//! lexicographic ordering would put "10" before "9". Integer-looking
//! names are therefore zero-padded to a fixed width before comparison
//! so that numeric indices sort numerically while everything else
//! stays lexicographic.

/// Width integer-looking names are padded to. Wide enough for any
/// collection index a debuggee will realistically report.
const NUMERIC_PAD_WIDTH: usize = 20;

/// Build the sort key for a variable name.
///
/// Names that parse as unsigned integers are zero-padded; all other
/// names are used as-is. The identity suffix (anything after the name
/// proper, e.g. an object id) takes part in the comparison unchanged,
/// which keeps keys unique among siblings.
pub fn sort_key(name: &str) -> String {
    if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
        format!("{name:0>NUMERIC_PAD_WIDTH$}")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_names_sort_numerically() {
        assert!(sort_key("9") < sort_key("10"));
        assert!(sort_key("2") < sort_key("100"));
        assert!(sort_key("0") < sort_key("1"));
    }

    #[test]
    fn non_numeric_names_sort_lexicographically() {
        assert!(sort_key("alpha") < sort_key("beta"));
        assert!(sort_key("Alpha") < sort_key("alpha"));
    }

    #[test]
    fn numeric_sorts_before_alphabetic() {
        // Zero-padding keeps digits ahead of letters in ASCII order.
        assert!(sort_key("42") < sort_key("x"));
    }
}
