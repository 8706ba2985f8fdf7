//! Semantic-map data model and the completeness check.
//!
//! The identifier lister and the semantic-map generator both emit JSON
//! arrays of records keyed by byte offset. The wire format uses capitalized
//! field names; both tools may attach additional fields the harness does not
//! care about, so unknown fields are ignored.

use std::collections::HashSet;

use serde::Deserialize;

/// One ground-truth identifier occurrence, as produced by the lister.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentOccurrence {
    /// Identifier text, carried for diagnostics only.
    #[serde(rename = "Name", default)]
    pub name: String,
    /// Byte offset of the occurrence within the source file.
    #[serde(rename = "Offset")]
    pub offset: usize,
}

/// One semantic-map entry, as produced by the smap generator.
///
/// Only `Offset` participates in the completeness check. `Length` is kept
/// because the semantic-map visualization highlights whole spans.
#[derive(Debug, Clone, Deserialize)]
pub struct SmapEntry {
    /// Byte offset of the mapped occurrence.
    #[serde(rename = "Offset")]
    pub offset: usize,
    /// Span length in bytes.
    #[serde(rename = "Length", default)]
    pub length: usize,
}

/// Check that the semantic map covers the ground truth.
///
/// True iff every occurrence's offset appears among the map's offsets. The
/// map is allowed to contain extra entries; that is not a failure. An empty
/// ground-truth collection is trivially covered. Neither input's ordering
/// matters.
pub fn smap_covers(idents: &[IdentOccurrence], smap: &[SmapEntry]) -> bool {
    let mapped: HashSet<usize> = smap.iter().map(|e| e.offset).collect();
    idents.iter().all(|i| mapped.contains(&i.offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(offset: usize) -> IdentOccurrence {
        IdentOccurrence {
            name: format!("id{offset}"),
            offset,
        }
    }

    fn entry(offset: usize) -> SmapEntry {
        SmapEntry { offset, length: 3 }
    }

    mod completeness {
        use super::*;

        #[test]
        fn empty_ground_truth_is_always_covered() {
            assert!(smap_covers(&[], &[]));
            assert!(smap_covers(&[], &[entry(10), entry(20)]));
        }

        #[test]
        fn exact_coverage_passes() {
            let idents = vec![ident(4), ident(17), ident(30)];
            let smap = vec![entry(4), entry(17), entry(30)];
            assert!(smap_covers(&idents, &smap));
        }

        #[test]
        fn extra_map_entries_are_not_a_failure() {
            let idents = vec![ident(4)];
            let smap = vec![entry(4), entry(99), entry(123)];
            assert!(smap_covers(&idents, &smap));
        }

        #[test]
        fn missing_offset_fails() {
            let idents = vec![ident(4), ident(17)];
            let smap = vec![entry(4)];
            assert!(!smap_covers(&idents, &smap));
        }

        #[test]
        fn nonempty_ground_truth_with_empty_map_fails() {
            assert!(!smap_covers(&[ident(0)], &[]));
        }

        #[test]
        fn result_is_order_independent() {
            let idents = vec![ident(30), ident(4), ident(17)];
            let mut smap = vec![entry(17), entry(30), entry(4)];
            assert!(smap_covers(&idents, &smap));
            smap.reverse();
            assert!(smap_covers(&idents, &smap));
        }

        #[test]
        fn duplicate_occurrences_at_one_offset_need_one_entry() {
            let idents = vec![ident(4), ident(4)];
            let smap = vec![entry(4)];
            assert!(smap_covers(&idents, &smap));
        }
    }

    mod wire_format {
        use super::*;

        #[test]
        fn idents_deserialize_from_capitalized_fields() {
            let raw = r#"[{"Name": "foo", "Offset": 12}, {"Name": "bar", "Offset": 40}]"#;
            let idents: Vec<IdentOccurrence> = serde_json::from_str(raw).unwrap();
            assert_eq!(idents.len(), 2);
            assert_eq!(idents[0].name, "foo");
            assert_eq!(idents[0].offset, 12);
            assert_eq!(idents[1].offset, 40);
        }

        #[test]
        fn smap_entries_ignore_unknown_fields() {
            let raw = r#"[{"Offset": 5, "Length": 3, "Kind": "var", "Scope": 2}]"#;
            let smap: Vec<SmapEntry> = serde_json::from_str(raw).unwrap();
            assert_eq!(smap[0].offset, 5);
            assert_eq!(smap[0].length, 3);
        }

        #[test]
        fn smap_length_defaults_to_zero() {
            let raw = r#"[{"Offset": 5}]"#;
            let smap: Vec<SmapEntry> = serde_json::from_str(raw).unwrap();
            assert_eq!(smap[0].length, 0);
        }

        #[test]
        fn malformed_input_is_an_error() {
            assert!(serde_json::from_str::<Vec<SmapEntry>>("not json").is_err());
            assert!(serde_json::from_str::<Vec<SmapEntry>>(r#"{"Offset": 5}"#).is_err());
            assert!(serde_json::from_str::<Vec<IdentOccurrence>>(r#"[{"Name": "x"}]"#).is_err());
        }

        #[test]
        fn empty_array_deserializes() {
            let idents: Vec<IdentOccurrence> = serde_json::from_str("[]").unwrap();
            assert!(idents.is_empty());
        }
    }
}
