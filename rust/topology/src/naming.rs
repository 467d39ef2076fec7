// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topological naming: stable names across rebuilds.
//!
//! Every rebuilt face (or edge) collects *claims* from the entities it was
//! derived from: a prior name and the amount of overlap (area for faces,
//! carrier length for edges). Claims are resolved greedily over the whole
//! rebuild so a name is never handed out twice.
//!
//! Targets claimed by a single name are served first, so an entity with one
//! contributor always inherits its name unless that name is split across
//! several such targets. Targets with several contributor names follow.
//! Within each pass claims are taken in order of:
//!
//! 1. larger overlap, compared at a relative resolution of `1e-9` of the
//!    largest claim so float noise cannot reorder near-equal claims;
//! 2. lexicographically smaller name;
//! 3. lower target index.
//!
//! A target whose claims are all taken by better claims is left unnamed and
//! receives a fresh name from [`NameAllocator`].

use std::cmp::Reverse;

use rustc_hash::FxHashSet;

/// Relative resolution at which overlaps are compared.
const OVERLAP_RESOLUTION: f64 = 1e-9;

/// One contributor's claim on a rebuilt entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Index of the rebuilt entity.
    pub target: usize,
    pub name: String,
    pub overlap: f64,
}

/// Result of [`resolve_claims`].
#[derive(Debug, Clone, Default)]
pub struct NameAssignment {
    /// Winning name per target; `None` needs a fresh name.
    pub names: Vec<Option<String>>,
    /// Every distinct claimed name per target, strongest claim first.
    pub sources: Vec<Vec<String>>,
}

/// Resolves claims on `target_count` entities.
pub fn resolve_claims(target_count: usize, claims: &[Claim]) -> NameAssignment {
    let max = claims
        .iter()
        .map(|c| c.overlap)
        .filter(|o| o.is_finite())
        .fold(0.0_f64, f64::max);
    let quantum = if max > 0.0 { max * OVERLAP_RESOLUTION } else { 1.0 };
    let level = |overlap: f64| (overlap / quantum).round() as i64;

    let mut ordered: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.target < target_count && c.overlap > 0.0 && !c.name.is_empty())
        .collect();
    ordered.sort_by(|a, b| {
        Reverse(level(a.overlap))
            .cmp(&Reverse(level(b.overlap)))
            .then_with(|| a.name.cmp(&b.name))
            .then(a.target.cmp(&b.target))
    });

    let mut sources: Vec<Vec<String>> = vec![Vec::new(); target_count];
    for claim in &ordered {
        let source = &mut sources[claim.target];
        if !source.contains(&claim.name) {
            source.push(claim.name.clone());
        }
    }

    let mut names: Vec<Option<String>> = vec![None; target_count];
    let mut used: FxHashSet<&str> = FxHashSet::default();
    for single in [true, false] {
        for claim in ordered
            .iter()
            .filter(|c| (sources[c.target].len() == 1) == single)
        {
            if names[claim.target].is_none() && used.insert(claim.name.as_str()) {
                names[claim.target] = Some(claim.name.clone());
            }
        }
    }

    NameAssignment { names, sources }
}

/// Per-sketch counters for fresh names.
///
/// Counters only grow, so a fresh name is never one that was handed out
/// earlier in the sketch's history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameAllocator {
    next_face: u64,
    next_edge: u64,
    next_guide: u64,
}

impl NameAllocator {
    /// Fresh face name (`face-<n>`) that `taken` does not contain.
    pub fn fresh_face(&mut self, taken: impl Fn(&str) -> bool) -> String {
        Self::fresh("face", &mut self.next_face, taken)
    }

    /// Fresh edge name (`edge-<n>`) that `taken` does not contain.
    pub fn fresh_edge(&mut self, taken: impl Fn(&str) -> bool) -> String {
        Self::fresh("edge", &mut self.next_edge, taken)
    }

    /// Fresh guide line name (`guide-<n>`) that `taken` does not contain.
    pub fn fresh_guide(&mut self, taken: impl Fn(&str) -> bool) -> String {
        Self::fresh("guide", &mut self.next_guide, taken)
    }

    fn fresh(prefix: &str, counter: &mut u64, taken: impl Fn(&str) -> bool) -> String {
        loop {
            *counter += 1;
            let name = format!("{prefix}-{counter}");
            if !taken(&name) {
                return name;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(target: usize, name: &str, overlap: f64) -> Claim {
        Claim {
            target,
            name: name.into(),
            overlap,
        }
    }

    #[test]
    fn single_contributor_inherits() {
        let out = resolve_claims(1, &[claim(0, "A", 12.0)]);
        assert_eq!(out.names, vec![Some("A".to_string())]);
        assert_eq!(out.sources[0], vec!["A".to_string()]);
    }

    #[test]
    fn largest_overlap_wins_merge() {
        let out = resolve_claims(1, &[claim(0, "A", 12.0), claim(0, "B", 20.0)]);
        assert_eq!(out.names[0].as_deref(), Some("B"));
        assert_eq!(out.sources[0], vec!["B".to_string(), "A".to_string()]);
    }

    #[test]
    fn near_equal_tie_breaks_by_name() {
        let out = resolve_claims(1, &[claim(0, "B", 12.0), claim(0, "A", 12.0 * (1.0 - 1e-13))]);
        assert_eq!(out.names[0].as_deref(), Some("A"));
    }

    #[test]
    fn equal_overlap_breaks_tie_by_smaller_name() {
        let out = resolve_claims(1, &[claim(0, "Zed", 5.0), claim(0, "Old", 5.0)]);
        assert_eq!(out.names[0].as_deref(), Some("Old"));
        assert_eq!(out.sources[0], vec!["Old".to_string(), "Zed".to_string()]);
    }

    #[test]
    fn single_contributor_target_is_served_first() {
        // A = 0..4 overlapped by C = 3..5: the A/C overlap ties with the C-only piece
        let out = resolve_claims(
            3,
            &[
                claim(0, "A", 9.0),
                claim(1, "A", 3.0),
                claim(1, "C", 3.0),
                claim(2, "C", 3.0),
            ],
        );
        assert_eq!(out.names, vec![Some("A".to_string()), None, Some("C".to_string())]);
        assert_eq!(out.sources[1], vec!["A".to_string(), "C".to_string()]);
    }

    #[test]
    fn multi_contributor_target_takes_leftover_name() {
        let out = resolve_claims(2, &[claim(0, "A", 4.0), claim(1, "A", 8.0), claim(1, "B", 6.0)]);
        assert_eq!(out.names, vec![Some("A".to_string()), Some("B".to_string())]);
    }

    #[test]
    fn split_face_keeps_name_on_larger_piece() {
        // Face "A" split into a 3-unit piece and a 9-unit piece
        let out = resolve_claims(2, &[claim(0, "A", 3.0), claim(1, "A", 9.0)]);
        assert_eq!(out.names, vec![None, Some("A".to_string())]);
        assert_eq!(out.sources[0], vec!["A".to_string()]);
    }

    #[test]
    fn zero_overlap_is_ignored() {
        let out = resolve_claims(1, &[claim(0, "A", 0.0)]);
        assert_eq!(out.names, vec![None]);
        assert!(out.sources[0].is_empty());
    }

    #[test]
    fn fresh_names_skip_taken() {
        let mut names = NameAllocator::default();
        let taken = ["face-1", "face-2"];
        let fresh = names.fresh_face(|n| taken.contains(&n));
        assert_eq!(fresh, "face-3");
        assert_eq!(names.fresh_face(|_| false), "face-4");
        assert_eq!(names.fresh_edge(|_| false), "edge-1");
        assert_eq!(names.fresh_guide(|_| false), "guide-1");
    }
}
