//! Cross-level vertex similarity maps.
//!
//! The default map is the identity on entity names: an entity present in both
//! levels of a pair maps to itself with similarity 1. With an entity-diff
//! separator `s`, two names from different levels are additionally identical
//! iff exactly one of them contains `s` and their prefixes up to the first
//! `s` are equal (`ARG29` vs `ARG29_7` with `s = "_"`). A user-supplied table
//! replaces the default entirely.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::ingest::VertexRow;
use crate::levels::LevelSet;
use crate::registry::IdRegistry;

/// Entries for one unordered level pair: `((i, j), sim)` with `i` drawn from
/// the lower-indexed level and `j` from the higher-indexed one.
pub type VertexPairs = Vec<((usize, usize), f64)>;

#[derive(Debug, Clone, Default)]
pub struct VertexSimMap {
    pairs: HashMap<(usize, usize), VertexPairs>,
}

impl VertexSimMap {
    /// Entries for the unordered pair `(a, b)`; empty when none are known.
    pub fn pairs(&self, a: usize, b: usize) -> &[((usize, usize), f64)] {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.pairs.get(&key).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Default identity map over every level pair of `set`.
    pub fn identity(
        set: &LevelSet,
        registry: &IdRegistry,
        entity_diff: Option<&str>,
    ) -> Self {
        let mut pairs: HashMap<(usize, usize), VertexPairs> = HashMap::new();

        for (a, b) in set.pairs() {
            let ents_a: BTreeSet<usize> = set.get(a).entities().into_iter().collect();
            let ents_b: BTreeSet<usize> = set.get(b).entities().into_iter().collect();

            let mut entries: VertexPairs = ents_a
                .intersection(&ents_b)
                .map(|&k| ((k, k), 1.0))
                .collect();

            if let Some(sep) = entity_diff {
                entries.extend(diff_matches(&ents_a, &ents_b, registry, sep));
            }

            debug!(
                "Identity vertex map for ({}, {}): {} entries",
                set.get(a).name,
                set.get(b).name,
                entries.len()
            );
            pairs.insert((a, b), entries);
        }

        Self { pairs }
    }

    /// Build from a user-supplied table. Rows referencing levels or entities
    /// absent from the data input are fatal.
    pub fn from_rows(
        rows: &[VertexRow],
        set: &LevelSet,
        registry: &IdRegistry,
    ) -> Result<Self> {
        info!("Building vertex similarity map from {} rows", rows.len());
        let mut pairs: HashMap<(usize, usize), VertexPairs> = HashMap::new();

        for row in rows {
            let l1 = set
                .index_of(&row.level1)
                .ok_or_else(|| Error::UnknownLevel(row.level1.clone()))?;
            let l2 = set
                .index_of(&row.level2)
                .ok_or_else(|| Error::UnknownLevel(row.level2.clone()))?;
            let e1 = registry
                .resolve(&row.entity1)
                .ok_or_else(|| Error::UnknownEntity(row.entity1.clone()))?;
            let e2 = registry
                .resolve(&row.entity2)
                .ok_or_else(|| Error::UnknownEntity(row.entity2.clone()))?;

            if l1 == l2 {
                warn!(
                    "Ignoring within-level vertex similarity ({}, {}) in level '{}'",
                    row.entity1, row.entity2, row.level1
                );
                continue;
            }

            let (key, entry) = if l1 < l2 {
                ((l1, l2), ((e1, e2), row.similarity))
            } else {
                ((l2, l1), ((e2, e1), row.similarity))
            };
            pairs.entry(key).or_default().push(entry);
        }

        Ok(Self { pairs })
    }
}

/// Cross-level matches under the entity-diff rule: exactly one name contains
/// the separator and the prefix up to its first occurrence equals the other
/// name.
fn diff_matches(
    ents_a: &BTreeSet<usize>,
    ents_b: &BTreeSet<usize>,
    registry: &IdRegistry,
    sep: &str,
) -> VertexPairs {
    // Names without the separator keyed verbatim; names with it keyed by
    // prefix. A match pairs a bare name on one side with a suffixed one on
    // the other.
    let mut bare_b: HashMap<&str, usize> = HashMap::new();
    let mut prefixed_b: HashMap<&str, Vec<usize>> = HashMap::new();
    for &j in ents_b {
        let name = registry.lookup(j).expect("entity index in registry");
        match name.split_once(sep) {
            Some((prefix, _)) => prefixed_b.entry(prefix).or_default().push(j),
            None => {
                bare_b.insert(name, j);
            }
        }
    }

    let mut out = VertexPairs::new();
    for &i in ents_a {
        let name = registry.lookup(i).expect("entity index in registry");
        match name.split_once(sep) {
            Some((prefix, _)) => {
                if let Some(&j) = bare_b.get(prefix) {
                    if i != j {
                        out.push(((i, j), 1.0));
                    }
                }
            }
            None => {
                if let Some(matches) = prefixed_b.get(name) {
                    for &j in matches {
                        if i != j {
                            out.push(((i, j), 1.0));
                        }
                    }
                }
            }
        }
    }
    out
}
