//! Level construction: raw measurement rows grouped into replicate-indexed
//! per-level tables.
//!
//! A `StandardLevel` maps each entity index to one (possibly missing) value
//! per replicate, replicates in sorted-name order so that downstream pair
//! similarities are deterministic. Missing values stay absent, never zero.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::ingest::DataRow;
use crate::registry::IdRegistry;

/// Dense per-level table of replicate intensities.
#[derive(Debug, Clone)]
pub struct StandardLevel {
    pub name: String,
    /// Replicate names in sorted order; positions in the intensity vectors
    /// follow this order.
    pub replicates: Vec<String>,
    /// Entity index to per-replicate intensity; `None` marks a missing value.
    pub intensities: HashMap<usize, Vec<Option<f64>>>,
}

impl StandardLevel {
    /// Entity indices present in this level, ascending.
    pub fn entities(&self) -> Vec<usize> {
        let mut out: Vec<usize> = self.intensities.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn replicate_vector(&self, entity: usize) -> Option<&[Option<f64>]> {
        self.intensities.get(&entity).map(|v| v.as_slice())
    }

    pub fn n_replicates(&self) -> usize {
        self.replicates.len()
    }
}

/// All levels of a run, sorted by level name so pair enumeration is stable.
#[derive(Debug, Clone, Default)]
pub struct LevelSet {
    pub levels: Vec<StandardLevel>,
}

impl LevelSet {
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, idx: usize) -> &StandardLevel {
        &self.levels[idx]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|l| l.name == name)
    }

    /// All unordered level pairs `(a, b)` with `a < b`.
    pub fn pairs(&self) -> Vec<(usize, usize)> {
        let n = self.levels.len();
        let mut out = Vec::with_capacity(n * (n.saturating_sub(1)) / 2);
        for a in 0..n {
            for b in (a + 1)..n {
                out.push((a, b));
            }
        }
        out
    }
}

/// Group raw rows into `StandardLevel`s, interning every entity name.
///
/// Fails when a `(level, replicate, entity)` triple appears more than once.
pub fn build_levels(rows: &[DataRow], registry: &mut IdRegistry) -> Result<LevelSet> {
    info!("Grouping {} rows into levels", rows.len());

    // level -> replicate -> entity index -> intensity, B-tree keyed so the
    // replicate order is the sorted order of replicate names.
    let mut grouped: BTreeMap<&str, BTreeMap<&str, HashMap<usize, f64>>> = BTreeMap::new();
    let mut seen: HashSet<(&str, &str, usize)> = HashSet::new();

    for row in rows {
        let entity = registry.intern(&row.entity)?;
        if !seen.insert((row.level.as_str(), row.replicate.as_str(), entity)) {
            return Err(Error::DuplicateRow {
                level: row.level.clone(),
                replicate: row.replicate.clone(),
                entity: row.entity.clone(),
            });
        }
        grouped
            .entry(&row.level)
            .or_default()
            .entry(&row.replicate)
            .or_default()
            .insert(entity, row.intensity);
    }

    let mut levels = Vec::with_capacity(grouped.len());
    for (level_name, replicates) in grouped {
        let replicate_names: Vec<String> =
            replicates.keys().map(|r| r.to_string()).collect();
        let n_reps = replicate_names.len();

        let entity_union: BTreeSet<usize> = replicates
            .values()
            .flat_map(|table| table.keys().copied())
            .collect();

        let mut intensities: HashMap<usize, Vec<Option<f64>>> =
            HashMap::with_capacity(entity_union.len());
        for &entity in &entity_union {
            let mut vector = Vec::with_capacity(n_reps);
            for table in replicates.values() {
                vector.push(table.get(&entity).copied());
            }
            intensities.insert(entity, vector);
        }

        debug!(
            "Level '{}': {} replicates, {} entities",
            level_name,
            n_reps,
            entity_union.len()
        );
        levels.push(StandardLevel {
            name: level_name.to_string(),
            replicates: replicate_names,
            intensities,
        });
    }

    info!("Built {} levels", levels.len());
    Ok(LevelSet { levels })
}
