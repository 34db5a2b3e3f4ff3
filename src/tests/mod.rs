#[cfg(test)]
mod test_builder;
#[cfg(test)]
mod test_ingest;
#[cfg(test)]
mod test_scenarios;
#[cfg(test)]
mod test_walker;

use crate::ingest::DataRow;
use crate::levels::{build_levels, LevelSet};
use crate::registry::IdRegistry;

pub const TRIALS: usize = 10;

/// Build a frozen registry and level set from `(level, replicate, entity,
/// intensity)` tuples.
pub fn level_set(rows: &[(&str, &str, &str, f64)]) -> (LevelSet, IdRegistry) {
    let data: Vec<DataRow> = rows
        .iter()
        .map(|&(level, replicate, entity, intensity)| DataRow {
            level: level.to_string(),
            replicate: replicate.to_string(),
            entity: entity.to_string(),
            intensity,
        })
        .collect();

    let mut registry = IdRegistry::new();
    let set = build_levels(&data, &mut registry).expect("valid fixture rows");
    registry.freeze();
    (set, registry)
}

/// Two identical levels, two entities, perfectly correlated replicates.
pub fn mirrored_levels() -> (LevelSet, IdRegistry) {
    level_set(&[
        ("a", "1", "e1", 1.0),
        ("a", "1", "e2", 2.0),
        ("a", "2", "e1", 2.0),
        ("a", "2", "e2", 4.0),
        ("b", "1", "e1", 1.0),
        ("b", "1", "e2", 2.0),
        ("b", "2", "e1", 2.0),
        ("b", "2", "e2", 4.0),
    ])
}
