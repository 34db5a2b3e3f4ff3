//! Cross-level alignment of entity measurements.
//!
//! alignspace integrates intensity measurements of one set of entities taken
//! by multiple independent experiments ("levels") and reports, per entity, a
//! score of how consistent that entity's behavior is across levels.
//!
//! The pipeline:
//!
//! - [`registry`]: canonical dense integer ids for entity names.
//! - [`ingest`] / [`levels`]: CSV rows grouped into replicate-indexed
//!   per-level tables.
//! - [`edgesim`]: per-level sparse symmetric similarity between entities'
//!   replicate vectors, plus cross-level vertex-similarity injection.
//! - [`vertexsim`]: inter-level entity similarity (identity default,
//!   entity-diff suffix matching, or user supplied).
//! - [`cosine`] / [`walker`]: the two alignment engines, producing per-pair
//!   per-entity scores with confidence statistics.
//! - [`aggregate`]: per-entity mean over all level pairs, ranking, accuracy
//!   and the output table.
//!
//! The [`builder::AlignerBuilder`] ties the pieces together:
//!
//! ```
//! use alignspace::builder::AlignerBuilder;
//! use alignspace::ingest::DataRow;
//! use alignspace::levels::build_levels;
//! use alignspace::registry::IdRegistry;
//! use alignspace::vertexsim::VertexSimMap;
//!
//! let rows = vec![
//!     DataRow { level: "a".into(), replicate: "r1".into(), entity: "e1".into(), intensity: 1.0 },
//!     DataRow { level: "a".into(), replicate: "r1".into(), entity: "e2".into(), intensity: 2.0 },
//!     DataRow { level: "a".into(), replicate: "r2".into(), entity: "e1".into(), intensity: 2.0 },
//!     DataRow { level: "a".into(), replicate: "r2".into(), entity: "e2".into(), intensity: 4.0 },
//!     DataRow { level: "b".into(), replicate: "r1".into(), entity: "e1".into(), intensity: 1.0 },
//!     DataRow { level: "b".into(), replicate: "r1".into(), entity: "e2".into(), intensity: 2.0 },
//!     DataRow { level: "b".into(), replicate: "r2".into(), entity: "e1".into(), intensity: 2.0 },
//!     DataRow { level: "b".into(), replicate: "r2".into(), entity: "e2".into(), intensity: 4.0 },
//! ];
//! let mut registry = IdRegistry::new();
//! let set = build_levels(&rows, &mut registry).unwrap();
//! registry.freeze();
//!
//! let vertex_map = VertexSimMap::identity(&set, &registry, None);
//! let aligner = AlignerBuilder::new().with_steps(10).with_seed(42).build().unwrap();
//! let scores = aligner.align(&set, &vertex_map, registry.len());
//! assert!((scores[0] - 1.0).abs() < 1e-9);
//! ```

pub mod aggregate;
pub mod builder;
pub mod cosine;
pub mod edgesim;
pub mod error;
pub mod ingest;
pub mod levels;
pub mod registry;
pub mod stats;
pub mod vertexsim;
pub mod walker;

#[cfg(test)]
mod tests;
