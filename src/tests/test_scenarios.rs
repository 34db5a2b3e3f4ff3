//! End-to-end runs over the public pipeline: CSV in, score table out.

use approx::assert_relative_eq;

use crate::aggregate::write_scores;
use crate::builder::AlignerBuilder;
use crate::ingest::{read_data, read_vertex};
use crate::levels::build_levels;
use crate::registry::IdRegistry;
use crate::tests::TRIALS;
use crate::vertexsim::VertexSimMap;

fn pipeline(
    data_csv: &str,
    vertex_csv: Option<&str>,
    entity_diff: Option<&str>,
) -> (Vec<f64>, IdRegistry) {
    let rows = read_data(data_csv.as_bytes()).unwrap();
    let mut registry = IdRegistry::new();
    let set = build_levels(&rows, &mut registry).unwrap();
    registry.freeze();

    let map = match vertex_csv {
        Some(csv) => {
            let vertex_rows = read_vertex(csv.as_bytes()).unwrap();
            VertexSimMap::from_rows(&vertex_rows, &set, &registry).unwrap()
        }
        None => VertexSimMap::identity(&set, &registry, entity_diff),
    };

    let aligner = AlignerBuilder::new()
        .with_steps(TRIALS)
        .with_seed(42)
        .build()
        .unwrap();
    let scores = aligner.align(&set, &map, registry.len());
    (scores, registry)
}

#[test]
fn perfectly_correlated_levels_end_to_end() {
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,e1,1.0
A,1,e2,2.0
A,2,e1,2.0
A,2,e2,4.0
B,1,e1,1.0
B,1,e2,2.0
B,2,e1,2.0
B,2,e2,4.0
";
    let (scores, registry) = pipeline(data, None, None);
    assert_relative_eq!(scores[registry.resolve("e1").unwrap()], 1.0, epsilon = 1e-9);
    assert_relative_eq!(scores[registry.resolve("e2").unwrap()], 1.0, epsilon = 1e-9);
}

#[test]
fn entity_diff_suffix_matches_across_levels() {
    // ARG29 measured in level A, ARG29_7 in level B with the same values;
    // the "_" separator makes them the same vertex.
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,ARG29,1.0
A,2,ARG29,2.0
B,1,ARG29_7,1.0
B,2,ARG29_7,2.0
";
    let (scores, registry) = pipeline(data, None, Some("_"));
    assert_relative_eq!(
        scores[registry.resolve("ARG29").unwrap()],
        1.0,
        epsilon = 1e-9
    );
    assert_relative_eq!(
        scores[registry.resolve("ARG29_7").unwrap()],
        1.0,
        epsilon = 1e-9
    );
}

#[test]
fn disjoint_levels_print_nan_rows() {
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,e1,1.0
B,1,e2,2.0
";
    let (scores, registry) = pipeline(data, None, None);

    let mut out = Vec::new();
    write_scores(&mut out, &registry, &scores).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "e1\tNaN\ne2\tNaN\n");
}

#[test]
fn user_supplied_vertex_map_links_distinct_names() {
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,x,1.0
A,1,y,2.0
A,2,x,2.0
A,2,y,4.0
B,1,x,1.0
B,1,z,2.0
B,2,x,2.0
B,2,z,4.0
";
    let vertex = "\
vertexLevel1,vertexLevel2,vertex1,vertex2,similarity
A,B,x,x,1.0
A,B,y,z,1.0
";
    let (scores, registry) = pipeline(data, Some(vertex), None);

    for name in ["x", "y", "z"] {
        let idx = registry.resolve(name).unwrap();
        assert!(
            !scores[idx].is_nan(),
            "{} should be scored through the vertex map",
            name
        );
        assert!((-1.0..=1.0).contains(&scores[idx]));
    }
}

#[test]
fn three_levels_aggregate_over_all_pairs() {
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,e1,1.0
A,1,e2,2.0
A,2,e1,2.0
A,2,e2,4.0
B,1,e1,1.0
B,1,e2,2.0
B,2,e1,2.0
B,2,e2,4.0
C,1,e1,1.0
C,1,e2,2.0
C,2,e1,2.0
C,2,e2,4.0
";
    let (scores, registry) = pipeline(data, None, None);
    // Three identical levels: every pair scores 1, so the mean does too.
    assert_relative_eq!(scores[registry.resolve("e1").unwrap()], 1.0, epsilon = 1e-9);
    assert_relative_eq!(scores[registry.resolve("e2").unwrap()], 1.0, epsilon = 1e-9);
}

#[test]
fn end_to_end_runs_are_reproducible_under_a_seed() {
    let data = "\
dataLevel,dataReplicate,vertex,intensity
A,1,e1,1.4
A,1,e2,2.3
A,2,e1,2.9
A,2,e2,4.1
A,3,e1,0.7
A,3,e2,5.2
B,1,e1,1.1
B,1,e2,2.8
B,2,e1,2.2
B,2,e2,3.6
B,3,e1,3.3
B,3,e2,1.9
";
    let (first, _) = pipeline(data, None, None);
    let (second, _) = pipeline(data, None, None);
    for (a, b) in first.iter().zip(second.iter()) {
        assert!(a.total_cmp(b).is_eq(), "non-reproducible: {} vs {}", a, b);
    }
}
