use crate::error::Error;
use crate::ingest::{read_data, read_truth, read_vertex};

const DATA: &str = "\
dataLevel,dataReplicate,vertex,intensity
proteomic,r1,p53,1.5
proteomic,r2,p53,2.25
rna,r1,p53,-0.5
";

#[test]
fn parses_data_table() {
    let rows = read_data(DATA.as_bytes()).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].level, "proteomic");
    assert_eq!(rows[0].replicate, "r1");
    assert_eq!(rows[0].entity, "p53");
    assert_eq!(rows[0].intensity, 1.5);
    assert_eq!(rows[2].intensity, -0.5);
}

#[test]
fn rejects_unparsable_intensity() {
    let input = "dataLevel,dataReplicate,vertex,intensity\nproteomic,r1,p53,abc\n";
    match read_data(input.as_bytes()) {
        Err(Error::InputFormat(msg)) => {
            assert!(msg.contains("row 1"), "message should carry the row: {}", msg)
        }
        other => panic!("expected InputFormat, got {:?}", other),
    }
}

#[test]
fn rejects_missing_column() {
    let input = "dataLevel,dataReplicate,vertex,intensity\nproteomic,r1,p53\n";
    assert!(matches!(
        read_data(input.as_bytes()),
        Err(Error::InputFormat(_))
    ));
}

#[test]
fn parses_vertex_table() {
    let input = "\
vertexLevel1,vertexLevel2,vertex1,vertex2,similarity
proteomic,rna,ARG29,ARG29_7,1.0
proteomic,rna,p53,p53,0.8
";
    let rows = read_vertex(input.as_bytes()).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].entity2, "ARG29_7");
    assert_eq!(rows[1].similarity, 0.8);
}

#[test]
fn rejects_unparsable_similarity() {
    let input = "vertexLevel1,vertexLevel2,vertex1,vertex2,similarity\na,b,x,y,high\n";
    assert!(matches!(
        read_vertex(input.as_bytes()),
        Err(Error::InputFormat(_))
    ));
}

#[test]
fn parses_truth_lines() {
    let input = "p53\n\nBRCA1\n  ARG29  \n";
    let names = read_truth(input.as_bytes()).unwrap();
    assert_eq!(names, vec!["p53", "BRCA1", "ARG29"]);
}
