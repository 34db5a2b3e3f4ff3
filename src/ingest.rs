//! CSV ingestion for the data, vertex-similarity, and truth tables.
//!
//! Data input (headered): `dataLevel,dataReplicate,vertex,intensity`.
//! Vertex input (headered): `vertexLevel1,vertexLevel2,vertex1,vertex2,similarity`.
//! Truth input: one entity name per line, no header.
//!
//! Any malformed row aborts the run; errors carry 1-based row numbers.

use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};

/// One measurement row from the data table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRow {
    pub level: String,
    pub replicate: String,
    pub entity: String,
    pub intensity: f64,
}

/// One cross-level similarity row from the vertex table.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexRow {
    pub level1: String,
    pub level2: String,
    pub entity1: String,
    pub entity2: String,
    pub similarity: f64,
}

fn field<'a>(record: &'a csv::StringRecord, row: usize, col: usize) -> Result<&'a str> {
    record
        .get(col)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InputFormat(format!("row {}: missing column {}", row, col)))
}

fn real(record: &csv::StringRecord, row: usize, col: usize) -> Result<f64> {
    let raw = field(record, row, col)?;
    raw.parse()
        .map_err(|e| Error::InputFormat(format!("row {}: bad number '{}': {}", row, raw, e)))
}

/// Parse the data table from a reader.
pub fn read_data<R: Read>(reader: R) -> Result<Vec<DataRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let row_no = idx + 1;
        let record =
            result.map_err(|e| Error::InputFormat(format!("row {}: {}", row_no, e)))?;
        rows.push(DataRow {
            level: field(&record, row_no, 0)?.to_string(),
            replicate: field(&record, row_no, 1)?.to_string(),
            entity: field(&record, row_no, 2)?.to_string(),
            intensity: real(&record, row_no, 3)?,
        });
    }

    debug!("Parsed {} data rows", rows.len());
    Ok(rows)
}

/// Parse the data table from a file path.
pub fn read_data_file(path: &Path) -> Result<Vec<DataRow>> {
    info!("Reading data input from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_data(BufReader::new(file))
}

/// Parse the vertex-similarity table from a reader.
pub fn read_vertex<R: Read>(reader: R) -> Result<Vec<VertexRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in csv_reader.records().enumerate() {
        let row_no = idx + 1;
        let record =
            result.map_err(|e| Error::InputFormat(format!("row {}: {}", row_no, e)))?;
        rows.push(VertexRow {
            level1: field(&record, row_no, 0)?.to_string(),
            level2: field(&record, row_no, 1)?.to_string(),
            entity1: field(&record, row_no, 2)?.to_string(),
            entity2: field(&record, row_no, 3)?.to_string(),
            similarity: real(&record, row_no, 4)?,
        });
    }

    debug!("Parsed {} vertex similarity rows", rows.len());
    Ok(rows)
}

/// Parse the vertex-similarity table from a file path.
pub fn read_vertex_file(path: &Path) -> Result<Vec<VertexRow>> {
    info!("Reading vertex input from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_vertex(BufReader::new(file))
}

/// Parse a truth set: one entity name per non-empty line.
pub fn read_truth<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Parse a truth set from a file path.
pub fn read_truth_file(path: &Path) -> Result<Vec<String>> {
    info!("Reading truth input from {}", path.display());
    let file = std::fs::File::open(path)?;
    read_truth(file)
}
