use std::path::Path;

use serde::Deserialize;

use crate::Error;

#[derive(Debug, Deserialize)]
struct IdRecord {
    cleabs: String,
}

/// Reads a hand-maintained identifier list: a CSV file with a `cleabs`
/// column. Blank identifiers are skipped.
pub fn read_id_list(path: &Path) -> Result<Vec<String>, Error> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut ids = Vec::new();
    for record in reader.deserialize::<IdRecord>() {
        let record = record?;
        let id = record.cleabs.trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_cleabs_column() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "cleabs,comment\nTRONCDEA1,canal\n ,blank\nTRONCDEA2,").expect("write");
        let ids = read_id_list(file.path()).expect("parse");
        assert_eq!(ids, vec!["TRONCDEA1".to_string(), "TRONCDEA2".to_string()]);
    }
}
