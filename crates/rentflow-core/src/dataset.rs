use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::error::Result;

/// Loads a listings CSV into memory. Schema is inferred; date-like columns
/// stay as strings until [`cleaning::clean`](crate::cleaning::clean)
/// reparses them.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1024))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Writes a frame as CSV with a header row and no index column. Dates are
/// serialized in the same `%Y-%m-%d` form they were parsed from.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_date_format(Some("%Y-%m-%d".into()))
        .finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_roundtrip_keeps_header_and_adds_no_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");

        let mut df = df!(
            "price" => [120i64, 45],
            "last_review" => ["2019-05-21", "2020-01-02"],
        )
        .unwrap();
        write_csv(&mut df, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("price,last_review"));
        assert_eq!(lines.next(), Some("120,2019-05-21"));

        let reread = read_csv(&path).unwrap();
        assert_eq!(reread.height(), 2);
        assert_eq!(reread.get_column_names().len(), 2);
    }
}
