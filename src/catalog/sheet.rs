//! Product catalog table.
//!
//! The catalog is a table with a header row; each row becomes a map from
//! column name to JSON value. xlsx cells keep their stored type. CSV cells
//! are typed the way a spreadsheet reader would type them: integers and
//! floats become numbers, empty cells become null, everything else stays
//! text.

use std::io::{Read, Seek};
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::{Map, Number, Value};

use super::CatalogError;
use super::workbook;

/// Rows of the catalog table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSheet {
    /// Column names in table order
    pub columns: Vec<String>,
    /// One map per row
    pub rows: Vec<Map<String, Value>>,
}

impl CatalogSheet {
    /// Load an `.xlsx`, `.csv` or `.json` (array of records) catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        let io_error = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        match extension.as_deref() {
            Some("xlsx") => Self::from_xlsx_reader(std::fs::File::open(path).map_err(io_error)?),
            Some("csv") => Self::from_csv_reader(std::fs::File::open(path).map_err(io_error)?),
            Some("json") => {
                let text = std::fs::read_to_string(path).map_err(io_error)?;
                let value = serde_json::from_str(&text).map_err(|source| CatalogError::Json {
                    file: path.display().to_string(),
                    source,
                })?;
                Self::from_records(value)
            }
            _ => Err(CatalogError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Parse CSV with a header row.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row = columns
                .iter()
                .enumerate()
                .map(|(i, column)| (column.clone(), parse_cell(record.get(i).unwrap_or(""))))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Read the first worksheet of an xlsx workbook; its first row is the header.
    pub fn from_xlsx_reader<R: Read + Seek>(reader: R) -> Result<Self, CatalogError> {
        let mut grid = workbook::read_first_sheet(reader)?.into_iter();
        let Some(header) = grid.next() else {
            return Ok(Self::default());
        };

        let columns: Vec<String> = header
            .iter()
            .map(|cell| match cell {
                Value::String(s) => s.trim().to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            })
            .collect();
        let rows: Vec<Map<String, Value>> = grid
            .map(|mut cells| {
                cells.resize(columns.len(), Value::Null);
                columns.iter().cloned().zip(cells).collect::<Map<String, Value>>()
            })
            .collect();

        Ok(Self { columns, rows })
    }

    /// Build from a JSON array of row objects.
    pub fn from_records(value: Value) -> Result<Self, CatalogError> {
        let records: Vec<Map<String, Value>> =
            serde_json::from_value(value).map_err(|source| CatalogError::Json {
                file: "catalog".to_string(),
                source,
            })?;

        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        Ok(Self {
            columns,
            rows: records,
        })
    }

    /// Check whether a column exists.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Type a CSV cell.
fn parse_cell(raw: &str) -> Value {
    let cell = raw.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = cell.parse::<u64>() {
        return Value::Number(u.into());
    }
    if let Some(n) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(cell.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    const CSV: &str = "\
UPC CODE,BRAND,DESCRIPTION,PRICE
7861042566762,Acme,Chocolate bar,1.25
0123,Beta,Gum,
,Gamma,Unknown,3
";

    #[test]
    fn test_csv_cells_are_typed() {
        let sheet = CatalogSheet::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(sheet.columns, vec!["UPC CODE", "BRAND", "DESCRIPTION", "PRICE"]);
        assert_eq!(sheet.len(), 3);

        let first = &sheet.rows[0];
        assert_eq!(first["UPC CODE"], json!(7861042566762_i64));
        assert_eq!(first["BRAND"], json!("Acme"));
        assert_eq!(first["PRICE"], json!(1.25));

        assert_eq!(sheet.rows[1]["UPC CODE"], json!(123));
        assert_eq!(sheet.rows[1]["PRICE"], Value::Null);
        assert_eq!(sheet.rows[2]["UPC CODE"], Value::Null);
    }

    #[test]
    fn test_short_rows_padded_with_null() {
        let sheet = CatalogSheet::from_csv_reader("A,B\n1\n".as_bytes()).unwrap();
        assert_eq!(sheet.rows[0]["A"], json!(1));
        assert_eq!(sheet.rows[0]["B"], Value::Null);
    }

    #[test]
    fn test_records() {
        let sheet = CatalogSheet::from_records(json!([
            {"UPC CODE": 1, "BRAND": "A"},
            {"UPC CODE": 2, "SIZE": "L"}
        ]))
        .unwrap();
        assert_eq!(sheet.columns, vec!["UPC CODE", "BRAND", "SIZE"]);
        assert!(sheet.has_column("SIZE"));
        assert!(!sheet.has_column("PRICE"));
    }

    #[test]
    fn test_records_must_be_objects() {
        assert!(CatalogSheet::from_records(json!([1, 2])).is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("catalog.csv");
        std::fs::File::create(&csv_path)
            .unwrap()
            .write_all(CSV.as_bytes())
            .unwrap();
        assert_eq!(CatalogSheet::load(&csv_path).unwrap().len(), 3);

        let json_path = dir.path().join("catalog.json");
        std::fs::write(&json_path, r#"[{"UPC CODE": "5"}]"#).unwrap();
        assert_eq!(CatalogSheet::load(&json_path).unwrap().len(), 1);

        let xlsx_path = dir.path().join("catalog.xlsx");
        std::fs::write(&xlsx_path, workbook::tests::xlsx_bytes()).unwrap();
        assert_eq!(CatalogSheet::load(&xlsx_path).unwrap().len(), 3);

        let xls_path = dir.path().join("catalog.xls");
        std::fs::write(&xls_path, b"\xD0\xCF").unwrap();
        assert!(matches!(
            CatalogSheet::load(&xls_path),
            Err(CatalogError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_xlsx_rows_keyed_by_header() {
        let bytes = workbook::tests::xlsx_bytes();
        let sheet = CatalogSheet::from_xlsx_reader(std::io::Cursor::new(bytes)).unwrap();

        assert_eq!(sheet.columns, vec!["UPC CODE", "BRAND", "PRICE"]);
        assert_eq!(sheet.rows[0]["UPC CODE"], json!(7861042566762_i64));
        assert_eq!(sheet.rows[0]["BRAND"], json!("Acme & Co"));
        assert_eq!(sheet.rows[1]["UPC CODE"], json!("049000028911"));
        assert_eq!(sheet.rows[1]["BRAND"], Value::Null);
        assert_eq!(sheet.rows[2]["PRICE"], Value::Null);
    }

    #[test]
    fn test_broken_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("product_catalog.xlsx");
        std::fs::write(&path, b"PK").unwrap();
        assert!(matches!(CatalogSheet::load(&path), Err(CatalogError::Zip(_))));
    }
}
