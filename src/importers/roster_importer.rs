use calamine::{open_workbook, Data, Reader, Xlsx};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RosterImportError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error("Header row is missing or empty")]
    MissingHeaders,

    #[error("Invalid number in column '{column}': {value}")]
    InvalidNumber { column: String, value: String },
}

/// One athlete parsed from a spreadsheet row. Built per row, upserted once,
/// then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct AthleteRecord {
    pub name: String,
    pub body_weight: Option<f64>,
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    /// Derived: squat + bench + deadlift, only when all three are present.
    pub total: Option<f64>,
    pub ohp: Option<f64>,
    pub incline_bench: Option<f64>,
    pub rdl: Option<f64>,
    pub rev_band_bench: Option<f64>,
    pub rev_band_squat: Option<f64>,
    pub rev_band_dl: Option<f64>,
    pub slingshot_bench: Option<f64>,
}

impl AthleteRecord {
    /// Build a record from a candidate data row.
    ///
    /// Returns `Ok(None)` when the `Name` column is blank after trimming
    /// (the row is skipped, not an error). Numeric columns map empty cells
    /// to `None`; a non-empty cell that cannot be read as a number fails
    /// this row only.
    pub fn from_row(header: &HeaderIndex, row: &[Data]) -> Result<Option<Self>, RosterImportError> {
        let name = match header.column("Name").and_then(|idx| name_text(row.get(idx))) {
            Some(name) => name,
            None => return Ok(None),
        };

        let field = |column: &str| -> Result<Option<f64>, RosterImportError> {
            match header.column(column) {
                Some(idx) => optional_number(row.get(idx), column),
                None => Ok(None),
            }
        };

        let body_weight = field("Bw")?;
        let squat = field("Squat")?;
        let bench = field("Bench")?;
        let deadlift = field("Deadlift")?;
        let ohp = field("OHP")?;
        let incline_bench = field("Incline Bench")?;
        let rdl = field("RDL")?;
        let rev_band_bench = field("Rev Band Bench")?;
        let rev_band_squat = field("Rev Band Squat")?;
        let rev_band_dl = field("Rev Band DL")?;
        let slingshot_bench = field("Slingshot Bench")?;

        // Never partially computed: all three lifts or nothing.
        let total = match (squat, bench, deadlift) {
            (Some(s), Some(b), Some(d)) => Some(s + b + d),
            _ => None,
        };

        Ok(Some(AthleteRecord {
            name,
            body_weight,
            squat,
            bench,
            deadlift,
            total,
            ohp,
            incline_bench,
            rdl,
            rev_band_bench,
            rev_band_squat,
            rev_band_dl,
            slingshot_bench,
        }))
    }
}

/// Maps header text to column index so field extraction survives column
/// reordering. Collection stops at the first empty header cell.
#[derive(Debug, Clone)]
pub struct HeaderIndex {
    columns: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_header_row(row: &[Data]) -> Self {
        let mut columns = HashMap::new();

        for (idx, cell) in row.iter().enumerate() {
            match cell {
                Data::String(s) if !s.trim().is_empty() => {
                    columns.insert(s.trim().to_string(), idx);
                }
                Data::Int(i) => {
                    columns.insert(i.to_string(), idx);
                }
                Data::Float(f) => {
                    columns.insert(format!("{f}"), idx);
                }
                _ => break,
            }
        }

        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The header map plus every candidate data row (first cell non-empty).
#[derive(Debug)]
pub struct AthleteSheet {
    header: HeaderIndex,
    rows: Vec<Vec<Data>>,
}

impl AthleteSheet {
    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<Data>] {
        &self.rows
    }

    /// Number of candidate rows found.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The trimmed `Name` cell of a candidate row, for log lines.
    pub fn candidate_name(&self, row: &[Data]) -> Option<String> {
        self.header
            .column("Name")
            .and_then(|idx| name_text(row.get(idx)))
    }
}

/// Reads the athlete roster from the first worksheet of an .xlsx workbook.
pub struct RosterImporter {
    workbook_path: String,
}

impl RosterImporter {
    pub fn new(workbook_path: impl Into<String>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
        }
    }

    /// Open the workbook and collect the header map and candidate rows.
    ///
    /// Row 1 is the header row; a data row is a candidate only when its
    /// first cell is non-empty. This is synchronous, callers on an async
    /// runtime should use spawn_blocking.
    pub fn load(&self) -> Result<AthleteSheet, RosterImportError> {
        info!("Loading roster workbook: {}", self.workbook_path);

        let mut workbook: Xlsx<BufReader<File>> = match open_workbook(&self.workbook_path) {
            Ok(wb) => wb,
            Err(e) => return Err(RosterImportError::WorkbookOpen(e.to_string())),
        };

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(RosterImportError::NoWorksheet)?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|_| RosterImportError::NoWorksheet)?;

        let mut rows = range.rows();

        let header_row = rows.next().ok_or(RosterImportError::MissingHeaders)?;
        let header = HeaderIndex::from_header_row(header_row);
        if header.is_empty() {
            return Err(RosterImportError::MissingHeaders);
        }
        debug!("Found {} header columns in sheet {}", header.len(), sheet_name);

        let mut candidates = Vec::new();
        let mut dropped = 0usize;

        for row in rows {
            if is_empty_cell(row.first()) {
                dropped += 1;
                continue;
            }
            candidates.push(row.to_vec());
        }

        if dropped > 0 {
            debug!("Dropped {} rows with an empty first cell", dropped);
        }
        info!(
            "Found {} candidate rows in sheet {}",
            candidates.len(),
            sheet_name
        );

        Ok(AthleteSheet {
            header,
            rows: candidates,
        })
    }
}

fn is_empty_cell(cell: Option<&Data>) -> bool {
    match cell {
        None | Some(Data::Empty) => true,
        Some(Data::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Name cells are usually text but spreadsheets sometimes hold bare numbers.
fn name_text(cell: Option<&Data>) -> Option<String> {
    match cell {
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Some(Data::Int(i)) => Some(i.to_string()),
        Some(Data::Float(f)) => Some(format!("{f}")),
        _ => None,
    }
}

/// Empty or blank cells map to None, never to zero.
fn optional_number(cell: Option<&Data>, column: &str) -> Result<Option<f64>, RosterImportError> {
    match cell {
        None | Some(Data::Empty) => Ok(None),
        Some(Data::Float(f)) => Ok(Some(*f)),
        Some(Data::Int(i)) => Ok(Some(*i as f64)),
        Some(Data::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                trimmed
                    .parse::<f64>()
                    .map(Some)
                    .map_err(|_| RosterImportError::InvalidNumber {
                        column: column.to_string(),
                        value: s.clone(),
                    })
            }
        }
        Some(other) => Err(RosterImportError::InvalidNumber {
            column: column.to_string(),
            value: format!("{other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> HeaderIndex {
        HeaderIndex::from_header_row(&[
            Data::String("Name".to_string()),
            Data::String("Bw".to_string()),
            Data::String("Squat".to_string()),
            Data::String("Bench".to_string()),
            Data::String("Deadlift".to_string()),
        ])
    }

    #[test]
    fn test_optional_number_empty_is_none() {
        assert_eq!(optional_number(Some(&Data::Empty), "Squat").unwrap(), None);
        assert_eq!(optional_number(None, "Squat").unwrap(), None);
        assert_eq!(
            optional_number(Some(&Data::String("   ".to_string())), "Squat").unwrap(),
            None
        );
    }

    #[test]
    fn test_optional_number_parses_text() {
        let value = optional_number(Some(&Data::String("142.5".to_string())), "Squat").unwrap();
        assert_eq!(value, Some(142.5));
    }

    #[test]
    fn test_optional_number_rejects_garbage() {
        let err = optional_number(Some(&Data::String("heavy".to_string())), "Squat").unwrap_err();
        match err {
            RosterImportError::InvalidNumber { column, value } => {
                assert_eq!(column, "Squat");
                assert_eq!(value, "heavy");
            }
            other => panic!("Expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_header_stops_at_first_blank_cell() {
        let index = HeaderIndex::from_header_row(&[
            Data::String("Name".to_string()),
            Data::String("Bw".to_string()),
            Data::Empty,
            Data::String("Squat".to_string()),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.column("Name"), Some(0));
        assert_eq!(index.column("Bw"), Some(1));
        assert_eq!(index.column("Squat"), None);
    }

    #[test]
    fn test_header_tolerates_reordered_columns() {
        let index = HeaderIndex::from_header_row(&[
            Data::String("Squat".to_string()),
            Data::String("Name".to_string()),
            Data::String("Bench".to_string()),
        ]);

        let row = vec![
            Data::Float(120.0),
            Data::String("Alice".to_string()),
            Data::Float(80.0),
        ];

        let record = AthleteRecord::from_row(&index, &row).unwrap().unwrap();
        assert_eq!(record.name, "Alice");
        assert_eq!(record.squat, Some(120.0));
        assert_eq!(record.bench, Some(80.0));
        assert_eq!(record.deadlift, None);
    }

    #[test]
    fn test_total_requires_all_three_lifts() {
        let row = vec![
            Data::String("Alice".to_string()),
            Data::Float(60.0),
            Data::Float(120.0),
            Data::Float(80.0),
            Data::Float(150.0),
        ];
        let record = AthleteRecord::from_row(&header(), &row).unwrap().unwrap();
        assert_eq!(record.total, Some(350.0));

        let row = vec![
            Data::String("Bob".to_string()),
            Data::Float(70.0),
            Data::Float(100.0),
            Data::Empty,
            Data::Float(140.0),
        ];
        let record = AthleteRecord::from_row(&header(), &row).unwrap().unwrap();
        assert_eq!(record.bench, None);
        assert_eq!(record.total, None);
    }

    #[test]
    fn test_blank_name_yields_no_record() {
        let row = vec![
            Data::String("   ".to_string()),
            Data::Float(60.0),
            Data::Float(120.0),
            Data::Float(80.0),
            Data::Float(150.0),
        ];
        assert!(AthleteRecord::from_row(&header(), &row).unwrap().is_none());
    }

    #[test]
    fn test_numeric_name_is_formatted_to_text() {
        let row = vec![Data::Int(42), Data::Float(60.0)];
        let record = AthleteRecord::from_row(&header(), &row).unwrap().unwrap();
        assert_eq!(record.name, "42");
    }

    #[test]
    fn test_missing_column_maps_to_none() {
        let index = HeaderIndex::from_header_row(&[
            Data::String("Name".to_string()),
            Data::String("Squat".to_string()),
        ]);
        let row = vec![Data::String("Carol".to_string()), Data::Float(95.0)];

        let record = AthleteRecord::from_row(&index, &row).unwrap().unwrap();
        assert_eq!(record.squat, Some(95.0));
        assert_eq!(record.body_weight, None);
        assert_eq!(record.ohp, None);
    }

    #[test]
    fn test_short_row_maps_to_none() {
        // Trailing cells past the row's end behave like empty cells
        let row = vec![Data::String("Dana".to_string()), Data::Float(72.5)];
        let record = AthleteRecord::from_row(&header(), &row).unwrap().unwrap();
        assert_eq!(record.body_weight, Some(72.5));
        assert_eq!(record.squat, None);
        assert_eq!(record.total, None);
    }
}
