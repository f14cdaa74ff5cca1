//! Equipment CSV parser and validator
//!
//! Accepts the raw bytes of an upload and produces either an ordered list of
//! validated rows or a single [`IngestError`] describing why the file was
//! rejected.
//!
//! Structural problems (extension, content type, size, encoding, header,
//! row limit) always reject the whole file. Row-level problems follow the
//! configured [`RowErrorPolicy`].

use crate::error::IngestError;
use chemequip_common::EquipmentType;
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Header cells, in the only accepted order.
pub const REQUIRED_COLUMNS: [&str; 5] =
    ["Equipment Name", "Type", "Flowrate", "Pressure", "Temperature"];

/// Content types browsers and HTTP clients commonly send for `.csv` files.
pub const ACCEPTED_CONTENT_TYPES: [&str; 5] = [
    "text/csv",
    "application/csv",
    "application/vnd.ms-excel",
    "text/plain",
    "application/octet-stream",
];

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// Skipped-row issues kept in the outcome; the count is always exact.
const MAX_REPORTED_ISSUES: usize = 50;

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Reject the whole upload on the first bad row.
    #[default]
    Strict,
    /// Drop bad rows, keep going and report how many were dropped.
    SkipRow,
}

impl std::str::FromStr for RowErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" | "reject" => Ok(RowErrorPolicy::Strict),
            "skip" | "skip_row" | "skip-row" => Ok(RowErrorPolicy::SkipRow),
            other => Err(format!("Invalid row error policy: {other} (expected 'strict' or 'skip')")),
        }
    }
}

impl std::fmt::Display for RowErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RowErrorPolicy::Strict => "strict",
            RowErrorPolicy::SkipRow => "skip",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    pub max_upload_bytes: usize,
    pub max_rows: usize,
    pub row_error_policy: RowErrorPolicy,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_rows: DEFAULT_MAX_ROWS,
            row_error_policy: RowErrorPolicy::Strict,
        }
    }
}

impl ParserConfig {
    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.row_error_policy = policy;
        self
    }
}

/// One accepted data row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedRow {
    /// Physical line in the file; the header is line 1.
    pub line: u64,
    pub name: String,
    pub equipment_type: EquipmentType,
    pub flowrate: Option<f64>,
    pub pressure: Option<f64>,
    pub temperature: Option<f64>,
}

/// A row that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    /// 1-based data row, not counting the header or blank lines.
    pub row: usize,
    pub line: u64,
    pub column: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {} (line {})", self.row, self.line)?;
        if let Some(column) = &self.column {
            write!(f, ", column '{column}'")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_rows: usize,
    pub accepted_rows: usize,
    pub skipped_rows: usize,
    pub blank_rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub rows: Vec<ValidatedRow>,
    pub stats: ParseStats,
    /// At most the first few skipped rows under [`RowErrorPolicy::SkipRow`].
    pub issues: Vec<RowIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    config: ParserConfig,
}

impl CsvParser {
    pub fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Checks that need only the upload metadata, so callers can reject
    /// before reading the body.
    pub fn check_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        size: usize,
    ) -> Result<(), IngestError> {
        let has_csv_extension = std::path::Path::new(filename)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !has_csv_extension {
            return Err(IngestError::InvalidExtension {
                filename: filename.to_string(),
            });
        }

        if let Some(content_type) = content_type {
            let essence = content_type
                .split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if !ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
                return Err(IngestError::UnsupportedContentType(content_type.to_string()));
            }
        }

        if size > self.config.max_upload_bytes {
            return Err(IngestError::TooLarge {
                size,
                limit: self.config.max_upload_bytes,
            });
        }

        Ok(())
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len(), policy = %self.config.row_error_policy))]
    pub fn parse(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<ParseOutcome, IngestError> {
        self.check_upload(filename, content_type, bytes.len())?;
        let text = std::str::from_utf8(bytes)?;
        self.parse_text(text)
    }

    /// Parse already-decoded text. Size and extension checks are the
    /// caller's job; see [`CsvParser::check_upload`].
    pub fn parse_text(&self, text: &str) -> Result<ParseOutcome, IngestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut records = reader.records();

        let header = records.next().ok_or(IngestError::MissingHeader)??;
        check_header(&header)?;

        let mut outcome = ParseOutcome::default();
        let mut data_rows = 0usize;

        for result in records {
            let record = result?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                outcome.stats.blank_rows += 1;
                continue;
            }

            data_rows += 1;
            if data_rows > self.config.max_rows {
                return Err(IngestError::TooManyRows {
                    limit: self.config.max_rows,
                });
            }

            let line = record.position().map_or(0, |p| p.line());
            match validate_row(&record, data_rows, line) {
                Ok(row) => outcome.rows.push(row),
                Err(issue) => match self.config.row_error_policy {
                    RowErrorPolicy::Strict => return Err(IngestError::InvalidRow(issue)),
                    RowErrorPolicy::SkipRow => {
                        debug!(row = issue.row, line = issue.line, reason = %issue.message, "Skipping invalid row");
                        outcome.stats.skipped_rows += 1;
                        if outcome.issues.len() < MAX_REPORTED_ISSUES {
                            outcome.issues.push(issue);
                        }
                    },
                },
            }
        }

        outcome.stats.total_rows = data_rows;
        outcome.stats.accepted_rows = outcome.rows.len();

        if data_rows == 0 {
            return Err(IngestError::NoDataRows);
        }
        if outcome.rows.is_empty() {
            return Err(IngestError::NoValidRows {
                skipped: outcome.stats.skipped_rows,
                issues: outcome.issues,
            });
        }

        debug!(
            accepted = outcome.stats.accepted_rows,
            skipped = outcome.stats.skipped_rows,
            "CSV parsed"
        );
        Ok(outcome)
    }
}

fn check_header(header: &StringRecord) -> Result<(), IngestError> {
    let found: Vec<&str> = header.iter().map(str::trim).collect();
    if found != REQUIRED_COLUMNS {
        return Err(IngestError::InvalidHeader {
            expected: REQUIRED_COLUMNS.join(","),
            found: found.join(","),
        });
    }
    Ok(())
}

fn validate_row(record: &StringRecord, row: usize, line: u64) -> Result<ValidatedRow, RowIssue> {
    let issue = |column: Option<&str>, message: String| RowIssue {
        row,
        line,
        column: column.map(str::to_string),
        message,
    };

    if record.len() != REQUIRED_COLUMNS.len() {
        return Err(issue(
            None,
            format!("expected {} fields, found {}", REQUIRED_COLUMNS.len(), record.len()),
        ));
    }

    let name = record[0].trim();
    if name.is_empty() {
        return Err(issue(Some(REQUIRED_COLUMNS[0]), "name must not be empty".to_string()));
    }

    let mut numbers = [None; 3];
    for (slot, index) in numbers.iter_mut().zip(2..5) {
        *slot = parse_number(&record[index]).map_err(|m| issue(Some(REQUIRED_COLUMNS[index]), m))?;
    }
    let [flowrate, pressure, temperature] = numbers;

    Ok(ValidatedRow {
        line,
        name: name.to_string(),
        equipment_type: EquipmentType::resolve(&record[1]),
        flowrate,
        pressure,
        temperature,
    })
}

/// Empty cells are absent; anything else must be a finite number.
fn parse_number(raw: &str) -> Result<Option<f64>, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        Ok(_) => Err(format!("'{value}' is not a finite number")),
        Err(_) => Err(format!("'{value}' is not a number")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";

    fn strict() -> CsvParser {
        CsvParser::new(ParserConfig::default())
    }

    fn skipping() -> CsvParser {
        CsvParser::new(ParserConfig::default().with_policy(RowErrorPolicy::SkipRow))
    }

    fn csv(rows: &str) -> String {
        format!("{HEADER}{rows}")
    }

    #[test]
    fn test_parses_reference_rows() {
        let input = csv("Pump-01,Pump,150.5,10.5,45.2\nTank-02,Unknown,,,\n");
        let outcome = strict().parse("plant.csv", Some("text/csv"), input.as_bytes()).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[0].name, "Pump-01");
        assert_eq!(outcome.rows[0].equipment_type, EquipmentType::Pump);
        assert_eq!(outcome.rows[0].flowrate, Some(150.5));
        assert_eq!(outcome.rows[0].line, 2);

        assert_eq!(outcome.rows[1].equipment_type, EquipmentType::Other);
        assert_eq!(outcome.rows[1].flowrate, None);
        assert_eq!(outcome.rows[1].pressure, None);
        assert_eq!(outcome.rows[1].temperature, None);
        assert_eq!(
            outcome.stats,
            ParseStats {
                total_rows: 2,
                accepted_rows: 2,
                skipped_rows: 0,
                blank_rows: 0
            }
        );
    }

    #[test]
    fn test_trims_cells_and_strips_bom() {
        let input = "\u{feff} Equipment Name , Type,Flowrate,Pressure,Temperature\n  R-1 , reactor , 1.5 , ,3\n";
        let outcome = strict().parse_text(input).unwrap();
        assert_eq!(outcome.rows[0].name, "R-1");
        assert_eq!(outcome.rows[0].equipment_type, EquipmentType::Reactor);
        assert_eq!(outcome.rows[0].flowrate, Some(1.5));
        assert_eq!(outcome.rows[0].pressure, None);
    }

    #[test]
    fn test_quoted_fields() {
        let input = csv("\"Exchanger, East\",\"Heat Exchanger\",\"1,5\",2,3\n");
        let err = strict().parse_text(&input).unwrap_err();
        // "1,5" is one quoted cell and is not a number
        match err {
            IngestError::InvalidRow(issue) => assert_eq!(issue.column.as_deref(), Some("Flowrate")),
            other => panic!("unexpected error: {other:?}"),
        }

        let input = csv("\"Exchanger, East\",\"Heat Exchanger\",1.5,2,3\n");
        let outcome = strict().parse_text(&input).unwrap();
        assert_eq!(outcome.rows[0].name, "Exchanger, East");
        assert_eq!(outcome.rows[0].equipment_type, EquipmentType::HeatExchanger);
    }

    #[test]
    fn test_blank_lines_are_ignored() {
        let input = csv("P-1,Pump,1,2,3\n   \n,,,,\nP-2,Pump,4,5,6\n");
        let outcome = strict().parse_text(&input).unwrap();
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.stats.blank_rows, 2);
        assert_eq!(outcome.stats.total_rows, 2);
    }

    #[test]
    fn test_rejects_wrong_header() {
        for header in [
            "Name,Type,Flowrate,Pressure,Temperature\n",
            "Equipment Name,Type,Pressure,Flowrate,Temperature\n",
            "Equipment Name,Type,Flowrate,Pressure\n",
            "Equipment Name,Type,Flowrate,Pressure,Temperature,Notes\n",
            "equipment name,type,flowrate,pressure,temperature\n",
        ] {
            let input = format!("{header}P-1,Pump,1,2,3\n");
            assert!(
                matches!(strict().parse_text(&input), Err(IngestError::InvalidHeader { .. })),
                "header accepted: {header}"
            );
        }
    }

    #[test]
    fn test_rejects_empty_and_header_only() {
        assert!(matches!(strict().parse_text(""), Err(IngestError::MissingHeader)));
        assert!(matches!(strict().parse_text(HEADER), Err(IngestError::NoDataRows)));
    }

    #[test]
    fn test_strict_rejects_non_numeric_cell() {
        let input = csv("P-1,Pump,1,2,3\nP-2,Pump,abc,2,3\n");
        match strict().parse_text(&input) {
            Err(IngestError::InvalidRow(issue)) => {
                assert_eq!(issue.row, 2);
                assert_eq!(issue.line, 3);
                assert_eq!(issue.column.as_deref(), Some("Flowrate"));
                assert!(issue.message.contains("abc"));
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_skip_mode_drops_bad_rows_and_counts_them() {
        let input = csv("P-1,Pump,1,2,3\nP-2,Pump,abc,2,3\n,Pump,1,1,1\nP-4,Pump,4,5,6\n");
        let outcome = skipping().parse_text(&input).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.rows[1].name, "P-4");
        assert_eq!(outcome.stats.skipped_rows, 2);
        assert_eq!(outcome.stats.total_rows, 4);
        assert_eq!(outcome.issues.len(), 2);
        assert_eq!(outcome.issues[1].column.as_deref(), Some("Equipment Name"));
    }

    #[test]
    fn test_skip_mode_with_no_survivors_is_rejected() {
        let input = csv("P-1,Pump,x,2,3\nP-2,Pump,y,2,3\n");
        match skipping().parse_text(&input) {
            Err(IngestError::NoValidRows { skipped, issues }) => {
                assert_eq!(skipped, 2);
                assert_eq!(issues.len(), 2);
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_non_finite_numbers_are_row_errors() {
        for cell in ["NaN", "inf", "-infinity"] {
            let input = csv(&format!("P-1,Pump,{cell},2,3\n"));
            assert!(matches!(strict().parse_text(&input), Err(IngestError::InvalidRow(_))));
        }
    }

    #[test]
    fn test_wrong_field_count_is_row_error() {
        let input = csv("P-1,Pump,1,2\n");
        match strict().parse_text(&input) {
            Err(IngestError::InvalidRow(issue)) => {
                assert_eq!(issue.column, None);
                assert!(issue.message.contains("expected 5 fields"));
            },
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_row_limit() {
        let parser = CsvParser::new(ParserConfig {
            max_rows: 2,
            ..ParserConfig::default()
        });
        assert!(parser.parse_text(&csv("A,Pump,1,1,1\nB,Pump,1,1,1\n")).is_ok());
        assert!(matches!(
            parser.parse_text(&csv("A,Pump,1,1,1\nB,Pump,1,1,1\nC,Pump,1,1,1\n")),
            Err(IngestError::TooManyRows { limit: 2 })
        ));
    }

    #[test]
    fn test_check_upload() {
        let parser = CsvParser::new(ParserConfig {
            max_upload_bytes: 10,
            ..ParserConfig::default()
        });

        assert!(parser.check_upload("data.CSV", None, 5).is_ok());
        assert!(parser.check_upload("data.csv", Some("text/csv; charset=utf-8"), 5).is_ok());
        assert!(matches!(
            parser.check_upload("data.xlsx", None, 5),
            Err(IngestError::InvalidExtension { .. })
        ));
        assert!(matches!(
            parser.check_upload("csv", None, 5),
            Err(IngestError::InvalidExtension { .. })
        ));
        assert!(matches!(
            parser.check_upload("data.csv", Some("image/png"), 5),
            Err(IngestError::UnsupportedContentType(_))
        ));
        let err = parser.check_upload("data.csv", None, 11).unwrap_err();
        assert!(err.is_too_large());
    }

    #[test]
    fn test_rejects_invalid_utf8() {
        let mut bytes = HEADER.as_bytes().to_vec();
        bytes.extend_from_slice(b"P\xff-1,Pump,1,2,3\n");
        assert!(matches!(
            strict().parse("data.csv", None, &bytes),
            Err(IngestError::Encoding(_))
        ));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("strict".parse::<RowErrorPolicy>().unwrap(), RowErrorPolicy::Strict);
        assert_eq!("SKIP".parse::<RowErrorPolicy>().unwrap(), RowErrorPolicy::SkipRow);
        assert_eq!("skip_row".parse::<RowErrorPolicy>().unwrap(), RowErrorPolicy::SkipRow);
        assert!("lenient".parse::<RowErrorPolicy>().is_err());
    }

    #[test]
    fn test_issue_display() {
        let issue = RowIssue {
            row: 3,
            line: 4,
            column: Some("Pressure".to_string()),
            message: "'x' is not a number".to_string(),
        };
        assert_eq!(issue.to_string(), "row 3 (line 4), column 'Pressure': 'x' is not a number");
    }
}
