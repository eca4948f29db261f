use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use gradlearn_core::{Dataset, LabeledExample, LearnError};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading a labeled table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("line {line}: expected {expected} fields, got {got}")]
    ColumnCount {
        line: u64,
        expected: usize,
        got: usize,
    },

    #[error("line {line}, column {column}: cannot read {raw:?} as {kind}")]
    Parse {
        line: u64,
        column: usize,
        raw: String,
        kind: ValueKind,
    },

    #[error("line {line}, column {column}: value {raw:?} must be {rule}")]
    OutOfRange {
        line: u64,
        column: usize,
        raw: String,
        rule: String,
    },

    #[error("invalid table format: {0}")]
    Format(String),

    #[error(transparent)]
    Dataset(#[from] LearnError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Real,
    Integer,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Real => write!(f, "a finite real number"),
            ValueKind::Integer => write!(f, "an integer"),
        }
    }
}

/// Coercion and validation rule for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnFormat {
    pub kind: ValueKind,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    /// When set, the value must equal one of these.
    #[serde(default)]
    pub allowed: Option<Vec<f64>>,
}

enum Rejection {
    Unparsable,
    OutOfRange,
}

impl ColumnFormat {
    pub fn real() -> Self {
        ColumnFormat {
            kind: ValueKind::Real,
            min: None,
            max: None,
            allowed: None,
        }
    }

    pub fn integer() -> Self {
        ColumnFormat {
            kind: ValueKind::Integer,
            ..ColumnFormat::real()
        }
    }

    /// Inclusive range `[min, max]`.
    pub fn within(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn at_least(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn one_of(mut self, values: &[f64]) -> Self {
        self.allowed = Some(values.to_vec());
        self
    }

    fn coerce(&self, raw: &str) -> Result<f64, Rejection> {
        let value = match self.kind {
            ValueKind::Real => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or(Rejection::Unparsable)?,
            ValueKind::Integer => raw.parse::<i64>().map_err(|_| Rejection::Unparsable)? as f64,
        };
        if self.min.is_some_and(|min| value < min) || self.max.is_some_and(|max| value > max) {
            return Err(Rejection::OutOfRange);
        }
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&value) {
                return Err(Rejection::OutOfRange);
            }
        }
        Ok(value)
    }

    /// Human-readable form of the range rule, e.g. `in [0, 100]`.
    pub fn describe_range(&self) -> String {
        let mut parts = Vec::new();
        match (self.min, self.max) {
            (Some(lo), Some(hi)) => parts.push(format!("in [{}, {}]", lo, hi)),
            (Some(lo), None) => parts.push(format!(">= {}", lo)),
            (None, Some(hi)) => parts.push(format!("<= {}", hi)),
            (None, None) => {}
        }
        if let Some(allowed) = &self.allowed {
            let list: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
            parts.push(format!("one of {{{}}}", list.join(", ")));
        }
        if parts.is_empty() {
            "unrestricted".to_string()
        } else {
            parts.join(" and ")
        }
    }
}

/// Layout of a delimited, labeled table. The last column is the label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableFormat {
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
    #[serde(default)]
    pub has_headers: bool,
    pub columns: Vec<ColumnFormat>,
}

fn default_delimiter() -> u8 {
    b','
}

impl TableFormat {
    pub fn new(columns: Vec<ColumnFormat>) -> Self {
        TableFormat {
            delimiter: default_delimiter(),
            has_headers: false,
            columns,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn n_features(&self) -> usize {
        self.columns.len().saturating_sub(1)
    }
}

/// Load a labeled table from a file.
pub fn load_path<P: AsRef<Path>>(path: P, format: &TableFormat) -> Result<Dataset, LoadError> {
    let path = path.as_ref();
    info!("loading {:?}", path);
    let file = File::open(path)?;
    load_reader(file, format)
}

/// Load a labeled table, failing on the first field that breaks its rule.
pub fn load_reader<R: Read>(reader: R, format: &TableFormat) -> Result<Dataset, LoadError> {
    if format.columns.len() < 2 {
        return Err(LoadError::Format(
            "need at least one feature column and a label column".into(),
        ));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut examples = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != format.columns.len() {
            return Err(LoadError::ColumnCount {
                line,
                expected: format.columns.len(),
                got: record.len(),
            });
        }

        let mut values = Vec::with_capacity(record.len());
        for (column, (raw, rule)) in record.iter().zip(format.columns.iter()).enumerate() {
            let value = rule.coerce(raw).map_err(|rejection| match rejection {
                Rejection::Unparsable => LoadError::Parse {
                    line,
                    column,
                    raw: raw.to_string(),
                    kind: rule.kind,
                },
                Rejection::OutOfRange => LoadError::OutOfRange {
                    line,
                    column,
                    raw: raw.to_string(),
                    rule: rule.describe_range(),
                },
            })?;
            values.push(value);
        }

        let label = values.pop().unwrap_or_default();
        examples.push(LabeledExample::new(values, label));
    }

    info!("loaded {} examples", examples.len());
    Ok(Dataset::new(examples)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format() -> TableFormat {
        TableFormat::new(vec![
            ColumnFormat::real().within(0.0, 100.0),
            ColumnFormat::integer().at_least(0.0),
            ColumnFormat::integer().one_of(&[0.0, 1.0]),
        ])
    }

    #[test]
    fn test_load_valid_table() {
        let text = "12.5, 3, 1\n0,0,0\n\n100,17,1\n";
        let data = load_reader(text.as_bytes(), &format()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.n_features(), 2);
        assert_eq!(data.examples()[0].features, vec![12.5, 3.0]);
        assert_eq!(data.labels(), vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_out_of_range_reports_field() {
        let text = "1,1,0\n100.5,2,1\n";
        match load_reader(text.as_bytes(), &format()) {
            Err(LoadError::OutOfRange { line, column, raw, rule }) => {
                assert_eq!(line, 2);
                assert_eq!(column, 0);
                assert_eq!(raw, "100.5");
                assert_eq!(rule, "in [0, 100]");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_bad_label_rejected() {
        let err = load_reader("1,1,2\n".as_bytes(), &format()).unwrap_err();
        assert!(matches!(err, LoadError::OutOfRange { column: 2, .. }));
        assert!(err.to_string().contains("one of {0, 1}"));
    }

    #[test]
    fn test_parse_failures() {
        let err = load_reader("1,2.5,1\n".as_bytes(), &format()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse { column: 1, kind: ValueKind::Integer, .. }
        ));

        let err = load_reader("abc,2,1\n".as_bytes(), &format()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { column: 0, .. }));

        let err = load_reader("NaN,2,1\n".as_bytes(), &format()).unwrap_err();
        assert!(matches!(err, LoadError::Parse { column: 0, .. }));
    }

    #[test]
    fn test_column_count_checked() {
        let err = load_reader("1,2,1\n1,2\n".as_bytes(), &format()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ColumnCount { line: 2, expected: 3, got: 2 }
        ));
    }

    #[test]
    fn test_tab_delimited_with_header() {
        let fmt = TableFormat::new(vec![ColumnFormat::real(), ColumnFormat::real()])
            .with_delimiter(b'\t')
            .with_headers(true);
        let data = load_reader("x\ty\n0.5\t-1\n".as_bytes(), &fmt).unwrap();
        assert_eq!(data.examples()[0], LabeledExample::new(vec![0.5], -1.0));
    }

    #[test]
    fn test_format_from_json() {
        let json = r#"{
            "columns": [
                {"kind": "real", "min": 0.0, "max": 1.0},
                {"kind": "integer", "allowed": [0.0, 1.0]}
            ]
        }"#;
        let fmt: TableFormat = serde_json::from_str(json).unwrap();
        assert_eq!(fmt.delimiter, b',');
        assert_eq!(fmt.n_features(), 1);
        assert_eq!(fmt.columns[0], ColumnFormat::real().within(0.0, 1.0));
    }

    #[test]
    fn test_too_few_columns() {
        let fmt = TableFormat::new(vec![ColumnFormat::real()]);
        assert!(matches!(
            load_reader("1\n".as_bytes(), &fmt),
            Err(LoadError::Format(_))
        ));
    }
}
