//! Reading and writing the `caseType,eraLabel,num,ref` link tables.
//!
//! Column order is whatever the header says. Lines starting with `#` and
//! blank lines are ignored anywhere in the file, and a `ref` may carry an
//! inline `# …` annotation (suggest writes the score there) that is dropped
//! before validation. Fields are split on commas only; quotes are literal.
//! Line numbers are physical, 1-based lines of the file.

use crate::error::GiketsuError;
use crate::pipeline::assemble::natural_cmp;
use csv::{ReaderBuilder, Terminator, Trim, WriterBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::path::Path;
use tracing::warn;

/// Required columns, in the order this crate writes them.
pub const LINK_HEADER: [&str; 4] = ["caseType", "eraLabel", "num", "ref"];

static RE_VALID_REF: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(theme|issue):.+$").unwrap());

/// One validated link: this item is tagged with this theme or issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkRow {
    pub case_type: String,
    pub era_label: String,
    pub num: u32,
    /// `theme:<id>` or `issue:<id>`.
    pub reference: String,
}

impl LinkRow {
    /// Lookup-map key: `令和7年-議案-3`.
    pub fn map_key(&self) -> String {
        format!("{}-{}-{}", self.era_label, self.case_type, self.num)
    }

    /// File order: era, number, ref, then case type.
    pub fn file_order(&self, other: &Self) -> Ordering {
        natural_cmp(&self.era_label, &other.era_label)
            .then(self.num.cmp(&other.num))
            .then_with(|| self.reference.cmp(&other.reference))
            .then_with(|| self.case_type.cmp(&other.case_type))
    }

    fn to_record(&self, annotation: Option<&str>) -> [String; 4] {
        let reference = match annotation {
            Some(note) => format!("{}  # {}", self.reference, note),
            None => self.reference.clone(),
        };
        [
            self.case_type.clone(),
            self.era_label.clone(),
            self.num.to_string(),
            reference,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    case_type: usize,
    era_label: usize,
    num: usize,
    reference: usize,
}

impl Columns {
    fn from_header(fields: &[String]) -> Option<Self> {
        let find = |name: &str| fields.iter().position(|f| f == name);
        Some(Self {
            case_type: find("caseType")?,
            era_label: find("eraLabel")?,
            num: find("num")?,
            reference: find("ref")?,
        })
    }

    fn width(&self) -> usize {
        [self.case_type, self.era_label, self.num, self.reference]
            .into_iter()
            .max()
            .unwrap_or(0)
            + 1
    }
}

/// One data line of a link table, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    pub line: u64,
    pub fields: Vec<String>,
}

/// A parsed link table: a valid header plus its data lines.
#[derive(Debug, Clone)]
pub struct LinkTable {
    pub header_line: u64,
    columns: Columns,
    pub records: Vec<LinkRecord>,
}

/// Split one physical line into trimmed fields. Quotes carry no meaning in
/// link files, so a stray `"` stays inside its field.
fn split_line(line: &str) -> Result<Vec<String>, csv::Error> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    let fields = match reader.records().next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };
    Ok(fields)
}

/// Parse link-table text. `Ok(None)` when the file holds no header at all
/// (empty, or only comments).
pub fn parse_table(text: &str, path: &Path) -> Result<Option<LinkTable>, GiketsuError> {
    let mut header: Option<(u64, Columns)> = None;
    let mut records = Vec::new();

    for (idx, raw) in text.trim_start_matches('\u{feff}').lines().enumerate() {
        let line = idx as u64 + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields = split_line(trimmed).map_err(|e| GiketsuError::InputReadFailed {
            path: path.to_path_buf(),
            detail: format!("line {line}: {e}"),
        })?;
        if fields.iter().all(String::is_empty) {
            continue;
        }

        if header.is_none() {
            let columns =
                Columns::from_header(&fields).ok_or_else(|| GiketsuError::InvalidCsvHeader {
                    path: path.to_path_buf(),
                    line,
                    found: fields.join(","),
                })?;
            header = Some((line, columns));
        } else {
            records.push(LinkRecord { line, fields });
        }
    }

    Ok(header.map(|(header_line, columns)| LinkTable {
        header_line,
        columns,
        records,
    }))
}

/// Read and parse a link table from disk.
pub fn read_table(path: &Path) -> Result<(String, Option<LinkTable>), GiketsuError> {
    let text = std::fs::read_to_string(path).map_err(|e| GiketsuError::InputReadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let table = parse_table(&text, path)?;
    Ok((text, table))
}

fn strip_inline_comment(field: &str) -> &str {
    field.split('#').next().unwrap_or("").trim()
}

impl LinkTable {
    /// Validate one record. The error lists every problem on the line.
    pub fn validate(&self, record: &LinkRecord) -> Result<LinkRow, String> {
        let width = self.columns.width();
        if record.fields.len() < width {
            return Err(format!(
                "expected at least {} columns, found {}",
                width,
                record.fields.len()
            ));
        }

        let field = |i: usize| record.fields[i].trim();
        let case_type = field(self.columns.case_type);
        let era_label = field(self.columns.era_label);
        let num_str = field(self.columns.num);
        let reference = strip_inline_comment(&record.fields[self.columns.reference]);

        let mut errors = Vec::new();
        if case_type.is_empty() {
            errors.push("caseType is empty".to_string());
        }
        if era_label.is_empty() {
            errors.push("eraLabel is empty".to_string());
        }
        let num = num_str.parse::<u32>().ok().filter(|n| *n > 0);
        if num.is_none() {
            errors.push(format!("num must be a positive integer, got: {num_str:?}"));
        }
        if !RE_VALID_REF.is_match(reference) {
            errors.push(format!(
                "ref must start with \"theme:\" or \"issue:\", got: {reference:?}"
            ));
        }

        match num {
            Some(num) if errors.is_empty() => Ok(LinkRow {
                case_type: case_type.to_string(),
                era_label: era_label.to_string(),
                num,
                reference: reference.to_string(),
            }),
            _ => Err(errors.join("; ")),
        }
    }

    /// Every valid row; invalid ones are logged and counted.
    pub fn lenient_rows(&self, path: &Path) -> (Vec<LinkRow>, usize) {
        let mut rows = Vec::with_capacity(self.records.len());
        let mut invalid = 0;
        for record in &self.records {
            match self.validate(record) {
                Ok(row) => rows.push(row),
                Err(detail) => {
                    warn!("{}: line {}: {} (skipped)", path.display(), record.line, detail);
                    invalid += 1;
                }
            }
        }
        (rows, invalid)
    }
}

/// Encode rows as CSV lines (`\n`-terminated), optionally preceded by the
/// header and with a per-row `# …` annotation after the ref.
pub fn encode_rows<'a, I>(rows: I, with_header: bool) -> Result<String, GiketsuError>
where
    I: IntoIterator<Item = (&'a LinkRow, Option<String>)>,
{
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let csv_err = |e: csv::Error| GiketsuError::Internal(format!("CSV encoding failed: {e}"));

    if with_header {
        writer.write_record(LINK_HEADER).map_err(csv_err)?;
    }
    for (row, annotation) in rows {
        writer
            .write_record(row.to_record(annotation.as_deref()))
            .map_err(csv_err)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| GiketsuError::Internal(format!("CSV encoding failed: {e}")))?;
    String::from_utf8(bytes).map_err(|e| GiketsuError::Internal(e.to_string()))
}
