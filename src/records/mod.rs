//! Spreadsheet record source
//!
//! Reads the first sheet of a workbook and turns every data row into a
//! [`RowRecord`] keyed by the header row. No field validation happens here:
//! rows missing columns are passed on as they are.

use crate::error::{EnrollError, Result};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

pub const FIELD_LOGIN: &str = "login";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_CHILD_ID: &str = "childId";
pub const FIELD_CLASS_ID: &str = "classId";
pub const FIELD_COURSE_ID: &str = "courseId";
pub const FIELD_CHILD_NAME: &str = "childName";

/// Extensions accepted by [`RecordSource::read_file`]
pub const ACCEPTED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

const EMPTY_HEADER: &str = "__EMPTY";

/// One spreadsheet data row, as ordered `(header, value)` pairs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, String)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing an existing value under the same header
    pub fn with_field(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(header, value);
        self
    }

    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(h, _)| *h == header) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, or the empty string when the column is missing
    pub fn field(&self, header: &str) -> &str {
        self.get(header).unwrap_or("")
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(h, _)| h.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn login(&self) -> &str {
        self.field(FIELD_LOGIN)
    }

    pub fn password(&self) -> &str {
        self.field(FIELD_PASSWORD)
    }

    pub fn child_id(&self) -> &str {
        self.field(FIELD_CHILD_ID)
    }

    pub fn class_id(&self) -> &str {
        self.field(FIELD_CLASS_ID)
    }

    pub fn course_id(&self) -> &str {
        self.field(FIELD_COURSE_ID)
    }

    pub fn child_name(&self) -> &str {
        self.field(FIELD_CHILD_NAME)
    }
}

impl Serialize for RowRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (header, value) in &self.fields {
            map.serialize_entry(header, value)?;
        }
        map.end()
    }
}

/// Converts uploaded spreadsheets into row records
pub struct RecordSource;

impl RecordSource {
    /// Read a spreadsheet file from disk
    pub fn read_file(path: &Path) -> Result<Vec<RowRecord>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(EnrollError::UnsupportedFormat(format!(
                "{} (expected one of: {})",
                path.display(),
                ACCEPTED_EXTENSIONS.join(", ")
            )));
        }

        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Decode workbook bytes and convert the first sheet
    pub fn parse(bytes: &[u8]) -> Result<Vec<RowRecord>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| EnrollError::FileParse("workbook contains no sheets".to_string()))??;

        let records = Self::rows_from_range(&range);
        tracing::debug!(rows = records.len(), "parsed first sheet");
        Ok(records)
    }

    /// First row becomes the headers, every later non-blank row one record
    pub fn rows_from_range(range: &Range<Data>) -> Vec<RowRecord> {
        let mut rows = range.rows();

        let headers = match rows.next() {
            Some(header_row) => Self::headers(header_row),
            None => return Vec::new(),
        };

        rows.filter_map(|cells| {
            let mut record = RowRecord::new();
            for (header, cell) in headers.iter().zip(cells) {
                if let Some(value) = cell_to_string(cell) {
                    record.insert(header.as_str(), value);
                }
            }
            (!record.is_empty()).then_some(record)
        })
        .collect()
    }

    fn headers(cells: &[Data]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut empty_count = 0usize;

        cells
            .iter()
            .map(|cell| {
                let base = match cell_to_string(cell) {
                    Some(name) => name,
                    None => {
                        let name = if empty_count == 0 {
                            EMPTY_HEADER.to_string()
                        } else {
                            format!("{}_{}", EMPTY_HEADER, empty_count)
                        };
                        empty_count += 1;
                        name
                    }
                };

                let mut name = base.clone();
                let mut suffix = 1;
                while !seen.insert(name.clone()) {
                    name = format!("{}_{}", base, suffix);
                    suffix += 1;
                }
                name
            })
            .collect()
    }
}

/// Stringify a cell; `None` for empty and error cells
fn cell_to_string(cell: &Data) -> Option<String> {
    let value = match cell {
        Data::Empty => return None,
        Data::String(s) if s.is_empty() => return None,
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format_float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => return None,
    };
    Some(value)
}

fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    fn sheet(cells: &[&[Data]]) -> Range<Data> {
        let height = cells.len() as u32;
        let width = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, row) in cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    #[test]
    fn test_rows_follow_header_order() {
        let range = sheet(&[
            &[s("login"), s("password"), s("childId"), s("classId"), s("courseId"), s("childName")],
            &[s("880101300123"), s("secret"), Data::Float(12345.0), Data::Int(7), s("42"), s("Aruzhan")],
            &[s("890202400456"), s("pass2"), Data::Float(555.0), Data::Int(8), s("43"), s("Timur")],
        ]);

        let rows = RecordSource::rows_from_range(&range);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].login(), "880101300123");
        assert_eq!(rows[0].child_id(), "12345");
        assert_eq!(rows[0].class_id(), "7");
        assert_eq!(rows[1].child_name(), "Timur");
        assert_eq!(
            rows[0].headers().collect::<Vec<_>>(),
            vec!["login", "password", "childId", "classId", "courseId", "childName"]
        );
    }

    #[test]
    fn test_missing_cells_are_omitted_and_read_empty() {
        let range = sheet(&[
            &[s("login"), s("password"), s("childId")],
            &[s("u1"), Data::Empty, s("9")],
        ]);

        let rows = RecordSource::rows_from_range(&range);
        assert_eq!(rows[0].get("password"), None);
        assert_eq!(rows[0].password(), "");
        assert_eq!(rows[0].course_id(), "");
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let range = sheet(&[
            &[s("login"), s("password")],
            &[Data::Empty, Data::Empty],
            &[s("u2"), s("p2")],
        ]);

        let rows = RecordSource::rows_from_range(&range);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].login(), "u2");
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let range = sheet(&[
            &[s("name"), Data::Empty, s("name"), Data::Empty],
            &[s("a"), s("b"), s("c"), s("d")],
        ]);

        let rows = RecordSource::rows_from_range(&range);
        assert_eq!(
            rows[0].headers().collect::<Vec<_>>(),
            vec!["name", "__EMPTY", "name_1", "__EMPTY_1"]
        );
        assert_eq!(rows[0].get("name_1"), Some("c"));
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        let range = sheet(&[&[s("login"), s("password")]]);
        assert!(RecordSource::rows_from_range(&range).is_empty());
        assert!(RecordSource::rows_from_range(&Range::<Data>::empty()).is_empty());
    }

    #[test]
    fn test_cell_formatting() {
        assert_eq!(cell_to_string(&Data::Float(3.5)).as_deref(), Some("3.5"));
        assert_eq!(cell_to_string(&Data::Float(-2.0)).as_deref(), Some("-2"));
        assert_eq!(cell_to_string(&Data::Bool(true)).as_deref(), Some("true"));
        assert_eq!(cell_to_string(&Data::Empty), None);
        assert_eq!(cell_to_string(&Data::Error(CellErrorType::Div0)), None);
    }

    #[test]
    fn test_undecodable_bytes_fail_explicitly() {
        let result = RecordSource::parse(b"definitely not a spreadsheet");
        assert!(matches!(result, Err(EnrollError::FileParse(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let result = RecordSource::read_file(Path::new("children.csv"));
        assert!(matches!(result, Err(EnrollError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_record_serializes_as_ordered_map() {
        let row = RowRecord::new()
            .with_field("login", "u1")
            .with_field("childName", "Aruzhan");
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"login":"u1","childName":"Aruzhan"}"#);
    }
}
