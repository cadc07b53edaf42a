//! First worksheet of an `.xlsx` workbook as a grid of JSON cells.
//!
//! An xlsx file is a ZIP archive of XML parts. Only what a catalog table
//! needs is read:
//!
//! - `xl/workbook.xml` and its relationships, to find the first sheet
//! - `xl/sharedStrings.xml`, the string table most text cells point into
//! - the sheet part itself, cell by cell
//!
//! Cells are typed like the CSV reader types them: numbers become JSON
//! numbers (integral values as integers), booleans stay booleans, empty and
//! error cells become null, text stays text.

use std::io::{Read, Seek};
use std::path::PathBuf;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Number, Value};
use zip::ZipArchive;
use zip::result::ZipError;

use super::CatalogError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const DEFAULT_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Largest integer an f64 holds exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Read the rows of the first worksheet. Rows without any value are dropped.
pub fn read_first_sheet<R: Read + Seek>(reader: R) -> Result<Vec<Vec<Value>>, CatalogError> {
    let mut archive = ZipArchive::new(reader)?;

    let sheet_part = first_sheet_part(&mut archive)?;
    let shared = match read_part(&mut archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let xml = read_part(&mut archive, &sheet_part)?.ok_or_else(|| {
        CatalogError::MalformedWorkbook {
            reason: format!("sheet part {sheet_part} is missing"),
        }
    })?;

    let rows = parse_sheet(&xml, &shared)?;
    log::debug!("Read {} rows from workbook part {}", rows.len(), sheet_part);
    Ok(rows)
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<String>, CatalogError> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|source| CatalogError::Io {
            path: PathBuf::from(name),
            source,
        })?;
    Ok(Some(xml))
}

/// Value of an attribute, matched by local name (`r:id` matches `id`).
fn attribute(element: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>, CatalogError> {
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Archive path of the first sheet listed in the workbook.
fn first_sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, CatalogError> {
    let Some(workbook) = read_part(archive, WORKBOOK_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };

    let mut relation_id = None;
    let mut reader = Reader::from_str(&workbook);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e) if e.local_name().as_ref() == b"sheet" => {
                relation_id = attribute(e, b"id")?;
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let Some(relation_id) = relation_id else {
        return Err(CatalogError::MalformedWorkbook {
            reason: "workbook lists no sheets".to_string(),
        });
    };

    let Some(rels) = read_part(archive, WORKBOOK_RELS_PART)? else {
        return Ok(DEFAULT_SHEET_PART.to_string());
    };
    let mut reader = Reader::from_str(&rels);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) | Event::Empty(ref e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if attribute(e, b"Id")?.as_deref() != Some(relation_id.as_str()) {
                    continue;
                }
                let target = attribute(e, b"Target")?.ok_or_else(|| {
                    CatalogError::MalformedWorkbook {
                        reason: format!("relationship {relation_id} has no target"),
                    }
                })?;
                return Ok(match target.strip_prefix('/') {
                    Some(absolute) => absolute.to_string(),
                    None => format!("xl/{target}"),
                });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(CatalogError::MalformedWorkbook {
        reason: format!("relationship {relation_id} of the first sheet not found"),
    })
}

/// Shared string table. Rich-text runs are concatenated; phonetic hints skipped.
fn parse_shared_strings(xml: &str) -> Result<Vec<String>, CatalogError> {
    let mut strings = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;
    let mut in_phonetic = false;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_text = !in_phonetic,
                b"rPh" => in_phonetic = true,
                _ => {}
            },
            Event::Empty(ref e) if e.local_name().as_ref() == b"si" => strings.push(String::new()),
            Event::Text(ref t) if in_text => {
                if let Some(current) = current.as_mut() {
                    current.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"si" => strings.extend(current.take()),
                b"t" => in_text = false,
                b"rPh" => in_phonetic = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

/// A cell being read.
struct Cell {
    column: Option<usize>,
    kind: String,
    text: String,
}

impl Cell {
    fn start(element: &BytesStart<'_>) -> Result<Self, CatalogError> {
        Ok(Self {
            column: attribute(element, b"r")?.as_deref().and_then(column_index),
            kind: attribute(element, b"t")?.unwrap_or_default(),
            text: String::new(),
        })
    }

    fn value(self, shared: &[String]) -> Result<Value, CatalogError> {
        match self.kind.as_str() {
            "s" => {
                let index: usize = self.text.trim().parse().map_err(|_| {
                    CatalogError::MalformedWorkbook {
                        reason: format!("bad shared string index {:?}", self.text),
                    }
                })?;
                shared
                    .get(index)
                    .map(|s| text_value(s.as_str()))
                    .ok_or_else(|| CatalogError::MalformedWorkbook {
                        reason: format!("shared string {index} out of range"),
                    })
            }
            "inlineStr" | "str" => Ok(text_value(&self.text)),
            "b" => Ok(Value::Bool(self.text.trim() == "1")),
            "e" => Ok(Value::Null),
            _ => Ok(number_value(&self.text)),
        }
    }
}

/// Zero-based column of a cell reference: `A1` is 0, `AB7` is 27.
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<u8> = reference
        .bytes()
        .take_while(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_uppercase())
        .collect();
    if letters.is_empty() {
        return None;
    }
    let number = letters
        .iter()
        .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1));
    Some(number - 1)
}

fn text_value(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        Value::Null
    } else {
        Value::String(text.to_string())
    }
}

fn number_value(text: &str) -> Value {
    let text = text.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    match text.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER => Value::Number((f as i64).into()),
        Ok(f) => Number::from_f64(f).map_or_else(|| Value::String(text.to_string()), Value::Number),
        Err(_) => Value::String(text.to_string()),
    }
}

fn parse_sheet(xml: &str, shared: &[String]) -> Result<Vec<Vec<Value>>, CatalogError> {
    let mut rows = Vec::new();
    let mut row: Vec<Value> = Vec::new();
    let mut cell: Option<Cell> = None;
    let mut in_value = false;

    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => cell = Some(Cell::start(e)?),
                b"v" | b"t" => in_value = cell.is_some(),
                _ => {}
            },
            Event::Text(ref t) if in_value => {
                if let Some(cell) = cell.as_mut() {
                    cell.text.push_str(&t.unescape()?);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    if let Some(cell) = cell.take() {
                        let column = cell.column.unwrap_or(row.len());
                        let value = cell.value(shared)?;
                        if row.len() <= column {
                            row.resize(column + 1, Value::Null);
                        }
                        row[column] = value;
                    }
                }
                b"row" => {
                    let filled = row.iter().any(|value| !value.is_null());
                    let done = std::mem::take(&mut row);
                    if filled {
                        rows.push(done);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}
