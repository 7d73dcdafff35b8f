use std::collections::{BTreeMap, HashSet};

use autopad_core::model::{Action, ActionRange, ActionTable, RangeId, TableEntry, TableError};
use thiserror::Error;

pub const FORMAT_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableEnvelope {
    pub format_version: u16,
    pub table: ActionTable,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("unsupported table format version {0}")]
    UnsupportedFormat(u16),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("line {line}: cannot parse {field} from `{value}`")]
    ParseError {
        line: usize,
        field: &'static str,
        value: String,
    },
    #[error("entry {0} is missing, entries must be numbered from 0 without gaps")]
    MissingEntry(usize),
    #[error("line {line}: unknown key `{key}`")]
    UnknownKey { line: usize, key: String },
    #[error("line {line}: key `{key}` is set more than once")]
    DuplicateKey { line: usize, key: String },
    #[error(transparent)]
    Table(#[from] TableError),
}

impl TableEnvelope {
    pub fn new(table: ActionTable) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            table,
        }
    }

    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("format_version={}", FORMAT_VERSION));
        lines.push(format!("name={}", self.table.name()));

        for (range_id, range) in self.table.ranges() {
            lines.push(format!("range.{}={}..{}", range_id, range.start, range.end));
        }

        for (index, entry) in self.table.entries().iter().enumerate() {
            lines.push(format!(
                "entry.{}={}:{}",
                index,
                entry.action.token(),
                entry.duration
            ));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    pub fn from_text(input: &str) -> Result<Self, StorageError> {
        let mut format_version = None;
        let mut name = None;
        let mut entries: BTreeMap<usize, TableEntry> = BTreeMap::new();
        let mut ranges: Vec<(RangeId, ActionRange)> = Vec::new();
        let mut seen_keys: HashSet<String> = HashSet::new();

        for (line_index, line) in input.lines().enumerate() {
            let line_no = line_index + 1;
            let content = line.trim();
            if content.is_empty() || content.starts_with('#') {
                continue;
            }

            let Some((key_raw, value_raw)) = content.split_once('=') else {
                return Err(StorageError::UnknownKey {
                    line: line_no,
                    key: content.to_string(),
                });
            };
            let key = key_raw.trim();
            let value = value_raw.trim();

            if !seen_keys.insert(key.to_string()) {
                return Err(StorageError::DuplicateKey {
                    line: line_no,
                    key: key.to_string(),
                });
            }

            match key {
                "format_version" => {
                    let version = parse_number::<u16>(value, "format_version", line_no)?;
                    if version != FORMAT_VERSION {
                        return Err(StorageError::UnsupportedFormat(version));
                    }
                    format_version = Some(version);
                    continue;
                }
                "name" => {
                    name = Some(value.to_string());
                    continue;
                }
                _ => {}
            }

            if let Some(index_raw) = key.strip_prefix("entry.") {
                let index = parse_number::<usize>(index_raw, "entry index", line_no)?;
                entries.insert(index, parse_entry(value, line_no)?);
                continue;
            }

            if let Some(range_raw) = key.strip_prefix("range.") {
                let Some(range_id) = RangeId::from_token(range_raw) else {
                    return Err(StorageError::ParseError {
                        line: line_no,
                        field: "range name",
                        value: range_raw.to_string(),
                    });
                };
                ranges.push((range_id, parse_range(value, line_no)?));
                continue;
            }

            return Err(StorageError::UnknownKey {
                line: line_no,
                key: key.to_string(),
            });
        }

        let format_version = format_version.ok_or(StorageError::MissingField("format_version"))?;
        let name = name.ok_or(StorageError::MissingField("name"))?;

        for (expected, index) in entries.keys().enumerate() {
            if *index != expected {
                return Err(StorageError::MissingEntry(expected));
            }
        }

        let table = ActionTable::new(name, entries.into_values().collect(), ranges)?;

        Ok(Self {
            format_version,
            table,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    value: &str,
    field: &'static str,
    line: usize,
) -> Result<T, StorageError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| StorageError::ParseError {
            line,
            field,
            value: value.to_string(),
        })
}

fn parse_entry(value: &str, line: usize) -> Result<TableEntry, StorageError> {
    let Some((action_raw, duration_raw)) = value.split_once(':') else {
        return Err(StorageError::ParseError {
            line,
            field: "entry",
            value: value.to_string(),
        });
    };

    let action = Action::from_token(action_raw).ok_or_else(|| StorageError::ParseError {
        line,
        field: "action",
        value: action_raw.trim().to_string(),
    })?;
    let duration = parse_number::<u32>(duration_raw, "duration", line)?;

    Ok(TableEntry::new(action, duration))
}

fn parse_range(value: &str, line: usize) -> Result<ActionRange, StorageError> {
    let Some((start_raw, end_raw)) = value.split_once("..") else {
        return Err(StorageError::ParseError {
            line,
            field: "range",
            value: value.to_string(),
        });
    };

    Ok(ActionRange::new(
        parse_number::<usize>(start_raw, "range start", line)?,
        parse_number::<usize>(end_raw, "range end", line)?,
    ))
}
