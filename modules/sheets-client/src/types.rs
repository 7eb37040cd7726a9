use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Subset of `GET /spreadsheets/{id}?fields=sheets.properties`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sheet {
    pub properties: WorksheetProperties,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorksheetProperties {
    #[serde(rename = "sheetId", default)]
    pub sheet_id: i64,
    pub title: String,
    #[serde(default)]
    pub index: usize,
}

impl WorksheetProperties {
    /// A1 range qualified with this worksheet's title, e.g. `'Bids 2024'!A1:A10`.
    pub fn range(&self, cells: &str) -> String {
        format!("'{}'!{}", self.title.replace('\'', "''"), cells)
    }
}

/// Response of `GET .../values/{range}`. `values` is omitted for empty ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct ValueRange {
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// Cell values rendered as strings.
    pub fn into_strings(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect()
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AppendBody<'a> {
    pub values: &'a [Vec<String>],
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendResponse {
    #[serde(rename = "tableRange", default)]
    pub table_range: Option<String>,
    #[serde(default)]
    pub updates: AppendUpdates,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppendUpdates {
    #[serde(rename = "updatedRange", default)]
    pub updated_range: String,
    #[serde(rename = "updatedRows", default)]
    pub updated_rows: usize,
}
