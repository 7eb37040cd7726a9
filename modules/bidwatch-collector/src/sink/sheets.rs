use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use sheets_client::SheetsClient;
use tracing::info;

use bidwatch_common::{header_cells, PrimaryKey, SheetRow};

use crate::traits::NoticeSink;

/// Google Sheets destination. Keys live in column A; row 1 is the header.
pub struct SheetsSink {
    client: SheetsClient,
    worksheet_index: usize,
}

impl SheetsSink {
    pub fn new(access_token: &str, spreadsheet_id: &str, worksheet_index: usize) -> Result<Self> {
        Ok(Self {
            client: SheetsClient::new(access_token, spreadsheet_id)?,
            worksheet_index,
        })
    }

    pub fn with_client(client: SheetsClient, worksheet_index: usize) -> Self {
        Self {
            client,
            worksheet_index,
        }
    }
}

/// Keys from the last `lookback` data rows of column A.
///
/// `column` is the read of `A2:A`. The API drops trailing blank rows, so its
/// tail is the last data row no matter how many blank rows the grid holds.
pub fn recent_keys(column: Vec<Vec<String>>, lookback: usize) -> HashSet<PrimaryKey> {
    let skip = column.len().saturating_sub(lookback);
    column
        .into_iter()
        .skip(skip)
        .filter_map(|row| row.into_iter().next())
        .filter(|key| !key.is_empty())
        .map(PrimaryKey::new)
        .collect()
}

#[async_trait]
impl NoticeSink for SheetsSink {
    async fn ensure_header(&self) -> Result<()> {
        let worksheet = self.client.worksheet(self.worksheet_index).await?;
        let a1 = self.client.get_values(&worksheet.range("A1")).await?;
        let has_header = a1
            .first()
            .and_then(|row| row.first())
            .is_some_and(|cell| !cell.is_empty());

        if !has_header {
            self.client
                .append_rows(&worksheet.range("A1"), &[header_cells()])
                .await?;
            info!(worksheet = %worksheet.title, "Wrote header row");
        }
        Ok(())
    }

    async fn existing_keys(&self, lookback: usize) -> Result<HashSet<PrimaryKey>> {
        if lookback == 0 {
            return Ok(HashSet::new());
        }
        let worksheet = self.client.worksheet(self.worksheet_index).await?;
        let column = self.client.get_values(&worksheet.range("A2:A")).await?;
        Ok(recent_keys(column, lookback))
    }

    async fn append_rows(&self, rows: &[SheetRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let worksheet = self.client.worksheet(self.worksheet_index).await?;
        let cells: Vec<Vec<String>> = rows.iter().map(SheetRow::to_cells).collect();
        self.client
            .append_rows(&worksheet.range("A1"), &cells)
            .await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "sheets"
    }
}
