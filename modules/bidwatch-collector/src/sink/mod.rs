mod csv_file;
mod sheets;

pub use self::csv_file::CsvSink;
pub use self::sheets::SheetsSink;

use anyhow::Result;
use bidwatch_common::SinkConfig;

use crate::traits::NoticeSink;

pub fn from_config(config: &SinkConfig) -> Result<Box<dyn NoticeSink>> {
    Ok(match config {
        SinkConfig::Sheets {
            spreadsheet_id,
            access_token,
            worksheet_index,
        } => Box::new(SheetsSink::new(access_token, spreadsheet_id, *worksheet_index)?),
        SinkConfig::Csv { path } => Box::new(CsvSink::new(path)),
    })
}
