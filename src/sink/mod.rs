pub mod db;
pub mod sheets;

use anyhow::Result;
use rusqlite::Connection;

use crate::config::{SheetsConfig, SinkArgs, SinkKind};
use crate::extract::Extraction;
use crate::record::HEADER;

/// Append-only destination for assembled records, one row per identifier.
pub enum Sink {
    Sqlite(Connection),
    Sheets(sheets::SheetsClient),
}

impl Sink {
    pub fn open(args: &SinkArgs) -> Result<Self> {
        match args.sink {
            SinkKind::Sqlite => Ok(Sink::Sqlite(db::connect(&args.db)?)),
            SinkKind::Sheets => {
                let config = SheetsConfig::from_env(&args.sheet_range)?;
                Ok(Sink::Sheets(sheets::SheetsClient::new(config)?))
            }
        }
    }

    /// SQLite: ensure the table exists (the schema is its header).
    /// Sheets: append the header row unless `header` is false.
    pub async fn prepare(&self, header: bool) -> Result<()> {
        match self {
            Sink::Sqlite(conn) => db::init_schema(conn),
            Sink::Sheets(client) if header => client.append_row(&HEADER).await,
            Sink::Sheets(_) => Ok(()),
        }
    }

    pub async fn append(&self, extraction: &Extraction) -> Result<()> {
        match self {
            Sink::Sqlite(conn) => db::append_record(conn, extraction),
            Sink::Sheets(client) => client.append_row(&extraction.record.to_row()).await,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sink::Sqlite(_) => "sqlite",
            Sink::Sheets(_) => "sheets",
        }
    }
}
