use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

use crate::extract::readiness::Readiness;
use crate::extract::Extraction;
use crate::record::NOT_FOUND;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS company_records (
            id                   INTEGER PRIMARY KEY,
            identifier           TEXT NOT NULL,
            formatted_identifier TEXT NOT NULL,
            legal_name           TEXT NOT NULL,
            status               TEXT NOT NULL,
            operation_period     TEXT NOT NULL,
            trade_name           TEXT NOT NULL,
            address              TEXT NOT NULL,
            legal_nature         TEXT NOT NULL,
            capital_social       TEXT NOT NULL,
            email                TEXT NOT NULL,
            phone                TEXT NOT NULL,
            url                  TEXT NOT NULL,
            fallback_used        BOOLEAN NOT NULL,
            timed_out            BOOLEAN NOT NULL,
            load_failed          BOOLEAN NOT NULL,
            extracted_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_records_identifier ON company_records(identifier);
        ",
    )?;
    Ok(())
}

/// Append-only: re-running an identifier adds another row.
pub fn append_record(conn: &Connection, extraction: &Extraction) -> Result<()> {
    let r = &extraction.record;
    let timed_out = extraction.readiness == Readiness::TimedOut;
    conn.execute(
        "INSERT INTO company_records
         (identifier, formatted_identifier, legal_name, status, operation_period, trade_name,
          address, legal_nature, capital_social, email, phone, url,
          fallback_used, timed_out, load_failed, extracted_at)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
        rusqlite::params![
            r.identifier,
            r.formatted_identifier,
            r.legal_name,
            r.status,
            r.operation_period,
            r.trade_name,
            r.address,
            r.legal_nature,
            r.capital_social,
            r.email,
            r.phone,
            r.source_url,
            extraction.fallback_used,
            timed_out,
            extraction.load_failed(),
            chrono::Utc::now().to_rfc3339(),
        ],
    )
    .with_context(|| format!("Failed to store record for {}", r.identifier))?;
    Ok(())
}

// ── Stats ──

pub struct Stats {
    pub total: i64,
    pub identifiers: i64,
    pub fallback_used: i64,
    pub timed_out: i64,
    pub load_failed: i64,
    pub missing_address: i64,
    pub missing_capital: i64,
    pub missing_email: i64,
    pub missing_phone: i64,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let stats = conn.query_row(
        "SELECT COUNT(*),
                COUNT(DISTINCT identifier),
                COALESCE(SUM(fallback_used), 0),
                COALESCE(SUM(timed_out), 0),
                COALESCE(SUM(load_failed), 0),
                COALESCE(SUM(address = ?1), 0),
                COALESCE(SUM(capital_social = ?1), 0),
                COALESCE(SUM(email = ?1), 0),
                COALESCE(SUM(phone = ?1), 0)
         FROM company_records",
        [NOT_FOUND],
        |row| {
            Ok(Stats {
                total: row.get(0)?,
                identifiers: row.get(1)?,
                fallback_used: row.get(2)?,
                timed_out: row.get(3)?,
                load_failed: row.get(4)?,
                missing_address: row.get(5)?,
                missing_capital: row.get(6)?,
                missing_email: row.get(7)?,
                missing_phone: row.get(8)?,
            })
        },
    )?;
    Ok(stats)
}

// ── Overview ──

pub struct OverviewRow {
    pub identifier: String,
    pub legal_name: String,
    pub status: String,
    pub capital_social: String,
    pub phone: String,
    pub fallback_used: bool,
    pub extracted_at: String,
}

/// Most recent rows first, optionally filtered by status.
pub fn fetch_overview(
    conn: &Connection,
    status: Option<&str>,
    limit: usize,
) -> Result<Vec<OverviewRow>> {
    let mut stmt = conn.prepare(
        "SELECT identifier, legal_name, status, capital_social, phone, fallback_used, extracted_at
         FROM company_records
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![status, limit as i64], |row| {
            Ok(OverviewRow {
                identifier: row.get(0)?,
                legal_name: row.get(1)?,
                status: row.get(2)?,
                capital_social: row.get(3)?,
                phone: row.get(4)?,
                fallback_used: row.get(5)?,
                extracted_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}
