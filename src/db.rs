use chrono::{DateTime, Utc};
use eyre::Result;
use flash_loan_detector::Finding;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS findings (
  tx_hash       TEXT PRIMARY KEY NOT NULL,
  block_number  INTEGER NOT NULL,
  alert_id      TEXT NOT NULL,
  severity      TEXT NOT NULL,
  balance_diff  TEXT NOT NULL, -- wei as decimal string
  finding_json  TEXT NOT NULL,
  detected_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_findings_block ON findings (block_number DESC);
"#;

/// A finding as persisted, with where and when it was seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFinding {
    pub tx_hash: String,
    pub block_number: i64,
    pub detected_at: DateTime<Utc>,
    pub finding: Finding,
}

/// Connect to SQLite (with WAL mode for performance)
pub fn connect(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Run schema migrations
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(INIT_SQL)?;
    Ok(())
}

/// Insert or update the finding for a transaction. Replaying a block
/// overwrites rather than duplicates.
pub fn record_finding(
    conn: &Connection,
    tx_hash: &str,
    block_number: i64,
    finding: &Finding,
    detected_at: DateTime<Utc>,
) -> Result<()> {
    let balance_diff = finding
        .metadata
        .get("balanceDiff")
        .cloned()
        .unwrap_or_default();

    conn.execute(
        r#"
        INSERT INTO findings (
            tx_hash, block_number, alert_id, severity,
            balance_diff, finding_json, detected_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(tx_hash) DO UPDATE SET
            block_number = excluded.block_number,
            alert_id     = excluded.alert_id,
            severity     = excluded.severity,
            balance_diff = excluded.balance_diff,
            finding_json = excluded.finding_json,
            detected_at  = excluded.detected_at
        "#,
        params![
            tx_hash.to_lowercase(),
            block_number,
            finding.alert_id,
            format!("{:?}", finding.severity),
            balance_diff,
            serde_json::to_string(finding)?,
            detected_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// Most recent findings, newest block first.
pub fn recent_findings(conn: &Connection, limit: u32) -> Result<Vec<StoredFinding>> {
    let mut stmt = conn.prepare(
        "SELECT tx_hash, block_number, finding_json, detected_at
         FROM findings
         ORDER BY block_number DESC, tx_hash ASC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit as i64], raw_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter().map(decode).collect()
}

pub fn finding_by_tx(conn: &Connection, tx_hash: &str) -> Result<Option<StoredFinding>> {
    let row = conn
        .query_row(
            "SELECT tx_hash, block_number, finding_json, detected_at
             FROM findings WHERE tx_hash = ?1",
            [tx_hash.to_lowercase()],
            raw_row,
        )
        .optional()?;

    row.map(decode).transpose()
}

type RawRow = (String, i64, String, String);

fn raw_row(r: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
}

fn decode((tx_hash, block_number, finding_json, detected_at): RawRow) -> Result<StoredFinding> {
    Ok(StoredFinding {
        tx_hash,
        block_number,
        detected_at: DateTime::parse_from_rfc3339(&detected_at)?.with_timezone(&Utc),
        finding: serde_json::from_str(&finding_json)?,
    })
}
