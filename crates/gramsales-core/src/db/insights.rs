//! Insight history database operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::{format_datetime, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::insights::{InsightRecord, Priority};

/// Summary of one stored engine run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRun {
    pub id: i64,
    pub generated_at: DateTime<Utc>,
    pub record_count: usize,
    pub high_priority: usize,
}

/// A run together with its ranked records
#[derive(Debug, Clone, Serialize)]
pub struct StoredRun {
    pub run: InsightRun,
    pub records: Vec<InsightRecord>,
}

impl Database {
    /// Store the records of one engine run, returning the run id
    ///
    /// The run is keyed by the latest record timestamp (now when empty).
    /// Records keep their given order as their rank.
    pub fn save_run(&self, records: &[InsightRecord]) -> Result<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let generated_at = records
            .iter()
            .map(|r| r.generated_at)
            .max()
            .unwrap_or_else(Utc::now);
        let high_priority = records
            .iter()
            .filter(|r| r.priority == Priority::High)
            .count();

        tx.execute(
            "INSERT INTO insight_runs (generated_at, record_count, high_priority) VALUES (?, ?, ?)",
            params![
                format_datetime(&generated_at),
                records.len() as i64,
                high_priority as i64
            ],
        )?;
        let run_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO insight_records (
                    run_id, position, kind, priority, title, message, recommended_action,
                    supporting_data, simulated, degraded, generated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )?;
            for (position, record) in records.iter().enumerate() {
                stmt.execute(params![
                    run_id,
                    position as i64,
                    record.kind.as_str(),
                    record.priority.as_str(),
                    record.title,
                    record.message,
                    record.recommended_action,
                    serde_json::to_string(&record.supporting_data)?,
                    record.simulated,
                    record.degraded,
                    format_datetime(&record.generated_at),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!(run_id, records = records.len(), "Saved insight run");
        Ok(run_id)
    }

    /// Most recent runs first
    pub fn list_runs(&self, limit: usize) -> Result<Vec<InsightRun>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, generated_at, record_count, high_priority
            FROM insight_runs
            ORDER BY generated_at DESC, id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], row_to_run)?;
        let runs: std::result::Result<Vec<_>, _> = rows.collect();
        Ok(runs?)
    }

    /// A run with its records in priority order
    pub fn get_run(&self, id: i64) -> Result<Option<StoredRun>> {
        let conn = self.conn()?;

        let run = conn.query_row(
            "SELECT id, generated_at, record_count, high_priority FROM insight_runs WHERE id = ?",
            params![id],
            row_to_run,
        );
        let run = match run {
            Ok(run) => run,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT kind, priority, title, message, recommended_action, supporting_data,
                   simulated, degraded, generated_at
            FROM insight_records
            WHERE run_id = ?
            ORDER BY
                CASE priority
                    WHEN 'high' THEN 1
                    WHEN 'medium' THEN 2
                    ELSE 3
                END,
                position
            "#,
        )?;
        let rows = stmt.query_map(params![id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, bool>(6)?,
                row.get::<_, bool>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (kind, priority, title, message, action, data, simulated, degraded, generated_at) =
                row?;
            records.push(InsightRecord {
                kind: kind.parse().map_err(Error::InvalidData)?,
                priority: priority.parse().map_err(Error::InvalidData)?,
                title,
                message,
                recommended_action: action,
                supporting_data: serde_json::from_str(&data)?,
                simulated,
                degraded,
                generated_at: parse_datetime(&generated_at),
            });
        }

        Ok(Some(StoredRun { run, records }))
    }

    /// The newest run, if any
    pub fn latest_run(&self) -> Result<Option<StoredRun>> {
        match self.list_runs(1)?.first() {
            Some(run) => self.get_run(run.id),
            None => Ok(None),
        }
    }
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<InsightRun> {
    let generated_at: String = row.get(1)?;
    Ok(InsightRun {
        id: row.get(0)?,
        generated_at: parse_datetime(&generated_at),
        record_count: row.get::<_, i64>(2)? as usize,
        high_priority: row.get::<_, i64>(3)? as usize,
    })
}
