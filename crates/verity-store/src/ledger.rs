//! Report, transparency record and signal ledger

use crate::{claim_is_live, SqliteStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::{debug, info};
use verity_domain::traits::LedgerStore;
use verity_domain::{ClaimId, ConfidenceReport, PlayfulSignal, SignalId, TransparencyRecord};

/// Insert a record and its subject index rows
pub(crate) fn insert_record(conn: &Connection, record: &TransparencyRecord) -> Result<(), StoreError> {
    let id = record.id.to_string();
    conn.execute(
        "INSERT INTO transparency_records (id, record_type, created_at, body) VALUES (?1, ?2, ?3, ?4)",
        params![
            id,
            record.record_type.as_str(),
            record.created_at as i64,
            serde_json::to_string(record)?
        ],
    )?;
    for subject in &record.subject_ids {
        conn.execute(
            "INSERT OR IGNORE INTO record_subjects (record_id, subject_id) VALUES (?1, ?2)",
            params![id, subject],
        )?;
    }
    Ok(())
}

fn load_reports(conn: &Connection, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ConfidenceReport>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, |row| Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(body, is_active)| {
            let mut report: ConfidenceReport = serde_json::from_str(&body)?;
            report.is_active = is_active;
            Ok(report)
        })
        .collect()
}

/// Active reports for a claim, ordered by lens id
pub(crate) fn active_reports_on(conn: &Connection, claim_id: &str) -> Result<Vec<ConfidenceReport>, StoreError> {
    load_reports(
        conn,
        "SELECT body, is_active FROM confidence_reports WHERE claim_id = ?1 AND is_active = 1 ORDER BY lens_id",
        params![claim_id],
    )
}

fn load_bodies<T: serde::de::DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let bodies = stmt
        .query_map(params, |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    bodies
        .iter()
        .map(|body| serde_json::from_str(body).map_err(StoreError::from))
        .collect()
}

impl LedgerStore for SqliteStore {
    fn activate_report(
        &self,
        report: ConfidenceReport,
        records: &[TransparencyRecord],
    ) -> Result<ConfidenceReport, Self::Error> {
        for record in records {
            self.gatekeeper.verify_signature(record)?;
        }
        let claim_id = report.claim_id.to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !claim_is_live(&tx, &claim_id)? {
            return Err(StoreError::NotFound(format!("claim {}", claim_id)));
        }

        let prior: i64 = tx.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM confidence_reports WHERE claim_id = ?1 AND lens_id = ?2",
            params![claim_id, report.lens_id],
            |row| row.get(0),
        )?;
        let superseded = tx.execute(
            "UPDATE confidence_reports SET is_active = 0 WHERE claim_id = ?1 AND lens_id = ?2 AND is_active = 1",
            params![claim_id, report.lens_id],
        )?;

        let mut stored = report;
        stored.version = prior as u32 + 1;
        stored.is_active = true;

        tx.execute(
            "INSERT INTO confidence_reports (id, claim_id, lens_id, version, is_active, computed_at, body)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
            params![
                stored.id.to_string(),
                claim_id,
                stored.lens_id,
                stored.version as i64,
                stored.computed_at as i64,
                serde_json::to_string(&stored)?
            ],
        )?;
        for record in records {
            insert_record(&tx, record)?;
        }
        tx.commit()?;

        info!(
            claim_id = %claim_id,
            lens_id = %stored.lens_id,
            version = stored.version,
            superseded,
            "Activated report"
        );
        Ok(stored)
    }

    fn active_reports(&self, claim_id: ClaimId) -> Result<Vec<ConfidenceReport>, Self::Error> {
        let conn = self.lock()?;
        active_reports_on(&conn, &claim_id.to_string())
    }

    fn report_history(&self, claim_id: ClaimId, lens_id: &str) -> Result<Vec<ConfidenceReport>, Self::Error> {
        let conn = self.lock()?;
        load_reports(
            &conn,
            "SELECT body, is_active FROM confidence_reports WHERE claim_id = ?1 AND lens_id = ?2 ORDER BY version",
            params![claim_id.to_string(), lens_id],
        )
    }

    fn append_record(&self, record: &TransparencyRecord) -> Result<(), Self::Error> {
        self.gatekeeper.verify_signature(record)?;
        let conn = self.lock()?;
        insert_record(&conn, record)?;
        debug!(record_id = %record.id, record_type = record.record_type.as_str(), "Appended record");
        Ok(())
    }

    fn records_for_subject(&self, subject: &str, limit: usize) -> Result<Vec<TransparencyRecord>, Self::Error> {
        let conn = self.lock()?;
        load_bodies(
            &conn,
            "SELECT r.body FROM transparency_records r
             JOIN record_subjects s ON s.record_id = r.id
             WHERE s.subject_id = ?1
             ORDER BY r.created_at DESC, r.rowid DESC
             LIMIT ?2",
            params![subject, limit as i64],
        )
    }

    fn put_signal(&self, signal: &PlayfulSignal, record: &TransparencyRecord) -> Result<bool, Self::Error> {
        self.gatekeeper.verify_signature(signal)?;
        self.gatekeeper.verify_signature(record)?;
        let id = signal.id.to_string();
        let claim_id = signal.claim_id.to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row("SELECT signature FROM playful_signals WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        if let Some(signature) = existing {
            if signature == signal.signature {
                return Ok(false);
            }
            return Err(StoreError::Conflict(format!(
                "signal {} already exists with a different signature",
                id
            )));
        }
        if !claim_is_live(&tx, &claim_id)? {
            return Err(StoreError::NotFound(format!("claim {}", claim_id)));
        }

        tx.execute(
            "INSERT INTO playful_signals (id, claim_id, signature, created_at, body) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id,
                claim_id,
                signal.signature,
                signal.created_at as i64,
                serde_json::to_string(signal)?
            ],
        )?;
        insert_record(&tx, record)?;
        tx.commit()?;
        Ok(true)
    }

    fn get_signal(&self, id: SignalId) -> Result<Option<PlayfulSignal>, Self::Error> {
        let conn = self.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM playful_signals WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }

    fn signals_for_claim(&self, claim_id: ClaimId) -> Result<Vec<PlayfulSignal>, Self::Error> {
        let conn = self.lock()?;
        load_bodies(
            &conn,
            "SELECT body FROM playful_signals WHERE claim_id = ?1 ORDER BY created_at, id",
            params![claim_id.to_string()],
        )
    }
}
