//! Verity Storage Layer
//!
//! Implements [`ProvenanceStore`] and [`LedgerStore`] on SQLite.
//!
//! # Architecture
//!
//! - Claims are stored column by column; attached objects, reports, records
//!   and signals keep their signed body as JSON beside their key columns
//! - Every write passes the Gatekeeper (signature, then fields) before it
//!   touches the database, and runs in one immediate transaction
//! - Rejected writes and soft deletes leave a signed transparency record
//!
//! # Examples
//!
//! ```no_run
//! use verity_gatekeeper::RecordSigner;
//! use verity_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:", RecordSigner::ephemeral()).unwrap();
//! // Store is now ready for claim operations
//! ```

#![warn(missing_docs)]

mod attached;
mod error;
mod ledger;

pub use error::StoreError;

use attached::{table_for, Attached};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde_json::json;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, info, warn};
use verity_domain::traits::{ClaimQuery, LedgerStore, ProvenanceStore};
use verity_domain::{
    now_millis, Attribution, Claim, ClaimId, Counterclaim, CounterclaimId, ErrorKind, Evidence, EvidenceId, Fault, Method,
    ObjectKind, ReadOptions, RecordType, Signable, Tombstone,
};
use verity_gatekeeper::{payload_digest, Gatekeeper, RecordSigner};

const CLAIM_COLUMNS: &str =
    "id, title, statement, topic_tags, author_key, signature, created_at, version, prev_id, lineage, deleted_by, deleted_at";

/// SQLite-based implementation of the provenance store and ledger
///
/// # Thread Safety
///
/// The connection sits behind a mutex, so one store can be shared across
/// tasks through an `Arc`. Each operation holds the lock for its whole
/// transaction; readers never see half of a write.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    gatekeeper: Gatekeeper,
    signer: RecordSigner,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path and default
    /// validation rules
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P, signer: RecordSigner) -> Result<Self, StoreError> {
        Self::with_gatekeeper(path, Gatekeeper::default_config(), signer)
    }

    /// Create a store with a specific gatekeeper
    pub fn with_gatekeeper<P: AsRef<Path>>(
        path: P,
        gatekeeper: Gatekeeper,
        signer: RecordSigner,
    ) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_millis(250))?;

        let store = Self {
            conn: Mutex::new(conn),
            gatekeeper,
            signer,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.lock()?.execute_batch(schema)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// The gatekeeper every write passes through
    pub fn gatekeeper(&self) -> &Gatekeeper {
        &self.gatekeeper
    }

    /// The signer used for the store's own records
    pub fn signer(&self) -> &RecordSigner {
        &self.signer
    }

    /// Insert a claim, enforcing idempotency and revision integrity
    fn insert_claim(&self, claim: &Claim) -> Result<Claim, StoreError> {
        self.gatekeeper.admit(claim)?;
        let id = claim.id.to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<String> = tx
            .query_row("SELECT signature FROM claims WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;
        if let Some(signature) = existing {
            if signature == claim.signature {
                debug!(claim_id = %id, "Duplicate claim submission");
                let mut stored = load_claim_row(&tx, &id)?.ok_or_else(|| StoreError::NotFound(id.clone()))?;
                fill_claim(&tx, &mut stored, ReadOptions::audit())?;
                return Ok(stored);
            }
            return Err(StoreError::Conflict(format!(
                "claim {} already exists with a different signature",
                id
            )));
        }

        check_revision(&tx, claim)?;

        tx.execute(
            "INSERT INTO claims (id, title, statement, topic_tags, author_key, signature, created_at, version, prev_id, lineage)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id,
                claim.title,
                claim.statement,
                serde_json::to_string(&claim.topic_tags)?,
                claim.author_key,
                claim.signature,
                claim.created_at as i64,
                claim.version as i64,
                claim.prev_id.map(|p| p.to_string()),
                serde_json::to_string(&claim.lineage)?,
            ],
        )?;
        for tag in &claim.topic_tags {
            tx.execute(
                "INSERT INTO claim_tags (claim_id, tag) VALUES (?1, ?2)",
                params![id, tag],
            )?;
        }
        tx.commit()?;

        info!(claim_id = %id, version = claim.version, "Stored claim");
        let mut stored = claim.clone();
        stored.clear_read_side();
        Ok(stored)
    }

    /// Insert an object attached to a live claim
    fn insert_attached<T: Attached>(&self, object: &T) -> Result<T, StoreError> {
        self.gatekeeper.admit(object)?;
        let id = object.id_string();
        let claim_id = object.claim_id().to_string();

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("SELECT signature FROM {} WHERE id = ?1", T::TABLE);
        let existing: Option<String> = tx.query_row(&sql, params![id], |row| row.get(0)).optional()?;
        if let Some(signature) = existing {
            if signature == object.signature() {
                debug!(kind = T::KIND.as_str(), id = %id, "Duplicate submission");
                return load_attached::<T>(&tx, "id", &id, ReadOptions::audit())?
                    .into_iter()
                    .next()
                    .ok_or(StoreError::NotFound(id));
            }
            return Err(StoreError::Conflict(format!(
                "{} {} already exists with a different signature",
                T::KIND.as_str(),
                id
            )));
        }

        if !claim_is_live(&tx, &claim_id)? {
            return Err(StoreError::NotFound(format!("claim {}", claim_id)));
        }
        // References must point at live objects of the same claim
        for (table, ref_id) in object.references() {
            let sql = format!(
                "SELECT 1 FROM {} WHERE id = ?1 AND claim_id = ?2 AND deleted_at IS NULL",
                table
            );
            if tx.query_row(&sql, params![ref_id, claim_id], |_| Ok(())).optional()?.is_none() {
                return Err(StoreError::NotFound(format!("{} {} on claim {}", table, ref_id, claim_id)));
            }
        }

        let mut stored = object.clone();
        stored.set_deleted(None);
        let sql = format!(
            "INSERT INTO {} (id, claim_id, signature, created_at, body) VALUES (?1, ?2, ?3, ?4, ?5)",
            T::TABLE
        );
        tx.execute(
            &sql,
            params![
                id,
                claim_id,
                object.signature(),
                object.created_at() as i64,
                serde_json::to_string(&stored)?
            ],
        )?;
        tx.commit()?;

        info!(kind = T::KIND.as_str(), id = %id, claim_id = %claim_id, "Stored object");
        Ok(stored)
    }

    /// Record a refused write; storage failures are not rejections
    fn audit_rejection<T>(
        &self,
        kind: ObjectKind,
        subjects: Vec<String>,
        object: &dyn Signable,
        result: Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        if let Err(err) = &result {
            if err.kind() != ErrorKind::Storage {
                self.record_rejection(kind, subjects, object, err);
            }
        }
        result
    }

    fn record_rejection(&self, kind: ObjectKind, subjects: Vec<String>, object: &dyn Signable, err: &StoreError) {
        warn!(kind = kind.as_str(), subjects = ?subjects, error = %err, "Write rejected");
        let record = self.signer.record(
            RecordType::WriteRejected,
            subjects,
            format!("rejected: {}", err.kind()),
            json!({
                "object_kind": kind.as_str(),
                "author_key": object.author_key(),
                "payload_digest": payload_digest(&object.signing_payload()),
                "error_kind": err.kind(),
            }),
            vec![err.to_string()],
        );
        if let Err(e) = self.append_record(&record) {
            warn!(error = %e, "Failed to record rejected write");
        }
    }

    fn put_attached<T: Attached>(&self, object: T) -> Result<T, StoreError> {
        let subjects = vec![object.id_string(), object.claim_id().to_string()];
        let result = self.insert_attached(&object);
        self.audit_rejection(T::KIND, subjects, &object, result)
    }
}

impl ProvenanceStore for SqliteStore {
    type Error = StoreError;

    fn put_claim(&self, claim: Claim) -> Result<Claim, Self::Error> {
        let mut subjects = vec![claim.id.to_string()];
        subjects.extend(claim.prev_id.map(|p| p.to_string()));
        let result = self.insert_claim(&claim);
        self.audit_rejection(ObjectKind::Claim, subjects, &claim, result)
    }

    fn put_evidence(&self, evidence: Evidence) -> Result<Evidence, Self::Error> {
        self.put_attached(evidence)
    }

    fn put_counterclaim(&self, counterclaim: Counterclaim) -> Result<Counterclaim, Self::Error> {
        self.put_attached(counterclaim)
    }

    fn put_method(&self, method: Method) -> Result<Method, Self::Error> {
        self.put_attached(method)
    }

    fn put_attribution(&self, attribution: Attribution) -> Result<Attribution, Self::Error> {
        self.put_attached(attribution)
    }

    fn get_claim(&self, id: ClaimId, opts: ReadOptions) -> Result<Option<Claim>, Self::Error> {
        let conn = self.lock()?;
        let Some(mut claim) = load_claim_row(&conn, &id.to_string())? else {
            return Ok(None);
        };
        if claim.is_deleted() && !opts.include_deleted {
            return Ok(None);
        }
        fill_claim(&conn, &mut claim, opts)?;
        Ok(Some(claim))
    }

    fn get_evidence(&self, id: EvidenceId, opts: ReadOptions) -> Result<Option<Evidence>, Self::Error> {
        let conn = self.lock()?;
        Ok(load_attached::<Evidence>(&conn, "id", &id.to_string(), opts)?.into_iter().next())
    }

    fn get_counterclaim(&self, id: CounterclaimId, opts: ReadOptions) -> Result<Option<Counterclaim>, Self::Error> {
        let conn = self.lock()?;
        Ok(load_attached::<Counterclaim>(&conn, "id", &id.to_string(), opts)?.into_iter().next())
    }

    fn get_evidence_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Evidence>, Self::Error> {
        let conn = self.lock()?;
        load_attached(&conn, "claim_id", &claim_id.to_string(), opts)
    }

    fn get_counterclaims_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Counterclaim>, Self::Error> {
        let conn = self.lock()?;
        load_attached(&conn, "claim_id", &claim_id.to_string(), opts)
    }

    fn get_methods_for_claim(&self, claim_id: ClaimId, opts: ReadOptions) -> Result<Vec<Method>, Self::Error> {
        let conn = self.lock()?;
        load_attached(&conn, "claim_id", &claim_id.to_string(), opts)
    }

    fn get_attributions_for_claim(
        &self,
        claim_id: ClaimId,
        opts: ReadOptions,
    ) -> Result<Vec<Attribution>, Self::Error> {
        let conn = self.lock()?;
        load_attached(&conn, "claim_id", &claim_id.to_string(), opts)
    }

    fn get_lineage(&self, id: ClaimId) -> Result<Vec<Claim>, Self::Error> {
        let conn = self.lock()?;
        let start = load_claim_row(&conn, &id.to_string())?.ok_or_else(|| StoreError::NotFound(format!("claim {}", id)))?;
        walk_ancestors(&conn, &start)
    }

    fn current_version(&self, id: ClaimId) -> Result<Claim, Self::Error> {
        let conn = self.lock()?;
        let start = load_claim_row(&conn, &id.to_string())?.ok_or_else(|| StoreError::NotFound(format!("claim {}", id)))?;

        let mut seen = HashSet::from([start.id]);
        let mut chain = vec![start];
        loop {
            let last = chain[chain.len() - 1].id.to_string();
            let successor: Option<String> = conn
                .query_row("SELECT id FROM claims WHERE prev_id = ?1", params![last], |row| row.get(0))
                .optional()?;
            let Some(successor) = successor else { break };
            let next = load_claim_row(&conn, &successor)?
                .ok_or_else(|| StoreError::InvalidData(format!("dangling successor {}", successor)))?;
            if !seen.insert(next.id) {
                return Err(StoreError::LineageCycle(format!("revision cycle at {}", next.id)));
            }
            chain.push(next);
        }

        // Fall back to older versions when every newer one is deleted
        let ancestors = walk_ancestors(&conn, &chain[0])?;
        let mut current = chain
            .into_iter()
            .rev()
            .chain(ancestors.into_iter().rev())
            .find(|c| !c.is_deleted())
            .ok_or_else(|| StoreError::NotFound(format!("no live version of claim {}", id)))?;

        fill_claim(&conn, &mut current, ReadOptions::live())?;
        Ok(current)
    }

    fn mark_deleted(&self, kind: ObjectKind, id: &str, actor: &str) -> Result<bool, Self::Error> {
        // Every object id is a UUID; normalize its textual form
        let id = ClaimId::from_string(id)
            .map_err(|_| StoreError::NotFound(format!("{} {}", kind.as_str(), id)))?
            .to_string();
        let table = table_for(kind);
        let owner_column = if kind == ObjectKind::Claim { "NULL" } else { "claim_id" };

        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let sql = format!("SELECT deleted_at, {} FROM {} WHERE id = ?1", owner_column, table);
        let row: Option<(Option<i64>, Option<String>)> = tx
            .query_row(&sql, params![id], |row| Ok((row.get(0)?, row.get(1)?)))
            .optional()?;
        let (deleted_at, owner) = row.ok_or_else(|| StoreError::NotFound(format!("{} {}", kind.as_str(), id)))?;
        if deleted_at.is_some() {
            return Ok(false);
        }

        let now = now_millis();
        let sql = format!("UPDATE {} SET deleted_by = ?1, deleted_at = ?2 WHERE id = ?3", table);
        tx.execute(&sql, params![actor, now as i64, id])?;

        let mut subjects = vec![id.clone()];
        subjects.extend(owner);
        let record = self.signer.record(
            RecordType::ObjectDeleted,
            subjects,
            "soft_deleted",
            json!({ "object_kind": kind.as_str(), "deleted_by": actor, "deleted_at": now }),
            vec![format!("{} {} soft-deleted by {}", kind.as_str(), id, actor)],
        );
        ledger::insert_record(&tx, &record)?;
        tx.commit()?;

        info!(kind = kind.as_str(), id = %id, actor = %actor, "Soft-deleted object");
        Ok(true)
    }

    fn query_claims(&self, query: &ClaimQuery) -> Result<Vec<Claim>, Self::Error> {
        let mut sql = format!("SELECT {} FROM claims WHERE 1=1", CLAIM_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(topic) = &query.topic {
            sql.push_str(" AND id IN (SELECT claim_id FROM claim_tags WHERE tag = ?)");
            params.push(Box::new(topic.clone()));
        }

        if let Some(text) = &query.text {
            sql.push_str(" AND (title LIKE ? OR statement LIKE ?)");
            let pattern = format!("%{}%", text);
            params.push(Box::new(pattern.clone()));
            params.push(Box::new(pattern));
        }

        if !query.include_deleted {
            sql.push_str(" AND deleted_at IS NULL");
        }

        if query.heads_only {
            sql.push_str(
                " AND id NOT IN (SELECT prev_id FROM claims WHERE prev_id IS NOT NULL AND deleted_at IS NULL)",
            );
        }

        sql.push_str(" ORDER BY created_at, id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let conn = self.lock()?;
        let rows = {
            let mut stmt = conn.prepare(&sql)?;
            let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let rows = stmt
                .query_map(&param_refs[..], ClaimRow::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let opts = ReadOptions {
            include_deleted: query.include_deleted,
        };
        rows.into_iter()
            .map(|row| {
                let mut claim = row.into_claim()?;
                fill_claim(&conn, &mut claim, opts)?;
                Ok(claim)
            })
            .collect()
    }
}

/// Raw claim columns, converted outside the row callback
struct ClaimRow {
    id: String,
    title: String,
    statement: String,
    topic_tags: String,
    author_key: String,
    signature: String,
    created_at: i64,
    version: i64,
    prev_id: Option<String>,
    lineage: String,
    deleted_by: Option<String>,
    deleted_at: Option<i64>,
}

impl ClaimRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            statement: row.get(2)?,
            topic_tags: row.get(3)?,
            author_key: row.get(4)?,
            signature: row.get(5)?,
            created_at: row.get(6)?,
            version: row.get(7)?,
            prev_id: row.get(8)?,
            lineage: row.get(9)?,
            deleted_by: row.get(10)?,
            deleted_at: row.get(11)?,
        })
    }

    fn into_claim(self) -> Result<Claim, StoreError> {
        let mut claim = Claim::new(
            parse_id(&self.id)?,
            self.title,
            self.statement,
            serde_json::from_str::<Vec<String>>(&self.topic_tags)?,
            self.created_at as u64,
        );
        claim.author_key = self.author_key;
        claim.signature = self.signature;
        claim.version = self.version as u32;
        claim.prev_id = self.prev_id.as_deref().map(parse_id).transpose()?;
        claim.lineage = serde_json::from_str(&self.lineage)?;
        claim.deleted = tombstone(self.deleted_by, self.deleted_at);
        Ok(claim)
    }
}

fn parse_id<I: FromStr<Err = String>>(s: &str) -> Result<I, StoreError> {
    s.parse().map_err(StoreError::InvalidData)
}

fn parse_ids<I: FromStr<Err = String>>(ids: Vec<String>) -> Result<Vec<I>, StoreError> {
    ids.iter().map(|s| parse_id(s)).collect()
}

fn tombstone(deleted_by: Option<String>, deleted_at: Option<i64>) -> Option<Tombstone> {
    match (deleted_by, deleted_at) {
        (Some(by), Some(at)) => Some(Tombstone::new(by, at as u64)),
        _ => None,
    }
}

fn deleted_filter(opts: ReadOptions) -> &'static str {
    if opts.include_deleted {
        ""
    } else {
        " AND deleted_at IS NULL"
    }
}

fn load_claim_row(conn: &Connection, id: &str) -> Result<Option<Claim>, StoreError> {
    let sql = format!("SELECT {} FROM claims WHERE id = ?1", CLAIM_COLUMNS);
    conn.query_row(&sql, params![id], ClaimRow::from_row)
        .optional()?
        .map(ClaimRow::into_claim)
        .transpose()
}

fn claim_is_live(conn: &Connection, claim_id: &str) -> Result<bool, StoreError> {
    let live: Option<bool> = conn
        .query_row(
            "SELECT deleted_at IS NULL FROM claims WHERE id = ?1",
            params![claim_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(live.unwrap_or(false))
}

/// Ancestors of `start`, oldest first
fn walk_ancestors(conn: &Connection, start: &Claim) -> Result<Vec<Claim>, StoreError> {
    let mut ancestors = Vec::new();
    let mut seen = HashSet::from([start.id]);
    let mut next = start.prev_id;

    while let Some(parent_id) = next {
        if !seen.insert(parent_id) {
            return Err(StoreError::LineageCycle(format!("revision cycle at {}", parent_id)));
        }
        let parent = load_claim_row(conn, &parent_id.to_string())?
            .ok_or_else(|| StoreError::UnknownParent(parent_id.to_string()))?;
        next = parent.prev_id;
        ancestors.push(parent);
    }

    ancestors.reverse();
    Ok(ancestors)
}

fn check_revision(conn: &Connection, claim: &Claim) -> Result<(), StoreError> {
    let Some(prev_id) = claim.prev_id else {
        if claim.version != 1 || !claim.lineage.is_empty() {
            return Err(StoreError::LineageCycle(format!(
                "root claim {} must have version 1 and an empty lineage",
                claim.id
            )));
        }
        return Ok(());
    };

    let parent = load_claim_row(conn, &prev_id.to_string())?
        .ok_or_else(|| StoreError::UnknownParent(prev_id.to_string()))?;
    if parent.is_deleted() {
        return Err(StoreError::UnknownParent(format!("{} is deleted", prev_id)));
    }

    let mut expected = parent.lineage.clone();
    expected.push(parent.id);
    if claim.lineage != expected || !claim.lineage_is_well_formed() {
        return Err(StoreError::LineageCycle(format!(
            "lineage of {} must be the lineage of {} followed by {}",
            claim.id, prev_id, prev_id
        )));
    }
    if claim.version != parent.version + 1 {
        return Err(StoreError::LineageCycle(format!(
            "version {} does not follow parent version {}",
            claim.version, parent.version
        )));
    }

    let superseded_by: Option<String> = conn
        .query_row("SELECT id FROM claims WHERE prev_id = ?1", params![prev_id.to_string()], |row| {
            row.get(0)
        })
        .optional()?;
    if let Some(successor) = superseded_by {
        return Err(StoreError::Conflict(format!(
            "claim {} is already superseded by {}",
            prev_id, successor
        )));
    }
    Ok(())
}

fn attached_ids(conn: &Connection, table: &str, claim_id: &str, opts: ReadOptions) -> Result<Vec<String>, StoreError> {
    let sql = format!(
        "SELECT id FROM {} WHERE claim_id = ?1{} ORDER BY created_at, id",
        table,
        deleted_filter(opts)
    );
    let mut stmt = conn.prepare(&sql)?;
    let ids = stmt
        .query_map(params![claim_id], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn load_attached<T: Attached>(
    conn: &Connection,
    key_column: &str,
    key: &str,
    opts: ReadOptions,
) -> Result<Vec<T>, StoreError> {
    let sql = format!(
        "SELECT body, deleted_by, deleted_at FROM {} WHERE {} = ?1{} ORDER BY created_at, id",
        T::TABLE,
        key_column,
        deleted_filter(opts)
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![key], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<i64>>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(body, deleted_by, deleted_at)| {
            let mut object: T = serde_json::from_str(&body)?;
            object.set_deleted(tombstone(deleted_by, deleted_at));
            Ok(object)
        })
        .collect()
}

/// Fill reference lists and active reports on a claim read
fn fill_claim(conn: &Connection, claim: &mut Claim, opts: ReadOptions) -> Result<(), StoreError> {
    let key = claim.id.to_string();
    claim.evidence_refs = parse_ids(attached_ids(conn, Evidence::TABLE, &key, opts)?)?;
    claim.counterclaim_refs = parse_ids(attached_ids(conn, Counterclaim::TABLE, &key, opts)?)?;
    claim.method_refs = parse_ids(attached_ids(conn, Method::TABLE, &key, opts)?)?;
    claim.attribution_refs = parse_ids(attached_ids(conn, Attribution::TABLE, &key, opts)?)?;
    claim.confidence_reports = ledger::active_reports_on(conn, &key)?;
    Ok(())
}
