use crate::error::StoreError;
use crate::record::CompanyRecord;
use crate::store::{InsertOutcome, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

const COMPANY_COLUMNS: &str = "id, registry_id, name, trade_name,
                street, number, complement, postal_code, district, municipality, state,
                email, phone, registry_authority, status, fetched_at";

pub fn setup_database(conn: &Connection) -> Result<(), StoreError> {
    // Enable WAL mode for crash recovery (in-memory databases report "memory")
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Companies Table
    // registry_id is the raw string as submitted; UNIQUE closes the
    // concurrent miss-then-insert race
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            registry_id TEXT UNIQUE NOT NULL,
            name TEXT NOT NULL,
            trade_name TEXT NOT NULL,
            street TEXT NOT NULL,
            number TEXT NOT NULL,
            complement TEXT NOT NULL,
            postal_code TEXT NOT NULL,
            district TEXT NOT NULL,
            municipality TEXT NOT NULL,
            state TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            registry_authority TEXT NOT NULL,
            status TEXT NOT NULL,
            fetched_at TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

/// Insert a company unless its registry id is already stored
pub fn insert_company(conn: &Connection, record: &CompanyRecord) -> Result<InsertOutcome, StoreError> {
    let result = conn.execute(
        "INSERT INTO companies (
            registry_id, name, trade_name,
            street, number, complement, postal_code, district, municipality, state,
            email, phone, registry_authority, status, fetched_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            record.registry_id,
            record.name,
            record.trade_name,
            record.street,
            record.number,
            record.complement,
            record.postal_code,
            record.district,
            record.municipality,
            record.state,
            record.email,
            record.phone,
            record.registry_authority,
            record.status,
            record.fetched_at.to_rfc3339(),
        ],
    );

    match result {
        Ok(_) => Ok(InsertOutcome::Inserted(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(InsertOutcome::Conflict)
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_company(conn: &Connection, registry_id: &str) -> Result<Option<CompanyRecord>, StoreError> {
    let sql = format!("SELECT {} FROM companies WHERE registry_id = ?1", COMPANY_COLUMNS);

    let row = conn
        .query_row(&sql, [registry_id], read_company_row)
        .optional()?;

    row.map(into_record).transpose()
}

pub fn get_all_companies(conn: &Connection) -> Result<Vec<CompanyRecord>, StoreError> {
    let sql = format!("SELECT {} FROM companies ORDER BY id", COMPANY_COLUMNS);
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([], read_company_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(into_record).collect()
}

pub fn verify_count(conn: &Connection) -> Result<i64, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM companies", [], |row| row.get(0))?;

    Ok(count)
}

/// Row with the timestamp still as text; parsed outside the rusqlite closure
/// so a bad value surfaces as `Corrupt` instead of a generic query error.
struct CompanyRow {
    record: CompanyRecord,
    fetched_at: String,
}

fn read_company_row(row: &Row<'_>) -> rusqlite::Result<CompanyRow> {
    let registry_id: String = row.get(1)?;
    let mut record = CompanyRecord::new(&registry_id);

    record.id = Some(row.get(0)?);
    record.name = row.get(2)?;
    record.trade_name = row.get(3)?;
    record.street = row.get(4)?;
    record.number = row.get(5)?;
    record.complement = row.get(6)?;
    record.postal_code = row.get(7)?;
    record.district = row.get(8)?;
    record.municipality = row.get(9)?;
    record.state = row.get(10)?;
    record.email = row.get(11)?;
    record.phone = row.get(12)?;
    record.registry_authority = row.get(13)?;
    record.status = row.get(14)?;

    Ok(CompanyRow {
        record,
        fetched_at: row.get(15)?,
    })
}

fn into_record(row: CompanyRow) -> Result<CompanyRecord, StoreError> {
    let CompanyRow { mut record, fetched_at } = row;

    record.fetched_at = DateTime::parse_from_rfc3339(&fetched_at)
        .map_err(|e| StoreError::Corrupt {
            detail: format!("fetched_at '{}' for {}: {}", fetched_at, record.registry_id, e),
        })?
        .with_timezone(&Utc);

    Ok(record)
}

// ============================================================================
// SQLITE STORE
// ============================================================================

/// [`Store`] over a single shared SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        f(&conn)
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_by_registry_id(&self, raw: &str) -> Result<Option<CompanyRecord>, StoreError> {
        self.with_conn(|conn| find_company(conn, raw))
    }

    async fn insert(&self, record: &CompanyRecord) -> Result<InsertOutcome, StoreError> {
        let outcome = self.with_conn(|conn| insert_company(conn, record))?;

        match outcome {
            InsertOutcome::Inserted(id) => {
                tracing::debug!(registry_id = %record.registry_id, id, "company stored")
            }
            InsertOutcome::Conflict => {
                tracing::debug!(registry_id = %record.registry_id, "company already stored")
            }
        }

        Ok(outcome)
    }

    async fn list_all(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        self.with_conn(get_all_companies)
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count = self.with_conn(verify_count)?;
        Ok(count as usize)
    }
}
