use anyhow::{Context, Result};
use log::{debug, info};
use rusqlite::{Connection, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

use crate::models::{CellMeasurement, DriveSample, Technology};
use crate::storage::schema::create_tables;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sample store lock poisoned")]
    Poisoned,

    #[error("sample store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Append-only repository of drive samples
///
/// Listings are always ordered newest first. Samples are never updated; they
/// leave the store only through [`delete_older_than`](Self::delete_older_than)
/// or [`delete_all`](Self::delete_all).
pub trait SampleStore: Send + Sync {
    /// Persists one sample and returns its row id
    fn insert(&self, sample: &DriveSample) -> Result<i64, StoreError>;

    /// Persists all samples in one transaction
    fn insert_batch(&self, samples: &[DriveSample]) -> Result<(), StoreError>;

    fn query_all(&self) -> Result<Vec<DriveSample>, StoreError>;

    /// Samples with `start <= timestamp <= end`
    fn query_by_time_range(&self, start: i64, end: i64) -> Result<Vec<DriveSample>, StoreError>;

    fn query_by_technology(&self, technology: &str) -> Result<Vec<DriveSample>, StoreError>;

    fn query_by_operator(&self, operator: &str) -> Result<Vec<DriveSample>, StoreError>;

    fn distinct_technologies(&self) -> Result<Vec<String>, StoreError>;

    fn distinct_operators(&self) -> Result<Vec<String>, StoreError>;

    fn count(&self) -> Result<u64, StoreError>;

    /// Removes samples with `timestamp < before`; returns how many were removed
    fn delete_older_than(&self, before: i64) -> Result<usize, StoreError>;

    fn delete_all(&self) -> Result<usize, StoreError>;
}

const SELECT_COLUMNS: &str = "SELECT id, device_id, timestamp, latitude, longitude, technology,
    plmn_id, lac, rac, tac, cell_id, frequency_band, arfcn, actual_frequency,
    rsrp, rsrq, rscp, ec_no, rx_lev, sinr, operator_name, notes,
    http_upload_rate, ping_response_time, dns_response_time, web_response_time,
    sms_enqueue_time, test_notes
    FROM drive_samples";

const INSERT_SAMPLE: &str = "INSERT INTO drive_samples (
    device_id, timestamp, latitude, longitude, technology,
    plmn_id, lac, rac, tac, cell_id, frequency_band, arfcn, actual_frequency,
    rsrp, rsrq, rscp, ec_no, rx_lev, sinr, operator_name, notes,
    http_upload_rate, ping_response_time, dns_response_time, web_response_time,
    sms_enqueue_time, test_notes
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
          ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27)";

pub struct SqliteSampleStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSampleStore {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database {}", db_path.as_ref().display()))?;

        // WAL is unavailable for in-memory databases; that is fine
        let _ = conn.pragma_update(None, "journal_mode", "WAL");

        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))
            .context("Failed to set busy timeout")?;

        create_tables(&conn).context("Failed to create database tables")?;

        info!("Sample store initialized");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn query_samples(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<DriveSample>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("{SELECT_COLUMNS} {filter} ORDER BY timestamp DESC, id DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params, sample_from_row)?;
        let samples = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(samples)
    }

    fn distinct(&self, column: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn()?;
        let sql = format!("SELECT DISTINCT {column} FROM drive_samples ORDER BY {column}");
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }
}

fn insert_with(conn: &Connection, sample: &DriveSample) -> rusqlite::Result<i64> {
    let cell = &sample.cell;
    conn.execute(
        INSERT_SAMPLE,
        params![
            sample.device_id,
            sample.timestamp,
            sample.latitude,
            sample.longitude,
            cell.technology.label(),
            cell.plmn_id,
            cell.lac,
            cell.rac,
            cell.tac,
            cell.cell_id,
            cell.frequency_band,
            cell.arfcn,
            cell.actual_frequency,
            cell.rsrp,
            cell.rsrq,
            cell.rscp,
            cell.ec_no,
            cell.rx_lev,
            cell.sinr,
            cell.operator_name,
            cell.notes,
            sample.http_upload_rate,
            sample.ping_response_time,
            sample.dns_response_time,
            sample.web_response_time,
            sample.sms_enqueue_ms,
            sample.test_notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn sample_from_row(row: &Row<'_>) -> rusqlite::Result<DriveSample> {
    let technology: String = row.get(5)?;
    Ok(DriveSample {
        id: Some(row.get(0)?),
        device_id: row.get(1)?,
        timestamp: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
        cell: CellMeasurement {
            technology: Technology::from_label(&technology),
            plmn_id: row.get(6)?,
            lac: row.get(7)?,
            rac: row.get(8)?,
            tac: row.get(9)?,
            cell_id: row.get(10)?,
            frequency_band: row.get(11)?,
            arfcn: row.get(12)?,
            actual_frequency: row.get(13)?,
            rsrp: row.get(14)?,
            rsrq: row.get(15)?,
            rscp: row.get(16)?,
            ec_no: row.get(17)?,
            rx_lev: row.get(18)?,
            sinr: row.get(19)?,
            operator_name: row.get(20)?,
            notes: row.get(21)?,
        },
        http_upload_rate: row.get(22)?,
        ping_response_time: row.get(23)?,
        dns_response_time: row.get(24)?,
        web_response_time: row.get(25)?,
        sms_enqueue_ms: row.get(26)?,
        test_notes: row.get(27)?,
    })
}

impl SampleStore for SqliteSampleStore {
    fn insert(&self, sample: &DriveSample) -> Result<i64, StoreError> {
        let conn = self.conn()?;
        let id = insert_with(&conn, sample)?;
        debug!("Stored sample {} (timestamp {})", id, sample.timestamp);
        Ok(id)
    }

    fn insert_batch(&self, samples: &[DriveSample]) -> Result<(), StoreError> {
        if samples.is_empty() {
            return Ok(());
        }

        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        for sample in samples {
            insert_with(&tx, sample)?;
        }
        tx.commit()?;

        debug!("Stored batch of {} samples", samples.len());
        Ok(())
    }

    fn query_all(&self) -> Result<Vec<DriveSample>, StoreError> {
        self.query_samples("", [])
    }

    fn query_by_time_range(&self, start: i64, end: i64) -> Result<Vec<DriveSample>, StoreError> {
        self.query_samples("WHERE timestamp BETWEEN ?1 AND ?2", params![start, end])
    }

    fn query_by_technology(&self, technology: &str) -> Result<Vec<DriveSample>, StoreError> {
        self.query_samples("WHERE technology = ?1", params![technology])
    }

    fn query_by_operator(&self, operator: &str) -> Result<Vec<DriveSample>, StoreError> {
        self.query_samples("WHERE operator_name = ?1", params![operator])
    }

    fn distinct_technologies(&self) -> Result<Vec<String>, StoreError> {
        self.distinct("technology")
    }

    fn distinct_operators(&self) -> Result<Vec<String>, StoreError> {
        self.distinct("operator_name")
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM drive_samples", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn delete_older_than(&self, before: i64) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM drive_samples WHERE timestamp < ?1", params![before])?;
        info!("Removed {} samples older than {}", removed, before);
        Ok(removed)
    }

    fn delete_all(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM drive_samples", [])?;
        info!("Removed all {} samples", removed);
        Ok(removed)
    }
}
