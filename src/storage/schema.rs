use anyhow::Result;
use rusqlite::Connection;

pub const SAMPLES_TABLE: &str = "drive_samples";

pub fn create_tables(conn: &Connection) -> Result<()> {
    // One row per drive-test tick; rows are only ever inserted or deleted
    conn.execute(
        "CREATE TABLE IF NOT EXISTS drive_samples (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            device_id TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            technology TEXT NOT NULL,
            plmn_id TEXT NOT NULL DEFAULT '',
            lac INTEGER NOT NULL DEFAULT -1,
            rac INTEGER NOT NULL DEFAULT -1,
            tac INTEGER NOT NULL DEFAULT -1,
            cell_id INTEGER NOT NULL DEFAULT -1,
            frequency_band TEXT NOT NULL DEFAULT 'Unknown',
            arfcn INTEGER NOT NULL DEFAULT -1,
            actual_frequency TEXT NOT NULL DEFAULT 'Unknown',
            rsrp INTEGER NOT NULL,
            rsrq INTEGER NOT NULL,
            rscp INTEGER NOT NULL,
            ec_no INTEGER NOT NULL,
            rx_lev INTEGER NOT NULL,
            sinr INTEGER NOT NULL,
            operator_name TEXT NOT NULL DEFAULT 'Unknown',
            notes TEXT NOT NULL DEFAULT '',
            http_upload_rate REAL NOT NULL DEFAULT -1.0,
            ping_response_time REAL NOT NULL DEFAULT -1.0,
            dns_response_time REAL NOT NULL DEFAULT -1.0,
            web_response_time REAL NOT NULL DEFAULT -1.0,
            sms_enqueue_time REAL NOT NULL DEFAULT -1.0,
            test_notes TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    create_indexes(conn)?;

    Ok(())
}

fn create_indexes(conn: &Connection) -> Result<()> {
    // Every listing is newest-first
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drive_samples_timestamp
         ON drive_samples(timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drive_samples_technology_timestamp
         ON drive_samples(technology, timestamp)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_drive_samples_operator_timestamp
         ON drive_samples(operator_name, timestamp)",
        [],
    )?;

    Ok(())
}
