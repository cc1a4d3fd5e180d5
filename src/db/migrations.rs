use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS prayer_times_cache (
            lat_key     TEXT NOT NULL,
            lng_key     TEXT NOT NULL,
            method      TEXT NOT NULL,
            date        TEXT NOT NULL,
            fajr        TEXT NOT NULL,
            dhuhr       TEXT NOT NULL,
            asr         TEXT NOT NULL,
            maghrib     TEXT NOT NULL,
            isha        TEXT NOT NULL,
            sunrise     TEXT,
            sunset      TEXT,
            fetched_at  INTEGER NOT NULL,
            PRIMARY KEY (lat_key, lng_key, method, date)
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ",
    )?;
    Ok(())
}
