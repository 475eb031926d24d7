//! SQL schema for the Haze SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// Locations are stored as integer microdegrees. The composite
/// `(lat_e6, lon_e6, forecast_time)` index serves both the bounding-box scan
/// and exact-site series lookups.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Rows are append-only; only retention purges ever delete.
CREATE TABLE IF NOT EXISTS air_quality_records (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    lat_e6              INTEGER NOT NULL CHECK (lat_e6 BETWEEN -90000000 AND 90000000),
    lon_e6              INTEGER NOT NULL CHECK (lon_e6 BETWEEN -180000000 AND 180000000),
    forecast_time       TEXT    NOT NULL,   -- RFC 3339 UTC, fixed width
    aqi                 INTEGER NOT NULL CHECK (aqi >= 0),
    pm25                REAL,
    o3                  REAL,
    ingestion_timestamp TEXT    NOT NULL    -- server-assigned, never updated
);

CREATE TABLE IF NOT EXISTS allergen_records (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    lat_e6              INTEGER NOT NULL CHECK (lat_e6 BETWEEN -90000000 AND 90000000),
    lon_e6              INTEGER NOT NULL CHECK (lon_e6 BETWEEN -180000000 AND 180000000),
    forecast_time       TEXT    NOT NULL,
    pollen_index        INTEGER NOT NULL CHECK (pollen_index >= 0),
    tree_pollen_count   INTEGER,
    grass_pollen_count  INTEGER,
    ingestion_timestamp TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS air_quality_location_idx
    ON air_quality_records(lat_e6, lon_e6, forecast_time);
CREATE INDEX IF NOT EXISTS air_quality_time_idx
    ON air_quality_records(forecast_time);
CREATE INDEX IF NOT EXISTS allergen_location_idx
    ON allergen_records(lat_e6, lon_e6, forecast_time);
CREATE INDEX IF NOT EXISTS allergen_time_idx
    ON allergen_records(forecast_time);

PRAGMA user_version = 1;
";
