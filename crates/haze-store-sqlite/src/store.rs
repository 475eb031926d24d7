//! [`SqliteStore`], the SQLite implementation of [`ForecastStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use haze_core::{
  geo::{BoundingBox, Coordinate, GridPoint},
  measurement::{
    AirQualityPoint, AllergenPoint, MeasurementBatch, MeasurementKind,
    StoredSite,
  },
  store::ForecastStore,
};

use crate::{
  Error, Result,
  encode::{
    AirQualityRow, AllergenRow, RawAirQualityPoint, RawAllergenPoint, encode_dt,
    table_for,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A forecast store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a store from a connection string.
  ///
  /// Accepts `sqlite::memory:`, `sqlite://<path>`, `sqlite:<path>`, or a bare
  /// filesystem path.
  pub async fn connect(url: &str) -> Result<Self> {
    let url = url.trim();
    if url == "sqlite::memory:" || url == ":memory:" {
      return Self::open_in_memory().await;
    }

    let path = url
      .strip_prefix("sqlite://")
      .or_else(|| url.strip_prefix("sqlite:"))
      .unwrap_or(url);

    if path.is_empty() || path.contains("://") {
      return Err(Error::UnsupportedUrl(url.to_owned()));
    }
    Self::open(path).await
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    tracing::debug!("schema initialised");
    Ok(())
  }

  async fn insert_air_quality(&self, rows: Vec<AirQualityRow>) -> Result<usize> {
    let ingested_at = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO air_quality_records (
               lat_e6, lon_e6, forecast_time, aqi, pm25, o3, ingestion_timestamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.lat_e6,
              row.lon_e6,
              row.forecast_time,
              row.aqi,
              row.pm25,
              row.o3,
              ingested_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }

  async fn insert_allergen(&self, rows: Vec<AllergenRow>) -> Result<usize> {
    let ingested_at = encode_dt(Utc::now());

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO allergen_records (
               lat_e6, lon_e6, forecast_time, pollen_index,
               tree_pollen_count, grass_pollen_count, ingestion_timestamp
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          )?;
          for row in &rows {
            stmt.execute(rusqlite::params![
              row.lat_e6,
              row.lon_e6,
              row.forecast_time,
              row.pollen_index,
              row.tree_pollen_count,
              row.grass_pollen_count,
              ingested_at,
            ])?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    Ok(written)
  }
}

// ─── ForecastStore impl ──────────────────────────────────────────────────────

impl ForecastStore for SqliteStore {
  type Error = Error;

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn insert_batch(&self, batch: MeasurementBatch) -> Result<usize> {
    match batch {
      MeasurementBatch::AirQuality(rows) => {
        self
          .insert_air_quality(rows.into_iter().map(AirQualityRow::from).collect())
          .await
      }
      MeasurementBatch::Allergen(rows) => {
        self
          .insert_allergen(rows.into_iter().map(AllergenRow::from).collect())
          .await
      }
    }
  }

  async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
    let cutoff_str = encode_dt(cutoff);

    let removed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut removed = 0;
        for kind in [MeasurementKind::AirQuality, MeasurementKind::Allergen] {
          removed += tx.execute(
            &format!("DELETE FROM {} WHERE forecast_time < ?1", table_for(kind)),
            rusqlite::params![cutoff_str],
          )?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;
    Ok(removed)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn sites_within(
    &self,
    kind: MeasurementKind,
    bbox: BoundingBox,
  ) -> Result<Vec<StoredSite>> {
    let sql = format!(
      "SELECT MIN(id), lat_e6, lon_e6
       FROM {}
       WHERE lat_e6 BETWEEN ?1 AND ?2
         AND lon_e6 BETWEEN ?3 AND ?4
       GROUP BY lat_e6, lon_e6",
      table_for(kind)
    );

    let sites = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              bbox.min.lat_e6,
              bbox.max.lat_e6,
              bbox.min.lon_e6,
              bbox.max.lon_e6,
            ],
            |row| {
              let grid = GridPoint { lat_e6: row.get(1)?, lon_e6: row.get(2)? };
              Ok(StoredSite { id: row.get(0)?, location: grid.into() })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(sites)
  }

  async fn air_quality_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> Result<Vec<AirQualityPoint>> {
    let grid = GridPoint::from(location);
    let limit_val = limit as i64;

    let raws: Vec<RawAirQualityPoint> = self
      .conn
      .call(move |conn| {
        // Latest ingestion wins when ticks have appended overlapping windows.
        let mut stmt = conn.prepare(
          "SELECT r.forecast_time, r.aqi, r.pm25, r.o3
           FROM air_quality_records r
           WHERE r.lat_e6 = ?1 AND r.lon_e6 = ?2
             AND r.id = (
               SELECT MAX(l.id) FROM air_quality_records l
               WHERE l.lat_e6 = r.lat_e6
                 AND l.lon_e6 = r.lon_e6
                 AND l.forecast_time = r.forecast_time
             )
           ORDER BY r.forecast_time ASC
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![grid.lat_e6, grid.lon_e6, limit_val], |row| {
            Ok(RawAirQualityPoint {
              forecast_time: row.get(0)?,
              aqi:           row.get(1)?,
              pm25:          row.get(2)?,
              o3:            row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAirQualityPoint::into_point).collect()
  }

  async fn allergen_series(
    &self,
    location: Coordinate,
    limit: usize,
  ) -> Result<Vec<AllergenPoint>> {
    let grid = GridPoint::from(location);
    let limit_val = limit as i64;

    let raws: Vec<RawAllergenPoint> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT r.forecast_time, r.pollen_index, r.tree_pollen_count, r.grass_pollen_count
           FROM allergen_records r
           WHERE r.lat_e6 = ?1 AND r.lon_e6 = ?2
             AND r.id = (
               SELECT MAX(l.id) FROM allergen_records l
               WHERE l.lat_e6 = r.lat_e6
                 AND l.lon_e6 = r.lon_e6
                 AND l.forecast_time = r.forecast_time
             )
           ORDER BY r.forecast_time ASC
           LIMIT ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![grid.lat_e6, grid.lon_e6, limit_val], |row| {
            Ok(RawAllergenPoint {
              forecast_time:      row.get(0)?,
              pollen_index:       row.get(1)?,
              tree_pollen_count:  row.get(2)?,
              grass_pollen_count: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAllergenPoint::into_point).collect()
  }

  async fn count(&self, kind: MeasurementKind) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM {}", table_for(kind));

    let n: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;
    Ok(n as usize)
  }
}
