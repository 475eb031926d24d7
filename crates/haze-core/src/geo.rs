//! Spherical geometry over WGS-84 coordinates.
//!
//! Distances are great-circle distances on a sphere of mean Earth radius; no
//! ellipsoidal correction is applied. Stored locations are snapped to a
//! microdegree grid so that every write of the same site yields bit-identical
//! coordinates, which is what exact-location matching relies on.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Mean Earth radius (IUGG), in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Grid cells per degree; one cell is roughly 11 cm of latitude.
const GRID_SCALE: f64 = 1_000_000.0;

// ─── Coordinate ──────────────────────────────────────────────────────────────

/// A validated geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
  pub latitude:  f64,
  pub longitude: f64,
}

impl Coordinate {
  /// Build a coordinate, rejecting non-finite or out-of-range values.
  pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
    let invalid = |reason| Error::InvalidCoordinate { latitude, longitude, reason };

    if !latitude.is_finite() || !longitude.is_finite() {
      return Err(invalid("coordinates must be finite"));
    }
    if !(-90.0..=90.0).contains(&latitude) {
      return Err(invalid("latitude must be within [-90, 90]"));
    }
    if !(-180.0..=180.0).contains(&longitude) {
      return Err(invalid("longitude must be within [-180, 180]"));
    }
    Ok(Self { latitude, longitude })
  }

  /// This coordinate moved onto the storage grid.
  pub fn snapped(self) -> Self { GridPoint::from(self).into() }
}

// ─── Grid ────────────────────────────────────────────────────────────────────

/// A coordinate expressed in integer microdegrees.
///
/// This is the representation the store indexes and compares on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPoint {
  pub lat_e6: i64,
  pub lon_e6: i64,
}

impl From<Coordinate> for GridPoint {
  fn from(c: Coordinate) -> Self {
    Self {
      lat_e6: (c.latitude * GRID_SCALE).round() as i64,
      lon_e6: (c.longitude * GRID_SCALE).round() as i64,
    }
  }
}

impl From<GridPoint> for Coordinate {
  fn from(g: GridPoint) -> Self {
    Self {
      latitude:  g.lat_e6 as f64 / GRID_SCALE,
      longitude: g.lon_e6 as f64 / GRID_SCALE,
    }
  }
}

// ─── Distance ────────────────────────────────────────────────────────────────

/// Great-circle distance between two points, in meters (haversine).
pub fn great_circle_distance(a: Coordinate, b: Coordinate) -> f64 {
  let lat1 = a.latitude.to_radians();
  let lat2 = b.latitude.to_radians();
  let dlat = lat2 - lat1;
  let dlon = (b.longitude - a.longitude).to_radians();

  let h = (dlat / 2.0).sin().powi(2)
    + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

// ─── Bounding box ────────────────────────────────────────────────────────────

/// An inclusive lat/lon rectangle on the storage grid.
///
/// Used as an index-friendly prefilter; it always contains the full circle of
/// the requested radius, and callers apply the exact distance test afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
  pub min: GridPoint,
  pub max: GridPoint,
}

impl BoundingBox {
  /// The smallest box enclosing every point within `radius_m` of `center`.
  ///
  /// When the circle reaches a pole or crosses the antimeridian the box spans
  /// every longitude.
  pub fn around(center: Coordinate, radius_m: f64) -> Self {
    let angular = radius_m.max(0.0) / EARTH_RADIUS_M;
    let lat = center.latitude.to_radians();

    let min_lat = lat - angular;
    let max_lat = lat + angular;
    let half_pi = std::f64::consts::FRAC_PI_2;

    let (min_lat, max_lat, min_lon, max_lon) =
      if min_lat > -half_pi && max_lat < half_pi {
        let dlon = (angular.sin() / lat.cos()).clamp(-1.0, 1.0).asin();
        let lon = center.longitude.to_radians();
        let (lo, hi) = (lon - dlon, lon + dlon);
        if lo < -std::f64::consts::PI || hi > std::f64::consts::PI {
          (min_lat, max_lat, -180.0, 180.0)
        } else {
          (min_lat, max_lat, lo.to_degrees(), hi.to_degrees())
        }
      } else {
        (min_lat.max(-half_pi), max_lat.min(half_pi), -180.0, 180.0)
      };

    Self {
      min: GridPoint {
        lat_e6: (min_lat.to_degrees() * GRID_SCALE).floor() as i64 - 1,
        lon_e6: (min_lon * GRID_SCALE).floor() as i64 - 1,
      },
      max: GridPoint {
        lat_e6: (max_lat.to_degrees() * GRID_SCALE).ceil() as i64 + 1,
        lon_e6: (max_lon * GRID_SCALE).ceil() as i64 + 1,
      },
    }
  }

  pub fn contains(&self, p: GridPoint) -> bool {
    (self.min.lat_e6..=self.max.lat_e6).contains(&p.lat_e6)
      && (self.min.lon_e6..=self.max.lon_e6).contains(&p.lon_e6)
  }
}
