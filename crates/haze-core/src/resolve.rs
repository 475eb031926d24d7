//! Nearest-site resolution.
//!
//! The store narrows candidates with an indexed bounding-box scan; exact
//! great-circle distances are computed here, candidates outside the radius
//! are dropped, and the closest survivor wins. Equal distances resolve to the
//! site with the lowest row id.

use serde::Serialize;
use strum::IntoEnumIterator as _;

use crate::{
  Error, Result,
  geo::{BoundingBox, Coordinate, great_circle_distance},
  measurement::{MeasurementKind, StoredSite},
  store::ForecastStore,
};

/// Default search radius around a query point, in meters.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 5_000.0;

/// The stored site closest to a query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Nearest {
  pub kind:       MeasurementKind,
  pub site:       StoredSite,
  /// Great-circle distance from the query point, in meters; never exceeds
  /// the search radius.
  pub distance_m: f64,
}

/// Find the stored site of `kind` closest to `query` within `radius_m`.
///
/// Returns [`Error::NotFound`] when no site lies inside the radius.
pub async fn find_nearest<S>(
  store: &S,
  query: Coordinate,
  kind: MeasurementKind,
  radius_m: f64,
) -> Result<Nearest>
where
  S: ForecastStore,
{
  let bbox = BoundingBox::around(query, radius_m);
  let sites = store.sites_within(kind, bbox).await.map_err(Error::store)?;

  closest_within(query, sites, radius_m)
    .map(|(site, distance_m)| Nearest { kind, site, distance_m })
    .ok_or_else(|| not_found(query, radius_m))
}

/// Find the closest stored site of any kind.
///
/// Both kinds are searched; the nearer result wins and air quality is
/// preferred on an exact tie.
pub async fn find_nearest_any<S>(
  store: &S,
  query: Coordinate,
  radius_m: f64,
) -> Result<Nearest>
where
  S: ForecastStore,
{
  let mut best: Option<Nearest> = None;

  for kind in MeasurementKind::iter() {
    match find_nearest(store, query, kind, radius_m).await {
      Ok(found) => {
        if best.is_none_or(|b| found.distance_m < b.distance_m) {
          best = Some(found);
        }
      }
      Err(Error::NotFound { .. }) => {}
      Err(e) => return Err(e),
    }
  }

  best.ok_or_else(|| not_found(query, radius_m))
}

fn closest_within(
  query: Coordinate,
  sites: Vec<StoredSite>,
  radius_m: f64,
) -> Option<(StoredSite, f64)> {
  sites
    .into_iter()
    .map(|site| (site, great_circle_distance(query, site.location)))
    .filter(|(_, d)| *d <= radius_m)
    .min_by(|(a, da), (b, db)| da.total_cmp(db).then(a.id.cmp(&b.id)))
}

fn not_found(query: Coordinate, radius_m: f64) -> Error {
  Error::NotFound {
    radius_m,
    latitude: query.latitude,
    longitude: query.longitude,
  }
}
