//! Fixed sites (depots) used as geofence targets.

use std::fmt;

use super::distance_m;

/// A fixed site a vehicle can arrive at.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    /// Stable identifier (e.g. "los-cardales").
    pub id: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Human-readable name written to location records.
    pub name: String,
}

impl Site {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            name: name.into(),
        }
    }

    /// Position as a (latitude, longitude) tuple.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.5}, {:.5})", self.name, self.lat, self.lng)
    }
}

/// Closest site to a position together with its distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestSite<'a> {
    pub site: &'a Site,
    pub distance_m: f64,
}

impl NearestSite<'_> {
    /// True if the distance is within `radius_m` (inclusive).
    pub fn is_within(&self, radius_m: f64) -> bool {
        self.distance_m <= radius_m
    }
}

/// Immutable list of known sites.
///
/// Built once and handed to the reporter; the reporter never mutates it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteTable {
    sites: Vec<Site>,
}

impl SiteTable {
    pub fn new(sites: Vec<Site>) -> Self {
        Self { sites }
    }

    /// The company's two known depots.
    pub fn builtin() -> Self {
        Self::new(vec![
            Site::new(
                "los-cardales",
                -34.36014566238795,
                -59.00991328060013,
                "Base Los Cardales",
            ),
            Site::new(
                "villa-maipu",
                -34.56297844053954,
                -58.52935080773911,
                "Base Villa Maipú",
            ),
        ])
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Find the site closest to a position.
    ///
    /// Returns `None` only when the table is empty. On ties the first site
    /// in table order wins.
    pub fn nearest(&self, lat: f64, lng: f64) -> Option<NearestSite<'_>> {
        self.sites
            .iter()
            .map(|site| NearestSite {
                site,
                distance_m: distance_m((lat, lng), site.position()),
            })
            .fold(None, |best: Option<NearestSite<'_>>, candidate| match best {
                Some(b) if b.distance_m <= candidate.distance_m => Some(b),
                _ => Some(candidate),
            })
    }
}
