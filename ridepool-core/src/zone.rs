//! Service zones and nearest-zone classification.
//!
//! A [`ZoneTable`] is ordered reference data. Classification walks the table
//! in that order and keeps the first zone at the minimum distance, so ties
//! resolve to the zone listed earlier. The table is never mutated by the
//! engine; swapping it means building a new configuration.

use std::fmt;

use geo::Coord;

use crate::spatial::haversine_miles;

/// Identifier of a service zone, e.g. `"downtown"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ZoneId(String);

impl ZoneId {
    /// Wrap a zone name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A service area with a centroid and typical road speed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Zone {
    /// Zone identifier.
    pub id: ZoneId,
    /// Centroid (`x = longitude`, `y = latitude`).
    pub centroid: Coord<f64>,
    /// Average road speed inside the zone, in miles per hour.
    pub average_speed_mph: f64,
}

impl Zone {
    /// Construct a zone from its parts.
    pub fn new(id: impl Into<ZoneId>, centroid: Coord<f64>, average_speed_mph: f64) -> Self {
        Self {
            id: id.into(),
            centroid,
            average_speed_mph,
        }
    }
}

impl From<String> for ZoneId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Result of classifying a coordinate against a [`ZoneTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneMatch<'a> {
    /// The nearest zone and the distance to its centroid in miles.
    Zone {
        /// Matched zone.
        zone: &'a Zone,
        /// Distance from the classified point to the zone centroid.
        distance_miles: f64,
    },
    /// No zone qualified: the table is empty or every centroid lies beyond
    /// the threshold.
    Unclassified,
}

impl<'a> ZoneMatch<'a> {
    /// Return the matched zone, if any.
    #[must_use]
    pub const fn zone(&self) -> Option<&'a Zone> {
        match self {
            Self::Zone { zone, .. } => Some(zone),
            Self::Unclassified => None,
        }
    }

    /// Average speed of the matched zone, or `default_mph` when unclassified.
    #[must_use]
    pub fn speed_or(&self, default_mph: f64) -> f64 {
        self.zone().map_or(default_mph, |zone| zone.average_speed_mph)
    }
}

/// Ordered zone reference table.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ridepool_core::{Zone, ZoneTable};
///
/// let table = ZoneTable::new(vec![
///     Zone::new("north", Coord { x: 0.0, y: 1.0 }, 30.0),
///     Zone::new("south", Coord { x: 0.0, y: -1.0 }, 20.0),
/// ]);
/// let matched = table.classify(Coord { x: 0.0, y: 0.9 }, None);
/// assert_eq!(matched.zone().map(|z| z.id.as_str()), Some("north"));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ZoneTable {
    zones: Vec<Zone>,
}

impl ZoneTable {
    /// Build a table; iteration order is the order given here.
    #[must_use]
    pub const fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// The Bentonville service areas the engine ships with.
    #[must_use]
    pub fn bentonville() -> Self {
        Self::new(vec![
            Zone::new("downtown", Coord { x: -94.209, y: 36.373 }, 25.0),
            Zone::new("airport", Coord { x: -94.220, y: 36.385 }, 35.0),
            Zone::new("business", Coord { x: -94.200, y: 36.365 }, 30.0),
            Zone::new("residential", Coord { x: -94.195, y: 36.380 }, 35.0),
            Zone::new("retail", Coord { x: -94.208, y: 36.368 }, 20.0),
        ])
    }

    /// Zones in table order.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether the table holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Look up a zone by identifier.
    #[must_use]
    pub fn get(&self, id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|zone| &zone.id == id)
    }

    /// Classify `point` to the nearest zone centroid.
    ///
    /// When `threshold_miles` is given, a nearest zone further away than the
    /// threshold yields [`ZoneMatch::Unclassified`]. Equal distances keep the
    /// zone that appears first in the table.
    #[must_use]
    pub fn classify(&self, point: Coord<f64>, threshold_miles: Option<f64>) -> ZoneMatch<'_> {
        let mut best: Option<(&Zone, f64)> = None;
        for zone in &self.zones {
            let distance = haversine_miles(point, zone.centroid);
            let closer = best.is_none_or(|(_, best_distance)| distance < best_distance);
            if closer {
                best = Some((zone, distance));
            }
        }

        match best {
            Some((zone, distance_miles))
                if threshold_miles.is_none_or(|limit| distance_miles <= limit) =>
            {
                ZoneMatch::Zone {
                    zone,
                    distance_miles,
                }
            }
            _ => ZoneMatch::Unclassified,
        }
    }
}
