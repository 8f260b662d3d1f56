//! Immutable engine configuration.
//!
//! One [`EngineConfig`] value is injected into every component at
//! construction. Nothing in the engine reads ambient state; replacing the zone
//! table means building a new configuration and a new engine.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use thiserror::Error;

use crate::spatial::is_finite_coord;
use crate::zone::{ZoneId, ZoneTable};

/// Errors raised while loading or validating an [`EngineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[cfg(feature = "serde")]
    #[error("failed to read engine configuration at {path}")]
    Read {
        /// Requested configuration path.
        path: camino::Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The configuration payload was not valid JSON for this schema.
    #[cfg(feature = "serde")]
    #[error("failed to parse engine configuration")]
    Parse {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// A zone declared a non-positive or non-finite average speed.
    #[error("zone {zone} has invalid average speed {speed_mph} mph")]
    InvalidZoneSpeed {
        /// Offending zone.
        zone: ZoneId,
        /// Declared speed.
        speed_mph: f64,
    },
    /// A zone centroid was outside WGS84 bounds or not finite.
    #[error("zone {zone} has an invalid centroid")]
    InvalidCentroid {
        /// Offending zone.
        zone: ZoneId,
    },
    /// Two zones shared an identifier.
    #[error("zone {zone} is declared more than once")]
    DuplicateZone {
        /// Repeated identifier.
        zone: ZoneId,
    },
    /// The fallback speed for unclassified points was unusable.
    #[error("default speed {speed_mph} mph must be positive and finite")]
    InvalidDefaultSpeed {
        /// Declared speed.
        speed_mph: f64,
    },
    /// The pool compatibility threshold was outside `0.0..=1.0`.
    #[error("pool compatibility threshold {value} must lie in 0.0..=1.0")]
    ThresholdOutOfRange {
        /// Declared threshold.
        value: f64,
    },
    /// Efficiency weights were negative, non-finite, or both zero.
    #[error("efficiency weights must be non-negative and not both zero")]
    InvalidEfficiencyWeights,
    /// Pools need room for at least two passengers.
    #[error("max pool passengers {value} must be at least 2")]
    PoolTooSmall {
        /// Declared maximum.
        value: usize,
    },
    /// A search tier was configured beyond what it can enumerate per call.
    #[error("{field} of {value} exceeds the maximum of {max}")]
    SearchLimitTooLarge {
        /// Name of the offending field.
        field: &'static str,
        /// Declared limit.
        value: usize,
        /// Largest accepted limit.
        max: usize,
    },
    /// A tolerance, service time or spread limit was negative or not finite.
    #[error("{field} must be a finite, non-negative number")]
    InvalidQuantity {
        /// Name of the offending field.
        field: &'static str,
    },
}

/// Largest accepted `exhaustive_search_limit`; 8! orderings per call.
pub const MAX_EXHAUSTIVE_SEARCH_LIMIT: usize = 8;
/// Largest accepted `exact_multi_stop_limit`.
pub const MAX_EXACT_MULTI_STOP_LIMIT: usize = 10;

/// Fare components used for earnings estimates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FareSchedule {
    /// Flat fare charged per passenger.
    pub base_fare: f64,
    /// Charge per route mile.
    pub per_mile: f64,
    /// Time-based component, expressed per route mile.
    pub time_component_per_mile: f64,
}

impl Default for FareSchedule {
    fn default() -> Self {
        Self {
            base_fare: 8.0,
            per_mile: 1.2,
            time_component_per_mile: 0.5,
        }
    }
}

/// Blend weights for the route efficiency score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EfficiencyWeights {
    /// Weight of the distance-efficiency term.
    pub distance: f64,
    /// Weight of the time-efficiency term.
    pub time: f64,
}

impl Default for EfficiencyWeights {
    fn default() -> Self {
        Self {
            distance: 0.6,
            time: 0.4,
        }
    }
}

/// Engine-wide constants and reference data.
///
/// # Examples
/// ```
/// use ridepool_core::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.zones.len(), 5);
/// assert_eq!(config.max_pool_passengers, 4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Ordered service zones.
    pub zones: ZoneTable,
    /// Maximum distance to a centroid for a point to be classified; `None`
    /// always picks the nearest zone.
    pub zone_match_radius_miles: Option<f64>,
    /// Speed assumed for points outside every zone.
    pub default_speed_mph: f64,
    /// Half-width of a pickup window.
    pub pickup_tolerance_minutes: f64,
    /// Slack added after the direct-trip arrival for dropoff windows.
    pub dropoff_tolerance_minutes: f64,
    /// Dwell time at a pickup.
    pub pickup_service_minutes: f64,
    /// Dwell time at a dropoff.
    pub dropoff_service_minutes: f64,
    /// Largest pickup set sequenced by trying every ordering.
    pub exhaustive_search_limit: usize,
    /// Largest multi-stop set sequenced by exact search.
    pub exact_multi_stop_limit: usize,
    /// Largest pool group considered.
    pub max_pool_passengers: usize,
    /// Minimum compatibility for a pool match to be reported.
    pub min_pool_compatibility: f64,
    /// Pickup spread at which pickup proximity scores zero.
    pub max_pickup_spread_miles: f64,
    /// Fare components.
    pub fares: FareSchedule,
    /// Efficiency blend.
    pub efficiency: EfficiencyWeights,
    /// Upper bound on a single weather or traffic lookup, in milliseconds.
    pub signal_timeout_ms: u64,
    /// Offset of the service area's local time from UTC, in minutes.
    pub utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zones: ZoneTable::bentonville(),
            zone_match_radius_miles: None,
            default_speed_mph: 30.0,
            pickup_tolerance_minutes: 5.0,
            dropoff_tolerance_minutes: 10.0,
            pickup_service_minutes: 2.0,
            dropoff_service_minutes: 1.0,
            exhaustive_search_limit: 3,
            exact_multi_stop_limit: 8,
            max_pool_passengers: 4,
            min_pool_compatibility: 0.6,
            max_pickup_spread_miles: 2.0,
            fares: FareSchedule::default(),
            efficiency: EfficiencyWeights::default(),
            signal_timeout_ms: 2_000,
            utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Replace the zone table.
    #[must_use]
    pub fn with_zones(mut self, zones: ZoneTable) -> Self {
        self.zones = zones;
        self
    }

    /// Timeout applied to each environmental signal lookup.
    #[must_use]
    pub const fn signal_timeout(&self) -> Duration {
        Duration::from_millis(self.signal_timeout_ms)
    }

    /// Hour of day (0-23) in service-local time.
    #[must_use]
    pub fn local_hour(&self, at: DateTime<Utc>) -> u32 {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .map_or_else(|| at.hour(), |offset| at.with_timezone(&offset).hour())
    }

    /// Check invariants the components rely on.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for zone in self.zones.iter() {
            if !seen.insert(&zone.id) {
                return Err(ConfigError::DuplicateZone {
                    zone: zone.id.clone(),
                });
            }
            if !is_finite_coord(zone.centroid) {
                return Err(ConfigError::InvalidCentroid {
                    zone: zone.id.clone(),
                });
            }
            if !(zone.average_speed_mph.is_finite() && zone.average_speed_mph > 0.0) {
                return Err(ConfigError::InvalidZoneSpeed {
                    zone: zone.id.clone(),
                    speed_mph: zone.average_speed_mph,
                });
            }
        }
        if !(self.default_speed_mph.is_finite() && self.default_speed_mph > 0.0) {
            return Err(ConfigError::InvalidDefaultSpeed {
                speed_mph: self.default_speed_mph,
            });
        }
        if !(0.0..=1.0).contains(&self.min_pool_compatibility) {
            return Err(ConfigError::ThresholdOutOfRange {
                value: self.min_pool_compatibility,
            });
        }
        if self.max_pool_passengers < 2 {
            return Err(ConfigError::PoolTooSmall {
                value: self.max_pool_passengers,
            });
        }
        let limits = [
            (
                "exhaustive_search_limit",
                self.exhaustive_search_limit,
                MAX_EXHAUSTIVE_SEARCH_LIMIT,
            ),
            (
                "exact_multi_stop_limit",
                self.exact_multi_stop_limit,
                MAX_EXACT_MULTI_STOP_LIMIT,
            ),
        ];
        if let Some((field, value, max)) = limits.into_iter().find(|(_, value, max)| value > max) {
            return Err(ConfigError::SearchLimitTooLarge { field, value, max });
        }
        let weights = &self.efficiency;
        let weights_ok = [weights.distance, weights.time]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
            && weights.distance + weights.time > 0.0;
        if !weights_ok {
            return Err(ConfigError::InvalidEfficiencyWeights);
        }
        let quantities = [
            ("pickup_tolerance_minutes", self.pickup_tolerance_minutes),
            ("dropoff_tolerance_minutes", self.dropoff_tolerance_minutes),
            ("pickup_service_minutes", self.pickup_service_minutes),
            ("dropoff_service_minutes", self.dropoff_service_minutes),
            ("max_pickup_spread_miles", self.max_pickup_spread_miles),
            ("fares.base_fare", self.fares.base_fare),
            ("fares.per_mile", self.fares.per_mile),
            ("fares.time_component_per_mile", self.fares.time_component_per_mile),
        ];
        if let Some((field, _)) = quantities
            .into_iter()
            .find(|(_, value)| !(value.is_finite() && *value >= 0.0))
        {
            return Err(ConfigError::InvalidQuantity { field });
        }
        if let Some(radius) = self.zone_match_radius_miles
            && !(radius.is_finite() && radius >= 0.0)
        {
            return Err(ConfigError::InvalidQuantity {
                field: "zone_match_radius_miles",
            });
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl EngineConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and any validation
    /// error from [`EngineConfig::validate`].
    ///
    /// # Examples
    /// ```
    /// use ridepool_core::EngineConfig;
    ///
    /// let config = EngineConfig::from_json_str(r#"{ "max_pool_passengers": 3 }"#)?;
    /// assert_eq!(config.max_pool_passengers, 3);
    /// assert_eq!(config.zones.len(), 5);
    /// # Ok::<(), ridepool_core::ConfigError>(())
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Read`] when the file cannot be opened or read,
    /// then anything [`EngineConfig::from_json_str`] can return.
    pub fn load(path: &camino::Utf8Path) -> Result<Self, ConfigError> {
        let read_error = |source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        };
        let file = cap_std::fs_utf8::File::open_ambient(path, cap_std::ambient_authority())
            .map_err(read_error)?;
        let json = std::io::read_to_string(file).map_err(read_error)?;
        log::debug!("loaded engine configuration from {path}");
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zone::Zone;
    use chrono::TimeZone;
    use geo::Coord;
    use rstest::rstest;

    #[rstest]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[rstest]
    fn rejects_duplicate_zone_ids() {
        let zones = ZoneTable::new(vec![
            Zone::new("a", Coord { x: 0.0, y: 0.0 }, 30.0),
            Zone::new("a", Coord { x: 1.0, y: 0.0 }, 30.0),
        ]);
        let err = EngineConfig::default()
            .with_zones(zones)
            .validate()
            .expect_err("duplicate zone");
        assert!(matches!(err, ConfigError::DuplicateZone { .. }));
    }

    #[rstest]
    #[case(0.0)]
    #[case(-5.0)]
    #[case(f64::NAN)]
    fn rejects_unusable_zone_speed(#[case] speed: f64) {
        let zones = ZoneTable::new(vec![Zone::new("a", Coord { x: 0.0, y: 0.0 }, speed)]);
        let err = EngineConfig::default()
            .with_zones(zones)
            .validate()
            .expect_err("bad speed");
        assert!(matches!(err, ConfigError::InvalidZoneSpeed { .. }));
    }

    #[rstest]
    fn rejects_threshold_outside_unit_interval() {
        let config = EngineConfig {
            min_pool_compatibility: 1.5,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange { .. })
        ));
    }

    #[rstest]
    fn rejects_zero_efficiency_weights() {
        let config = EngineConfig {
            efficiency: EfficiencyWeights {
                distance: 0.0,
                time: 0.0,
            },
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEfficiencyWeights)
        ));
    }

    #[rstest]
    #[case(12, 8, "exhaustive_search_limit")]
    #[case(3, 11, "exact_multi_stop_limit")]
    fn rejects_unbounded_search_limits(
        #[case] exhaustive: usize,
        #[case] exact: usize,
        #[case] expected: &str,
    ) {
        let config = EngineConfig {
            exhaustive_search_limit: exhaustive,
            exact_multi_stop_limit: exact,
            ..EngineConfig::default()
        };
        let err = config.validate().expect_err("limit too large");
        assert!(matches!(
            err,
            ConfigError::SearchLimitTooLarge { field, .. } if field == expected
        ));
    }

    #[rstest]
    fn accepts_search_limits_at_the_cap() {
        let config = EngineConfig {
            exhaustive_search_limit: MAX_EXHAUSTIVE_SEARCH_LIMIT,
            exact_multi_stop_limit: MAX_EXACT_MULTI_STOP_LIMIT,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    #[case(0, 8)]
    #[case(-360, 2)]
    #[case(120, 10)]
    fn local_hour_applies_offset(#[case] offset_minutes: i32, #[case] expected: u32) {
        let at = Utc
            .with_ymd_and_hms(2025, 9, 1, 8, 15, 0)
            .single()
            .expect("valid instant");
        let config = EngineConfig {
            utc_offset_minutes: offset_minutes,
            ..EngineConfig::default()
        };
        assert_eq!(config.local_hour(at), expected);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn json_overrides_keep_other_defaults() {
        let json = r#"{
            "zones": [
                { "id": "centre", "centroid": { "x": -0.1, "y": 51.5 }, "average_speed_mph": 12.0 }
            ],
            "signal_timeout_ms": 250
        }"#;
        let config = EngineConfig::from_json_str(json).expect("valid configuration");
        assert_eq!(config.zones.len(), 1);
        assert_eq!(config.signal_timeout(), Duration::from_millis(250));
        assert_eq!(config.default_speed_mph, 30.0);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn json_validation_errors_surface() {
        let err = EngineConfig::from_json_str(r#"{ "max_pool_passengers": 1 }"#)
            .expect_err("pool too small");
        assert!(matches!(err, ConfigError::PoolTooSmall { value: 1 }));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "utc_offset_minutes": -300 }"#).expect("write config");
        let utf8 = camino::Utf8PathBuf::from_path_buf(path).expect("utf-8 path");
        let config = EngineConfig::load(&utf8).expect("load config");
        assert_eq!(config.utc_offset_minutes, -300);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn missing_file_is_a_read_error() {
        let err = EngineConfig::load(camino::Utf8Path::new("/nonexistent/engine.json"))
            .expect_err("missing file");
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
