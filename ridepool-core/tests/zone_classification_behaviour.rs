//! Behavioural tests for zone classification and base speeds.

use std::cell::RefCell;
use std::sync::Arc;

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ridepool_core::{EngineConfig, ZoneSpeedEstimator};

#[derive(Debug, Default)]
struct ZoneWorld {
    config: RefCell<EngineConfig>,
    point: RefCell<Option<Coord<f64>>>,
}

impl ZoneWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn point(&self) -> Coord<f64> {
        self.point
            .borrow()
            .expect("a point should be classified before assertions")
    }
}

#[fixture]
fn world() -> ZoneWorld {
    ZoneWorld::default()
}

#[given("the default zone table")]
fn given_default_table(world: &ZoneWorld) {
    world.config.replace(EngineConfig::default());
}

#[given("the default zone table with a 5 mile match radius")]
fn given_table_with_radius(world: &ZoneWorld) {
    world.config.replace(EngineConfig {
        zone_match_radius_miles: Some(5.0),
        ..EngineConfig::default()
    });
}

#[when("I classify latitude {lat} and longitude {lng}")]
fn when_classify(world: &ZoneWorld, lat: f64, lng: f64) {
    world.point.replace(Some(Coord { x: lng, y: lat }));
}

#[then("the point is in zone {zone}")]
fn then_in_zone(world: &ZoneWorld, zone: String) {
    let config = world.config.borrow();
    let matched = config
        .zones
        .classify(world.point(), config.zone_match_radius_miles);
    assert_eq!(matched.zone().map(|z| z.id.as_str()), Some(zone.as_str()));
}

#[then("the point is unclassified")]
fn then_unclassified(world: &ZoneWorld) {
    let config = world.config.borrow();
    let matched = config
        .zones
        .classify(world.point(), config.zone_match_radius_miles);
    assert!(matched.zone().is_none());
}

#[then("the base speed is {speed} mph")]
fn then_speed(world: &ZoneWorld, speed: f64) {
    let estimator = ZoneSpeedEstimator::new(Arc::new(world.config.borrow().clone()));
    let point = world.point();
    assert!((estimator.speed_between(point, point) - speed).abs() < 1e-9);
}

#[scenario(path = "tests/features/zone_classification.feature", index = 0)]
fn classified_point(world: ZoneWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/zone_classification.feature", index = 1)]
fn unclassified_point(world: ZoneWorld) {
    let _ = world;
}
