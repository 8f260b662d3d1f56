//! Behavioural tests for `EnvironmentalImpactEstimator`.

use std::cell::RefCell;
use std::sync::Arc;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ridepool_core::test_support::{AIRPORT, DOWNTOWN, FailingSignals, FixedTraffic, FixedWeather};
use ridepool_core::{
    EngineConfig, EnvironmentalImpactEstimator, NoSignals, Reading, RouteImpact, SignalError,
    SignalKind, TrafficProvider, TrafficReport, WeatherCondition, WeatherProvider, WeatherReport,
    ZoneId,
};

/// Feed selected by a scenario.
#[derive(Debug, Clone, Default)]
enum Feed {
    #[default]
    Silent,
    Traffic(FixedTraffic),
    Weather(FixedWeather),
    Failing,
}

impl WeatherProvider for Feed {
    fn weather_at(&self, location: geo::Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        match self {
            Self::Weather(provider) => provider.weather_at(location),
            Self::Failing => FailingSignals.weather_at(location),
            Self::Silent | Self::Traffic(_) => NoSignals.weather_at(location),
        }
    }
}

impl TrafficProvider for Feed {
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        match self {
            Self::Traffic(provider) => provider.traffic_in(zone),
            Self::Silent | Self::Weather(_) | Self::Failing => NoSignals.traffic_in(zone),
        }
    }
}

#[derive(Debug, Default)]
struct ImpactWorld {
    feed: RefCell<Feed>,
    delay: RefCell<Option<Reading>>,
    impact: RefCell<Option<RouteImpact>>,
}

impl ImpactWorld {
    fn estimator(&self) -> EnvironmentalImpactEstimator<Feed, Feed> {
        let feed = self.feed.borrow().clone();
        EnvironmentalImpactEstimator::new(feed.clone(), feed, Arc::new(EngineConfig::default()))
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn impact(&self) -> RouteImpact {
        self.impact
            .borrow()
            .clone()
            .expect("impact should be estimated before assertions")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn delay(&self) -> Reading {
        self.delay
            .borrow()
            .clone()
            .expect("delay should be estimated before assertions")
    }
}

#[fixture]
fn world() -> ImpactWorld {
    ImpactWorld::default()
}

#[given("traffic of {minutes} minutes in every zone")]
fn given_traffic(world: &ImpactWorld, minutes: f64) {
    world.feed.replace(Feed::Traffic(FixedTraffic::new(minutes)));
}

#[given("rain everywhere")]
fn given_rain(world: &ImpactWorld) {
    world
        .feed
        .replace(Feed::Weather(FixedWeather::new(WeatherCondition::Rain)));
}

#[given("a failing weather feed")]
fn given_failing_weather(world: &ImpactWorld) {
    world.feed.replace(Feed::Failing);
}

#[when("I estimate the downtown traffic delay at hour {hour}")]
fn when_traffic_delay(world: &ImpactWorld, hour: u32) {
    let reading = world.estimator().traffic_delay_minutes(DOWNTOWN, hour);
    world.delay.replace(Some(reading));
}

#[when("I estimate the impact of a route through downtown and the airport")]
fn when_route_impact(world: &ImpactWorld) {
    let impact = world.estimator().route_impact(&[DOWNTOWN, AIRPORT]);
    world.impact.replace(Some(impact));
}

#[then("the delay is {minutes} minutes")]
fn then_delay(world: &ImpactWorld, minutes: f64) {
    assert!((world.delay().value - minutes).abs() < 1e-9);
}

#[then("no signal failure is reported")]
fn then_no_failure(world: &ImpactWorld) {
    assert!(world.delay().unavailable.is_none());
}

#[then("the weather multiplier is {value}")]
fn then_weather_multiplier(world: &ImpactWorld, value: f64) {
    assert!((world.impact().weather - value).abs() < 1e-9);
}

#[then("the traffic multiplier is {value}")]
fn then_traffic_multiplier(world: &ImpactWorld, value: f64) {
    assert!((world.impact().traffic - value).abs() < 1e-9);
}

#[then("the weather signal is reported unavailable")]
fn then_weather_unavailable(world: &ImpactWorld) {
    let impact = world.impact();
    assert_eq!(
        impact.unavailable.as_ref().map(SignalError::signal),
        Some(SignalKind::Weather)
    );
}

#[scenario(path = "tests/features/environmental_impact.feature", index = 0)]
fn rush_hour_traffic(world: ImpactWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/environmental_impact.feature", index = 1)]
fn night_traffic(world: ImpactWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/environmental_impact.feature", index = 2)]
fn rainy_route(world: ImpactWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/environmental_impact.feature", index = 3)]
fn failing_weather(world: ImpactWorld) {
    let _ = world;
}
