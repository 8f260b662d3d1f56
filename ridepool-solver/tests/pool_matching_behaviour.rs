//! Behavioural tests for pool ride matching.

use std::cell::RefCell;

use chrono::TimeDelta;
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use ridepool_core::test_support::{AIRPORT, DOWNTOWN, instant, ride_request};
use ridepool_core::{PoolMatch, RideRequest};
use ridepool_solver::RouteOptimizationEngine;

#[derive(Default)]
struct PoolWorld {
    requests: RefCell<Vec<RideRequest>>,
    matches: RefCell<Vec<PoolMatch>>,
}

impl PoolWorld {
    fn add(&self, location: Coord<f64>, minutes_after_nine: i64) {
        let mut requests = self.requests.borrow_mut();
        let id = format!("r{}", requests.len());
        let at = instant(9, 0) + TimeDelta::minutes(minutes_after_nine);
        requests.push(ride_request(&id, location, at));
    }
}

#[fixture]
fn world() -> PoolWorld {
    PoolWorld::default()
}

#[given("a request downtown at 09:00")]
fn given_downtown(world: &PoolWorld) {
    world.add(DOWNTOWN, 0);
}

#[given("a request next door at 09:02")]
fn given_neighbour(world: &PoolWorld) {
    world.add(
        Coord {
            x: DOWNTOWN.x + 0.001,
            y: DOWNTOWN.y,
        },
        2,
    );
}

#[given("a request at the airport at 09:40")]
fn given_airport(world: &PoolWorld) {
    world.add(AIRPORT, 40);
}

#[given("a second request downtown {hours} hours later")]
fn given_same_place_later(world: &PoolWorld, hours: i64) {
    world.add(DOWNTOWN, hours * 60);
}

#[given("a batch of {count} neighbouring requests at 09:00")]
fn given_batch(world: &PoolWorld, count: u32) {
    for step in 0..count {
        world.add(
            Coord {
                x: DOWNTOWN.x,
                y: DOWNTOWN.y + 0.001 * f64::from(step),
            },
            0,
        );
    }
}

#[when("I look for up to {limit} pool matches")]
fn when_match(world: &PoolWorld, limit: usize) {
    let engine = RouteOptimizationEngine::default();
    let found = engine
        .find_pool_ride_matches(&world.requests.borrow(), limit)
        .into_value();
    world.matches.replace(found);
}

#[then("the match list is empty")]
fn then_none(world: &PoolWorld) {
    assert!(world.matches.borrow().is_empty());
}

#[then("{count} pool matches are returned")]
fn then_count(world: &PoolWorld, count: usize) {
    assert_eq!(world.matches.borrow().len(), count);
}

#[then("every match scores at least {threshold}")]
fn then_threshold(world: &PoolWorld, threshold: f64) {
    assert!(
        world
            .matches
            .borrow()
            .iter()
            .all(|m| m.compatibility_score >= threshold)
    );
}

#[then("the best match pools {count} passengers")]
fn then_best_size(world: &PoolWorld, count: usize) {
    let matches = world.matches.borrow();
    assert_eq!(matches.first().map(PoolMatch::size), Some(count));
}

#[then("the matches are sorted by compatibility")]
fn then_sorted(world: &PoolWorld) {
    let scores: Vec<f64> = world
        .matches
        .borrow()
        .iter()
        .map(|m| m.compatibility_score)
        .collect();
    assert!(scores.is_sorted_by(|a, b| a >= b));
}

#[scenario(path = "tests/features/pool_matching.feature", index = 0)]
fn single_request(world: PoolWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pool_matching.feature", index = 1)]
fn neighbours_pool(world: PoolWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pool_matching.feature", index = 2)]
fn ranked_and_limited(world: PoolWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pool_matching.feature", index = 3)]
fn distant_requests(world: PoolWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/pool_matching.feature", index = 4)]
fn hours_apart(world: PoolWorld) {
    let _ = world;
}
