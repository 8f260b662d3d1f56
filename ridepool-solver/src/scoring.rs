//! Route scoring: efficiency, earnings and confidence.

use ridepool_core::{EfficiencyWeights, FareSchedule, Waypoint, WaypointKind, path_miles};

/// Windows narrower than this many minutes lower route confidence.
pub const NARROW_WINDOW_MINUTES: f64 = 10.0;

/// Round dollars to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Efficiency of a sequenced route in `[0, 1]`.
///
/// `sequence` is the full route including the driver's start. The ideal
/// distance is 80% of the legs that do not leave the start; the ideal time
/// assumes two minutes per ideal mile. Each ratio is clipped to `[0, 1]`
/// before blending with `weights`.
#[must_use]
pub fn efficiency_score(
    sequence: &[Waypoint],
    total_distance_miles: f64,
    total_time_minutes: f64,
    weights: &EfficiencyWeights,
) -> f64 {
    if !sequence.iter().any(|w| w.kind.is_stop()) {
        return 1.0;
    }
    if !(total_distance_miles > 0.0 && total_time_minutes > 0.0) {
        return 0.0;
    }
    let ideal_distance = 0.8
        * sequence
            .iter()
            .zip(sequence.iter().skip(1))
            .filter(|(from, _)| from.kind != WaypointKind::Start)
            .map(|(from, to)| path_miles([from.location, to.location]))
            .sum::<f64>();
    let ideal_time = ideal_distance * 2.0;
    let distance_efficiency = (ideal_distance / total_distance_miles).clamp(0.0, 1.0);
    let time_efficiency = (ideal_time / total_time_minutes).clamp(0.0, 1.0);
    let blended = weights.distance * distance_efficiency + weights.time * time_efficiency;
    let total_weight = weights.distance + weights.time;
    if total_weight > 0.0 {
        (blended / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Estimated driver earnings, rounded to cents.
///
/// Each pickup pays the base fare plus the distance and time components for
/// the whole route distance.
#[must_use]
pub fn estimated_earnings(pickups: usize, total_distance_miles: f64, fares: &FareSchedule) -> f64 {
    if pickups == 0 {
        return 0.0;
    }
    let per_passenger = fares.base_fare
        + fares.per_mile * total_distance_miles
        + fares.time_component_per_mile * total_distance_miles;
    #[expect(clippy::cast_precision_loss, reason = "pickup counts are tiny")]
    let passengers = pickups as f64;
    round_cents(passengers * per_passenger)
}

/// Confidence for a route serving `stops`, clipped to `[0.3, 0.95]`.
///
/// Starts at 0.8, loses 0.1 for every stop beyond the first and 0.05 for
/// every pickup or dropoff window narrower than ten minutes.
#[must_use]
pub fn route_confidence(stops: &[Waypoint]) -> f64 {
    let count = stops.iter().filter(|w| w.kind.is_stop()).count();
    let narrow_count = stops
        .iter()
        .filter(|w| w.kind.is_stop() && w.window.length_minutes() < NARROW_WINDOW_MINUTES)
        .count();
    #[expect(clippy::cast_precision_loss, reason = "stop counts are tiny")]
    let (extra, narrow) = (count.saturating_sub(1) as f64, narrow_count as f64);
    (0.8 - 0.1 * extra - 0.05 * narrow).clamp(0.3, 0.95)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use geo::Coord;
    use ridepool_core::test_support::{instant, pickup};
    use ridepool_core::TimeWindow;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10.0, 0.0)]
    #[case(1, 0.0, 8.0)]
    #[case(2, 2.5, 2.0 * (8.0 + 3.0 + 1.25))]
    #[case(1, 1.234, 10.1)]
    fn earnings_follow_fare_schedule(
        #[case] pickups: usize,
        #[case] miles: f64,
        #[case] expected: f64,
    ) {
        let earnings = estimated_earnings(pickups, miles, &FareSchedule::default());
        assert!((earnings - expected).abs() < 1e-9, "{earnings} != {expected}");
    }

    #[rstest]
    fn confidence_drops_with_stops_and_narrow_windows() {
        let at = instant(9, 0);
        let wide = pickup("a", Coord { x: 0.0, y: 0.0 }, at);
        let mut narrow = pickup("b", Coord { x: 0.0, y: 0.01 }, at);
        narrow.window = TimeWindow::around(at, TimeDelta::minutes(2));
        assert!((route_confidence(&[wide.clone()]) - 0.8).abs() < 1e-12);
        assert!((route_confidence(&[wide.clone(), narrow]) - 0.65).abs() < 1e-12);
        let many: Vec<_> = (0..8).map(|_| wide.clone()).collect();
        assert!((route_confidence(&many) - 0.3).abs() < 1e-12);
    }

    #[rstest]
    fn efficiency_is_one_without_stops() {
        let start = Waypoint::driver_start(Coord { x: 0.0, y: 0.0 }, instant(9, 0));
        assert_eq!(
            efficiency_score(&[start], 0.0, 0.0, &EfficiencyWeights::default()),
            1.0
        );
    }

    #[rstest]
    fn efficiency_is_zero_for_zero_distance() {
        let at = instant(9, 0);
        let start = Waypoint::driver_start(Coord { x: 0.0, y: 0.0 }, at);
        let stop = pickup("a", Coord { x: 0.0, y: 0.0 }, at);
        assert_eq!(
            efficiency_score(&[start, stop], 0.0, 3.0, &EfficiencyWeights::default()),
            0.0
        );
    }

    #[rstest]
    fn efficiency_stays_in_unit_interval() {
        let at = instant(9, 0);
        let start = Waypoint::driver_start(Coord { x: 0.0, y: 0.0 }, at);
        let a = pickup("a", Coord { x: 0.0, y: 0.01 }, at);
        let b = pickup("b", Coord { x: 0.0, y: 0.02 }, at);
        let sequence = [start, a, b];
        let distance = path_miles(sequence.iter().map(|w| w.location));
        let score = efficiency_score(&sequence, distance, 0.1, &EfficiencyWeights::default());
        assert!((0.0..=1.0).contains(&score));
        // Half the driven distance is ideal: 0.8 * 0.5 on distance, time capped at 1.
        assert!((score - (0.6 * 0.4 + 0.4 * 1.0)).abs() < 1e-9);
    }
}
