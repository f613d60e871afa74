//! End-to-end behavior of the cleaning pass.

use tt_core::{ExclusionReason, GeoPoint, RawTripRecord};
use tt_features::{
    haversine_km, FeatureEngine, TripCleaner, ValidityConfig, Verdict, EARTH_RADIUS_KM,
};
use tt_runtime::MetricsRegistry;

fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

fn raw(
    id: &str,
    pickup: (f64, f64),
    dropoff: (f64, f64),
    duration_s: i64,
) -> RawTripRecord {
    RawTripRecord {
        id: Some(id.to_string()),
        vendor_id: Some("2".to_string()),
        pickup_datetime: Some("2016-01-19 11:35:24".to_string()),
        dropoff_datetime: Some("2016-01-19 12:10:48".to_string()),
        passenger_count: Some("1".to_string()),
        pickup_latitude: Some(pickup.0.to_string()),
        pickup_longitude: Some(pickup.1.to_string()),
        dropoff_latitude: Some(dropoff.0.to_string()),
        dropoff_longitude: Some(dropoff.1.to_string()),
        store_and_fwd_flag: Some("N".to_string()),
        trip_duration: Some(duration_s.to_string()),
    }
}

fn cleaner() -> TripCleaner {
    TripCleaner::new(
        FeatureEngine::new(ValidityConfig::default()).unwrap(),
        MetricsRegistry::default(),
    )
}

fn mixed_batch() -> Vec<RawTripRecord> {
    let mut missing = raw("id6", (40.75, -73.99), (40.76, -73.98), 500);
    missing.pickup_longitude = None;
    let mut bad_time = raw("id7", (40.75, -73.99), (40.76, -73.98), 500);
    bad_time.pickup_datetime = Some("19/01/2016 lunchtime".to_string());

    vec![
        raw("id1", (40.730, -73.935), (40.732, -73.900), 600),
        raw("id2", (40.730, -73.935), (40.732, -73.900), 0),
        raw("id3", (40.750, -73.990), (40.750, -73.990), 300),
        raw("id4", (40.641, -73.778), (40.758, -73.985), 60),
        raw("id5", (40.641, -73.778), (40.758, -73.985), -20),
        missing,
        bad_time,
        raw("id8", (40.641, -73.778), (40.758, -73.985), 2400),
    ]
}

#[test]
fn haversine_is_symmetric() {
    let points = [
        GeoPoint::new(40.730, -73.935),
        GeoPoint::new(40.641, -73.778),
        GeoPoint::new(-33.8688, 151.2093),
        GeoPoint::new(0.0, 0.0),
        GeoPoint::new(89.9, 179.9),
    ];
    for a in &points {
        assert_eq!(haversine_km(a, a, EARTH_RADIUS_KM), 0.0);
        for b in &points {
            let ab = haversine_km(a, b, EARTH_RADIUS_KM);
            let ba = haversine_km(b, a, EARTH_RADIUS_KM);
            assert!(approx_eq(ab, ba, 1e-9), "{ab} vs {ba}");
        }
    }
}

#[test]
fn city_trip_is_admitted() {
    let engine = FeatureEngine::new(ValidityConfig::default()).unwrap();
    let record = raw("id1", (40.730, -73.935), (40.732, -73.900), 600);
    let Verdict::Admitted(trip) = engine.derive_and_validate(&record) else {
        panic!("expected admission");
    };
    assert!(approx_eq(trip.trip_distance_km, 3.0, 0.05), "{}", trip.trip_distance_km);
    assert!(approx_eq(trip.speed_kmph, 18.0, 0.5), "{}", trip.speed_kmph);
}

#[test]
fn zero_duration_is_excluded_anywhere() {
    let engine = FeatureEngine::new(ValidityConfig::default()).unwrap();
    for (pickup, dropoff) in [
        ((40.730, -73.935), (40.732, -73.900)),
        ((40.641, -73.778), (40.758, -73.985)),
        ((40.750, -73.990), (40.750, -73.990)),
    ] {
        let verdict = engine.derive_and_validate(&raw("id", pickup, dropoff, 0));
        assert!(matches!(
            verdict,
            Verdict::Excluded(ref e) if e.reason == ExclusionReason::NonPositiveDuration { duration_s: 0 }
        ));
    }
}

#[test]
fn batch_partitions_into_admitted_and_excluded() {
    let batch = mixed_batch();
    let outcome = cleaner().clean(batch.clone());

    let admitted: Vec<_> = outcome.admitted.iter().filter_map(|t| t.id.as_deref()).collect();
    assert_eq!(admitted, vec!["id1", "id8"]);

    let excluded: Vec<_> = outcome
        .exclusions
        .iter()
        .filter_map(|e| e.raw.id.as_deref())
        .collect();
    assert_eq!(excluded, vec!["id2", "id3", "id4", "id5", "id6", "id7"]);
    assert_eq!(outcome.stats.admitted + outcome.stats.excluded, batch.len());

    let reasons: Vec<_> = outcome.exclusions.iter().map(|e| &e.reason).collect();
    assert!(matches!(reasons[1], ExclusionReason::NonPositiveDistance { .. }));
    assert!(matches!(reasons[2], ExclusionReason::ImplausibleSpeed { .. }));
    assert!(matches!(reasons[3], ExclusionReason::NonPositiveDuration { duration_s: -20 }));
    assert!(matches!(reasons[4], ExclusionReason::MissingInput { .. }));
    assert!(matches!(reasons[5], ExclusionReason::InvalidTimestamp { .. }));

    for trip in &outcome.admitted {
        assert!(trip.is_consistent());
        assert!(trip.trip_duration > 0 && trip.trip_distance_km > 0.0 && trip.speed_kmph <= 120.0);
    }
}

#[test]
fn cleaning_is_deterministic() {
    let first = cleaner().clean(mixed_batch());
    let second = cleaner().clean(mixed_batch());

    assert_eq!(first.admitted, second.admitted);
    assert_eq!(first.exclusions, second.exclusions);
    for (a, b) in first.admitted.iter().zip(&second.admitted) {
        assert_eq!(a.trip_distance_km.to_bits(), b.trip_distance_km.to_bits());
        assert_eq!(a.speed_kmph.to_bits(), b.speed_kmph.to_bits());
    }
}

#[test]
fn exclusions_serialize_for_audit() {
    let outcome = cleaner().clean(mixed_batch());
    let json = serde_json::to_value(outcome.exclusions.entries()).unwrap();
    assert_eq!(json[0]["reason"]["kind"], "non_positive_duration");
    assert_eq!(json[0]["raw"]["id"], "id2");
    assert_eq!(json[0]["features"]["pickup_hour"], 11);
}
