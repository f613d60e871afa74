//! Raw CSV in, cleaned CSV / exclusion log / storage rows out, all in memory.

use tt_core::{ExclusionReason, WeekdayEncoding};
use tt_features::{FeatureEngine, TripCleaner, ValidityConfig};
use tt_runtime::MetricsRegistry;
use tt_tools::cli::{FilterArgs, PeakWindow};
use tt_tools::csv_io::{
    read_cleaned, read_raw_trips, storage_rows, write_cleaned, write_exclusions, write_rows,
};
use tt_views::select_top_k;

const RAW: &str = "\
id,vendor_id,pickup_datetime,dropoff_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,store_and_fwd_flag,trip_duration
id2875421,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.982154846191406,40.767936706542969,-73.964630126953125,40.765602111816406,N,455
id2377394,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-73.980415344238281,40.738563537597656,-73.999481201171875,40.731151580810547,N,663
id2377394,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-73.980415344238281,40.738563537597656,-73.999481201171875,40.731151580810547,N,663
id3858529,2,2016-01-19 11:35:24,2016-01-19 12:10:48,1,-73.979026794433594,40.763938903808594,-74.005332946777344,40.710086822509766,N,2124
id0000001,1,2016-01-19 11:35:24,2016-01-19 11:35:24,1,-73.979026794433594,40.763938903808594,-74.005332946777344,40.710086822509766,N,0
id0000002,1,2016-01-19 11:35:24,2016-01-19 11:36:24,2,-73.778,40.641,-73.985,40.758,N,60
id0000003,1,,2016-01-19 11:36:24,2,-73.778,40.641,-73.985,40.758,N,60
id0000004,2,2016-02-30 08:00:00,2016-03-01 08:10:00,1,-73.98,40.76,-73.97,40.75,Y,600
id0000005,2,2016-04-02 09:00:00,2016-04-02 09:10:00
";

fn cleaner() -> TripCleaner {
    TripCleaner::new(
        FeatureEngine::new(ValidityConfig::default()).unwrap(),
        MetricsRegistry::default(),
    )
}

#[test]
fn raw_reader_tolerates_short_rows() {
    let batch = read_raw_trips(RAW.as_bytes()).unwrap();
    assert_eq!(batch.records.len(), 9);
    assert_eq!(batch.unreadable_rows, 0);
    let short = &batch.records[8];
    assert_eq!(short.id.as_deref(), Some("id0000005"));
    assert_eq!(short.pickup_longitude, None);
    assert_eq!(batch.records[6].pickup_datetime, None);
}

#[test]
fn cleaned_file_round_trips() {
    let batch = read_raw_trips(RAW.as_bytes()).unwrap();
    let outcome = cleaner().clean(batch.records);
    assert_eq!(outcome.stats.duplicates, 1);
    assert_eq!(outcome.admitted.len(), 3);
    assert_eq!(outcome.exclusions.len(), 5);

    let mut buf = Vec::new();
    write_cleaned(&mut buf, &outcome.admitted).unwrap();
    let text = String::from_utf8(buf.clone()).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.ends_with("trip_distance_km,speed_kmph,pickup_hour,pickup_dayofweek"));
    assert!(text.contains("2016-03-14 17:24:55"));
    assert!(text.contains(",Monday"));

    let back = read_cleaned(buf.as_slice()).unwrap();
    assert_eq!(back, outcome.admitted);

    let ranked = select_top_k(&back, 2, "trip_distance_km").unwrap();
    assert_eq!(ranked[0].trip.id.as_deref(), Some("id3858529"));
}

#[test]
fn cleaned_file_keeps_fractional_seconds() {
    let raw = "\
id,vendor_id,pickup_datetime,dropoff_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,store_and_fwd_flag,trip_duration
id2875421,2,2016-03-14 17:24:55.500,2016-03-14 17:32:30.25,1.0,-73.982154846191406,40.767936706542969,-73.964630126953125,40.765602111816406,N,455
";
    let batch = read_raw_trips(raw.as_bytes()).unwrap();
    let outcome = cleaner().clean(batch.records);
    assert_eq!(outcome.admitted.len(), 1);
    assert_eq!(outcome.admitted[0].passenger_count, Some(1));

    let mut buf = Vec::new();
    write_cleaned(&mut buf, &outcome.admitted).unwrap();
    let text = String::from_utf8(buf.clone()).unwrap();
    assert!(text.contains("2016-03-14 17:24:55.500"));

    let back = read_cleaned(buf.as_slice()).unwrap();
    assert_eq!(back, outcome.admitted);
}

#[test]
fn invalid_utf8_row_is_logged_not_dropped() {
    let mut raw = RAW.lines().next().unwrap().as_bytes().to_vec();
    raw.extend_from_slice(
        b"\nid0000009,1,2016-01-19 11:35:24,2016-01-19 11:45:24,1,-73.9\xff,40.76,-73.97,40.75,N,600\n",
    );
    let batch = read_raw_trips(raw.as_slice()).unwrap();
    assert_eq!(batch.unreadable_rows, 0);
    assert_eq!(batch.records.len(), 1);

    let outcome = cleaner().clean(batch.records);
    assert!(outcome.admitted.is_empty());
    assert_eq!(outcome.exclusions.len(), 1);
    let excluded = &outcome.exclusions.entries()[0];
    assert_eq!(excluded.raw.id.as_deref(), Some("id0000009"));
    assert_eq!(
        excluded.reason,
        ExclusionReason::InvalidInput {
            field: "pickup_longitude".into(),
            value: "-73.9\u{FFFD}".into(),
        }
    );
}

#[test]
fn exclusion_log_has_reasons_and_partial_features() {
    let batch = read_raw_trips(RAW.as_bytes()).unwrap();
    let outcome = cleaner().clean(batch.records);

    let mut buf = Vec::new();
    write_exclusions(&mut buf, &outcome.exclusions).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].ends_with("pickup_dayofweek,exclusion_reason"));
    assert!(lines[1].starts_with("id0000001,"));
    assert!(lines[1].contains("Tuesday"));
    assert!(lines[1].ends_with("trip duration 0s is not positive"));
    assert!(lines[2].contains("exceeds 120 km/h"));
    assert!(lines[3].contains("missing/invalid input: pickup_datetime is missing"));
    assert!(lines[4].contains("invalid timestamp: pickup_datetime"));
}

#[test]
fn storage_rows_follow_table_schema() {
    let batch = read_raw_trips(RAW.as_bytes()).unwrap();
    let outcome = cleaner().clean(batch.records);
    let rows = storage_rows(&outcome.admitted, WeekdayEncoding::SundayZero);

    assert_eq!(rows.skipped, 0);
    assert_eq!(rows.vendors, vec![1, 2]);
    let first = &rows.trips[0];
    assert_eq!(first.trip_id, 2875421);
    assert_eq!(first.pickup_dayofweek, 1);
    assert_eq!(rows.locations[0].trip_id, 2875421);

    let mut buf = Vec::new();
    write_rows(&mut buf, &rows.trips).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("trip_id,vendor_id,pickup_datetime"));

    let iso = storage_rows(&outcome.admitted, WeekdayEncoding::MondayZero);
    assert_eq!(iso.trips[0].pickup_dayofweek, 0);
}

#[test]
fn filter_args_map_to_trip_filter() {
    let args = FilterArgs {
        vendor_id: Some("2".into()),
        min_distance: Some(1.0),
        peak: Some(PeakWindow::Evening),
        ..FilterArgs::default()
    };
    let filter = args.to_filter();
    assert_eq!(filter.pickup_hours, Some((17, 19)));
    assert_eq!(filter.min_distance_km, Some(1.0));

    let batch = read_raw_trips(RAW.as_bytes()).unwrap();
    let outcome = cleaner().clean(batch.records);
    let matched: Vec<_> = filter
        .apply(&outcome.admitted)
        .iter()
        .filter_map(|t| t.id.as_deref())
        .collect();
    assert_eq!(matched, vec!["id2875421"]);
}
