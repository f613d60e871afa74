//! CSV layouts for raw input, cleaned output, the exclusion log and storage rows.

use std::io::{Read, Write};

use anyhow::{anyhow, Context, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tt_core::storage::distinct_vendors;
use tt_core::{
    DayOfWeek, DerivedTripRecord, ExcludedRecord, GeoPoint, LocationRow, RawTripRecord, TripRow,
    WeekdayEncoding,
};
use tt_features::timestamp::parse_timestamp;

/// Raw rows plus the number of rows the CSV layer could not split at all.
#[derive(Debug, Default)]
pub struct RawBatch {
    pub records: Vec<RawTripRecord>,
    pub unreadable_rows: usize,
}

/// Read raw trips by header name. Short rows leave the missing columns empty.
/// Bytes that are not valid UTF-8 become U+FFFD, so such a row still reaches
/// the engine and is logged if it fails. Rows the CSV layer cannot split are
/// skipped and counted.
pub fn read_raw_trips<R: Read>(reader: R) -> Result<RawBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("reading CSV header")?.clone();

    let mut batch = RawBatch::default();
    for (line, row) in rdr.byte_records().enumerate() {
        let parsed = row.map_err(anyhow::Error::from).and_then(|bytes| {
            let mut fields: StringRecord = bytes.iter().map(String::from_utf8_lossy).collect();
            fields.trim();
            Ok(fields.deserialize::<RawTripRecord>(Some(&headers))?)
        });
        match parsed {
            Ok(record) => batch.records.push(record),
            Err(err) => {
                warn!(line = line + 2, error = %err, "skipping unreadable row");
                batch.unreadable_rows += 1;
            }
        }
    }
    Ok(batch)
}

/// Timestamp layout of the cleaned file; keeps sub-second precision.
const CLEANED_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// One line of the cleaned trips file: input columns then derived columns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanedRow {
    pub id: Option<String>,
    pub vendor_id: Option<String>,
    pub pickup_datetime: String,
    pub dropoff_datetime: String,
    pub passenger_count: Option<u32>,
    pub pickup_longitude: f64,
    pub pickup_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_latitude: f64,
    pub store_and_fwd_flag: Option<String>,
    pub trip_duration: i64,
    pub trip_distance_km: f64,
    pub speed_kmph: f64,
    pub pickup_hour: u8,
    pub pickup_dayofweek: String,
}

impl From<&DerivedTripRecord> for CleanedRow {
    fn from(trip: &DerivedTripRecord) -> Self {
        Self {
            id: trip.id.clone(),
            vendor_id: trip.vendor_id.clone(),
            pickup_datetime: trip.pickup_datetime.format(CLEANED_DATETIME_FORMAT).to_string(),
            dropoff_datetime: trip.dropoff_datetime.format(CLEANED_DATETIME_FORMAT).to_string(),
            passenger_count: trip.passenger_count,
            pickup_longitude: trip.pickup.longitude,
            pickup_latitude: trip.pickup.latitude,
            dropoff_longitude: trip.dropoff.longitude,
            dropoff_latitude: trip.dropoff.latitude,
            store_and_fwd_flag: trip.store_and_fwd_flag.clone(),
            trip_duration: trip.trip_duration,
            trip_distance_km: trip.trip_distance_km,
            speed_kmph: trip.speed_kmph,
            pickup_hour: trip.pickup_hour,
            pickup_dayofweek: trip.pickup_dayofweek.name().to_string(),
        }
    }
}

impl TryFrom<CleanedRow> for DerivedTripRecord {
    type Error = anyhow::Error;

    fn try_from(row: CleanedRow) -> Result<Self> {
        let pickup_datetime = parse_timestamp(&row.pickup_datetime)
            .ok_or_else(|| anyhow!("bad pickup_datetime '{}'", row.pickup_datetime))?;
        let dropoff_datetime = parse_timestamp(&row.dropoff_datetime)
            .ok_or_else(|| anyhow!("bad dropoff_datetime '{}'", row.dropoff_datetime))?;
        Ok(Self {
            id: row.id,
            vendor_id: row.vendor_id,
            pickup_datetime,
            dropoff_datetime,
            passenger_count: row.passenger_count,
            pickup: GeoPoint::new(row.pickup_latitude, row.pickup_longitude),
            dropoff: GeoPoint::new(row.dropoff_latitude, row.dropoff_longitude),
            store_and_fwd_flag: row.store_and_fwd_flag,
            trip_duration: row.trip_duration,
            trip_distance_km: row.trip_distance_km,
            speed_kmph: row.speed_kmph,
            pickup_hour: row.pickup_hour,
            pickup_dayofweek: row.pickup_dayofweek.parse::<DayOfWeek>()?,
        })
    }
}

pub fn write_cleaned<W: Write>(writer: W, trips: &[DerivedTripRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for trip in trips {
        wtr.serialize(CleanedRow::from(trip))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a cleaned trips file back. Any malformed row fails the whole read:
/// this file is our own output, so damage means the wrong file was given.
pub fn read_cleaned<R: Read>(reader: R) -> Result<Vec<DerivedTripRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut trips = Vec::new();
    for (line, row) in rdr.deserialize::<CleanedRow>().enumerate() {
        let row = row.with_context(|| format!("cleaned row at line {}", line + 2))?;
        trips.push(
            DerivedTripRecord::try_from(row)
                .with_context(|| format!("cleaned row at line {}", line + 2))?,
        );
    }
    Ok(trips)
}

/// Write the exclusion log: the raw columns verbatim, whatever derived fields
/// were computed before rejection, and the reason.
pub fn write_exclusions<'a, W, I>(writer: W, excluded: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a ExcludedRecord>,
{
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXCLUSION_HEADERS)?;
    for record in excluded {
        let raw = &record.raw;
        let features = &record.features;
        let fmt_f64 = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        let fields = [
            opt(&raw.id),
            opt(&raw.vendor_id),
            opt(&raw.pickup_datetime),
            opt(&raw.dropoff_datetime),
            opt(&raw.passenger_count),
            opt(&raw.pickup_longitude),
            opt(&raw.pickup_latitude),
            opt(&raw.dropoff_longitude),
            opt(&raw.dropoff_latitude),
            opt(&raw.store_and_fwd_flag),
            opt(&raw.trip_duration),
            fmt_f64(features.trip_distance_km),
            fmt_f64(features.speed_kmph),
            features.pickup_hour.map(|h| h.to_string()).unwrap_or_default(),
            features
                .pickup_dayofweek
                .map(|day| day.name().to_string())
                .unwrap_or_default(),
            record.reason.to_string(),
        ];
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

const EXCLUSION_HEADERS: [&str; 16] = [
    "id",
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "passenger_count",
    "pickup_longitude",
    "pickup_latitude",
    "dropoff_longitude",
    "dropoff_latitude",
    "store_and_fwd_flag",
    "trip_duration",
    "trip_distance_km",
    "speed_kmph",
    "pickup_hour",
    "pickup_dayofweek",
    "exclusion_reason",
];

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Rows for the trips/locations/vendors tables. Trips whose id or vendor
/// cannot be stored are skipped with a warning.
#[derive(Debug, Default)]
pub struct StorageRows {
    pub trips: Vec<TripRow>,
    pub locations: Vec<LocationRow>,
    pub vendors: Vec<u32>,
    pub skipped: usize,
}

pub fn storage_rows(trips: &[DerivedTripRecord], encoding: WeekdayEncoding) -> StorageRows {
    let mut rows = StorageRows::default();
    for trip in trips {
        match TripRow::from_derived(trip, encoding) {
            Ok(row) => {
                rows.locations.push(LocationRow::from_derived(trip, row.trip_id));
                rows.trips.push(row);
            }
            Err(err) => {
                warn!(id = ?trip.id, error = %err, "trip cannot be stored");
                rows.skipped += 1;
            }
        }
    }
    rows.vendors = distinct_vendors(&rows.trips);
    rows
}

pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct VendorRow {
    vendor_id: u32,
}

pub fn write_vendors<W: Write>(writer: W, vendors: &[u32]) -> Result<()> {
    let rows: Vec<VendorRow> = vendors.iter().map(|&vendor_id| VendorRow { vendor_id }).collect();
    write_rows(writer, &rows)
}
