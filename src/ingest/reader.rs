use std::io;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;

use super::{aggregator::RawSample, error::DataError};
use crate::time::parse_sample_instant;

/// One CSV row as written by the devices' exporter. Column names from the
/// exporter (`device_fk_id`, `time_stamp`, `sts`) and descriptive ones are
/// both accepted.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(alias = "device_fk_id")]
    device_id: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    speed: Option<String>,
    #[serde(alias = "time_stamp")]
    sample_time: Option<String>,
    #[serde(alias = "sts")]
    arrival_time: Option<String>,
}

/// Reads every row, stopping at the first one that is malformed.
pub fn read_samples<R: io::Read>(rdr: R) -> Result<Vec<RawSample>, DataError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(rdr);
    let headers = reader.headers()?.clone();

    let mut samples = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        let row: Row = record.deserialize(Some(&headers))?;
        samples.push(row.into_sample(line)?);
    }
    Ok(samples)
}

fn required<T>(value: Option<T>, line: u64, field: &'static str) -> Result<T, DataError> {
    value.ok_or(DataError::MissingField { line, field })
}

fn number(value: Option<String>, line: u64, field: &'static str) -> Result<f64, DataError> {
    let value = required(value, line, field)?;
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(DataError::BadNumber { line, field, value }),
    }
}

fn instant(value: Option<String>, line: u64, field: &'static str) -> Result<f64, DataError> {
    let value = required(value, line, field)?;
    parse_sample_instant(&value).ok_or(DataError::BadTimestamp { line, field, value })
}

impl Row {
    fn into_sample(self, line: u64) -> Result<RawSample, DataError> {
        let device_id = required(self.device_id.filter(|d| !d.is_empty()), line, "device_id")?;
        Ok(RawSample {
            device_id,
            latitude: number(self.latitude, line, "latitude")?,
            longitude: number(self.longitude, line, "longitude")?,
            speed: number(self.speed, line, "speed")?,
            sample_time: instant(self.sample_time, line, "sample_time")?,
            arrival_time: instant(self.arrival_time, line, "arrival_time")?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_read_exporter_columns() {
        let csv = "\
device_fk_id,latitude,longitude,time_stamp,sts,speed
25029,12.3456,56.789,2021-10-23T14:08:11Z,2021-10-23T14:08:12.934Z,5.5
25030, 1.5 ,2.5,100,101.25,0
";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(
            samples,
            vec![
                RawSample {
                    device_id: "25029".to_string(),
                    latitude: 12.3456,
                    longitude: 56.789,
                    speed: 5.5,
                    sample_time: 1_634_998_091.0,
                    arrival_time: 1_634_998_092.934,
                },
                RawSample {
                    device_id: "25030".to_string(),
                    latitude: 1.5,
                    longitude: 2.5,
                    speed: 0.0,
                    sample_time: 100.0,
                    arrival_time: 101.25,
                },
            ]
        );
    }

    #[test]
    fn test_read_descriptive_columns() {
        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time,extra
D1,1,2,3,10,11,ignored
";
        let samples = read_samples(csv.as_bytes()).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].device_id, "D1");
        assert_eq!(samples[0].arrival_time, 11.0);
    }

    #[test]
    fn test_missing_field_aborts() {
        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
D1,1,2,3,10,11
D1,1,,3,10,12
D1,1,2,3,10,13
";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(DataError::MissingField { line: 3, field: "longitude" })
        ));
    }

    #[test]
    fn test_missing_column_aborts() {
        let csv = "\
device_id,latitude,longitude,sample_time,arrival_time
D1,1,2,10,11
";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(DataError::MissingField { line: 2, field: "speed" })
        ));
    }

    #[test]
    fn test_empty_device_aborts() {
        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
,1,2,3,10,11
";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(DataError::MissingField { field: "device_id", .. })
        ));
    }

    #[test]
    fn test_bad_timestamp_aborts() {
        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
D1,1,2,3,10,yesterday
";
        let Err(DataError::BadTimestamp { line, field, value }) = read_samples(csv.as_bytes())
        else {
            panic!("expected bad timestamp");
        };
        assert_eq!((line, field, value.as_str()), (2, "arrival_time", "yesterday"));
    }

    #[test]
    fn test_non_numeric_aborts() {
        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
D1,1,2,3,10,11
D1,north,2,3,10,12
";
        let Err(DataError::BadNumber { line, field, value }) = read_samples(csv.as_bytes()) else {
            panic!("expected bad number");
        };
        assert_eq!((line, field, value.as_str()), (3, "latitude", "north"));

        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
D1,1,2,fast,10,11
";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(DataError::BadNumber { line: 2, field: "speed", .. })
        ));

        let csv = "\
device_id,latitude,longitude,speed,sample_time,arrival_time
D1,1,NaN,3,10,11
";
        assert!(matches!(
            read_samples(csv.as_bytes()),
            Err(DataError::BadNumber { line: 2, field: "longitude", .. })
        ));
    }
}
