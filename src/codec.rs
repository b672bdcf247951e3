use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{TimestampError, epoch_to_iso};

const FIELD_SEP: char = ',';
const COORD_SEP: char = ':';
const PRECISION: f64 = 10_000.0;

/// One stored record. `member` is `"<lat>:<lon>,<sample_time>,<speed>"`,
/// `score` is the arrival time in epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub member: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedPoint {
    pub device_id: String,
    #[serde(rename = "device_latitude")]
    pub latitude: f64,
    #[serde(rename = "device_longitude")]
    pub longitude: f64,
    #[serde(rename = "device_speed")]
    pub speed: f64,
    /// when the sample was measured
    pub timestamp: String,
    /// when the sample reached the backend (the store score)
    #[serde(rename = "sts_timestamp")]
    pub arrival_timestamp: String,
}

#[derive(Error, Debug, PartialEq)]
pub enum DecodeError {
    #[error("record `{member}` has {found} fields, expected 3")]
    FieldCount { member: String, found: usize },
    #[error("record `{member}` has {found} coordinates, expected 2")]
    CoordCount { member: String, found: usize },
    #[error("record `{member}` has non-numeric {field} `{value}`")]
    NotNumeric {
        member: String,
        field: &'static str,
        value: String,
    },
    #[error("record `{member}` has bad timestamp: {source}")]
    Timestamp {
        member: String,
        source: TimestampError,
    },
}

/// Rounds to the 4 decimal digits kept in the stored form.
pub fn round4(value: f64) -> f64 {
    (value * PRECISION).round() / PRECISION
}

pub fn encode(
    latitude: f64,
    longitude: f64,
    sample_time: f64,
    speed: f64,
    arrival_time: f64,
) -> EncodedRecord {
    EncodedRecord {
        member: format!(
            "{}{COORD_SEP}{}{FIELD_SEP}{sample_time}{FIELD_SEP}{}",
            round4(latitude),
            round4(longitude),
            round4(speed)
        ),
        score: arrival_time,
    }
}

pub fn decode(device_id: &str, member: &str, score: f64) -> Result<DecodedPoint, DecodeError> {
    let fields: Vec<&str> = member.split(FIELD_SEP).collect();
    let [coords, sample_time, speed] = fields[..] else {
        return Err(DecodeError::FieldCount {
            member: member.to_string(),
            found: fields.len(),
        });
    };

    let coords: Vec<&str> = coords.split(COORD_SEP).collect();
    let [latitude, longitude] = coords[..] else {
        return Err(DecodeError::CoordCount {
            member: member.to_string(),
            found: coords.len(),
        });
    };

    let number = |field: &'static str, value: &str| {
        value
            .trim()
            .parse::<f64>()
            .map_err(|_| DecodeError::NotNumeric {
                member: member.to_string(),
                field,
                value: value.to_string(),
            })
    };
    let iso = |secs: f64| {
        epoch_to_iso(secs).map_err(|source| DecodeError::Timestamp {
            member: member.to_string(),
            source,
        })
    };

    Ok(DecodedPoint {
        device_id: device_id.to_string(),
        latitude: number("latitude", latitude)?,
        longitude: number("longitude", longitude)?,
        speed: number("speed", speed)?,
        timestamp: iso(number("sample time", sample_time)?)?,
        arrival_timestamp: iso(score)?,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_encode_format() {
        let rec = encode(12.345_678, 56.789_01, 1_634_998_091.0, 5.55556, 1_634_998_092.934);
        assert_eq!(rec.member, "12.3457:56.789,1634998091,5.5556");
        assert_eq!(rec.score, 1_634_998_092.934);

        let rec = encode(-33.86882, 151.20929, 100.25, 0.0, 101.0);
        assert_eq!(rec.member, "-33.8688:151.2093,100.25,0");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            (12.3456, 56.789, 100.0, 5.5, 100.0),
            (-89.99994, 179.99996, 1_634_998_091.0, 120.123_456, 1_634_998_092.934_512),
            (0.00004, -0.00006, 0.5, 0.00005, 1.0),
        ];

        for (lat, lon, t, spd, t2) in cases {
            let rec = encode(lat, lon, t, spd, t2);
            let point = decode("D1", &rec.member, rec.score).unwrap();
            assert_eq!(point.device_id, "D1");
            assert_eq!(point.latitude, round4(lat));
            assert_eq!(point.longitude, round4(lon));
            assert_eq!(point.speed, round4(spd));
            assert_eq!(point.timestamp, epoch_to_iso(t).unwrap());
            assert_eq!(point.arrival_timestamp, epoch_to_iso(t2).unwrap());
        }
    }

    #[test]
    fn test_decode_keeps_timestamps_apart() {
        let point = decode("7", "1:2,100,3", 300.0).unwrap();
        assert_eq!(point.timestamp, "1970-01-01T00:01:40.000000Z");
        assert_eq!(point.arrival_timestamp, "1970-01-01T00:05:00.000000Z");
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            decode("D1", "1:2,100", 1.0),
            Err(DecodeError::FieldCount { found: 2, .. })
        ));
        assert!(matches!(
            decode("D1", "1:2,100,3,4", 1.0),
            Err(DecodeError::FieldCount { found: 4, .. })
        ));
        assert!(matches!(
            decode("D1", "1:2:3,100,3", 1.0),
            Err(DecodeError::CoordCount { found: 3, .. })
        ));
        assert!(matches!(
            decode("D1", "12,100,3", 1.0),
            Err(DecodeError::CoordCount { found: 1, .. })
        ));
        assert!(matches!(
            decode("D1", "north:2,100,3", 1.0),
            Err(DecodeError::NotNumeric { field: "latitude", .. })
        ));
        assert!(matches!(
            decode("D1", "1:2,noon,3", 1.0),
            Err(DecodeError::NotNumeric { field: "sample time", .. })
        ));
        assert!(matches!(
            decode("D1", "1:2,100,", 1.0),
            Err(DecodeError::NotNumeric { field: "speed", .. })
        ));
        assert!(matches!(
            decode("D1", "1:2,1e300,3", 1.0),
            Err(DecodeError::Timestamp { .. })
        ));
        assert!(matches!(
            decode("D1", "1:2,100,3", f64::NAN),
            Err(DecodeError::Timestamp { .. })
        ));
    }

    #[test]
    fn test_point_json_shape() {
        let point = decode("25029", "12.3456:56.789,100,5.5", 200.0).unwrap();
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["device_id"], "25029");
        assert_eq!(json["device_latitude"], 12.3456);
        assert_eq!(json["device_longitude"], 56.789);
        assert_eq!(json["device_speed"], 5.5);
        assert_eq!(json["timestamp"], "1970-01-01T00:01:40.000000Z");
        assert_eq!(json["sts_timestamp"], "1970-01-01T00:03:20.000000Z");
    }
}
