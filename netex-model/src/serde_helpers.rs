use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{Deserialize, Deserializer};
use serde::ser::Serializer;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn deserialize_date_time<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom)
}

pub fn serialize_date_time<S>(date_time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date_time.format(DATE_TIME_FORMAT).to_string())
}

pub fn deserialize_option_date_time<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<&str>::deserialize(deserializer)?
        .map(|s| NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT).map_err(serde::de::Error::custom));
    match s {
        Some(Ok(d)) => Ok(Some(d)),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

pub fn serialize_option_date_time<S>(
    date_time: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date_time {
        None => serializer.serialize_none(),
        Some(d) => serialize_date_time(d, serializer),
    }
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let s: &str = Deserialize::deserialize(deserializer)?;
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(serde::de::Error::custom)
}

pub fn serialize_date<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
}

pub fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = Option::<&str>::deserialize(deserializer)?
        .map(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(serde::de::Error::custom));
    match s {
        Some(Ok(d)) => Ok(Some(d)),
        Some(Err(e)) => Err(e),
        None => Ok(None),
    }
}

pub fn serialize_option_date<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match date {
        None => serializer.serialize_none(),
        Some(d) => serialize_date(d, serializer),
    }
}

#[test]
fn test_serialize_date_time() {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Test {
        #[serde(
            deserialize_with = "deserialize_date_time",
            serialize_with = "serialize_date_time"
        )]
        created: NaiveDateTime,
    }
    let parsed: Test = serde_json::from_str(r#"{"created":"2023-01-12T10:47:36"}"#).unwrap();
    assert_eq!(
        NaiveDate::from_ymd_opt(2023, 1, 12)
            .unwrap()
            .and_hms_opt(10, 47, 36)
            .unwrap(),
        parsed.created
    );

    let out = serde_json::to_string(&parsed).unwrap();
    assert_eq!(r#"{"created":"2023-01-12T10:47:36"}"#, out);
}

#[test]
fn test_deserialize_date_time_with_millis() {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Test {
        #[serde(deserialize_with = "deserialize_date_time")]
        created: NaiveDateTime,
    }
    let parsed: Test = serde_json::from_str(r#"{"created":"2023-01-12T10:47:36.123"}"#).unwrap();
    assert_eq!(36, chrono::Timelike::second(&parsed.created));
}
