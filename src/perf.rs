use serde::{Deserialize, Deserializer};

pub const THREADS: &str = "Threads";
pub const RUN: &str = "Run";
pub const TIME_SEC: &str = "TimeSec";
pub const AVERAGE_TIME_SEC: &str = "AverageTimeSec";

/// Columns read through [`parse_decimal`] rather than as plain numbers.
pub const DECIMAL_COLUMNS: [&str; 2] = [TIME_SEC, AVERAGE_TIME_SEC];

/// One timed run from a raw measurement file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RunSample {
    #[serde(rename = "Threads")]
    pub threads: u32,
    #[serde(rename = "Run")]
    pub run: u32,
    #[serde(rename = "TimeSec", deserialize_with = "decimal_comma")]
    pub time_sec: f64,
}

/// A row that already carries the average for its thread count.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AverageSample {
    #[serde(rename = "Threads")]
    pub threads: u32,
    #[serde(rename = "AverageTimeSec", deserialize_with = "decimal_comma")]
    pub average_time_sec: f64,
}

/// A single point on the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreadTiming {
    pub threads: u32,
    pub average_time_sec: f64,
}

/// Parses a decimal written with a comma as the fractional separator.
/// Dot decimals and plain integers are accepted too; non-finite values are not.
pub fn parse_decimal(field: &str) -> Option<f64> {
    let field = field.trim();
    if field.is_empty() || field.matches(',').count() > 1 {
        return None;
    }
    field
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

fn decimal_comma<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let field = String::deserialize(deserializer)?;
    parse_decimal(&field)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal {:?}", field)))
}
