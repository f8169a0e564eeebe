use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::runnable::AdvisedRange;

/// Operator-curated metadata for one river section.
///
/// Field names follow the wire format of `/riverdetails`; the three
/// all-caps acronyms do not survive a plain camelCase rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiverDetail {
    pub id: i64,
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_code: String,
    #[serde(default)]
    pub gauge_name: String,
    #[serde(default)]
    pub gauge_source: String,
    #[serde(default)]
    pub american_whitewater_link: String,
    #[serde(default, rename = "localWeatherNOAA")]
    pub local_weather_noaa: String,
    #[serde(default, rename = "lowAdvisedCFS")]
    pub low_advised_cfs: Option<f64>,
    #[serde(default, rename = "highAdvisedCFS")]
    pub high_advised_cfs: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl RiverDetail {
    /// Stable card identifier: the gauge site code, or a synthetic id for
    /// rivers that have no gauge.
    pub fn identifier(&self) -> String {
        if self.site_code.is_empty() {
            format!("db-id-{}", self.id)
        } else {
            self.site_code.clone()
        }
    }

    pub fn has_gauge(&self) -> bool {
        !self.site_code.is_empty()
    }

    pub fn advised_range(&self) -> AdvisedRange {
        AdvisedRange::new(self.low_advised_cfs, self.high_advised_cfs)
    }

    pub fn comments(&self) -> Option<&str> {
        self.comments.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// One timestamped gauge reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiverLevel {
    #[serde(default)]
    pub id: String,
    pub value: f64,
    #[serde(default)]
    pub variable_code: String,
    #[serde(default)]
    pub site_code: String,
    pub timestamp: String,
    #[serde(default)]
    pub unit_code: String,
    #[serde(default)]
    pub site_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_at: Option<String>,
}

impl RiverLevel {
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

/// Sort a series ascending by timestamp. Unparseable timestamps sort first
/// and keep their relative order.
pub fn sort_levels_ascending(levels: &mut [RiverLevel]) {
    levels.sort_by_key(|level| level.parsed_timestamp());
}

/// Most recent reading of an ascending series.
pub fn latest_value(levels: &[RiverLevel]) -> Option<f64> {
    levels.last().map(|level| level.value)
}
