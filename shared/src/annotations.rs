//! Chart colours and advisory annotations derived from a river's advised range.

use crate::runnable::{AdvisedRange, FlowStatus};

pub const BAND_BELOW_LOW: &str = "rgba(255, 99, 132, 0.2)";
pub const BAND_OPTIMAL: &str = "rgba(76, 175, 80, 0.2)";
pub const BAND_ABOVE_HIGH: &str = "rgba(54, 162, 235, 0.2)";

pub const LINE_LOW: &str = "rgba(200, 0, 0, 0.9)";
pub const LINE_HIGH: &str = "rgba(0, 0, 200, 0.9)";

pub const SERIES_STROKE: &str = "rgb(75, 192, 192)";

pub const SUBTITLE_DEFAULT: &str = "rgba(0, 0, 0, 0.87)";
pub const SUBTITLE_LOW: &str = "rgb(211, 47, 47)";
pub const SUBTITLE_OPTIMAL: &str = "rgb(56, 142, 60)";
pub const SUBTITLE_HIGH: &str = "rgb(25, 118, 210)";

/// Horizontal band between two flow values. An open end extends to the
/// edge of the plot.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdLine {
    pub value: f64,
    pub color: &'static str,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Annotations {
    pub bands: Vec<Band>,
    pub lines: Vec<ThresholdLine>,
}

impl Annotations {
    pub fn for_range(range: AdvisedRange) -> Self {
        let mut bands = Vec::new();
        let mut lines = Vec::new();

        if let Some(low) = range.low {
            bands.push(Band {
                from: None,
                to: Some(low),
                color: BAND_BELOW_LOW,
            });
        }
        match (range.low, range.high) {
            (Some(low), Some(high)) if low < high => bands.push(Band {
                from: Some(low),
                to: Some(high),
                color: BAND_OPTIMAL,
            }),
            (Some(low), _) => bands.push(Band {
                from: Some(low),
                to: None,
                color: BAND_OPTIMAL,
            }),
            (None, Some(high)) => bands.push(Band {
                from: None,
                to: Some(high),
                color: BAND_OPTIMAL,
            }),
            (None, None) => {}
        }
        if let Some(high) = range.high {
            bands.push(Band {
                from: Some(high),
                to: None,
                color: BAND_ABOVE_HIGH,
            });
        }

        if let Some(low) = range.low {
            lines.push(ThresholdLine {
                value: low,
                color: LINE_LOW,
                label: format!("Low: {}", format_flow(low)),
            });
        }
        if let Some(high) = range.high {
            lines.push(ThresholdLine {
                value: high,
                color: LINE_HIGH,
                label: format!("High: {}", format_flow(high)),
            });
        }

        Self { bands, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty() && self.lines.is_empty()
    }
}

pub fn subtitle_color(status: FlowStatus) -> &'static str {
    match status {
        FlowStatus::BelowLow => SUBTITLE_LOW,
        FlowStatus::Optimal => SUBTITLE_OPTIMAL,
        FlowStatus::AboveHigh => SUBTITLE_HIGH,
        FlowStatus::Unknown => SUBTITLE_DEFAULT,
    }
}

/// Whole numbers print without a fractional part.
pub fn format_flow(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
