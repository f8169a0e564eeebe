use serde::{Deserialize, Serialize};

/// Advised flow bounds with unset sentinels normalized away.
///
/// A bound that is missing, zero, negative or NaN counts as absent, so a
/// detail carrying `(0, 0)` has no advisory at all.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AdvisedRange {
    pub low: Option<f64>,
    pub high: Option<f64>,
}

impl AdvisedRange {
    pub fn new(low: Option<f64>, high: Option<f64>) -> Self {
        Self {
            low: low.filter(|v| *v > 0.0),
            high: high.filter(|v| *v > 0.0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_none() && self.high.is_none()
    }

    /// Both bounds present with `low >= high`.
    pub fn is_degenerate(&self) -> bool {
        matches!((self.low, self.high), (Some(low), Some(high)) if low >= high)
    }

    pub fn status(&self, value: f64) -> FlowStatus {
        if self.is_empty() || self.is_degenerate() || !value.is_finite() {
            return FlowStatus::Unknown;
        }
        if let Some(low) = self.low
            && value < low
        {
            return FlowStatus::BelowLow;
        }
        if let Some(high) = self.high
            && value > high
        {
            return FlowStatus::AboveHigh;
        }
        FlowStatus::Optimal
    }
}

/// Where a reading sits relative to the advised range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    BelowLow,
    Optimal,
    AboveHigh,
    Unknown,
}

/// Ordinal used by the runnable sort mode. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RunnableKey {
    Optimal = 0,
    OutsideRange = 1,
    DegenerateRange = 2,
    NoAdvisory = 3,
    Loading = 4,
    NoData = 5,
}

impl RunnableKey {
    pub fn ordinal(self) -> u8 {
        self as u8
    }
}

/// Runnable key of a card from its latest reading and advisory bounds.
///
/// `empty` means loading finished with no readings. Rules apply in order:
/// loading, no data, no advisory, then the bound comparisons.
pub fn runnable_key(
    latest: Option<f64>,
    low: Option<f64>,
    high: Option<f64>,
    loading: bool,
    empty: bool,
) -> RunnableKey {
    if loading {
        return RunnableKey::Loading;
    }
    let Some(value) = latest.filter(|v| !empty && v.is_finite()) else {
        return RunnableKey::NoData;
    };

    let range = AdvisedRange::new(low, high);
    let in_range = match (range.low, range.high) {
        (None, None) => return RunnableKey::NoAdvisory,
        (Some(low), Some(high)) if low >= high => return RunnableKey::DegenerateRange,
        (Some(low), Some(high)) => value >= low && value <= high,
        (Some(low), None) => value >= low,
        (None, Some(high)) => value <= high,
    };

    if in_range {
        RunnableKey::Optimal
    } else {
        RunnableKey::OutsideRange
    }
}
