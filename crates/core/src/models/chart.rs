use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single (timestamp, price) sample of a historical price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Selectable history windows on the coin detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartTimeframe {
    /// 24 hours
    Day,
    /// 7 days
    #[default]
    Week,
    /// 30 days
    Month,
    /// 90 days
    Quarter,
}

impl ChartTimeframe {
    pub const ALL: [ChartTimeframe; 4] = [
        ChartTimeframe::Day,
        ChartTimeframe::Week,
        ChartTimeframe::Month,
        ChartTimeframe::Quarter,
    ];

    /// Number of days requested from the API.
    pub fn days(self) -> u32 {
        match self {
            ChartTimeframe::Day => 1,
            ChartTimeframe::Week => 7,
            ChartTimeframe::Month => 30,
            ChartTimeframe::Quarter => 90,
        }
    }

    /// Map a day count back to a timeframe. Only 1, 7, 30 and 90 are valid.
    pub fn from_days(days: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.days() == days)
    }
}

impl std::fmt::Display for ChartTimeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartTimeframe::Day => write!(f, "24h"),
            ChartTimeframe::Week => write!(f, "7d"),
            ChartTimeframe::Month => write!(f, "30d"),
            ChartTimeframe::Quarter => write!(f, "90d"),
        }
    }
}

/// One labelled point, ready for a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// X-axis label (date, or time of day for the 24h window)
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// A complete dataset for the price chart.
///
/// The core computes the labels and values; the front end only draws them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Dataset label, e.g. "Price in EUR"
    pub label: String,
    pub timeframe: ChartTimeframe,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
