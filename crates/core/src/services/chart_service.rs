use crate::models::chart::{ChartPoint, ChartSeries, ChartTimeframe, PricePoint};

/// Turns raw price history into a chart-ready dataset.
///
/// The core computes labels and values; the front end only draws them.
/// The 24h window is labelled by time of day, longer windows by date.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Build the dataset for the detail page chart.
    /// Points are emitted oldest first regardless of input order.
    pub fn build_series(
        &self,
        points: &[PricePoint],
        currency: &str,
        timeframe: ChartTimeframe,
    ) -> ChartSeries {
        let mut sorted: Vec<&PricePoint> = points.iter().collect();
        sorted.sort_by_key(|p| p.timestamp);

        let format = match timeframe {
            ChartTimeframe::Day => "%H:%M",
            _ => "%Y-%m-%d",
        };

        ChartSeries {
            label: format!("Price in {}", currency.to_uppercase()),
            timeframe,
            points: sorted
                .into_iter()
                .map(|p| ChartPoint {
                    label: p.timestamp.format(format).to_string(),
                    timestamp: p.timestamp,
                    price: p.price,
                })
                .collect(),
        }
    }

    /// (min, max) price for axis scaling, `None` for an empty series.
    pub fn price_range(&self, series: &ChartSeries) -> Option<(f64, f64)> {
        series.points.iter().map(|p| p.price).fold(None, |acc, price| {
            Some(match acc {
                None => (price, price),
                Some((lo, hi)) => (lo.min(price), hi.max(price)),
            })
        })
    }

    /// Percentage change from the first to the last point of the series.
    pub fn change_percent(&self, series: &ChartSeries) -> Option<f64> {
        let first = series.points.first()?.price;
        let last = series.points.last()?.price;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
