//! Time series for the progress chart
//!
//! Records in, `(date, value)` points out. No resampling or gap filling:
//! days without a record have no point, and several records on one day all
//! get a point in store order.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::volume;
use crate::models::TrainingRecord;

/// ---------------------------------------------------------------------------
/// Metric Selector
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMetric {
  #[default]
  Weight,
  Reps,
  /// weight × reps × sets
  Volume,
}

impl TrendMetric {
  pub const ALL: [TrendMetric; 3] = [TrendMetric::Weight, TrendMetric::Reps, TrendMetric::Volume];

  pub fn value(&self, record: &TrainingRecord) -> f64 {
    match self {
      Self::Weight => record.weight,
      Self::Reps => f64::from(record.reps),
      Self::Volume => volume(record),
    }
  }

  pub fn axis_label(&self) -> &'static str {
    match self {
      Self::Weight => "Weight (kg)",
      Self::Reps => "Reps",
      Self::Volume => "Volume (kg x reps x sets)",
    }
  }

  pub fn title(&self, exercise: &str) -> String {
    match self {
      Self::Weight => format!("{} weight trend", exercise),
      Self::Reps => format!("{} reps trend", exercise),
      Self::Volume => format!("{} training volume trend", exercise),
    }
  }
}

impl std::fmt::Display for TrendMetric {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Weight => write!(f, "weight"),
      Self::Reps => write!(f, "reps"),
      Self::Volume => write!(f, "volume"),
    }
  }
}

impl std::str::FromStr for TrendMetric {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "weight" => Ok(Self::Weight),
      "reps" => Ok(Self::Reps),
      "volume" => Ok(Self::Volume),
      _ => Err(format!("Unknown trend metric: {}", s)),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Trend Series
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
  pub date: NaiveDate,
  pub value: f64,
}

/// A chart series over a borrowed record slice. Points are produced lazily
/// and the series can be walked any number of times.
#[derive(Debug, Clone, Copy)]
pub struct TrendSeries<'a> {
  records: &'a [TrainingRecord],
  metric: TrendMetric,
}

impl<'a> TrendSeries<'a> {
  /// `records` must already be sorted ascending by training date.
  pub fn new(records: &'a [TrainingRecord], metric: TrendMetric) -> Self {
    Self { records, metric }
  }

  pub fn metric(&self) -> TrendMetric {
    self.metric
  }

  pub fn points(&self) -> impl Iterator<Item = TrendPoint> + 'a {
    let metric = self.metric;
    self.records.iter().map(move |record| TrendPoint {
      date: record.training_date,
      value: metric.value(record),
    })
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}

/// Collect a series into owned points, ready to hand to a chart.
pub fn build_trend(records: &[TrainingRecord], metric: TrendMetric) -> Vec<TrendPoint> {
  TrendSeries::new(records, metric).points().collect()
}
