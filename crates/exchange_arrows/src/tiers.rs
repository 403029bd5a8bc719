use crate::constants::{
    INTENSITY_DOMAIN_MAX, INTENSITY_TIER_COUNT, SPEED_DOMAIN, SPEED_TIER_MAX, TIER_CSV_HEADERS,
};
use crate::error::{ArrowError, Result};

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// Discrete bucket of a continuous value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    Level(usize),
    /// The value was NaN
    Unknown,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Level(n) => write!(f, "{}", n),
            Tier::Unknown => write!(f, "nan"),
        }
    }
}

/// Ordered threshold table: a value falls into tier `k` when exactly `k`
/// thresholds are `<=` the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct TierTable {
    thresholds: Vec<f64>,
}

impl TierTable {
    /// Thresholds must be finite and strictly increasing
    pub fn new(thresholds: Vec<f64>) -> Result<Self> {
        if let Some(bad) = thresholds.iter().find(|t| !t.is_finite()) {
            return Err(ArrowError::TierTable(format!(
                "threshold {} is not finite",
                bad
            )));
        }
        if let Some(w) = thresholds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ArrowError::TierTable(format!(
                "thresholds must be strictly increasing, got {} then {}",
                w[0], w[1]
            )));
        }
        Ok(Self { thresholds })
    }

    /// Carbon intensity [gCO2eq/kWh]: 0..800 split into 11 equal buckets,
    /// everything above 800 in the last one.
    pub fn default_intensity() -> Self {
        let step = INTENSITY_DOMAIN_MAX / INTENSITY_TIER_COUNT as f64;
        Self {
            thresholds: (1..INTENSITY_TIER_COUNT).map(|k| step * k as f64).collect(),
        }
    }

    /// Exchange speed [MW]: 500..5000 mapped linearly onto 0..=2 and rounded.
    pub fn default_speed() -> Self {
        let (lo, hi) = SPEED_DOMAIN;
        let span = (hi - lo) / SPEED_TIER_MAX as f64;
        Self {
            thresholds: (0..SPEED_TIER_MAX)
                .map(|k| lo + span * (k as f64 + 0.5))
                .collect(),
        }
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Number of distinct non-NaN tiers
    pub fn tier_count(&self) -> usize {
        self.thresholds.len() + 1
    }

    #[inline]
    pub fn tier_of(&self, value: f64) -> Tier {
        if value.is_nan() {
            return Tier::Unknown;
        }
        Tier::Level(self.thresholds.partition_point(|&t| t <= value))
    }

    /// Loads a table from a `Tier,Threshold` CSV. Tier `k` holds the lower
    /// bound of tier `k`, so the tiers must be exactly 1..=n; the file may
    /// list them in any order.
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?;
        let ok = headers.len() == TIER_CSV_HEADERS.len()
            && headers
                .iter()
                .zip(TIER_CSV_HEADERS)
                .all(|(got, want)| got.eq_ignore_ascii_case(want));
        if !ok {
            return Err(ArrowError::CsvHeader(format!(
                "expected {}",
                TIER_CSV_HEADERS.join(",")
            )));
        }

        let mut rows: Vec<(usize, f64, usize)> = Vec::new();
        for (i, result) in rdr.records().enumerate() {
            let rec = result?;
            let row = i + 2;
            let tier_s = rec.get(0).unwrap_or_default();
            let tier = tier_s.parse::<usize>().map_err(|_| {
                ArrowError::TierTable(format!("invalid tier '{}' at row {}", tier_s, row))
            })?;
            let value_s = rec.get(1).unwrap_or_default();
            let threshold = value_s
                .parse::<f64>()
                .map_err(|source| ArrowError::ValueParse {
                    row,
                    column: "Threshold",
                    value: value_s.to_string(),
                    source,
                })?;
            rows.push((tier, threshold, row));
        }
        rows.sort_by_key(|&(tier, _, row)| (tier, row));

        if let Some(w) = rows.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ArrowError::TierTable(format!(
                "duplicate tier {} at rows {} and {}",
                w[1].0, w[0].2, w[1].2
            )));
        }
        for (expected, &(tier, _, row)) in (1..).zip(&rows) {
            if tier != expected {
                return Err(ArrowError::TierTable(format!(
                    "tier {} missing, found tier {} at row {}",
                    expected, tier, row
                )));
            }
        }

        Self::new(rows.into_iter().map(|(_, t, _)| t).collect())
    }
}

impl TryFrom<Vec<f64>> for TierTable {
    type Error = ArrowError;

    fn try_from(thresholds: Vec<f64>) -> Result<Self> {
        Self::new(thresholds)
    }
}

impl From<TierTable> for Vec<f64> {
    fn from(table: TierTable) -> Self {
        table.thresholds
    }
}
