//! Parameters for relief image generation.

use crate::error::{UnrollError, UnrollResult};

/// Summary statistic computed over the relief values of a block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Aggregate {
    /// Arithmetic mean.
    #[default]
    Mean,
    /// Sum of all values.
    Sum,
    /// Largest value.
    Max,
    /// Middle value, averaging the two middle values for even counts.
    Median,
}

impl Aggregate {
    /// Summarize `values`, or `None` when there are none.
    ///
    /// `values` may be reordered.
    pub fn evaluate(self, values: &mut [f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let n = values.len();
        let value = match self {
            Aggregate::Sum => values.iter().sum(),
            Aggregate::Mean => values.iter().sum::<f64>() / n as f64,
            Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregate::Median => {
                values.sort_unstable_by(f64::total_cmp);
                if n % 2 == 0 {
                    (values[n / 2 - 1] + values[n / 2]) / 2.0
                } else {
                    values[n / 2]
                }
            }
        };
        Some(value)
    }
}

impl std::fmt::Display for Aggregate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Aggregate::Mean => "mean",
            Aggregate::Sum => "sum",
            Aggregate::Max => "max",
            Aggregate::Median => "median",
        };
        f.write_str(name)
    }
}

/// How relief images are resampled from the unrolled grid.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct UnrollParams {
    /// Fill every full-resolution cell from the finest non-empty block
    /// instead of using one fixed decrease factor. Default: true
    pub multiscale: bool,
    /// Fixed decrease factor used when `multiscale` is off. Default: 1
    pub decrease_factor: usize,
    /// First block size tried by the multiscale search. Default: 2
    pub min_scale: usize,
    /// Exclusive upper bound on the multiscale block size. Default: 32
    pub max_scale: usize,
    /// Statistic used to summarize each block. Default: mean
    pub aggregate: Aggregate,
}

impl Default for UnrollParams {
    fn default() -> Self {
        Self {
            multiscale: true,
            decrease_factor: 1,
            min_scale: 2,
            max_scale: 32,
            aggregate: Aggregate::Mean,
        }
    }
}

impl UnrollParams {
    /// Fixed-resolution params with the given decrease factor.
    pub fn fixed(decrease_factor: usize) -> Self {
        Self {
            multiscale: false,
            decrease_factor,
            ..Default::default()
        }
    }

    /// Set the aggregate statistic.
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = aggregate;
        self
    }

    /// Set the multiscale search bounds.
    pub fn with_scales(mut self, min_scale: usize, max_scale: usize) -> Self {
        self.min_scale = min_scale;
        self.max_scale = max_scale;
        self
    }

    /// Block sizes tried by the multiscale search, finest first.
    pub fn scales(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors(Some(self.min_scale), |&s| s.checked_mul(2))
            .take_while(|&s| s > 0 && s < self.max_scale)
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> UnrollResult<()> {
        if self.decrease_factor == 0 {
            return Err(UnrollError::InvalidDecreaseFactor);
        }
        if self.min_scale == 0 || self.min_scale >= self.max_scale {
            return Err(UnrollError::invalid_params(format!(
                "scales must satisfy 1 <= min_scale < max_scale, got {} and {}",
                self.min_scale, self.max_scale
            )));
        }
        Ok(())
    }

    /// Load params from a TOML string. Missing keys take default values.
    #[cfg(feature = "config")]
    pub fn from_toml(toml_str: &str) -> Result<Self, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::from_toml(toml_str)
    }

    /// Load params from a TOML file. Missing keys take default values.
    #[cfg(feature = "config")]
    pub fn from_toml_file(
        path: impl AsRef<std::path::Path>,
    ) -> Result<Self, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::from_toml_file(path)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "config")]
    pub fn to_toml(&self) -> Result<String, vessel_mesh::config::ConfigError> {
        vessel_mesh::config::to_toml(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scales() {
        let p = UnrollParams::default();
        assert!(p.validate().is_ok());
        assert_eq!(p.scales().collect::<Vec<_>>(), vec![2, 4, 8, 16]);
        assert_eq!(p.aggregate, Aggregate::Mean);
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(Aggregate::Median.evaluate(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(Aggregate::Median.evaluate(&mut [5.0]), Some(5.0));
        assert_eq!(Aggregate::Median.evaluate(&mut [9.0, -1.0, 3.0]), Some(3.0));
        assert_eq!(Aggregate::Sum.evaluate(&mut [1.5, 2.5]), Some(4.0));
        assert_eq!(Aggregate::Mean.evaluate(&mut [1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(Aggregate::Max.evaluate(&mut [-3.0, -7.0]), Some(-3.0));
        for kind in [Aggregate::Sum, Aggregate::Mean, Aggregate::Max, Aggregate::Median] {
            assert_eq!(kind.evaluate(&mut []), None);
        }
    }

    #[test]
    fn test_fixed() {
        let p = UnrollParams::fixed(4).with_aggregate(Aggregate::Median);
        assert!(!p.multiscale);
        assert_eq!(p.decrease_factor, 4);
        assert_eq!(p.aggregate.to_string(), "median");
    }

    #[test]
    fn test_validate() {
        assert!(matches!(
            UnrollParams::fixed(0).validate(),
            Err(UnrollError::InvalidDecreaseFactor)
        ));
        assert!(UnrollParams::default().with_scales(4, 4).validate().is_err());
        assert!(UnrollParams::default().with_scales(0, 8).validate().is_err());
        assert!(UnrollParams::default().with_scales(3, 20).validate().is_ok());
        assert_eq!(
            UnrollParams::default()
                .with_scales(3, 20)
                .scales()
                .collect::<Vec<_>>(),
            vec![3, 6, 12]
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_toml() {
        let p = UnrollParams::from_toml("multiscale = false\naggregate = \"max\"\n").unwrap();
        assert!(!p.multiscale);
        assert_eq!(p.aggregate, Aggregate::Max);
        assert_eq!(p.max_scale, 32);
        assert_eq!(UnrollParams::from_toml(&p.to_toml().unwrap()).unwrap(), p);
    }
}
