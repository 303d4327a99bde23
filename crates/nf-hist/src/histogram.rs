//! Plain 1D histogram used for flux and event-rate inputs.

use nf_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::Axis;

/// A 1D histogram without under/overflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawHistogram")]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Binning.
    pub axis: Axis,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
}

#[derive(Deserialize)]
struct RawHistogram {
    #[serde(default)]
    name: String,
    axis: Axis,
    bin_content: Vec<f64>,
}

impl TryFrom<RawHistogram> for Histogram {
    type Error = Error;

    fn try_from(raw: RawHistogram) -> Result<Self> {
        Histogram::from_parts(raw.name, raw.axis, raw.bin_content)
    }
}

impl Histogram {
    /// Build a histogram, checking that contents match the binning.
    pub fn from_parts(name: impl Into<String>, axis: Axis, bin_content: Vec<f64>) -> Result<Self> {
        let name = name.into();
        if bin_content.len() != axis.n_bins() {
            return Err(Error::Validation(format!(
                "histogram '{}': {} contents for {} bins",
                name,
                bin_content.len(),
                axis.n_bins()
            )));
        }
        Ok(Self { name, axis, bin_content })
    }

    /// Number of bins.
    pub fn n_bins(&self) -> usize {
        self.bin_content.len()
    }

    /// Sum of bin contents; with `width`, each bin is multiplied by its width.
    pub fn integral(&self, width: bool) -> f64 {
        self.integral_bins(0, self.n_bins() - 1, width)
    }

    /// Sum over bins `first..=last` (clamped to range).
    pub fn integral_bins(&self, first: usize, last: usize, width: bool) -> f64 {
        let last = last.min(self.n_bins() - 1);
        if first > last {
            return 0.0;
        }
        (first..=last)
            .map(|i| if width { self.bin_content[i] * self.axis.width(i) } else { self.bin_content[i] })
            .sum()
    }

    /// Sum from the bin containing `lo` up to and including the bin containing `hi`.
    ///
    /// Bounds outside the axis are clamped to the first/last bin, so the bin
    /// holding the lower bound always contributes in full. A window that
    /// misses the axis entirely integrates to 0.
    pub fn integral_range(&self, lo: f64, hi: f64, width: bool) -> f64 {
        if !self.axis.overlaps(lo, hi) {
            return 0.0;
        }
        let first = self.axis.find_bin_clamped(lo);
        let last = self.axis.find_bin_clamped(hi);
        self.integral_bins(first, last, width)
    }

    /// Add another histogram with identical binning.
    pub fn add(&mut self, other: &Histogram) -> Result<()> {
        if self.axis != other.axis {
            return Err(Error::Validation(format!(
                "cannot add histogram '{}' to '{}': binning differs",
                other.name, self.name
            )));
        }
        for (a, b) in self.bin_content.iter_mut().zip(&other.bin_content) {
            *a += b;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flux() -> Histogram {
        Histogram::from_parts("flux", Axis::new(vec![0.0, 1.0, 2.0, 4.0]).unwrap(), vec![1.0, 2.0, 3.0])
            .unwrap()
    }

    #[test]
    fn integrals() {
        let h = flux();
        assert_eq!(h.integral(false), 6.0);
        assert_eq!(h.integral(true), 1.0 + 2.0 + 6.0);
        assert_eq!(h.integral_bins(1, 5, false), 5.0);
        assert_eq!(h.integral_bins(2, 1, false), 0.0);
    }

    #[test]
    fn integral_range_includes_partial_first_bin() {
        let h = flux();
        // 0.5 lies inside bin 0, 1.5 inside bin 1.
        assert_eq!(h.integral_range(0.5, 1.5, false), 3.0);
        assert_eq!(h.integral_range(-10.0, 100.0, false), 6.0);
        assert_eq!(h.integral_range(1.0, 1.0, false), 2.0);
    }

    #[test]
    fn integral_range_outside_axis_is_zero() {
        let h = flux();
        assert_eq!(h.integral_range(5.0, 10.0, true), 0.0);
        assert_eq!(h.integral_range(4.0, 10.0, false), 0.0);
        assert_eq!(h.integral_range(-3.0, -1.0, true), 0.0);
        // Touching the lower edge still picks up the first bin.
        assert_eq!(h.integral_range(-3.0, 0.0, false), 1.0);
    }

    #[test]
    fn add_requires_same_binning() {
        let mut a = flux();
        a.add(&flux()).unwrap();
        assert_eq!(a.bin_content, vec![2.0, 4.0, 6.0]);
        let other = Histogram::from_parts("x", Axis::uniform(3, 0.0, 3.0).unwrap(), vec![0.0; 3]).unwrap();
        assert!(a.add(&other).is_err());
    }

    #[test]
    fn deserialize_validates_length() {
        let ok = r#"{"name":"f","axis":[0.0,1.0],"bin_content":[5.0]}"#;
        assert_eq!(serde_json::from_str::<Histogram>(ok).unwrap().integral(false), 5.0);
        let bad = r#"{"axis":[0.0,1.0],"bin_content":[5.0,1.0]}"#;
        assert!(serde_json::from_str::<Histogram>(bad).is_err());
    }
}
