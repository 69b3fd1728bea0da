use serde::{Deserialize, Serialize};

/// Default width of the switching region, in Angstroms.
pub const DEFAULT_FEATHER: f64 = 1.0;

/// Smoothing applied between `cutoff - feather` and `cutoff`.
///
/// Each feather is the width of the switching region in Angstroms. A feather of zero is
/// plain truncation at the cutoff. The default is CHARMM-style switching over
/// [`DEFAULT_FEATHER`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "kebab-case",
    rename_all_fields = "kebab-case",
    tag = "kind"
)]
pub enum SwitchingFunction {
    /// Hard truncation: full interaction inside the cutoff, none outside.
    None,
    /// `S = (Rc² - r²) / (Rc² - Ron²)`.
    Harmonic { coulomb_feather: f64, lj_feather: f64 },
    /// CHARMM-style `S = (Rc² - r²)² (Rc² + 2r² - 3Ron²) / (Rc² - Ron²)³`, smooth in both
    /// the energy and its first derivative.
    Charmm { coulomb_feather: f64, lj_feather: f64 },
}

impl Default for SwitchingFunction {
    fn default() -> Self {
        Self::Charmm {
            coulomb_feather: DEFAULT_FEATHER,
            lj_feather: DEFAULT_FEATHER,
        }
    }
}

impl SwitchingFunction {
    /// `(coulomb_feather, lj_feather)` for the smoothing variants.
    pub fn feathers(&self) -> Option<(f64, f64)> {
        match *self {
            Self::None => None,
            Self::Harmonic {
                coulomb_feather,
                lj_feather,
            }
            | Self::Charmm {
                coulomb_feather,
                lj_feather,
            } => Some((coulomb_feather, lj_feather)),
        }
    }

    pub fn coulomb_window(&self, cutoff: f64) -> SwitchWindow {
        let feather = self.feathers().map_or(0.0, |(c, _)| c);
        SwitchWindow::new(self.shape(), cutoff, feather)
    }

    pub fn lj_window(&self, cutoff: f64) -> SwitchWindow {
        let feather = self.feathers().map_or(0.0, |(_, l)| l);
        SwitchWindow::new(self.shape(), cutoff, feather)
    }

    fn shape(&self) -> Shape {
        match self {
            Self::None => Shape::Truncate,
            Self::Harmonic { .. } => Shape::Harmonic,
            Self::Charmm { .. } => Shape::Charmm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Truncate,
    Harmonic,
    Charmm,
}

/// A switching function resolved against one cutoff, with its constants precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchWindow {
    shape: Shape,
    r_on2: f64,
    r_off2: f64,
    inv_denominator: f64,
}

impl SwitchWindow {
    fn new(shape: Shape, cutoff: f64, feather: f64) -> Self {
        let r_on = (cutoff - feather).max(0.0);
        let r_on2 = r_on * r_on;
        let r_off2 = cutoff * cutoff;
        let width2 = r_off2 - r_on2;
        let shape = if width2 <= 0.0 { Shape::Truncate } else { shape };
        let inv_denominator = match shape {
            Shape::Truncate => 0.0,
            Shape::Harmonic => 1.0 / width2,
            Shape::Charmm => 1.0 / (width2 * width2 * width2),
        };
        Self {
            shape,
            r_on2,
            r_off2,
            inv_denominator,
        }
    }

    /// Returns `(S, dS/dr)` at separation `r` (with `r2 = r * r`).
    ///
    /// Callers only evaluate pairs inside the cutoff; beyond it the scale is zero.
    #[inline]
    pub fn scale(&self, r: f64, r2: f64) -> (f64, f64) {
        if r2 >= self.r_off2 {
            return (0.0, 0.0);
        }
        if self.shape == Shape::Truncate || r2 <= self.r_on2 {
            return (1.0, 0.0);
        }
        let a = self.r_off2 - r2;
        match self.shape {
            Shape::Harmonic => (a * self.inv_denominator, -2.0 * r * self.inv_denominator),
            Shape::Charmm => {
                let value = a * a * (self.r_off2 + 2.0 * r2 - 3.0 * self.r_on2) * self.inv_denominator;
                let derivative = 12.0 * r * a * (self.r_on2 - r2) * self.inv_denominator;
                (value, derivative)
            }
            Shape::Truncate => (1.0, 0.0),
        }
    }
}
