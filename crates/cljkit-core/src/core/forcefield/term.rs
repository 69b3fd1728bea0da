use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Coulomb and Lennard-Jones energy totals in kcal/mol.
///
/// Zero is the identity; accumulation is plain field-wise addition, so the result is
/// reproducible bit-for-bit as long as terms are added in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CljEnergy {
    pub coulomb: f64,
    pub lj: f64,
}

impl CljEnergy {
    pub const ZERO: Self = Self {
        coulomb: 0.0,
        lj: 0.0,
    };

    pub fn new(coulomb: f64, lj: f64) -> Self {
        Self { coulomb, lj }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.coulomb + self.lj
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.coulomb.is_finite() && self.lj.is_finite()
    }
}

impl Add for CljEnergy {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            coulomb: self.coulomb + rhs.coulomb,
            lj: self.lj + rhs.lj,
        }
    }
}

impl AddAssign for CljEnergy {
    fn add_assign(&mut self, rhs: Self) {
        self.coulomb += rhs.coulomb;
        self.lj += rhs.lj;
    }
}

impl Sub for CljEnergy {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            coulomb: self.coulomb - rhs.coulomb,
            lj: self.lj - rhs.lj,
        }
    }
}

impl SubAssign for CljEnergy {
    fn sub_assign(&mut self, rhs: Self) {
        self.coulomb -= rhs.coulomb;
        self.lj -= rhs.lj;
    }
}

impl Neg for CljEnergy {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            coulomb: -self.coulomb,
            lj: -self.lj,
        }
    }
}

impl Mul<f64> for CljEnergy {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            coulomb: self.coulomb * rhs,
            lj: self.lj * rhs,
        }
    }
}

impl Sum for CljEnergy {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, term| acc + term)
    }
}
