use super::params::CombiningRule;

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

/// Separations below this floor (Å) are evaluated at the floor, so coincident atoms give a
/// large but finite energy instead of NaN or infinity.
pub const MIN_PAIR_DISTANCE: f64 = 1e-6;

#[inline]
pub fn coulomb(dist: f64, q1q2: f64) -> f64 {
    COULOMB_CONSTANT * q1q2 / dist.max(MIN_PAIR_DISTANCE)
}

/// `-dE/dr` of [`coulomb`].
#[inline]
pub fn coulomb_force(dist: f64, q1q2: f64) -> f64 {
    let r = dist.max(MIN_PAIR_DISTANCE);
    COULOMB_CONSTANT * q1q2 / (r * r)
}

/// Force-shifted Coulomb: both the energy and its derivative vanish at `cutoff`.
#[inline]
pub fn coulomb_force_shifted(dist: f64, q1q2: f64, cutoff: f64) -> f64 {
    let r = dist.max(MIN_PAIR_DISTANCE);
    COULOMB_CONSTANT * q1q2 * (1.0 / r - 1.0 / cutoff + (r - cutoff) / (cutoff * cutoff))
}

/// `-dE/dr` of [`coulomb_force_shifted`].
#[inline]
pub fn coulomb_force_shifted_force(dist: f64, q1q2: f64, cutoff: f64) -> f64 {
    let r = dist.max(MIN_PAIR_DISTANCE);
    COULOMB_CONSTANT * q1q2 * (1.0 / (r * r) - 1.0 / (cutoff * cutoff))
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    let rho = sigma / dist.max(MIN_PAIR_DISTANCE);
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    4.0 * epsilon * (rho12 - rho6)
}

/// `-dE/dr` of [`lennard_jones_12_6`].
#[inline]
pub fn lennard_jones_12_6_force(dist: f64, sigma: f64, epsilon: f64) -> f64 {
    let r = dist.max(MIN_PAIR_DISTANCE);
    let rho = sigma / r;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    24.0 * epsilon * (2.0 * rho12 - rho6) / r
}

/// Mixes two per-atom `(sigma, epsilon)` pairs into the pair parameters.
#[inline]
pub fn combine(rule: CombiningRule, a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let epsilon = (a.1 * b.1).sqrt();
    let sigma = match rule {
        CombiningRule::Geometric => (a.0 * b.0).sqrt(),
        CombiningRule::LorentzBerthelot => 0.5 * (a.0 + b.0),
    };
    (sigma, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn numerical_force(f: impl Fn(f64) -> f64, r: f64) -> f64 {
        let h = 1e-6;
        -(f(r + h) - f(r - h)) / (2.0 * h)
    }

    #[test]
    fn lennard_jones_at_minimum_returns_negative_well_depth() {
        let sigma: f64 = 3.15365;
        let r_min = sigma * 2f64.powf(1.0 / 6.0);
        let energy = lennard_jones_12_6(r_min, sigma, 0.1550);
        assert!(f64_approx_equal(energy, -0.1550));
    }

    #[test]
    fn lennard_jones_is_zero_at_sigma() {
        assert!(f64_approx_equal(lennard_jones_12_6(3.0, 3.0, 0.5), 0.0));
    }

    #[test]
    fn lennard_jones_at_coincident_atoms_is_finite_and_repulsive() {
        let energy = lennard_jones_12_6(0.0, 3.0, 0.2);
        assert!(energy.is_finite());
        assert!(energy > 0.0);
    }

    #[test]
    fn coulomb_of_opposite_unit_charges_at_one_angstrom() {
        assert!(f64_approx_equal(coulomb(1.0, -1.0), -COULOMB_CONSTANT));
    }

    #[test]
    fn coulomb_at_coincident_atoms_is_finite_with_correct_sign() {
        assert!(coulomb(0.0, 1.0).is_finite());
        assert!(coulomb(0.0, 1.0) > 0.0);
        assert!(coulomb(0.0, -1.0) < 0.0);
    }

    #[test]
    fn force_shifted_coulomb_vanishes_at_cutoff() {
        assert!(f64_approx_equal(coulomb_force_shifted(10.0, 1.0, 10.0), 0.0));
        assert!(f64_approx_equal(coulomb_force_shifted_force(10.0, 1.0, 10.0), 0.0));
    }

    #[test]
    fn analytic_forces_match_numerical_derivatives() {
        let r = 3.7;
        let lj = numerical_force(|d| lennard_jones_12_6(d, 3.2, 0.3), r);
        assert!((lj - lennard_jones_12_6_force(r, 3.2, 0.3)).abs() < 1e-6);

        let c = numerical_force(|d| coulomb(d, 0.42), r);
        assert!((c - coulomb_force(r, 0.42)).abs() < 1e-6);

        let s = numerical_force(|d| coulomb_force_shifted(d, 0.42, 9.0), r);
        assert!((s - coulomb_force_shifted_force(r, 0.42, 9.0)).abs() < 1e-6);
    }

    #[test]
    fn combining_rules_mix_sigma_differently() {
        let a = (3.0, 0.1);
        let b = (4.0, 0.4);
        let (sg, eg) = combine(CombiningRule::Geometric, a, b);
        let (sl, el) = combine(CombiningRule::LorentzBerthelot, a, b);
        assert!(f64_approx_equal(sg, 12f64.sqrt()));
        assert!(f64_approx_equal(sl, 3.5));
        assert!(f64_approx_equal(eg, 0.2));
        assert!(f64_approx_equal(el, 0.2));
    }
}
