use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Periodic box dimensions must be positive and finite, got {0:?}")]
    InvalidDimensions([f64; 3]),
    #[error(
        "Cutoff {cutoff} Å exceeds half of the smallest box dimension ({half_box} Å); the minimum image would not be unique"
    )]
    CutoffExceedsHalfBox { cutoff: f64, half_box: f64 },
}

/// The boundary conditions atoms live in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum Space {
    /// Infinite, non-periodic space. Distances are plain Euclidean distances.
    #[default]
    Vacuum,
    /// Rectangular periodic box with edge lengths `dimensions` (Angstroms).
    Periodic { dimensions: Vector3<f64> },
}

impl Space {
    pub fn periodic(x: f64, y: f64, z: f64) -> Self {
        Self::Periodic {
            dimensions: Vector3::new(x, y, z),
        }
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic { .. })
    }

    pub fn dimensions(&self) -> Option<Vector3<f64>> {
        match *self {
            Self::Vacuum => None,
            Self::Periodic { dimensions } => Some(dimensions),
        }
    }

    /// Maps a separation vector to its shortest periodic image.
    #[inline]
    pub fn minimum_image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        match self {
            Self::Vacuum => delta,
            Self::Periodic { dimensions } => Vector3::new(
                delta.x - dimensions.x * (delta.x / dimensions.x).round(),
                delta.y - dimensions.y * (delta.y / dimensions.y).round(),
                delta.z - dimensions.z * (delta.z / dimensions.z).round(),
            ),
        }
    }

    /// Squared distance between two points, using the minimum-image convention under
    /// periodic boundaries.
    #[inline]
    pub fn distance_squared(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.minimum_image(b - a).norm_squared()
    }

    /// Folds a point back into the primary box `[0, L)`. Vacuum points are unchanged.
    pub fn wrap(&self, point: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Vacuum => *point,
            Self::Periodic { dimensions } => Point3::new(
                point.x - dimensions.x * (point.x / dimensions.x).floor(),
                point.y - dimensions.y * (point.y / dimensions.y).floor(),
                point.z - dimensions.z * (point.z / dimensions.z).floor(),
            ),
        }
    }

    /// Checks that the box is usable with the given cutoff.
    pub fn validate(&self, max_cutoff: f64) -> Result<(), SpaceError> {
        let Self::Periodic { dimensions } = self else {
            return Ok(());
        };
        if !dimensions.iter().all(|&d| d.is_finite() && d > 0.0) {
            return Err(SpaceError::InvalidDimensions([
                dimensions.x,
                dimensions.y,
                dimensions.z,
            ]));
        }
        let half_box = 0.5 * dimensions.min();
        if max_cutoff > half_box {
            return Err(SpaceError::CutoffExceedsHalfBox {
                cutoff: max_cutoff,
                half_box,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    #[test]
    fn vacuum_distance_is_euclidean() {
        let space = Space::Vacuum;
        let d2 = space.distance_squared(&Point3::new(0.0, 0.0, 0.0), &Point3::new(3.0, 4.0, 0.0));
        assert!((d2 - 25.0).abs() < TOLERANCE);
    }

    #[test]
    fn periodic_distance_uses_nearest_image() {
        let space = Space::periodic(20.0, 20.0, 20.0);
        let a = Point3::new(1.0, 0.0, 0.0);
        let b = Point3::new(19.0, 0.0, 0.0);
        let d2 = space.distance_squared(&a, &b);
        assert!((d2 - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn periodic_distance_handles_points_outside_the_primary_box() {
        let space = Space::periodic(10.0, 10.0, 10.0);
        let a = Point3::new(-31.0, 0.5, 0.0);
        let b = Point3::new(1.0, 0.5, 0.0);
        let d2 = space.distance_squared(&a, &b);
        assert!((d2 - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn wrap_folds_into_primary_box() {
        let space = Space::periodic(10.0, 10.0, 10.0);
        let wrapped = space.wrap(&Point3::new(-1.0, 12.5, 10.0));
        assert!((wrapped.x - 9.0).abs() < TOLERANCE);
        assert!((wrapped.y - 2.5).abs() < TOLERANCE);
        assert!(wrapped.z.abs() < TOLERANCE);
    }

    #[test]
    fn validate_rejects_cutoff_larger_than_half_box() {
        let space = Space::periodic(20.0, 20.0, 14.0);
        assert!(space.validate(7.0).is_ok());
        assert!(matches!(
            space.validate(7.5),
            Err(SpaceError::CutoffExceedsHalfBox { .. })
        ));
    }

    #[test]
    fn validate_rejects_non_positive_dimensions() {
        let space = Space::periodic(20.0, 0.0, 20.0);
        assert!(matches!(
            space.validate(1.0),
            Err(SpaceError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn vacuum_always_validates() {
        assert!(Space::Vacuum.validate(1.0e6).is_ok());
    }
}
