//! Axis-aligned ellipsoid iso-surface.
//!
//! In D dimensions the surface satisfies `Σ((x_i - c_i) / a_i)² = 1`, where
//! `c` is the center and `a_i = radius * axes_i / 2` are the semi-axes (axis
//! lengths are given as relative diameters). A sphere is the degenerate case
//! with equal axes.

use crate::geometry::IsoSurface;
use crate::simulation::neighborhood_grid::MAX_DIMENSION;

/// Axis-aligned ellipsoid evaluated with the accumulator protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipsoid {
    dimension: usize,
    center: [f32; MAX_DIMENSION],
    semi_axes: [f32; MAX_DIMENSION],
    coordinates: [f32; MAX_DIMENSION],
    count: usize,
}

impl Ellipsoid {
    /// Create an ellipsoid.
    ///
    /// # Arguments
    /// * `dimension` - Number of coordinates per query
    /// * `radius` - Overall scale
    /// * `center` - At least `dimension` center coordinates
    /// * `axes` - At least `dimension` relative axis lengths (diameters in units of `radius`)
    ///
    /// # Panics
    /// If `center` or `axes` is shorter than `dimension`, or a semi-axis is not positive.
    pub fn new(dimension: usize, radius: f32, center: &[f32], axes: &[f32]) -> Self {
        assert!(
            (1..=MAX_DIMENSION).contains(&dimension),
            "ellipsoid dimension must be within 1..={MAX_DIMENSION}"
        );
        assert!(center.len() >= dimension && axes.len() >= dimension);

        let mut c = [0.0; MAX_DIMENSION];
        let mut a = [1.0; MAX_DIMENSION];
        for i in 0..dimension {
            c[i] = center[i];
            a[i] = 0.5 * radius * axes[i];
            assert!(a[i] > 0.0, "ellipsoid semi-axes must be positive");
        }

        Self {
            dimension,
            center: c,
            semi_axes: a,
            coordinates: [0.0; MAX_DIMENSION],
            count: 0,
        }
    }

    /// Ellipsoid centered at `(a, b, c)` with the same relative `axis` on every axis.
    pub fn centered(dimension: usize, center: [f32; 3], radius: f32, axis: f32) -> Self {
        Self::new(dimension, radius, &center, &[axis; MAX_DIMENSION])
    }

    /// Sphere of the given radius (`axes = 2` so the semi-axis equals `radius`).
    pub fn sphere(dimension: usize, radius: f32, center: &[f32]) -> Self {
        Self::new(dimension, radius, center, &[2.0; MAX_DIMENSION])
    }

    pub fn center(&self) -> &[f32] {
        &self.center[..self.dimension]
    }

    pub fn semi_axes(&self) -> &[f32] {
        &self.semi_axes[..self.dimension]
    }

    /// Outward partial derivative along `axis`.
    #[inline]
    fn partial(&self, axis: usize) -> f32 {
        let a = self.semi_axes[axis];
        2.0 * (self.coordinates[axis] - self.center[axis]) / (a * a)
    }
}

impl IsoSurface for Ellipsoid {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn clear(&mut self) {
        self.count = 0;
    }

    fn add_coordinate(&mut self, value: f32) {
        debug_assert!(
            self.count < self.dimension,
            "more than {} coordinates supplied",
            self.dimension
        );
        self.coordinates[self.count] = value;
        self.count += 1;
    }

    fn coordinate_count(&self) -> usize {
        self.count
    }

    fn distance(&self) -> f32 {
        debug_assert_eq!(
            self.count, self.dimension,
            "iso-surface queried before all coordinates were supplied"
        );
        let sum: f32 = (0..self.dimension)
            .map(|i| {
                let u = (self.coordinates[i] - self.center[i]) / self.semi_axes[i];
                u * u
            })
            .sum();
        sum - 1.0
    }

    fn normalized_gradient(&self, axis: usize) -> f32 {
        debug_assert_eq!(
            self.count, self.dimension,
            "iso-surface queried before all coordinates were supplied"
        );
        let norm = (0..self.dimension)
            .map(|i| self.partial(i).powi(2))
            .sum::<f32>()
            .sqrt();
        if norm == 0.0 {
            return 0.0;
        }
        -self.partial(axis) / norm
    }

    fn box_clone(&self) -> Box<dyn IsoSurface> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn regression_point_on_the_surface() {
        let mut ellipsoid = Ellipsoid::centered(2, [0.5, 0.5, 0.5], 1.0, 0.5);
        ellipsoid.clear();
        ellipsoid.add_coordinate(0.5);
        ellipsoid.add_coordinate(0.75);

        assert!(ellipsoid.distance().abs() < EPS, "distance {}", ellipsoid.distance());
        assert!(ellipsoid.normalized_gradient(0).abs() < EPS);
        assert!((ellipsoid.normalized_gradient(1) + 1.0).abs() < EPS);
    }

    #[test]
    fn sign_follows_inside_and_outside() {
        let mut sphere = Ellipsoid::sphere(3, 0.25, &[0.5, 0.5, 0.5]);
        assert!(sphere.evaluate(&[0.5, 0.5, 0.5]) < 0.0);
        assert!(sphere.evaluate(&[0.9, 0.5, 0.5]) > 0.0);
        assert!(sphere.evaluate(&[0.75, 0.5, 0.5]).abs() < EPS);
    }

    #[test]
    fn gradient_points_inward_with_unit_length() {
        let mut ellipsoid = Ellipsoid::new(3, 1.0, &[0.5, 0.5, 0.5], &[0.8, 0.4, 0.4]);
        ellipsoid.evaluate(&[0.9, 0.7, 0.6]);
        let g: Vec<f32> = (0..3).map(|i| ellipsoid.normalized_gradient(i)).collect();
        let length = g.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((length - 1.0).abs() < EPS);
        assert!(g.iter().all(|&v| v < 0.0));
    }

    #[test]
    fn gradient_is_zero_at_center() {
        let mut sphere = Ellipsoid::sphere(2, 0.3, &[0.5, 0.5]);
        sphere.evaluate(&[0.5, 0.5]);
        assert_eq!(sphere.normalized_gradient(0), 0.0);
        assert_eq!(sphere.normalized_gradient(1), 0.0);
    }

    #[test]
    fn try_distance_requires_complete_point() {
        let mut sphere = Ellipsoid::sphere(3, 0.3, &[0.5, 0.5, 0.5]);
        sphere.clear();
        sphere.add_coordinate(0.5);
        assert_eq!(sphere.try_distance(), None);
        sphere.add_coordinate(0.5);
        sphere.add_coordinate(0.5);
        assert!(sphere.try_distance().is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "before all coordinates")]
    fn incomplete_query_fails_fast() {
        let mut sphere = Ellipsoid::sphere(2, 0.3, &[0.5, 0.5]);
        sphere.clear();
        sphere.add_coordinate(0.1);
        let _ = sphere.distance();
    }
}
