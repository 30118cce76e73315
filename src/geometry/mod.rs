//! # Iso-Surface Geometry
//!
//! Implicit shapes used to constrain tissue growth (the embryo boundary) and
//! to select regions for morphogen operators.
//!
//! ## Accumulator protocol
//!
//! Surfaces are queried one coordinate at a time so that callers iterating a
//! flattened position buffer never build a point object:
//!
//! ```text
//! clear() ─► add_coordinate(x0) ─► ... ─► add_coordinate(x{D-1}) ─► distance()
//!                                                                 └► normalized_gradient(i)
//! ```
//!
//! Querying before all `dimension()` coordinates were supplied is a
//! programming error. Debug builds panic; [`IsoSurface::try_distance`] offers a
//! checked alternative.
//!
//! ## Sign convention
//!
//! `distance() < 0` inside the shape, `0` on the surface, `> 0` outside.
//! The normalized gradient points **inward**, the direction that moves a
//! point back toward the inside of the shape.

pub mod ellipsoid;

pub use ellipsoid::Ellipsoid;

/// Implicit surface evaluated through the coordinate accumulator protocol.
pub trait IsoSurface: Send + Sync + std::fmt::Debug {
    /// Number of coordinates per query.
    fn dimension(&self) -> usize;

    /// Forget the coordinates of the previous query.
    fn clear(&mut self);

    /// Supply the next coordinate of the query point.
    fn add_coordinate(&mut self, value: f32);

    /// Number of coordinates supplied since the last `clear()`.
    fn coordinate_count(&self) -> usize;

    /// Signed distance-like value of the query point.
    fn distance(&self) -> f32;

    /// Component `axis` of the unit inward gradient at the query point.
    fn normalized_gradient(&self, axis: usize) -> f32;

    fn box_clone(&self) -> Box<dyn IsoSurface>;

    /// `distance()`, or `None` if the query point is incomplete.
    fn try_distance(&self) -> Option<f32> {
        (self.coordinate_count() == self.dimension()).then(|| self.distance())
    }

    /// Run a full query for `point`.
    fn evaluate(&mut self, point: &[f32]) -> f32 {
        self.clear();
        for &x in point {
            self.add_coordinate(x);
        }
        self.distance()
    }
}

impl Clone for Box<dyn IsoSurface> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}
