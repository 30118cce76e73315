//! Bounded odometer over integer lattices.
//!
//! Enumerates every point of `Π[min_i, max_i)` by incrementing the first
//! axis and carrying into the next one when it wraps, like the wheels of an
//! odometer. The grid uses it to walk neighbor cells in any dimension; the
//! same routine enumerates arbitrary bounded boxes of cells.

/// Advance `current` to the next lattice point inside `[min, max)`.
///
/// Axis 0 moves fastest. Returns `false` (leaving `current` at `min`) after
/// the last point has been passed.
pub fn increment_bounded(current: &mut [i64], min: &[i64], max: &[i64]) -> bool {
    debug_assert_eq!(current.len(), min.len());
    debug_assert_eq!(current.len(), max.len());

    for axis in 0..current.len() {
        current[axis] += 1;
        if current[axis] < max[axis] {
            return true;
        }
        current[axis] = min[axis];
    }
    false
}

/// Iterator over every lattice point of a bounded box.
///
/// ```
/// use bio_tissue::simulation::odometer::BoundedOdometer;
///
/// let points: Vec<Vec<i64>> = BoundedOdometer::new(&[0, 0], &[2, 2]).collect();
/// assert_eq!(points, vec![vec![0, 0], vec![1, 0], vec![0, 1], vec![1, 1]]);
/// ```
#[derive(Debug, Clone)]
pub struct BoundedOdometer {
    current: Vec<i64>,
    min: Vec<i64>,
    max: Vec<i64>,
    done: bool,
}

impl BoundedOdometer {
    pub fn new(min: &[i64], max: &[i64]) -> Self {
        let empty = min.iter().zip(max).any(|(lo, hi)| lo >= hi);
        Self {
            current: min.to_vec(),
            min: min.to_vec(),
            max: max.to_vec(),
            done: empty,
        }
    }

    /// Number of points the odometer visits in total.
    pub fn point_count(&self) -> usize {
        self.min
            .iter()
            .zip(&self.max)
            .map(|(lo, hi)| (hi - lo).max(0) as usize)
            .product()
    }
}

impl Iterator for BoundedOdometer {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let point = self.current.clone();
        self.done = !increment_bounded(&mut self.current, &self.min, &self.max);
        Some(point)
    }
}
