//! Uniform Neighborhood Grid for Interaction Forces
//!
//! Divides the unit cube `[0, 1)^D` into a uniform grid. Each grid cell keeps a
//! bounded list of the particle ids whose position falls inside it. Interaction
//! forces then only examine a particle's own cell and the cells within
//! Chebyshev distance 1, so the cost per particle is bounded by
//! `max_per_cell * 3^D` instead of the total particle count.
//!
//! ## Rebuild
//!
//! The grid is rebuilt from scratch every step in O(n). Only the cells that
//! were occupied in the previous rebuild are reset, so a sparse tissue in a
//! fine grid does not pay for the empty cells.
//!
//! ## Out-of-range positions
//!
//! Positions outside `[0, 1)` are clamped onto the border cells. Every active
//! particle therefore lands in exactly one cell.
//!
//! ## Overflow
//!
//! Each cell holds at most `max_per_cell` ids. A particle arriving at a full
//! cell is dropped from that cell's list for this rebuild; the event is
//! counted in [`GridStats`] and logged once per rebuild. Overflow is expected
//! briefly during dense division bursts and only degrades interaction accuracy.

use crate::simulation::odometer::increment_bounded;

/// Highest dimension the grid enumerates without allocating.
pub const MAX_DIMENSION: usize = 4;

/// Occupancy statistics of the most recent rebuild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GridStats {
    /// Grid cells holding at least one particle
    pub occupied_cells: usize,
    /// Largest number of particles listed in one cell
    pub max_occupancy: usize,
    /// Particles dropped during the last rebuild
    pub last_overflow: usize,
    /// Particles dropped over the lifetime of the grid
    pub overflow_events: u64,
}

/// Bounded-list spatial grid over the unit cube.
#[derive(Debug, Clone)]
pub struct NeighborhoodGrid {
    dimension: usize,
    /// Number of grid cells along each axis
    cells_per_axis: Vec<usize>,
    /// Linear index stride of each axis (axis 0 has stride 1)
    strides: Vec<usize>,
    max_per_cell: usize,
    /// Flat `[num_cells * max_per_cell]` array of particle ids
    cell_contents: Vec<u32>,
    /// Listed particles per grid cell
    cell_counts: Vec<u32>,
    /// Grid cells touched by the last rebuild
    used_cells: Vec<usize>,
    last_overflow: usize,
    overflow_events: u64,
}

impl NeighborhoodGrid {
    /// Create an empty grid.
    ///
    /// # Arguments
    /// * `cells_per_axis` - Grid resolution along each axis; its length is the dimension
    /// * `max_per_cell` - Capacity of each cell's particle list
    ///
    /// # Panics
    /// If the dimension is 0 or above [`MAX_DIMENSION`], or any axis has zero cells.
    pub fn new(cells_per_axis: &[usize], max_per_cell: usize) -> Self {
        let dimension = cells_per_axis.len();
        assert!(
            (1..=MAX_DIMENSION).contains(&dimension),
            "grid dimension must be within 1..={MAX_DIMENSION}"
        );
        assert!(
            cells_per_axis.iter().all(|&n| n > 0),
            "every axis needs at least one grid cell"
        );

        let mut strides = Vec::with_capacity(dimension);
        let mut stride = 1;
        for &n in cells_per_axis {
            strides.push(stride);
            stride *= n;
        }
        let num_cells = stride;

        Self {
            dimension,
            cells_per_axis: cells_per_axis.to_vec(),
            strides,
            max_per_cell,
            cell_contents: vec![0; num_cells * max_per_cell],
            cell_counts: vec![0; num_cells],
            used_cells: Vec::new(),
            last_overflow: 0,
            overflow_events: 0,
        }
    }

    /// Same resolution on every axis.
    pub fn uniform(dimension: usize, cells: usize, max_per_cell: usize) -> Self {
        Self::new(&vec![cells; dimension], max_per_cell)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn cells_per_axis(&self) -> &[usize] {
        &self.cells_per_axis
    }

    pub fn max_per_cell(&self) -> usize {
        self.max_per_cell
    }

    pub fn num_cells(&self) -> usize {
        self.cell_counts.len()
    }

    /// Reset occupancy without releasing memory.
    pub fn clear(&mut self) {
        for &cell in &self.used_cells {
            self.cell_counts[cell] = 0;
        }
        self.used_cells.clear();
        self.last_overflow = 0;
    }

    /// Rebuild occupancy from the first `active_count` particles of `positions`.
    ///
    /// `positions` is the flattened current position buffer (`dimension`
    /// floats per particle).
    pub fn update(&mut self, positions: &[f32], active_count: usize) {
        self.clear();

        let d = self.dimension;
        for id in 0..active_count {
            let cell = self.cell_of(&positions[id * d..(id + 1) * d]);
            let count = self.cell_counts[cell] as usize;
            if count == 0 {
                self.used_cells.push(cell);
            }
            if count >= self.max_per_cell {
                self.last_overflow += 1;
                continue;
            }
            self.cell_contents[cell * self.max_per_cell + count] = id as u32;
            self.cell_counts[cell] += 1;
        }

        if self.last_overflow > 0 {
            self.overflow_events += self.last_overflow as u64;
            log::warn!(
                "Neighborhood grid overflow: {} particles dropped (max {} per cell)",
                self.last_overflow,
                self.max_per_cell
            );
        }
    }

    /// Grid coordinate of a position along one axis, clamped into the grid.
    #[inline]
    fn axis_coordinate(&self, axis: usize, value: f32) -> i64 {
        let n = self.cells_per_axis[axis] as i64;
        ((value * n as f32).floor() as i64).clamp(0, n - 1)
    }

    /// Linear index of the grid cell containing `position`.
    pub fn cell_of(&self, position: &[f32]) -> usize {
        debug_assert_eq!(position.len(), self.dimension);
        position
            .iter()
            .enumerate()
            .map(|(axis, &x)| self.axis_coordinate(axis, x) as usize * self.strides[axis])
            .sum()
    }

    /// Linear index of a grid coordinate, or `None` outside the grid.
    pub fn cell_index(&self, coordinates: &[i64]) -> Option<usize> {
        let mut index = 0;
        for (axis, &c) in coordinates.iter().enumerate() {
            if c < 0 || c >= self.cells_per_axis[axis] as i64 {
                return None;
            }
            index += c as usize * self.strides[axis];
        }
        Some(index)
    }

    /// Grid coordinate of a linear cell index.
    pub fn cell_coordinates(&self, cell: usize) -> Vec<i64> {
        (0..self.dimension)
            .map(|axis| ((cell / self.strides[axis]) % self.cells_per_axis[axis]) as i64)
            .collect()
    }

    /// Particle ids listed in a grid cell.
    #[inline]
    pub fn particles_in(&self, cell: usize) -> &[u32] {
        let start = cell * self.max_per_cell;
        &self.cell_contents[start..start + self.cell_counts[cell] as usize]
    }

    /// Visit `cell` and every cell within Chebyshev distance 1 of it.
    pub fn for_each_neighbor_cell(&self, cell: usize, mut visit: impl FnMut(usize)) {
        let d = self.dimension;
        let mut min = [0i64; MAX_DIMENSION];
        let mut max = [0i64; MAX_DIMENSION];
        for axis in 0..d {
            let c = ((cell / self.strides[axis]) % self.cells_per_axis[axis]) as i64;
            min[axis] = (c - 1).max(0);
            max[axis] = (c + 2).min(self.cells_per_axis[axis] as i64);
        }
        self.for_each_cell_in_box(&min[..d], &max[..d], &mut visit);
    }

    /// Visit the ids listed in the home cell of `position` and its neighbor cells.
    pub fn for_each_neighbor(&self, position: &[f32], mut visit: impl FnMut(u32)) {
        let home = self.cell_of(position);
        self.for_each_neighbor_cell(home, |cell| {
            for &id in self.particles_in(cell) {
                visit(id);
            }
        });
    }

    /// Visit the ids listed in every cell overlapping the box `point ± radius`.
    ///
    /// Candidates are not filtered by distance; callers test the exact shape.
    pub fn particles_near(&self, point: &[f32], radius: f32, mut visit: impl FnMut(u32)) {
        let d = self.dimension;
        let mut min = [0i64; MAX_DIMENSION];
        let mut max = [0i64; MAX_DIMENSION];
        for axis in 0..d {
            min[axis] = self.axis_coordinate(axis, point[axis] - radius);
            max[axis] = self.axis_coordinate(axis, point[axis] + radius) + 1;
        }
        self.for_each_cell_in_box(&min[..d], &max[..d], &mut |cell| {
            for &id in self.particles_in(cell) {
                visit(id);
            }
        });
    }

    fn for_each_cell_in_box(&self, min: &[i64], max: &[i64], visit: &mut impl FnMut(usize)) {
        if min.iter().zip(max).any(|(lo, hi)| lo >= hi) {
            return;
        }
        let mut current = [0i64; MAX_DIMENSION];
        let current = &mut current[..min.len()];
        current.copy_from_slice(min);
        loop {
            // Coordinates stay within [min, max), which was clipped to the grid.
            let cell = current
                .iter()
                .enumerate()
                .map(|(axis, &c)| c as usize * self.strides[axis])
                .sum();
            visit(cell);
            if !increment_bounded(current, min, max) {
                break;
            }
        }
    }

    pub fn stats(&self) -> GridStats {
        let max_occupancy = self
            .used_cells
            .iter()
            .map(|&cell| self.cell_counts[cell] as usize)
            .max()
            .unwrap_or(0);
        GridStats {
            occupied_cells: self.used_cells.len(),
            max_occupancy,
            last_overflow: self.last_overflow,
            overflow_events: self.overflow_events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_neighbors(grid: &NeighborhoodGrid, position: &[f32]) -> Vec<u32> {
        let mut ids = Vec::new();
        grid.for_each_neighbor(position, |id| ids.push(id));
        ids.sort_unstable();
        ids
    }

    #[test]
    fn every_particle_lands_in_exactly_one_cell() {
        let mut grid = NeighborhoodGrid::uniform(2, 4, 8);
        let positions = [0.1, 0.1, 0.9, 0.9, 0.3, 0.6, 0.31, 0.61];
        grid.update(&positions, 4);

        let mut seen = vec![0; 4];
        for cell in 0..grid.num_cells() {
            for &id in grid.particles_in(cell) {
                seen[id as usize] += 1;
            }
        }
        assert_eq!(seen, vec![1, 1, 1, 1]);
        assert_eq!(grid.stats().occupied_cells, 3);
        assert_eq!(grid.stats().max_occupancy, 2);
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        let grid = NeighborhoodGrid::uniform(2, 4, 8);
        assert_eq!(grid.cell_of(&[-0.5, -3.0]), 0);
        assert_eq!(grid.cell_of(&[1.0, 1.0]), grid.num_cells() - 1);
        assert_eq!(grid.cell_of(&[7.0, 0.0]), 3);
    }

    #[test]
    fn cell_coordinates_roundtrip_linear_index() {
        let grid = NeighborhoodGrid::new(&[3, 4, 5], 1);
        for cell in 0..grid.num_cells() {
            let coords = grid.cell_coordinates(cell);
            assert_eq!(grid.cell_index(&coords), Some(cell));
        }
        assert_eq!(grid.cell_index(&[3, 0, 0]), None);
        assert_eq!(grid.cell_index(&[0, -1, 0]), None);
    }

    #[test]
    fn neighbor_cells_are_clipped_at_the_border() {
        let grid = NeighborhoodGrid::uniform(3, 5, 1);
        let mut corner = Vec::new();
        grid.for_each_neighbor_cell(0, |c| corner.push(c));
        assert_eq!(corner.len(), 8);

        let center = grid.cell_index(&[2, 2, 2]).unwrap();
        let mut inner = Vec::new();
        grid.for_each_neighbor_cell(center, |c| inner.push(c));
        assert_eq!(inner.len(), 27);
        assert!(inner.contains(&center));
    }

    #[test]
    fn distant_particles_are_not_neighbors() {
        let mut grid = NeighborhoodGrid::uniform(2, 4, 8);
        grid.update(&[0.0, 0.0, 1.0, 1.0], 2);
        assert_eq!(collect_neighbors(&grid, &[0.0, 0.0]), vec![0]);
        assert_eq!(collect_neighbors(&grid, &[1.0, 1.0]), vec![1]);
    }

    #[test]
    fn adjacent_cells_are_neighbors() {
        let mut grid = NeighborhoodGrid::uniform(2, 4, 8);
        grid.update(&[0.24, 0.24, 0.26, 0.26], 2);
        assert_eq!(collect_neighbors(&grid, &[0.24, 0.24]), vec![0, 1]);
    }

    #[test]
    fn overflow_drops_and_counts() {
        let mut grid = NeighborhoodGrid::uniform(2, 2, 2);
        let positions = [0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.8, 0.8];
        grid.update(&positions, 4);

        let stats = grid.stats();
        assert_eq!(stats.last_overflow, 1);
        assert_eq!(stats.overflow_events, 1);
        assert_eq!(grid.particles_in(0), &[0, 1]);

        grid.update(&positions, 4);
        assert_eq!(grid.stats().overflow_events, 2);

        grid.update(&positions, 2);
        assert_eq!(grid.stats().last_overflow, 0);
    }

    #[test]
    fn clear_only_resets_counts() {
        let mut grid = NeighborhoodGrid::uniform(2, 4, 4);
        grid.update(&[0.5, 0.5], 1);
        grid.clear();
        for cell in 0..grid.num_cells() {
            assert!(grid.particles_in(cell).is_empty());
        }
        assert_eq!(grid.stats().occupied_cells, 0);
    }

    #[test]
    fn particles_near_covers_the_query_box() {
        let mut grid = NeighborhoodGrid::uniform(2, 10, 4);
        let positions = [0.05, 0.05, 0.35, 0.05, 0.95, 0.95];
        grid.update(&positions, 3);

        let mut ids = Vec::new();
        grid.particles_near(&[0.2, 0.05], 0.16, |id| ids.push(id));
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }
}
