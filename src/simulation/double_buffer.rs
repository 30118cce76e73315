//! # Double-Buffered Attribute Storage
//!
//! Every per-particle attribute is stored twice: a **current** copy that all
//! readers observe during a step, and a **next** copy that the step writes.
//! Publishing the new state is a single [`DoubleBuffer::swap`], which flips an
//! index instead of copying data.
//!
//! ```text
//!            step N reads                 step N writes
//!   ┌──────────────────────────┐  ┌──────────────────────────┐
//!   │ slots[front] (current)   │  │ slots[1 - front] (next)  │
//!   └──────────────────────────┘  └──────────────────────────┘
//!                 ▲                             │
//!                 └──────── swap() flips ───────┘
//! ```
//!
//! Capacity is fixed at construction. Indexing past it panics: running out of
//! room means the caller sized the simulation wrong, which is not something a
//! step can recover from.

/// Two equally sized `f32` arrays with an O(1) swap.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    slots: [Vec<f32>; 2],
    front: usize,
}

impl DoubleBuffer {
    /// Create a buffer pair holding `len` zeroed values each.
    pub fn new(len: usize) -> Self {
        Self {
            slots: [vec![0.0; len], vec![0.0; len]],
            front: 0,
        }
    }

    /// Number of values per copy.
    pub fn len(&self) -> usize {
        self.slots[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-only view of the published snapshot.
    #[inline]
    pub fn current(&self) -> &[f32] {
        &self.slots[self.front]
    }

    /// Mutable view of the published snapshot.
    ///
    /// Only lifecycle operations that run *between* steps (adding, cloning or
    /// editing particles) write here; a step itself only writes [`Self::next_mut`].
    #[inline]
    pub fn current_mut(&mut self) -> &mut [f32] {
        &mut self.slots[self.front]
    }

    /// Read-only view of the buffer being prepared.
    #[inline]
    pub fn next(&self) -> &[f32] {
        &self.slots[1 - self.front]
    }

    /// Mutable view of the buffer being prepared.
    #[inline]
    pub fn next_mut(&mut self) -> &mut [f32] {
        &mut self.slots[1 - self.front]
    }

    /// Borrow current (read) and next (write) at the same time.
    #[inline]
    pub fn split(&mut self) -> (&[f32], &mut [f32]) {
        let (a, b) = self.slots.split_at_mut(1);
        if self.front == 0 {
            (&a[0], &mut b[0])
        } else {
            (&b[0], &mut a[0])
        }
    }

    /// Publish the next buffer. No data is copied.
    #[inline]
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    /// Copy `current[range]` into `next[range]`.
    pub fn copy_current_to_next(&mut self, begin: usize, end: usize) {
        let (current, next) = self.split();
        next[begin..end].copy_from_slice(&current[begin..end]);
    }

    /// Write `value` at `index` in both copies, so the edit survives the next swap
    /// regardless of whether the step rewrites that slot.
    pub fn set_both(&mut self, index: usize, value: f32) {
        self.slots[0][index] = value;
        self.slots[1][index] = value;
    }
}

/// The core particle attributes, each double-buffered.
///
/// Vector attributes (position, velocity) are flattened: particle `id` owns
/// `[id * dimension, (id + 1) * dimension)`.
#[derive(Debug, Clone)]
pub struct AttributeStore {
    dimension: usize,
    pub positions: DoubleBuffer,
    pub velocities: DoubleBuffer,
    pub radii: DoubleBuffer,
    pub target_radii: DoubleBuffer,
}

impl AttributeStore {
    pub fn new(dimension: usize, capacity: usize) -> Self {
        Self {
            dimension,
            positions: DoubleBuffer::new(capacity * dimension),
            velocities: DoubleBuffer::new(capacity * dimension),
            radii: DoubleBuffer::new(capacity),
            target_radii: DoubleBuffer::new(capacity),
        }
    }

    /// Publish every attribute at once.
    ///
    /// All four buffers flip together; there is no state in which some
    /// attributes are from step N and others from step N + 1.
    pub fn swap_all(&mut self) {
        self.positions.swap();
        self.velocities.swap();
        self.radii.swap();
        self.target_radii.swap();
    }

    /// Copy every attribute of `src` onto `dst` in the current snapshot.
    pub fn copy_particle(&mut self, src: usize, dst: usize) {
        let d = self.dimension;
        self.positions
            .current_mut()
            .copy_within(src * d..(src + 1) * d, dst * d);
        self.velocities
            .current_mut()
            .copy_within(src * d..(src + 1) * d, dst * d);
        let radius = self.radii.current()[src];
        self.radii.current_mut()[dst] = radius;
        let target = self.target_radii.current()[src];
        self.target_radii.current_mut()[dst] = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn swap_exchanges_roles_without_copying() {
        let mut buffer = DoubleBuffer::new(4);
        buffer.next_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.current(), &[0.0; 4]);

        let next_ptr = buffer.next().as_ptr();
        buffer.swap();
        assert_eq!(buffer.current(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(buffer.current().as_ptr(), next_ptr);
        assert_eq!(buffer.next(), &[0.0; 4]);
    }

    #[test]
    fn split_reads_current_and_writes_next() {
        let mut buffer = DoubleBuffer::new(3);
        buffer.current_mut().copy_from_slice(&[1.0, 2.0, 3.0]);
        {
            let (current, next) = buffer.split();
            for (n, c) in next.iter_mut().zip(current) {
                *n = c * 10.0;
            }
        }
        assert_eq!(buffer.current(), &[1.0, 2.0, 3.0]);
        buffer.swap();
        assert_eq!(buffer.current(), &[10.0, 20.0, 30.0]);

        // Split must follow the flip.
        let (current, next) = buffer.split();
        assert_eq!(current, &[10.0, 20.0, 30.0]);
        assert_eq!(next, &[1.0, 2.0, 3.0]);
    }

    #[test]
    #[should_panic]
    fn writing_past_capacity_panics() {
        let mut buffer = DoubleBuffer::new(2);
        buffer.next_mut()[2] = 1.0;
    }

    #[test]
    fn set_both_survives_swap() {
        let mut buffer = DoubleBuffer::new(2);
        buffer.set_both(1, 7.0);
        assert_eq!(buffer.current()[1], 7.0);
        buffer.swap();
        assert_eq!(buffer.current()[1], 7.0);
    }

    #[test]
    fn copy_particle_copies_vector_and_scalar_attributes() {
        let mut store = AttributeStore::new(3, 4);
        store.positions.current_mut()[3..6].copy_from_slice(&[0.1, 0.2, 0.3]);
        store.radii.current_mut()[1] = 0.05;
        store.target_radii.current_mut()[1] = 0.04;

        store.copy_particle(1, 3);

        assert_eq!(&store.positions.current()[9..12], &[0.1, 0.2, 0.3]);
        assert_eq!(store.radii.current()[3], 0.05);
        assert_eq!(store.target_radii.current()[3], 0.04);
    }

    proptest! {
        #[test]
        fn reader_never_sees_mixed_snapshot(
            old in 0.0f32..100.0,
            new in 100.0f32..200.0,
            len in 1usize..64,
        ) {
            let mut buffer = DoubleBuffer::new(len);
            buffer.current_mut().fill(old);
            buffer.next_mut().fill(new);

            // Before the swap every value is old, after it every value is new.
            prop_assert!(buffer.current().iter().all(|&v| v == old));
            buffer.swap();
            prop_assert!(buffer.current().iter().all(|&v| v == new));
        }
    }
}
