//! Uniform spatial hash grid for broad-phase collision queries.
//!
//! Buckets particle indices by the integer cell containing their position.
//! A grid is only valid for the positions it was built from; the solver builds
//! it once per frame and tolerates particles drifting out of their bucket
//! during that frame's substeps.

use glam::Vec3;
use rustc_hash::FxHashMap;
use std::hash::{Hash, Hasher};

/// Integer coordinate of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vec3i {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Vec3i {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Cell containing `position`: `floor(position / cell_size)` per axis.
    pub fn from_position(position: Vec3, cell_size: f32) -> Self {
        let cell = (position / cell_size).floor();
        Self::new(cell.x as i32, cell.y as i32, cell.z as i32)
    }

    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Classic three-prime xor mix for spatial hashing.
    pub fn spatial_hash(&self) -> u64 {
        let hx = (self.x as i64 as u64).wrapping_mul(73_856_093);
        let hy = (self.y as i64 as u64).wrapping_mul(19_349_663);
        let hz = (self.z as i64 as u64).wrapping_mul(83_492_791);
        hx ^ hy ^ hz
    }
}

impl Hash for Vec3i {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.spatial_hash());
    }
}

/// Map from cell to the indices of the particles whose position fell in it.
#[derive(Debug, Clone)]
pub struct SpatialHashGrid {
    cell_size: f32,
    cells: FxHashMap<Vec3i, Vec<usize>>,
}

impl SpatialHashGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: FxHashMap::default(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size. Existing buckets are dropped.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        self.cell_size = cell_size;
        self.cells.clear();
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn cell_of(&self, position: Vec3) -> Vec3i {
        Vec3i::from_position(position, self.cell_size)
    }

    pub fn insert(&mut self, index: usize, position: Vec3) {
        let cell = self.cell_of(position);
        self.cells.entry(cell).or_default().push(index);
    }

    /// Clear and re-bucket every position by its index.
    pub fn build(&mut self, positions: &[Vec3]) {
        self.clear();
        for (index, &position) in positions.iter().enumerate() {
            self.insert(index, position);
        }
    }

    /// Indices bucketed in `cell`, in insertion order.
    pub fn cell(&self, cell: Vec3i) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    /// Visit the 3×3×3 block of cells around `position` in a fixed order.
    pub fn neighborhood(&self, position: Vec3) -> impl Iterator<Item = usize> + '_ {
        let center = self.cell_of(position);
        (-1..=1).flat_map(move |dx| {
            (-1..=1).flat_map(move |dy| {
                (-1..=1).flat_map(move |dz| self.cell(center.offset(dx, dy, dz)).iter().copied())
            })
        })
    }

    /// Candidates near `position`: every other index in the neighborhood whose
    /// position lies strictly within `radius`. Coarse filter only.
    pub fn potential_collisions_into(
        &self,
        position: Vec3,
        radius: f32,
        self_index: usize,
        positions: &[Vec3],
        out: &mut Vec<usize>,
    ) {
        out.clear();
        let radius_sq = radius * radius;
        out.extend(self.neighborhood(position).filter(|&other| {
            other != self_index && positions[other].distance_squared(position) < radius_sq
        }));
    }

    pub fn potential_collisions(
        &self,
        position: Vec3,
        radius: f32,
        self_index: usize,
        positions: &[Vec3],
    ) -> Vec<usize> {
        let mut out = Vec::new();
        self.potential_collisions_into(position, radius, self_index, positions, &mut out);
        out
    }
}
