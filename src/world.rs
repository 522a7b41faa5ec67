use serde::Deserialize;

use crate::color::Rgb;
use crate::error::WorldError;

/// Bytes per voxel in the map format (R, G, B).
pub const BYTES_PER_VOXEL: usize = 3;

/// Grid dimensions, fixed when a [`WorldGrid`] is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GridDims {
    pub width: usize,
    pub height: usize,
    pub depth: usize,
}

impl Default for GridDims {
    fn default() -> Self {
        Self {
            width: 96,
            height: 96,
            depth: 12,
        }
    }
}

impl GridDims {
    pub const fn new(width: usize, height: usize, depth: usize) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    pub fn voxel_count(&self) -> usize {
        self.width * self.height * self.depth
    }

    pub fn byte_len(&self) -> usize {
        self.voxel_count() * BYTES_PER_VOXEL
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.width && y < self.height && z < self.depth
    }

    /// Whether integer cell `(x, y)` lies inside the grid.
    pub fn contains_cell(&self, x: i64, y: i64) -> bool {
        (0..self.width as i64).contains(&x) && (0..self.height as i64).contains(&y)
    }

    /// Linear index of a voxel: x outer, y middle, z inner.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.height + y) * self.depth + z
    }

    /// Index of the first voxel of column `(x, y)`.
    #[inline]
    fn column_start(&self, x: usize, y: usize) -> usize {
        self.index(x, y, 0)
    }

    /// Maps any integer cell into the grid, boundary cells absorb everything outside.
    #[inline]
    pub fn clamp_cell(&self, x: i64, y: i64) -> (usize, usize) {
        let cx = x.clamp(0, self.width.saturating_sub(1) as i64) as usize;
        let cy = y.clamp(0, self.height.saturating_sub(1) as i64) as usize;
        (cx, cy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoxelCell {
    pub color: Rgb,
    /// Only meaningful on run starts.
    pub run_length: u32,
}

impl VoxelCell {
    pub const fn new(color: Rgb) -> Self {
        Self {
            color,
            run_length: 1,
        }
    }
}

impl Default for VoxelCell {
    fn default() -> Self {
        Self::new(Rgb::BLACK)
    }
}

/// Width x height columns of `depth` voxels each.
#[derive(Debug, Clone)]
pub struct WorldGrid {
    dims: GridDims,
    cells: Vec<VoxelCell>,
    // Column (x, y) at x * height + y.
    stale: Vec<bool>,
    stale_count: usize,
}

impl WorldGrid {
    /// Grid filled with empty voxels, already encoded.
    pub fn empty(dims: GridDims) -> Self {
        let mut grid = Self {
            dims,
            cells: vec![VoxelCell::default(); dims.voxel_count()],
            stale: vec![false; dims.width * dims.height],
            stale_count: 0,
        };
        grid.encode();
        grid
    }

    /// Builds a grid from the flat map format. Bytes past the required length are ignored.
    pub fn from_bytes(dims: GridDims, bytes: &[u8]) -> Result<Self, WorldError> {
        let expected = dims.byte_len();
        if bytes.len() < expected {
            return Err(WorldError::CorruptData {
                expected,
                actual: bytes.len(),
            });
        }

        let cells = bytes[..expected]
            .chunks_exact(BYTES_PER_VOXEL)
            .map(|rgb| VoxelCell::new(Rgb::new(rgb[0], rgb[1], rgb[2])))
            .collect();

        let mut grid = Self {
            dims,
            cells,
            stale: vec![false; dims.width * dims.height],
            stale_count: 0,
        };
        grid.encode();
        Ok(grid)
    }

    /// Like [`WorldGrid::from_bytes`], falling back to [`WorldGrid::default_room`] on corrupt data.
    pub fn load_or_default(dims: GridDims, bytes: &[u8]) -> Self {
        match Self::from_bytes(dims, bytes) {
            Ok(grid) => grid,
            Err(err) => {
                log::warn!("{err}; using the default map");
                Self::default_room(dims)
            }
        }
    }

    /// Bordered room: grey walls, green floor and ceiling, a few blocks in the middle.
    pub fn default_room(dims: GridDims) -> Self {
        let mut grid = Self::empty(dims);
        let GridDims {
            width,
            height,
            depth,
        } = dims;
        if depth == 0 {
            return grid;
        }

        for x in 0..width {
            for y in 0..height {
                let border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
                let start = dims.column_start(x, y);
                let column = &mut grid.cells[start..start + depth];
                for (z, cell) in column.iter_mut().enumerate() {
                    cell.color = if z == 0 || z == depth - 1 {
                        Rgb::GREEN
                    } else if border {
                        Rgb::GREY
                    } else {
                        Rgb::BLACK
                    };
                }
            }
        }

        const BLOCKS: [(usize, usize, usize, Rgb); 15] = [
            (60, 60, 4, Rgb::BLUE),
            (60, 60, 5, Rgb::WHITE),
            (60, 60, 6, Rgb::WHITE),
            (60, 60, 7, Rgb::BLUE),
            (60, 61, 5, Rgb::WHITE),
            (60, 61, 6, Rgb::WHITE),
            (61, 60, 4, Rgb::BLUE),
            (61, 60, 7, Rgb::BLUE),
            (62, 60, 4, Rgb::BLUE),
            (62, 60, 7, Rgb::BLUE),
            (63, 60, 4, Rgb::BLUE),
            (63, 60, 7, Rgb::BLUE),
            (63, 66, 3, Rgb::RED),
            (63, 66, 5, Rgb::WHITE),
            (63, 66, 7, Rgb::BLUE),
        ];
        for (x, y, z, color) in BLOCKS {
            if dims.contains(x, y, z) {
                let idx = dims.index(x, y, z);
                grid.cells[idx].color = color;
            }
        }

        grid.encode();
        grid
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn column(&self, x: usize, y: usize) -> &[VoxelCell] {
        let start = self.dims.column_start(x, y);
        &self.cells[start..start + self.dims.depth]
    }

    pub fn voxel(&self, x: usize, y: usize, z: usize) -> Option<Rgb> {
        self.dims
            .contains(x, y, z)
            .then(|| self.cells[self.dims.index(x, y, z)].color)
    }

    /// Overwrites one voxel. The column stays stale until the next [`WorldGrid::encode`].
    pub fn write(&mut self, x: usize, y: usize, z: usize, color: Rgb) -> Result<(), WorldError> {
        if !self.dims.contains(x, y, z) {
            return Err(WorldError::OutOfBounds { x, y, z });
        }
        let idx = self.dims.index(x, y, z);
        self.cells[idx].color = color;

        let col = x * self.dims.height + y;
        if !self.stale[col] {
            self.stale[col] = true;
            self.stale_count += 1;
        }
        Ok(())
    }

    /// Recomputes the run-length table of every column.
    pub fn encode(&mut self) {
        let depth = self.dims.depth;
        if depth == 0 {
            return;
        }
        for column in self.cells.chunks_exact_mut(depth) {
            encode_column(column);
        }
        self.stale.fill(false);
        self.stale_count = 0;
    }

    pub fn is_encoded(&self) -> bool {
        self.stale_count == 0
    }

    pub fn is_stale(&self, x: usize, y: usize) -> bool {
        self.stale[x * self.dims.height + y]
    }

    /// First stale column in storage order, if any.
    pub fn first_stale(&self) -> Option<(usize, usize)> {
        if self.is_encoded() {
            return None;
        }
        let col = self.stale.iter().position(|&s| s)?;
        Some((col / self.dims.height, col % self.dims.height))
    }

    /// Run starts of a column as `(start, length, color)`.
    pub fn runs(&self, x: usize, y: usize) -> Runs<'_> {
        Runs {
            column: self.column(x, y),
            next: 0,
        }
    }

    /// Serializes colors in the map byte format. Run lengths are not stored.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.dims.byte_len());
        for cell in &self.cells {
            bytes.extend_from_slice(&[cell.color.r, cell.color.g, cell.color.b]);
        }
        bytes
    }
}

/// Longest run a single cell can describe.
const MAX_RUN: usize = u32::MAX as usize;

fn encode_column(column: &mut [VoxelCell]) {
    encode_runs(column, MAX_RUN);
}

/// Runs longer than `max_run` are split into consecutive runs of the same color.
fn encode_runs(column: &mut [VoxelCell], max_run: usize) {
    let depth = column.len();
    let mut b = 0;
    while b < depth {
        let color = column[b].color;
        let mut run = 1;
        while run < max_run && b + run < depth && column[b + run].color == color {
            run += 1;
        }
        column[b].run_length = run as u32;
        b += run;
    }
}

pub struct Runs<'a> {
    column: &'a [VoxelCell],
    next: usize,
}

impl Iterator for Runs<'_> {
    type Item = (usize, usize, Rgb);

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.column.get(self.next)?;
        let start = self.next;
        let len = (cell.run_length.max(1) as usize).min(self.column.len() - start);
        self.next += len;
        Some((start, len, cell.color))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_x_major_then_y_then_z() {
        let dims = GridDims::new(4, 3, 2);
        assert_eq!(dims.index(0, 0, 0), 0);
        assert_eq!(dims.index(0, 0, 1), 1);
        assert_eq!(dims.index(0, 1, 0), 2);
        assert_eq!(dims.index(1, 0, 0), 6);
        assert_eq!(dims.index(3, 2, 1), dims.voxel_count() - 1);
    }

    #[test]
    fn clamp_cell_pins_to_boundary() {
        let dims = GridDims::new(4, 3, 2);
        assert_eq!(dims.clamp_cell(-5, 1), (0, 1));
        assert_eq!(dims.clamp_cell(9, 9), (3, 2));
        assert_eq!(dims.clamp_cell(2, 1), (2, 1));
    }

    #[test]
    fn encode_marks_run_starts() {
        let mut column = [
            VoxelCell::new(Rgb::GREEN),
            VoxelCell::new(Rgb::GREY),
            VoxelCell::new(Rgb::GREY),
            VoxelCell::new(Rgb::GREY),
            VoxelCell::new(Rgb::GREEN),
        ];
        encode_column(&mut column);
        assert_eq!(column[0].run_length, 1);
        assert_eq!(column[1].run_length, 3);
        assert_eq!(column[4].run_length, 1);
    }

    #[test]
    fn long_runs_are_split_at_the_cap() {
        let mut column = [VoxelCell::new(Rgb::GREY); 5];
        encode_runs(&mut column, 2);
        assert_eq!(column[0].run_length, 2);
        assert_eq!(column[2].run_length, 2);
        assert_eq!(column[4].run_length, 1);

        let grid = WorldGrid {
            dims: GridDims::new(1, 1, 5),
            cells: column.to_vec(),
            stale: vec![false],
            stale_count: 0,
        };
        let runs: Vec<_> = grid.runs(0, 0).collect();
        assert_eq!(
            runs,
            vec![(0, 2, Rgb::GREY), (2, 2, Rgb::GREY), (4, 1, Rgb::GREY)]
        );
    }

    #[test]
    fn write_makes_column_stale_until_encode() {
        let mut grid = WorldGrid::empty(GridDims::new(2, 2, 4));
        grid.write(1, 0, 2, Rgb::RED).unwrap();
        assert!(grid.is_stale(1, 0));
        assert!(!grid.is_stale(0, 0));
        assert_eq!(grid.first_stale(), Some((1, 0)));

        grid.encode();
        assert!(grid.is_encoded());
        let runs: Vec<_> = grid.runs(1, 0).collect();
        assert_eq!(
            runs,
            vec![(0, 2, Rgb::BLACK), (2, 1, Rgb::RED), (3, 1, Rgb::BLACK)]
        );
    }

    #[test]
    fn write_out_of_bounds_is_rejected() {
        let mut grid = WorldGrid::empty(GridDims::new(2, 2, 4));
        assert_eq!(
            grid.write(2, 0, 0, Rgb::RED),
            Err(WorldError::OutOfBounds { x: 2, y: 0, z: 0 })
        );
        assert!(grid.is_encoded());
    }

    #[test]
    fn default_room_skips_blocks_that_do_not_fit() {
        let grid = WorldGrid::default_room(GridDims::new(8, 8, 4));
        assert_eq!(grid.voxel(0, 3, 1), Some(Rgb::GREY));
        assert_eq!(grid.voxel(3, 3, 1), Some(Rgb::BLACK));
        assert_eq!(grid.voxel(3, 3, 0), Some(Rgb::GREEN));
        assert_eq!(grid.voxel(3, 3, 3), Some(Rgb::GREEN));
    }
}
