use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::camera::Camera;
use crate::color::Rgb;
use crate::depth::DepthCompositor;
use crate::error::RenderError;
use crate::raycast::RayState;
use crate::span::SpanProjector;
use crate::world::WorldGrid;

/// DDA steps allowed per screen column.
pub const DEFAULT_HIT_BUDGET: u32 = 900;

/// Color the frame is cleared to, also the empty voxel.
pub const BACKGROUND: Rgb = Rgb::BLACK;

/// Work done by one render call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub steps: u64,
    pub painted_rows: u64,
}

impl FrameStats {
    fn merge(self, other: FrameStats) -> FrameStats {
        FrameStats {
            steps: self.steps + other.steps,
            painted_rows: self.painted_rows + other.painted_rows,
        }
    }
}

/// Renders screen column `x` into `column` (one pixel per screen row, top first).
///
/// `column` is not cleared; rows no span reaches keep their contents.
pub fn render_column(
    grid: &WorldGrid,
    camera: &Camera,
    x: usize,
    width: usize,
    column: &mut [u32],
    depth: &mut DepthCompositor,
    hit_budget: u32,
) -> FrameStats {
    let height = column.len();
    let dims = grid.dims();
    debug_assert_eq!(depth.height(), height);
    depth.reset();

    let projector = SpanProjector::new(camera, height);
    let mut ray = RayState::new(camera, x, width, height);
    // A camera inside the grid has entered it already, even if its first step leaves.
    let (cam_x, cam_y) = (camera.pos.x.floor() as i64, camera.pos.y.floor() as i64);
    let mut entered = dims.contains_cell(cam_x, cam_y);
    let mut step: u32 = 0;

    while !depth.is_full() && step < hit_budget {
        if !entered {
            if ray.in_grid(dims) {
                entered = true;
            } else if !ray.can_reach(dims) {
                break;
            }
        }
        step += 1;

        // The lookahead becomes the next real state.
        let next = ray.advanced();
        if entered {
            let (cx, cy) = ray.sample_cell(dims);
            let ordinal = step as i32;
            projector.project_cell(grid.runs(cx, cy), &ray, &next, |span| {
                depth.composite(&span, ordinal, column);
            });
        }
        depth.end_step();
        ray = next;
    }

    FrameStats {
        steps: step as u64,
        painted_rows: depth.painted() as u64,
    }
}

fn check_frame(
    buf: &[u32],
    width: usize,
    height: usize,
    grid: &WorldGrid,
) -> Result<(), RenderError> {
    let expected = width * height;
    if buf.len() != expected {
        return Err(RenderError::BufferSize {
            expected,
            actual: buf.len(),
        });
    }
    if let Some((x, y)) = grid.first_stale() {
        return Err(RenderError::StaleColumn { x, y });
    }
    Ok(())
}

/// Renders one frame into the row-major `buf` of `width * height` 0RGB pixels.
pub fn render_frame(
    buf: &mut [u32],
    width: usize,
    height: usize,
    grid: &WorldGrid,
    camera: &Camera,
    hit_budget: u32,
) -> Result<FrameStats, RenderError> {
    check_frame(buf, width, height, grid)?;
    let background = BACKGROUND.pack();
    buf.fill(background);
    if width == 0 || height == 0 {
        return Ok(FrameStats::default());
    }

    let mut depth = DepthCompositor::new(height);
    let mut column = vec![background; height];
    let mut stats = FrameStats::default();

    for x in 0..width {
        column.fill(background);
        let col_stats =
            render_column(grid, camera, x, width, &mut column, &mut depth, hit_budget);
        stats = stats.merge(col_stats);

        for (y, &px) in column.iter().enumerate() {
            buf[y * width + x] = px;
        }
    }

    Ok(stats)
}

/// Same output as [`render_frame`], with screen columns spread over the rayon pool.
pub fn render_frame_parallel(
    buf: &mut [u32],
    width: usize,
    height: usize,
    grid: &WorldGrid,
    camera: &Camera,
    hit_budget: u32,
) -> Result<FrameStats, RenderError> {
    check_frame(buf, width, height, grid)?;
    let background = BACKGROUND.pack();
    if width == 0 || height == 0 {
        return Ok(FrameStats::default());
    }

    // Column-major so each worker owns a contiguous strip.
    let mut columns = vec![background; width * height];
    let stats = columns
        .par_chunks_mut(height)
        .enumerate()
        .map_init(
            || DepthCompositor::new(height),
            |depth, (x, column)| render_column(grid, camera, x, width, column, depth, hit_budget),
        )
        .reduce(FrameStats::default, FrameStats::merge);

    buf.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
            *px = columns[x * height + y];
        }
    });

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::GridDims;

    #[test]
    fn wrong_buffer_size_is_rejected() {
        let grid = WorldGrid::default_room(GridDims::new(8, 8, 4));
        let cam = Camera::spawn(grid.dims(), 4.0);
        let mut buf = vec![0u32; 10];
        assert_eq!(
            render_frame(&mut buf, 4, 4, &grid, &cam, DEFAULT_HIT_BUDGET),
            Err(RenderError::BufferSize {
                expected: 16,
                actual: 10
            })
        );
    }

    #[test]
    fn stale_grid_is_refused() {
        let mut grid = WorldGrid::default_room(GridDims::new(8, 8, 4));
        grid.write(2, 3, 1, Rgb::RED).unwrap();
        let cam = Camera::spawn(grid.dims(), 4.0);
        let mut buf = vec![0u32; 16];
        assert_eq!(
            render_frame_parallel(&mut buf, 4, 4, &grid, &cam, DEFAULT_HIT_BUDGET),
            Err(RenderError::StaleColumn { x: 2, y: 3 })
        );
    }

    #[test]
    fn column_stops_once_every_row_is_painted() {
        let grid = WorldGrid::default_room(GridDims::new(16, 16, 6));
        let cam = Camera::spawn(grid.dims(), 20.0);
        let mut depth = DepthCompositor::new(40);
        let mut column = vec![0u32; 40];
        let stats =
            render_column(&grid, &cam, 10, 20, &mut column, &mut depth, DEFAULT_HIT_BUDGET);
        assert_eq!(stats.painted_rows, 40);
        assert!(stats.steps < DEFAULT_HIT_BUDGET as u64);
    }

    #[test]
    fn budget_caps_steps() {
        let grid = WorldGrid::empty(GridDims::new(16, 16, 6));
        let cam = Camera::spawn(grid.dims(), 20.0);
        let mut depth = DepthCompositor::new(40);
        let mut column = vec![0u32; 40];
        let stats = render_column(&grid, &cam, 10, 20, &mut column, &mut depth, 25);
        assert_eq!(stats.steps, 25);
        assert_eq!(stats.painted_rows, 0);
    }

    #[test]
    fn edge_cell_facing_out_still_samples_its_boundary() {
        let mut grid = WorldGrid::empty(GridDims::new(4, 4, 3));
        for x in 0..4 {
            for y in 0..4 {
                grid.write(x, y, 0, Rgb::GREEN).unwrap();
            }
        }
        grid.encode();
        let cam = Camera {
            pos: glam::DVec2::new(0.5, 1.5),
            pos_z: 1.5,
            dir: glam::DVec2::new(-1.0, 0.0),
            plane: glam::DVec2::new(0.0, 0.66),
            pitch: 8.0,
        };

        let mut depth = DepthCompositor::new(16);
        let mut column = vec![0u32; 16];
        let stats = render_column(&grid, &cam, 8, 16, &mut column, &mut depth, 64);
        assert!(stats.steps > 0);
        assert!(stats.painted_rows > 0);
        assert!(column.contains(&Rgb::GREEN.dim(3).pack()));
    }
}
