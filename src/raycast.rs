//! 2D DDA traversal of the column grid for one screen column.

use glam::DVec2;

use crate::camera::Camera;
use crate::world::GridDims;

/// Stand-in for an infinite `delta_dist` when a ray component is (near) zero.
pub const DELTA_DIST_SENTINEL: f64 = 1e30;
/// Smallest perpendicular distance, keeps `line_height` finite on grid lines.
pub const MIN_PERP_DIST: f64 = 1e-4;
const DIR_EPSILON: f64 = 1e-12;

/// Which grid line the ray crossed last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    X,
    Y,
}

/// Transient traversal state of one screen column.
#[derive(Debug, Clone, Copy)]
pub struct RayState {
    pos: DVec2,
    ray_dir: DVec2,
    delta_dist: DVec2,
    side_dist: DVec2,
    step_x: i64,
    step_y: i64,
    // Unclamped, so distances keep growing once the ray leaves the grid.
    map_x: i64,
    map_y: i64,
    side: Side,
    perp_wall_dist: f64,
    line_height: f64,
    screen_height: f64,
}

impl RayState {
    /// Sets up the ray through screen column `x` and takes the first step out of the camera's cell.
    pub fn new(camera: &Camera, x: usize, screen_width: usize, screen_height: usize) -> Self {
        let pos = camera.pos;
        let ray_dir = camera.ray_dir(x, screen_width);
        let delta_dist = DVec2::new(
            delta_dist(ray_dir.x, ray_dir.y),
            delta_dist(ray_dir.y, ray_dir.x),
        );

        let map_x = pos.x.floor() as i64;
        let map_y = pos.y.floor() as i64;

        let (step_x, side_x) = if ray_dir.x < 0.0 {
            (-1, (pos.x - map_x as f64) * delta_dist.x)
        } else {
            (1, (map_x as f64 + 1.0 - pos.x) * delta_dist.x)
        };
        let (step_y, side_y) = if ray_dir.y < 0.0 {
            (-1, (pos.y - map_y as f64) * delta_dist.y)
        } else {
            (1, (map_y as f64 + 1.0 - pos.y) * delta_dist.y)
        };

        let origin = Self {
            pos,
            ray_dir,
            delta_dist,
            side_dist: DVec2::new(side_x, side_y),
            step_x,
            step_y,
            map_x,
            map_y,
            side: Side::X,
            perp_wall_dist: 0.0,
            line_height: 0.0,
            screen_height: screen_height as f64,
        };
        origin.advanced()
    }

    /// The state one grid-line crossing further along. `self` is left untouched.
    pub fn advanced(&self) -> Self {
        let mut next = *self;
        if next.side_dist.x < next.side_dist.y {
            next.side_dist.x += next.delta_dist.x;
            next.map_x += next.step_x;
            next.side = Side::X;
        } else {
            next.side_dist.y += next.delta_dist.y;
            next.map_y += next.step_y;
            next.side = Side::Y;
        }

        let raw = match next.side {
            Side::X => {
                (next.map_x as f64 - next.pos.x + (1 - next.step_x) as f64 / 2.0) / next.ray_dir.x
            }
            Side::Y => {
                (next.map_y as f64 - next.pos.y + (1 - next.step_y) as f64 / 2.0) / next.ray_dir.y
            }
        };
        next.perp_wall_dist = if raw.is_finite() && raw > MIN_PERP_DIST {
            raw
        } else {
            MIN_PERP_DIST
        };
        next.line_height = next.screen_height / next.perp_wall_dist;
        next
    }

    pub fn map_cell(&self) -> (i64, i64) {
        (self.map_x, self.map_y)
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn perp_wall_dist(&self) -> f64 {
        self.perp_wall_dist
    }

    pub fn line_height(&self) -> f64 {
        self.line_height
    }

    pub fn in_grid(&self, dims: GridDims) -> bool {
        dims.contains_cell(self.map_x, self.map_y)
    }

    /// False once a ray that is still outside the grid heads away from it on some axis.
    pub fn can_reach(&self, dims: GridDims) -> bool {
        let away_x = (self.map_x < 0 && self.step_x < 0)
            || (self.map_x >= dims.width as i64 && self.step_x > 0);
        let away_y = (self.map_y < 0 && self.step_y < 0)
            || (self.map_y >= dims.height as i64 && self.step_y > 0);
        !(away_x || away_y)
    }

    /// Cell to sample: the traversal cell clamped into the grid.
    pub fn sample_cell(&self, dims: GridDims) -> (usize, usize) {
        dims.clamp_cell(self.map_x, self.map_y)
    }
}

#[inline]
fn delta_dist(axis: f64, other: f64) -> f64 {
    if axis.abs() < DIR_EPSILON {
        return DELTA_DIST_SENTINEL;
    }
    let ratio = other / axis;
    (1.0 + ratio * ratio).sqrt().min(DELTA_DIST_SENTINEL)
}
