use glam::DVec2;

use crate::world::{GridDims, WorldGrid};

pub struct Camera {
    pub pos: DVec2,   // (x, y) position in grid space
    pub pos_z: f64,   // vertical offset into a column, in voxels
    pub dir: DVec2,   // forward vector
    pub plane: DVec2, // camera plane, its length sets the field of view
    pub pitch: f64,   // screen row of the eye's horizon offset, in pixels
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pos: DVec2::new(40.0, 40.0),
            pos_z: 6.0,
            dir: DVec2::new(-1.0, 0.0),
            plane: DVec2::new(0.0, 0.66),
            pitch: 200.0,
        }
    }
}

/// Per-frame movement deltas from the input collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: f64, // grid units along `dir`, negative walks back
    pub rotate: f64,  // radians, positive turns left
    pub pitch: f64,   // pixels
    pub lift: f64,    // voxels added to `pos_z`
}

impl Camera {
    /// Starting camera for a grid: the usual spawn point if it lies inside, the centre otherwise.
    pub fn spawn(dims: GridDims, pitch: f64) -> Self {
        let default = Self::default();
        let inside = default.pos.x < (dims.width as f64 - 1.0)
            && default.pos.y < (dims.height as f64 - 1.0);
        let pos = if inside {
            default.pos
        } else {
            DVec2::new(dims.width as f64 * 0.5, dims.height as f64 * 0.5)
        };

        Self {
            pos,
            pos_z: dims.depth as f64 * 0.5,
            pitch,
            ..default
        }
    }

    /// Direction of the ray through screen column `x` of `width`.
    #[inline]
    pub fn ray_dir(&self, x: usize, width: usize) -> DVec2 {
        let camera_x = 2.0 * x as f64 / width as f64 - 1.0;
        self.dir + self.plane * camera_x
    }

    pub fn apply(&mut self, input: &CameraInput, grid: &WorldGrid) {
        if input.forward != 0.0 {
            // Axis-separated so the camera slides along walls.
            let step = self.dir * input.forward;
            if is_walkable(grid, self.pos.x + step.x, self.pos.y) {
                self.pos.x += step.x;
            }
            if is_walkable(grid, self.pos.x, self.pos.y + step.y) {
                self.pos.y += step.y;
            }
        }

        if input.rotate != 0.0 {
            self.dir = rotate(self.dir, input.rotate);
            self.plane = rotate(self.plane, input.rotate);
        }

        self.pitch += input.pitch;
        self.pos_z = (self.pos_z + input.lift).clamp(0.0, grid.dims().depth as f64);
    }
}

#[inline]
fn rotate(v: DVec2, angle: f64) -> DVec2 {
    let (s, c) = angle.sin_cos();
    DVec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

/// A cell is walkable when the voxel at collision height is empty.
fn is_walkable(grid: &WorldGrid, x: f64, y: f64) -> bool {
    if x < 0.0 || y < 0.0 {
        return false;
    }
    let probe_z = grid.dims().depth.saturating_sub(2);
    grid.voxel(x as usize, y as usize, probe_z)
        .is_some_and(|c| c.is_empty())
}
