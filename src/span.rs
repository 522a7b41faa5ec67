use crate::camera::Camera;
use crate::color::Rgb;
use crate::raycast::{RayState, Side};

/// Which face of a run a span belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Near,
    Far,
}

/// Inclusive screen rows `start..=end` painted with one color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub color: Rgb,
    pub face: Face,
}

/// Projects the voxel runs of one cell onto a screen column.
pub struct SpanProjector {
    pos_z: f64,
    pitch: f64,
    screen_height: usize,
}

impl SpanProjector {
    pub fn new(camera: &Camera, screen_height: usize) -> Self {
        Self {
            pos_z: camera.pos_z,
            pitch: camera.pitch,
            screen_height,
        }
    }

    /// Emits near and far spans for every non-empty run of the cell. `current` is the step
    /// the cell was entered at, `next` the lookahead step where the ray leaves it.
    pub fn project_cell<I, F>(&self, runs: I, current: &RayState, next: &RayState, mut emit: F)
    where
        I: IntoIterator<Item = (usize, usize, Rgb)>,
        F: FnMut(Span),
    {
        let near_lh = current.line_height();
        let far_lh = next.line_height();

        for (start, len, color) in runs {
            if color.is_empty() {
                continue;
            }
            let top = start as f64;
            let bottom = (start + len) as f64;

            let near = (self.row(near_lh, top), self.row(near_lh, bottom));
            let far = (self.row(far_lh, top), self.row(far_lh, bottom));

            let near_color = match current.side() {
                Side::X => color,
                Side::Y => color.dim(2),
            };
            if let Some(span) = self.clamp(near.0, near.1, near_color, Face::Near) {
                emit(span);
            }

            // The cap between both faces, on the side the eye looks at.
            let last = (start + len - 1) as f64;
            let (cap_start, cap_end) = if last < self.pos_z {
                (near.0, far.1)
            } else {
                (far.0, near.1)
            };
            if let Some(span) = self.clamp(cap_start, cap_end, color.dim(3), Face::Far) {
                emit(span);
            }
        }
    }

    /// Screen row of height `z` at the distance that gives `line_height`.
    #[inline]
    fn row(&self, line_height: f64, z: f64) -> i64 {
        let y = line_height * (z - self.pos_z) + self.pitch;
        if y.is_nan() {
            return -1;
        }
        // Rows past the screen behave the same, keep the cast in range.
        y.clamp(-1.0, self.screen_height as f64).floor() as i64
    }

    fn clamp(&self, start: i64, end: i64, color: Rgb, face: Face) -> Option<Span> {
        let last = self.screen_height as i64 - 1;
        let start = start.max(0);
        let end = end.min(last);
        (start <= end && last >= 0).then_some(Span {
            start: start as usize,
            end: end as usize,
            color,
            face,
        })
    }
}
