use crate::span::{Face, Span};

/// Depth of a row nothing has been drawn to yet.
pub const DEPTH_SENTINEL: i32 = i32::MAX;

/// Per-column occlusion state: near-face and far-face depth per screen row.
///
/// Depths are traversal step ordinals, so smaller is nearer. Allocated once per worker and
/// reset at the start of every screen column.
pub struct DepthCompositor {
    near: Vec<i32>,
    far: Vec<i32>,
    painted: usize,
}

impl DepthCompositor {
    pub fn new(screen_height: usize) -> Self {
        Self {
            near: vec![DEPTH_SENTINEL; screen_height],
            far: vec![DEPTH_SENTINEL; screen_height],
            painted: 0,
        }
    }

    pub fn reset(&mut self) {
        self.near.fill(DEPTH_SENTINEL);
        self.far.fill(DEPTH_SENTINEL);
        self.painted = 0;
    }

    pub fn height(&self) -> usize {
        self.near.len()
    }

    /// Rows that have been drawn at least once since the last reset.
    pub fn painted(&self) -> usize {
        self.painted
    }

    pub fn is_full(&self) -> bool {
        self.painted >= self.near.len()
    }

    /// Nearest depth recorded for a row.
    #[cfg(test)]
    fn depth_at(&self, row: usize) -> i32 {
        self.far[row]
    }

    /// Draws the rows of `span` that are nearer than what the column already holds.
    /// Returns the number of rows written to `column`.
    pub fn composite(&mut self, span: &Span, depth: i32, column: &mut [u32]) -> usize {
        let px = span.color.pack();
        let Some(last) = self.near.len().checked_sub(1) else {
            return 0;
        };
        let end = span.end.min(last);
        if span.start > end {
            return 0;
        }

        let mut drawn = 0;
        for row in span.start..=end {
            // Far faces lose against near faces of the same step.
            let visible = match span.face {
                Face::Near => depth < self.near[row],
                Face::Far => depth < self.near[row] && depth < self.far[row],
            };
            if !visible {
                continue;
            }

            if self.far[row] == DEPTH_SENTINEL {
                self.painted += 1;
            }
            if span.face == Face::Near {
                self.near[row] = depth;
            }
            self.far[row] = self.far[row].min(depth);
            column[row] = px;
            drawn += 1;
        }
        drawn
    }

    /// Commits this step's far-face depths so later steps see them as occluders.
    pub fn end_step(&mut self) {
        self.near.copy_from_slice(&self.far);
    }
}
