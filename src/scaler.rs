use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

/// Marks a destination row/column that falls in the letterbox border.
const BORDER: usize = usize::MAX;

/// Precomputed mapping from window pixels to raster pixels.
///
/// The raster keeps its aspect ratio and is centred, leftover space is border.
pub struct ScaleLut {
    src_x: Vec<usize>,
    src_y: Vec<usize>,
}

impl ScaleLut {
    pub fn empty() -> Self {
        Self {
            src_x: Vec::new(),
            src_y: Vec::new(),
        }
    }
}

pub fn build_scale_lut(dst_w: usize, dst_h: usize, src_w: usize, src_h: usize) -> ScaleLut {
    if src_w == 0 || src_h == 0 {
        return ScaleLut {
            src_x: vec![BORDER; dst_w],
            src_y: vec![BORDER; dst_h],
        };
    }

    let scale = (dst_w as f32 / src_w as f32).min(dst_h as f32 / src_h as f32);
    let axis = |dst: usize, src: usize| -> Vec<usize> {
        let covered = ((src as f32 * scale).round() as usize).min(dst);
        let offset = (dst - covered) / 2;
        (0..dst)
            .map(|d| {
                if d < offset || d >= offset + covered {
                    BORDER
                } else {
                    (((d - offset) as f32 / scale) as usize).min(src - 1)
                }
            })
            .collect()
    };

    ScaleLut {
        src_x: axis(dst_w, src_w),
        src_y: axis(dst_h, src_h),
    }
}

/// Nearest-neighbour blit of `src` (width `sw`) into `dst` (width `dw`).
/// Rows are processed in parallel.
pub fn blit_scaled(
    dst: &mut [u32],
    dw: usize,
    src: &[u32],
    sw: usize,
    lut: &ScaleLut,
    border: u32,
) {
    if dw == 0 {
        return;
    }
    dst.par_chunks_mut(dw).enumerate().for_each(|(y, dst_row)| {
        let sy = lut.src_y.get(y).copied().unwrap_or(BORDER);
        if sy == BORDER {
            dst_row.fill(border);
            return;
        }
        let row = sy * sw;
        for (x, px) in dst_row.iter_mut().enumerate() {
            *px = match lut.src_x.get(x).copied().unwrap_or(BORDER) {
                BORDER => border,
                sx => src[row + sx],
            };
        }
    });
}
