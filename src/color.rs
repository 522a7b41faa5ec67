/// 24-bit voxel color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Empty voxel. Runs of this color are never drawn and the frame is cleared to it.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    pub const GREY: Rgb = Rgb::new(128, 128, 128);
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == Rgb::BLACK
    }

    /// Divides every channel, used for side and far-face shading.
    #[inline]
    pub fn dim(self, divisor: u8) -> Rgb {
        Rgb::new(self.r / divisor, self.g / divisor, self.b / divisor)
    }

    /// 0RGB in a `u32`, the layout softbuffer expects.
    #[inline]
    pub fn pack(self) -> u32 {
        (self.b as u32) | ((self.g as u32) << 8) | ((self.r as u32) << 16)
    }

    #[inline]
    pub fn unpack(px: u32) -> Rgb {
        Rgb::new((px >> 16) as u8, (px >> 8) as u8, px as u8)
    }
}
