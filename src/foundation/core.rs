use crate::foundation::error::{StampError, StampResult};

/// 0-based frame index in source (and output) order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Pixel dimensions of a raster or logical screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Size {
    /// Create a validated size with both sides non-zero.
    pub fn new(width: u32, height: u32) -> StampResult<Self> {
        if width == 0 || height == 0 {
            return Err(StampError::validation("size width/height must be non-zero"));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Axis-aligned pixel rectangle. `left`/`top` are inclusive, the far edges exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Rect {
    /// Create a rectangle from offset and extent.
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u32 {
        self.left.saturating_add(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u32 {
        self.top.saturating_add(self.height)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Return `true` when the rectangle lies fully inside `size`.
    pub fn fits_within(self, size: Size) -> bool {
        u64::from(self.left) + u64::from(self.width) <= u64::from(size.width)
            && u64::from(self.top) + u64::from(self.height) <= u64::from(size.height)
    }

    /// Number of pixels covered.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// RGB palette entry.
pub type Rgb8 = [u8; 3];

/// Straight-alpha RGBA8 pixel.
pub type Rgba8 = [u8; 4];

/// Fully transparent black.
pub const TRANSPARENT: Rgba8 = [0, 0, 0, 0];

/// What a viewer does with a frame's rectangle after showing it, before the next frame paints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum DisposalMethod {
    /// No disposal specified.
    #[default]
    None,
    /// Leave the canvas as painted.
    DoNotDispose,
    /// Clear the rectangle to the background.
    RestoreBackground,
    /// Restore the rectangle to its contents before the frame painted.
    RestorePrevious,
}

impl DisposalMethod {
    /// Decode the 3-bit packed field of a graphic control extension.
    ///
    /// Reserved values 4..=7 are treated as "no disposal specified".
    pub fn from_gif_code(code: u8) -> Self {
        match code & 0x07 {
            1 => Self::DoNotDispose,
            2 => Self::RestoreBackground,
            3 => Self::RestorePrevious,
            _ => Self::None,
        }
    }

    /// Encode as the 3-bit packed field of a graphic control extension.
    pub fn gif_code(self) -> u8 {
        match self {
            Self::None => 0,
            Self::DoNotDispose => 1,
            Self::RestoreBackground => 2,
            Self::RestorePrevious => 3,
        }
    }
}

/// Animation repeat behaviour from the application extension block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LoopCount {
    /// Repeat forever (stored as 0).
    Infinite,
    /// Repeat the animation `n` extra times.
    Finite(u16),
}

impl LoopCount {
    /// Decode the stored repeat value.
    pub fn from_stored(value: u16) -> Self {
        if value == 0 {
            Self::Infinite
        } else {
            Self::Finite(value)
        }
    }

    /// Value written to the application extension.
    pub fn stored(self) -> u16 {
        match self {
            Self::Infinite => 0,
            Self::Finite(n) => n,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
