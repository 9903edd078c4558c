use std::fmt;

use crate::error::TrayError;

/// Pixel dimensions, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// An RGBA image handed to the tray facility.
///
/// Kept as raw bytes because that is the currency every backend consumes;
/// decoding file formats is the caller's concern. Construction does not
/// validate. The backend does, when the image is bound to a native
/// object, so a bad image surfaces as the same error the native facility
/// would raise.
#[derive(Clone, PartialEq, Eq)]
pub struct TrayImage {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl TrayImage {
    pub fn from_rgba(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self { rgba, width, height }
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    /// Checks the invariants the native facility enforces on construction.
    /// Backends call this before binding a native object to the image.
    pub fn validate(&self) -> Result<(), TrayError> {
        if self.rgba.is_empty() {
            return Err(TrayError::InvalidArgument("image must not be empty".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(TrayError::InvalidArgument(format!(
                "image dimensions must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 4;
        if self.rgba.len() != expected {
            return Err(TrayError::InvalidArgument(format!(
                "image buffer holds {} bytes, {}x{} RGBA needs {}",
                self.rgba.len(),
                self.width,
                self.height,
                expected
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for TrayImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrayImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}
