//! RGBA8 input views.
use crate::error::PipelineError;

/// Borrowed RGBA8 raster. `stride` is the number of bytes between row starts.
#[derive(Clone, Copy, Debug)]
pub struct RgbaImage<'a> {
    pub w: usize,
    pub h: usize,
    pub stride: usize,
    pub data: &'a [u8],
}

impl<'a> RgbaImage<'a> {
    /// Tightly packed view (`stride == 4 * w`).
    pub fn new(w: usize, h: usize, data: &'a [u8]) -> Result<Self, PipelineError> {
        Self::with_stride(w, h, row_bytes(w)?, data)
    }

    pub fn with_stride(
        w: usize,
        h: usize,
        stride: usize,
        data: &'a [u8],
    ) -> Result<Self, PipelineError> {
        let row = row_bytes(w)?;
        if stride < row {
            return Err(PipelineError::Image(format!(
                "stride {stride} shorter than row of {w} pixels"
            )));
        }
        let needed = match h {
            0 => 0,
            _ => stride
                .checked_mul(h - 1)
                .and_then(|n| n.checked_add(row))
                .ok_or_else(|| overflow(w, h))?,
        };
        if data.len() < needed {
            return Err(PipelineError::Image(format!(
                "buffer of {} bytes too small for {w}x{h} (need {needed})",
                data.len()
            )));
        }
        Ok(Self { w, h, stride, data })
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        let i = y * self.stride + x * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> [u8; 3] {
        let [r, g, b, _] = self.get(x, y);
        [r, g, b]
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// Owned RGBA8 buffer with a borrowed view conversion.
#[derive(Clone, Debug)]
pub struct OwnedRgbaImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl OwnedRgbaImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, PipelineError> {
        let expected = row_bytes(width)?
            .checked_mul(height)
            .ok_or_else(|| overflow(width, height))?;
        if data.len() != expected {
            return Err(PipelineError::Image(format!(
                "expected {expected} RGBA bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_view(&self) -> RgbaImage<'_> {
        RgbaImage {
            w: self.width,
            h: self.height,
            stride: self.width * 4,
            data: &self.data,
        }
    }
}

#[inline]
fn row_bytes(w: usize) -> Result<usize, PipelineError> {
    w.checked_mul(4).ok_or_else(|| overflow(w, 1))
}

fn overflow(w: usize, h: usize) -> PipelineError {
    PipelineError::Image(format!("image {w}x{h} overflows the address space"))
}

#[cfg(test)]
mod tests {
    use super::{OwnedRgbaImage, RgbaImage};

    #[test]
    fn strided_view_reads_pixels() {
        let data = [
            1u8, 2, 3, 255, 4, 5, 6, 255, 0, 0, // row 0 + padding
            7, 8, 9, 255, 10, 11, 12, 255, 0, 0, // row 1 + padding
        ];
        let img = RgbaImage::with_stride(2, 2, 10, &data).expect("valid view");
        assert_eq!(img.rgb(1, 0), [4, 5, 6]);
        assert_eq!(img.get(0, 1), [7, 8, 9, 255]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let data = [0u8; 15];
        assert!(RgbaImage::new(2, 2, &data).is_err());
    }

    #[test]
    fn huge_dimensions_are_rejected() {
        let data = [0u8; 16];
        assert!(RgbaImage::new(usize::MAX / 2, 2, &data).is_err());
        assert!(RgbaImage::with_stride(2, usize::MAX, 8, &data).is_err());
        assert!(OwnedRgbaImage::new(usize::MAX / 4, 8, Vec::new()).is_err());
    }
}
