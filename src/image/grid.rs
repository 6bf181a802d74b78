//! Owned 2D grid in row-major layout (stride == width).
use crate::error::PipelineError;

/// Dense `width × height` storage indexed by pixel coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    /// Construct a grid with every cell set to `value`.
    pub fn new(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Resize to `width × height`, reusing the allocation where possible.
    /// All cells are reset to `value`.
    pub fn reset(&mut self, width: usize, height: usize, value: T) {
        self.width = width;
        self.height = height;
        self.data.clear();
        self.data.resize(width * height, value);
    }
}

impl<T> Grid<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, PipelineError> {
        let expected = width
            .checked_mul(height)
            .ok_or_else(|| PipelineError::Image(format!("grid {width}x{height} overflows")))?;
        if data.len() != expected {
            return Err(PipelineError::Image(format!(
                "grid size mismatch: expected {expected}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    /// Convert (x, y) to a linear index into the backing storage.
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// True when the signed coordinate lies inside the grid.
    #[inline]
    pub fn contains(&self, x: isize, y: isize) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let i = self.idx(x, y);
        self.data[i] = value;
    }

    pub fn row(&self, y: usize) -> &[T] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Copy> Grid<T> {
    /// Value at (x, y). Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> T {
        self.data[y * self.width + x]
    }

    /// Value at a signed coordinate, `None` outside the grid.
    #[inline]
    pub fn at_signed(&self, x: isize, y: isize) -> Option<T> {
        if self.contains(x, y) {
            Some(self.data[y as usize * self.width + x as usize])
        } else {
            None
        }
    }
}
