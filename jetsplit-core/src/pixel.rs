//! Pixel and cluster types for detector charge deposits.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single pixel record: column, row, and ADC charge.
///
/// Identity within one cluster is the (x, y) pair; two records sharing an
/// identity represent charge at the same location and are additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pixel {
    /// X coordinate (column).
    pub x: u16,
    /// Y coordinate (row).
    pub y: u16,
    /// ADC charge reading.
    pub adc: u32,
}

impl Pixel {
    /// Creates a new pixel record.
    #[inline]
    pub fn new(x: u16, y: u16, adc: u32) -> Self {
        Self { x, y, adc }
    }
}

/// An ordered group of pixels forming one charge deposit on a sensor.
///
/// Serves both as the raw input cluster and as a split output cluster; split
/// outputs additionally carry forced position errors, substituted for the
/// fit-derived uncertainty that splitting cannot provide.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCluster {
    pixels: Vec<Pixel>,
    split_error_x: Option<f32>,
    split_error_y: Option<f32>,
}

impl PixelCluster {
    /// Creates an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cluster with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pixels: Vec::with_capacity(capacity),
            split_error_x: None,
            split_error_y: None,
        }
    }

    /// Adds a pixel to the cluster.
    pub fn push(&mut self, pixel: Pixel) {
        self.pixels.push(pixel);
    }

    /// Returns the pixels in insertion order.
    #[inline]
    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Returns the number of pixels.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns true if the cluster holds no pixels.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Total ADC charge of the cluster.
    pub fn charge(&self) -> u64 {
        self.pixels.iter().map(|p| u64::from(p.adc)).sum()
    }

    /// Bounding-box extent along x, in pixels. Zero for an empty cluster.
    pub fn size_x(&self) -> u16 {
        Self::extent(self.pixels.iter().map(|p| p.x))
    }

    /// Bounding-box extent along y, in pixels. Zero for an empty cluster.
    pub fn size_y(&self) -> u16 {
        Self::extent(self.pixels.iter().map(|p| p.y))
    }

    /// Minimum pixel row (y). Used as the ordering key for output
    /// collections. Returns `None` for an empty cluster.
    pub fn min_pixel_row(&self) -> Option<u16> {
        self.pixels.iter().map(|p| p.y).min()
    }

    /// Minimum pixel column (x). Returns `None` for an empty cluster.
    pub fn min_pixel_col(&self) -> Option<u16> {
        self.pixels.iter().map(|p| p.x).min()
    }

    /// Forced x position error, if one was assigned.
    #[inline]
    pub fn split_error_x(&self) -> Option<f32> {
        self.split_error_x
    }

    /// Forced y position error, if one was assigned.
    #[inline]
    pub fn split_error_y(&self) -> Option<f32> {
        self.split_error_y
    }

    /// Forces the x position error.
    pub fn set_split_error_x(&mut self, error: f32) {
        self.split_error_x = Some(error);
    }

    /// Forces the y position error.
    pub fn set_split_error_y(&mut self, error: f32) {
        self.split_error_y = Some(error);
    }

    fn extent(coords: impl Iterator<Item = u16> + Clone) -> u16 {
        let min = coords.clone().min();
        let max = coords.max();
        match (min, max) {
            (Some(lo), Some(hi)) => hi - lo + 1,
            _ => 0,
        }
    }
}

impl FromIterator<Pixel> for PixelCluster {
    fn from_iter<I: IntoIterator<Item = Pixel>>(iter: I) -> Self {
        Self {
            pixels: iter.into_iter().collect(),
            split_error_x: None,
            split_error_y: None,
        }
    }
}

impl From<Vec<Pixel>> for PixelCluster {
    fn from(pixels: Vec<Pixel>) -> Self {
        Self {
            pixels,
            split_error_x: None,
            split_error_y: None,
        }
    }
}
