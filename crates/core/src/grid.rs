//! The authoritative pixel grid and its transfer-buffer encoding

use crate::Color;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bytes per cell in the transfer buffer (r, g, b)
pub const BYTES_PER_CELL: usize = 3;

/// Grid construction and addressing errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// Negative or unaddressable board dimensions
    #[error("Invalid board dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Coordinates outside `[0, W) x [0, H)`
    #[error("Cell ({x}, {y}) is outside the board")]
    OutOfBounds { x: i64, y: i64 },

    /// Stored pixel data does not match the declared dimensions
    #[error("Snapshot holds {actual} bytes, expected {expected}")]
    SnapshotMismatch { expected: usize, actual: usize },
}

/// A validated cell address
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
    /// Row-major index (`y * width + x`)
    pub index: usize,
}

/// Board as handed to and received from storage
///
/// `pixels` is exactly the transfer buffer: `width * height * 3` bytes,
/// row-major, channel order (r, g, b).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

/// Fully populated W x H grid of colors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    cells: Vec<Color>,
}

impl PixelGrid {
    /// Allocate a grid filled with `fill`
    pub fn new(width: i64, height: i64, fill: Color) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions { width, height };
        let w = usize::try_from(width).map_err(|_| invalid.clone())?;
        let h = usize::try_from(height).map_err(|_| invalid.clone())?;

        // The transfer buffer must be addressable too
        let len = w
            .checked_mul(h)
            .filter(|n| n.checked_mul(BYTES_PER_CELL).is_some())
            .ok_or(invalid)?;

        Ok(Self {
            width: w,
            height: h,
            cells: vec![fill; len],
        })
    }

    /// Rebuild a grid from a stored snapshot
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Result<Self, GridError> {
        let expected = snapshot
            .width
            .checked_mul(snapshot.height)
            .and_then(|n| n.checked_mul(BYTES_PER_CELL))
            .ok_or(GridError::InvalidDimensions {
                width: snapshot.width as i64,
                height: snapshot.height as i64,
            })?;

        if snapshot.pixels.len() != expected {
            return Err(GridError::SnapshotMismatch {
                expected,
                actual: snapshot.pixels.len(),
            });
        }

        let cells = snapshot
            .pixels
            .chunks_exact(BYTES_PER_CELL)
            .map(|c| Color::new(c[0], c[1], c[2]))
            .collect();

        Ok(Self {
            width: snapshot.width,
            height: snapshot.height,
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Validate coordinates and resolve them to a cell address
    pub fn cell(&self, x: i64, y: i64) -> Result<Cell, GridError> {
        resolve_cell(self.width, self.height, x, y)
    }

    /// Read the committed color at (x, y)
    pub fn get(&self, x: i64, y: i64) -> Result<Color, GridError> {
        let cell = self.cell(x, y)?;
        Ok(self.cells[cell.index])
    }

    /// Overwrite the color at (x, y)
    pub fn set(&mut self, x: i64, y: i64, color: Color) -> Result<(), GridError> {
        let cell = self.cell(x, y)?;
        self.set_cell(cell, color);
        Ok(())
    }

    /// Overwrite an already validated cell
    pub fn set_cell(&mut self, cell: Cell, color: Color) {
        self.cells[cell.index] = color;
    }

    /// Encode the grid as the transfer buffer
    pub fn serialize(&self) -> Bytes {
        let mut buf = Vec::with_capacity(self.cells.len() * BYTES_PER_CELL);
        for color in &self.cells {
            buf.extend_from_slice(&color.to_bytes());
        }
        Bytes::from(buf)
    }

    /// Copy the grid out in storage form
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            width: self.width,
            height: self.height,
            pixels: self.serialize().to_vec(),
        }
    }
}

/// Bounds check shared by the grid and callers holding only the dimensions
pub fn resolve_cell(width: usize, height: usize, x: i64, y: i64) -> Result<Cell, GridError> {
    let out = GridError::OutOfBounds { x, y };
    let cx = usize::try_from(x).map_err(|_| out.clone())?;
    let cy = usize::try_from(y).map_err(|_| out.clone())?;

    if cx >= width || cy >= height {
        return Err(out);
    }

    Ok(Cell {
        x: cx,
        y: cy,
        index: cy * width + cx,
    })
}
