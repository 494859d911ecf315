//! Byte lengths paired with row/column extents.
//!
//! Subtrees store their size as a [`Length`] rather than absolute
//! positions, which is what lets an unchanged subtree be shared verbatim
//! between the tree before an edit and the tree after it. Absolute
//! positions are recovered by summing lengths during traversal.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use serde::{Deserialize, Serialize};

/// Zero-based row and byte column.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub row: u32,
    pub column: u32,
}

impl Point {
    pub const ZERO: Point = Point { row: 0, column: 0 };

    #[inline]
    pub const fn new(row: u32, column: u32) -> Self {
        Point { row, column }
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row + 1, self.column + 1)
    }
}

/// A span of text measured both in bytes and in rows/columns.
///
/// Used for sizes (relative) and for absolute positions (a length measured
/// from the start of input).
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct Length {
    pub bytes: u32,
    pub extent: Point,
}

impl Length {
    pub const ZERO: Length = Length {
        bytes: 0,
        extent: Point::ZERO,
    };

    #[inline]
    pub const fn new(bytes: u32, extent: Point) -> Self {
        Length { bytes, extent }
    }

    /// Measure a piece of text.
    pub fn of_str(text: &str) -> Self {
        let bytes = u32::try_from(text.len()).unwrap_or(u32::MAX);
        match text.rfind('\n') {
            Some(last) => {
                let rows = text.bytes().filter(|&b| b == b'\n').count();
                Length {
                    bytes,
                    extent: Point {
                        row: u32::try_from(rows).unwrap_or(u32::MAX),
                        column: u32::try_from(text.len() - last - 1).unwrap_or(u32::MAX),
                    },
                }
            }
            None => Length {
                bytes,
                extent: Point { row: 0, column: bytes },
            },
        }
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.bytes == 0
    }
}

impl Add for Length {
    type Output = Length;

    #[inline]
    fn add(self, other: Length) -> Length {
        Length {
            bytes: self.bytes + other.bytes,
            extent: if other.extent.row > 0 {
                Point {
                    row: self.extent.row + other.extent.row,
                    column: other.extent.column,
                }
            } else {
                Point {
                    row: self.extent.row,
                    column: self.extent.column + other.extent.column,
                }
            },
        }
    }
}

impl AddAssign for Length {
    #[inline]
    fn add_assign(&mut self, other: Length) {
        *self = *self + other;
    }
}

/// Saturating difference between two absolute positions (`self >= other`).
impl Sub for Length {
    type Output = Length;

    #[inline]
    fn sub(self, other: Length) -> Length {
        Length {
            bytes: self.bytes.saturating_sub(other.bytes),
            extent: if self.extent.row > other.extent.row {
                Point {
                    row: self.extent.row - other.extent.row,
                    column: self.extent.column,
                }
            } else {
                Point {
                    row: 0,
                    column: self.extent.column.saturating_sub(other.extent.column),
                }
            },
        }
    }
}

impl fmt::Debug for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b{:?}", self.bytes, self.extent)
    }
}

/// Absolute source range of a node.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Range {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_point: Point,
    pub end_point: Point,
}

impl Range {
    #[inline]
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.start_byte as usize..self.end_byte as usize
    }
}

#[cfg(test)]
mod tests;
