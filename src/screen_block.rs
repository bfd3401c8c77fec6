use std::iter::FusedIterator;
use std::num::NonZeroU32;

use crate::geometry::{ScreenBlock, ScreenPoint, ScreenSize};

pub trait ScreenBlockExt {
    fn from_size(size: ScreenSize) -> Self;
    fn is_empty_or_negative(&self) -> bool;
    fn area(&self) -> u32;
    fn contains_point(&self, point: &ScreenPoint) -> bool;
    fn internal_points(&self) -> InternalPoints;
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock>;
}

impl ScreenBlockExt for ScreenBlock {
    fn from_size(size: ScreenSize) -> ScreenBlock {
        ScreenBlock::with_size(ScreenPoint::origin(), &size)
    }

    fn is_empty_or_negative(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Number of pixels in the block, zero for empty or negative blocks
    fn area(&self) -> u32 {
        if self.is_empty_or_negative() {
            0
        } else {
            self.width() * self.height()
        }
    }

    fn contains_point(&self, point: &ScreenPoint) -> bool {
        self.min.x <= point.x && point.x < self.max.x && self.min.y <= point.y && point.y < self.max.y
    }

    /// Create an iterator over coordinates (x, y) pairs inside the block,
    /// in C order (x changes first, then y)
    fn internal_points(&self) -> InternalPoints {
        if self.is_empty_or_negative() {
            InternalPoints::empty()
        } else {
            InternalPoints {
                min_x: self.min.x,
                max: self.max,

                cursor: self.min,
            }
        }
    }

    /// Splits the block into tiles in row major order.
    /// Tiles are tile_size * tile_size large, except on the bottom and right side of the
    /// block, where they are clipped if tile size doesn't evenly divide block size.
    fn tile_ordering(&self, tile_size: NonZeroU32) -> Vec<ScreenBlock> {
        if self.is_empty_or_negative() {
            return Vec::new();
        }

        let step = tile_size.get() as usize;
        let mut tiles = Vec::new();
        for y in (self.min.y..self.max.y).step_by(step) {
            for x in (self.min.x..self.max.x).step_by(step) {
                tiles.push(ScreenBlock::new(
                    ScreenPoint::new(x, y),
                    ScreenPoint::new(
                        x.saturating_add(tile_size.get()).min(self.max.x),
                        y.saturating_add(tile_size.get()).min(self.max.y),
                    ),
                ));
            }
        }
        tiles
    }
}

#[derive(Copy, Clone, Debug)]
pub struct InternalPoints {
    min_x: u32,
    max: ScreenPoint,

    cursor: ScreenPoint,
}

impl InternalPoints {
    // Construct an iterator over internal points that returns no points
    fn empty() -> Self {
        InternalPoints {
            min_x: 1,
            max: ScreenPoint::origin(),

            cursor: ScreenPoint::origin(),
        }
    }
}

impl Iterator for InternalPoints {
    type Item = ScreenPoint;

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.len();
        (len, Some(len))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.y >= self.max.y {
            return None;
        }

        let ret = self.cursor;

        debug_assert!(self.cursor.x < self.max.x);
        self.cursor.x += 1;
        if self.cursor.x >= self.max.x {
            self.cursor.x = self.min_x;
            self.cursor.y += 1;
        }

        Some(ret)
    }
}

impl ExactSizeIterator for InternalPoints {
    fn len(&self) -> usize {
        if self.cursor.y >= self.max.y {
            0
        } else {
            let whole_rows = ScreenBlock::new(
                ScreenPoint::new(self.min_x, self.cursor.y + 1),
                self.max,
            );
            let current_row = ScreenBlock::new(
                self.cursor,
                ScreenPoint::new(self.max.x, self.cursor.y + 1),
            );
            (whole_rows.area() + current_row.area()) as usize
        }
    }
}

impl FusedIterator for InternalPoints {}
