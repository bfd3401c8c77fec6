use num_traits::One;
use std::ops::{Add, Sub};

use nalgebra::{ClosedAddAssign, ClosedDivAssign, Point, Point2, Scalar};

use super::{FloatType, WorldBox, WorldPoint, WorldVector};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AABB<Point> {
    pub min: Point,
    pub max: Point,
}

impl<Point> AABB<Point> {
    pub fn new(min: Point, max: Point) -> AABB<Point> {
        AABB { min, max }
    }

    pub fn with_size<S>(min: Point, size: &S) -> AABB<Point>
    where
        for<'a> &'a Point: Add<&'a S, Output = Point>,
    {
        let max = &min + size;
        AABB { min, max }
    }
}

impl<Point: Sub + Copy> AABB<Point> {
    /// Vector from the min corner to the max corner.
    pub fn extent(&self) -> Point::Output {
        self.max - self.min
    }
}

impl<T: Scalar + Copy + Sub> AABB<Point2<T>> {
    pub fn width(&self) -> T::Output {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> T::Output {
        self.max[1] - self.min[1]
    }
}

impl<T: Scalar + ClosedAddAssign + ClosedDivAssign + One, const D: usize> AABB<Point<T, D>> {
    pub fn centroid(&self) -> Point<T, D> {
        let two = T::one() + T::one();
        let avg_coords = (&self.min.coords + &self.max.coords) / two;
        Point::from(avg_coords)
    }
}

impl WorldBox {
    /// Inverted infinite box. Contains nothing, the first expansion defines it.
    pub fn empty() -> WorldBox {
        AABB {
            min: WorldPoint::from(WorldVector::repeat(FloatType::INFINITY)),
            max: WorldPoint::from(WorldVector::repeat(FloatType::NEG_INFINITY)),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a WorldPoint>) -> WorldBox {
        points.into_iter().fold(WorldBox::empty(), |mut b, p| {
            b.expand(p);
            b
        })
    }

    /// True if the box doesn't contain any point (also for boxes with NaN corners).
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| !(self.min[i] <= self.max[i]))
    }

    /// Grows the box to contain `point`. NaN coordinates poison the box instead
    /// of being skipped, so that invalid geometry stays detectable.
    pub fn expand(&mut self, point: &WorldPoint) {
        let min = |a: FloatType, b: FloatType| if b.is_nan() || b < a { b } else { a };
        let max = |a: FloatType, b: FloatType| if b.is_nan() || b > a { b } else { a };
        self.min = WorldPoint::from(self.min.coords.zip_map(&point.coords, min));
        self.max = WorldPoint::from(self.max.coords.zip_map(&point.coords, max));
    }

    pub fn expand_box(&mut self, other: &WorldBox) {
        if other.is_empty() {
            return;
        }
        self.expand(&other.min);
        self.expand(&other.max);
    }

    /// Index of the axis along which the box is the largest.
    pub fn longest_axis(&self) -> usize {
        self.extent().imax()
    }

    pub fn contains(&self, point: &WorldPoint) -> bool {
        (0..3).all(|i| self.min[i] <= point[i] && point[i] <= self.max[i])
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::test::WorldPointWrapper;
    use assert2::assert;
    use test_strategy::proptest;

    #[test]
    fn empty_box() {
        let b = WorldBox::empty();
        assert!(b.is_empty());
        assert!(!b.contains(&WorldPoint::origin()));
    }

    #[test]
    fn first_expansion_defines_the_box() {
        let mut b = WorldBox::empty();
        b.expand(&WorldPoint::new(1.0, 2.0, 3.0));
        assert!(!b.is_empty());
        assert!(b.min == WorldPoint::new(1.0, 2.0, 3.0));
        assert!(b.max == WorldPoint::new(1.0, 2.0, 3.0));
        assert!(b.extent() == WorldVector::zeros());
    }

    #[test]
    fn expand_by_empty_box_is_noop() {
        let mut b = WorldBox::new(WorldPoint::new(0.0, 0.0, 0.0), WorldPoint::new(1.0, 1.0, 1.0));
        let copy = b;
        b.expand_box(&WorldBox::empty());
        assert!(b == copy);
    }

    #[test]
    fn centroid_and_longest_axis() {
        let b = WorldBox::new(WorldPoint::new(-1.0, 0.0, 2.0), WorldPoint::new(1.0, 6.0, 3.0));
        assert!(b.centroid() == WorldPoint::new(0.0, 3.0, 2.5));
        assert!(b.longest_axis() == 1);
    }

    #[test]
    fn screen_block_size() {
        let b = AABB::with_size(Point2::new(10u32, 20), &nalgebra::Vector2::new(5u32, 7));
        assert!(b.width() == 5);
        assert!(b.height() == 7);
    }

    #[test]
    fn nan_poisons_the_box() {
        let b = WorldBox::from_points(&[
            WorldPoint::new(0.0, 0.0, 0.0),
            WorldPoint::new(FloatType::NAN, 1.0, 1.0),
            WorldPoint::new(2.0, 2.0, 2.0),
        ]);
        assert!(b.min.x.is_nan());
        assert!(b.is_empty());
    }

    #[proptest]
    fn expanded_box_contains_all_points(points: Vec<WorldPointWrapper>) {
        let b = WorldBox::from_points(points.iter().map(|p| &p.0));
        assert!(b.is_empty() == points.is_empty());
        for p in points.iter() {
            assert!(b.contains(p));
        }
    }
}
