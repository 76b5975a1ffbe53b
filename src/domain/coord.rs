//! Tile coordinates and the fixed world grid.
//!
//! Everything in the simulation lives on an 80×60 tile grid. Pixel space is
//! only used by the presentation layer: `pixel = tile × BLOCK_SIZE`.

use std::ops::{Add, Sub};

pub const WORLD_WIDTH: i32 = 80;
pub const WORLD_HEIGHT: i32 = 60;
pub const BLOCK_SIZE: i32 = 10;

/// Integer tile position. Plain value type, copied everywhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Inside the world grid?
    #[inline]
    pub fn is_valid(self) -> bool {
        self.x >= 0 && self.x < WORLD_WIDTH && self.y >= 0 && self.y < WORLD_HEIGHT
    }

    /// Euclidean distance in tiles.
    pub fn distance_to(self, other: Coord) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn to_pixels(self) -> (i32, i32) {
        (self.x * BLOCK_SIZE, self.y * BLOCK_SIZE)
    }

    /// Pixel → tile, flooring toward negative infinity.
    #[allow(dead_code)]
    pub fn from_pixels(px: i32, py: i32) -> Self {
        Coord::new(px.div_euclid(BLOCK_SIZE), py.div_euclid(BLOCK_SIZE))
    }

    /// Flat index into a `WORLD_WIDTH × WORLD_HEIGHT` buffer. None if out of bounds.
    #[inline]
    pub fn index(self) -> Option<usize> {
        if self.is_valid() {
            Some((self.y * WORLD_WIDTH + self.x) as usize)
        } else {
            None
        }
    }

    pub fn step(self, dir: Direction) -> Coord {
        self + dir.delta()
    }

    /// Tile-sized rectangle at this tile's pixel position.
    pub fn bounds(self) -> PixelRect {
        let (x, y) = self.to_pixels();
        PixelRect { x, y, w: BLOCK_SIZE, h: BLOCK_SIZE }
    }
}

impl Add for Coord {
    type Output = Coord;
    fn add(self, rhs: Coord) -> Coord {
        Coord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coord {
    type Output = Coord;
    fn sub(self, rhs: Coord) -> Coord {
        Coord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Cardinal direction. Used for movement intent, facing and harpoon flight.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub fn delta(self) -> Coord {
        match self {
            Direction::Up => Coord::new(0, -1),
            Direction::Down => Coord::new(0, 1),
            Direction::Left => Coord::new(-1, 0),
            Direction::Right => Coord::new(1, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn corners_are_valid() {
        assert!(Coord::new(0, 0).is_valid());
        assert!(Coord::new(WORLD_WIDTH - 1, WORLD_HEIGHT - 1).is_valid());
        assert!(!Coord::new(WORLD_WIDTH, 0).is_valid());
        assert!(!Coord::new(0, WORLD_HEIGHT).is_valid());
        assert!(!Coord::new(-1, 5).is_valid());
    }

    #[test]
    fn three_four_five() {
        let d = Coord::new(0, 0).distance_to(Coord::new(3, 4));
        assert!((d - 5.0).abs() < 1e-6);
    }

    #[test]
    fn pixel_conversion() {
        assert_eq!(Coord::new(3, 7).to_pixels(), (30, 70));
        assert_eq!(Coord::from_pixels(39, 70), Coord::new(3, 7));
        assert_eq!(Coord::from_pixels(-1, 0), Coord::new(-1, 0));
        let r = Coord::new(2, 1).bounds();
        assert_eq!((r.x, r.y, r.w, r.h), (20, 10, BLOCK_SIZE, BLOCK_SIZE));
    }

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Coord::new(4, -2);
        let b = Coord::new(1, 3);
        assert_eq!(a + b, Coord::new(5, 1));
        assert_eq!(a - b, Coord::new(3, -5));
        assert_eq!(Coord::new(5, 5).step(Direction::Up), Coord::new(5, 4));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_valid_iff_inside_grid(x in -200i32..200, y in -200i32..200) {
            let inside = (0..WORLD_WIDTH).contains(&x) && (0..WORLD_HEIGHT).contains(&y);
            prop_assert_eq!(Coord::new(x, y).is_valid(), inside);
            prop_assert_eq!(Coord::new(x, y).index().is_some(), inside);
        }

        #[test]
        fn prop_distance_is_symmetric(ax in -100i32..100, ay in -100i32..100,
                                      bx in -100i32..100, by in -100i32..100) {
            let a = Coord::new(ax, ay);
            let b = Coord::new(bx, by);
            prop_assert!((a.distance_to(b) - b.distance_to(a)).abs() < 1e-4);
        }

        #[test]
        fn prop_pixel_round_trip(x in -50i32..150, y in -50i32..150) {
            let (px, py) = Coord::new(x, y).to_pixels();
            prop_assert_eq!(Coord::from_pixels(px, py), Coord::new(x, y));
        }
    }
}
