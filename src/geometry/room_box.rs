use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{DegenerateGeometryError, GeometryEntity};
use crate::math::distance_2d::interval_gap;
use crate::math::Point2;

/// Room category, using the RPLAN label set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum RoomType {
    LivingRoom = 0,
    MasterRoom = 1,
    Kitchen = 2,
    Bathroom = 3,
    DiningRoom = 4,
    ChildRoom = 5,
    StudyRoom = 6,
    SecondRoom = 7,
    GuestRoom = 8,
    Balcony = 9,
    Entrance = 10,
    Storage = 11,
    WallIn = 12,
    External = 13,
    ExteriorWall = 14,
    FrontDoor = 15,
    InteriorWall = 16,
    InteriorDoor = 17,
}

/// Raw label outside the known category set.
#[derive(Debug, Clone, Copy, Error)]
#[error("unknown room type label {0}")]
pub struct UnknownRoomType(pub u8);

impl RoomType {
    /// All categories in label order.
    pub const ALL: [RoomType; 18] = [
        Self::LivingRoom,
        Self::MasterRoom,
        Self::Kitchen,
        Self::Bathroom,
        Self::DiningRoom,
        Self::ChildRoom,
        Self::StudyRoom,
        Self::SecondRoom,
        Self::GuestRoom,
        Self::Balcony,
        Self::Entrance,
        Self::Storage,
        Self::WallIn,
        Self::External,
        Self::ExteriorWall,
        Self::FrontDoor,
        Self::InteriorWall,
        Self::InteriorDoor,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::LivingRoom => "living room",
            Self::MasterRoom => "master room",
            Self::Kitchen => "kitchen",
            Self::Bathroom => "bathroom",
            Self::DiningRoom => "dining room",
            Self::ChildRoom => "child room",
            Self::StudyRoom => "study room",
            Self::SecondRoom => "second room",
            Self::GuestRoom => "guest room",
            Self::Balcony => "balcony",
            Self::Entrance => "entrance",
            Self::Storage => "storage",
            Self::WallIn => "wall-in",
            Self::External => "external",
            Self::ExteriorWall => "exterior wall",
            Self::FrontDoor => "front door",
            Self::InteriorWall => "interior wall",
            Self::InteriorDoor => "interior door",
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<RoomType> for u8 {
    fn from(t: RoomType) -> Self {
        t as u8
    }
}

impl TryFrom<u8> for RoomType {
    type Error = UnknownRoomType;

    fn try_from(label: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(label))
            .copied()
            .ok_or(UnknownRoomType(label))
    }
}

/// An axis-aligned room rectangle tagged with its category.
///
/// Immutable once constructed; `x_min < x_max` and `y_min < y_max` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BoxRecord")]
pub struct RoomBox {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    room_type: RoomType,
}

#[derive(Deserialize)]
struct BoxRecord {
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    room_type: RoomType,
}

impl TryFrom<BoxRecord> for RoomBox {
    type Error = DegenerateGeometryError;

    fn try_from(r: BoxRecord) -> Result<Self, Self::Error> {
        Self::new(r.x_min, r.y_min, r.x_max, r.y_max, r.room_type)
    }
}

impl RoomBox {
    /// Creates a new room box.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometryError::NonFinite` for NaN or infinite
    /// coordinates and `DegenerateGeometryError::InvertedBox` when the box
    /// has no positive extent on either axis.
    pub fn new(
        x_min: f64,
        y_min: f64,
        x_max: f64,
        y_max: f64,
        room_type: RoomType,
    ) -> Result<Self, DegenerateGeometryError> {
        let entity = GeometryEntity::Polygon;
        if ![x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) {
            return Err(DegenerateGeometryError::NonFinite { entity });
        }
        if x_min >= x_max || y_min >= y_max {
            return Err(DegenerateGeometryError::InvertedBox { entity });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
            room_type,
        })
    }

    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    #[must_use]
    pub fn room_type(&self) -> RoomType {
        self.room_type
    }

    /// Lower-left corner.
    #[must_use]
    pub fn min(&self) -> Point2 {
        Point2::new(self.x_min, self.y_min)
    }

    /// Upper-right corner.
    #[must_use]
    pub fn max(&self) -> Point2 {
        Point2::new(self.x_max, self.y_max)
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        Point2::new(
            (self.x_min + self.x_max) * 0.5,
            (self.y_min + self.y_max) * 0.5,
        )
    }

    /// Corners in counter-clockwise order, starting at the lower-left corner.
    #[must_use]
    pub fn corners(&self) -> [Point2; 4] {
        [
            Point2::new(self.x_min, self.y_min),
            Point2::new(self.x_max, self.y_min),
            Point2::new(self.x_max, self.y_max),
            Point2::new(self.x_min, self.y_max),
        ]
    }

    /// Positive-area overlap test. Boxes that only touch along an edge or at a
    /// corner do not intersect.
    #[must_use]
    pub fn intersects(&self, other: &RoomBox) -> bool {
        self.x_min < other.x_max
            && other.x_min < self.x_max
            && self.y_min < other.y_max
            && other.y_min < self.y_max
    }

    /// The overlap rectangle as `(min, max)` corners, if the boxes intersect.
    #[must_use]
    pub fn overlap(&self, other: &RoomBox) -> Option<(Point2, Point2)> {
        if !self.intersects(other) {
            return None;
        }
        Some((
            Point2::new(self.x_min.max(other.x_min), self.y_min.max(other.y_min)),
            Point2::new(self.x_max.min(other.x_max), self.y_max.min(other.y_max)),
        ))
    }

    /// Wall adjacency: the boxes overlap, or are at most `gap` apart along one
    /// axis while sharing more than `eps` of extent along the other.
    ///
    /// Corner contact alone is not adjacency.
    #[must_use]
    pub fn is_adjacent(&self, other: &RoomBox, gap: f64, eps: f64) -> bool {
        let gx = interval_gap(self.x_min, self.x_max, other.x_min, other.x_max);
        let gy = interval_gap(self.y_min, self.y_max, other.y_min, other.y_max);
        if gx < -eps && gy < -eps {
            return true;
        }
        (gx <= gap + eps && gy < -eps) || (gy <= gap + eps && gx < -eps)
    }

    /// Whether `other` lies inside this box (within `eps`).
    #[must_use]
    pub fn contains_box(&self, other: &RoomBox, eps: f64) -> bool {
        other.x_min >= self.x_min - eps
            && other.x_max <= self.x_max + eps
            && other.y_min >= self.y_min - eps
            && other.y_max <= self.y_max + eps
    }

    /// Whether a point lies inside the box (boundary included).
    #[must_use]
    pub fn contains_point(&self, p: &Point2) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}
