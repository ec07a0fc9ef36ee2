//! Minimal 3D geometry for badge placement.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// Right
    pub x: f32,
    /// Up
    pub y: f32,
    /// Forward
    pub z: f32,
}

impl Vec3 {
    /// Origin
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    /// Vector from components.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero-length vector.
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len <= f32::EPSILON {
            return None;
        }
        Some(Vec3::new(self.x / len, self.y / len, self.z / len))
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// Where a badge sits this frame and what it faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Entity head position plus the configured offset
    pub anchor: Vec3,
    /// Point the badge faces (the local viewer's head)
    pub look_at: Vec3,
}

impl Placement {
    /// Compute the placement for a badge above `head`, facing `viewer_head`.
    pub fn above(head: Vec3, offset: Vec3, viewer_head: Vec3) -> Self {
        Self {
            anchor: head + offset,
            look_at: viewer_head,
        }
    }

    /// Unit direction from the anchor toward the viewer.
    ///
    /// `None` when the viewer is exactly at the anchor.
    pub fn facing(&self) -> Option<Vec3> {
        (self.look_at - self.anchor).normalized()
    }
}
