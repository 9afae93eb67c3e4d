//! Engine math types with built-in converters.
//!
//! These mirror the fixed-shape value types a game engine exposes to
//! gameplay code. All of them are plain `Copy` data.

use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vectors
// ---------------------------------------------------------------------------

/// 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f32,
    pub y: f32,
}

/// 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// 4D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

macro_rules! vector_ops {
    ($ty:ident { $($f:ident),+ }) => {
        impl $ty {
            pub const ZERO: Self = Self { $($f: 0.0),+ };
            pub const ONE: Self = Self { $($f: 1.0),+ };

            pub const fn new($($f: f32),+) -> Self {
                Self { $($f),+ }
            }

            /// Component-wise comparison within `eps`.
            pub fn approx_eq(self, other: Self, eps: f32) -> bool {
                true $(&& (self.$f - other.$f).abs() <= eps)+
            }

            pub fn abs(self) -> Self {
                Self { $($f: self.$f.abs()),+ }
            }

            pub fn to_array(self) -> Vec<f32> {
                vec![$(self.$f),+]
            }
        }

        impl Add for $ty {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($f: self.$f + rhs.$f),+ }
            }
        }

        impl Sub for $ty {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($f: self.$f - rhs.$f),+ }
            }
        }

        impl Mul<f32> for $ty {
            type Output = Self;
            fn mul(self, rhs: f32) -> Self {
                Self { $($f: self.$f * rhs),+ }
            }
        }

        impl Neg for $ty {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($f: -self.$f),+ }
            }
        }
    };
}

vector_ops!(Vector2 { x, y });
vector_ops!(Vector3 { x, y, z });
vector_ops!(Vector4 { x, y, z, w });

// ---------------------------------------------------------------------------
// Quaternion
// ---------------------------------------------------------------------------

/// Rotation quaternion. Defaults to [`Quaternion::IDENTITY`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    pub fn approx_eq(self, other: Self, eps: f32) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.z - other.z).abs() <= eps
            && (self.w - other.w).abs() <= eps
    }
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ---------------------------------------------------------------------------
// Color
// ---------------------------------------------------------------------------

/// Linear RGBA color with `f32` channels.
///
/// `Default` is transparent black; the converter falls back to
/// [`Color::WHITE`] for unreadable input instead.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Self = Self::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Self = Self::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Self = Self::new(0.0, 0.0, 1.0, 1.0);
    pub const CLEAR: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub fn approx_eq(self, other: Self, eps: f32) -> bool {
        (self.r - other.r).abs() <= eps
            && (self.g - other.g).abs() <= eps
            && (self.b - other.b).abs() <= eps
            && (self.a - other.a).abs() <= eps
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// Axis-aligned box described by its center and full size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub center: Vector3,
    pub size: Vector3,
}

impl Bounds {
    pub const fn new(center: Vector3, size: Vector3) -> Self {
        Self { center, size }
    }

    /// Build from opposite corners, in either order.
    pub fn from_min_max(min: Vector3, max: Vector3) -> Self {
        Self {
            center: (min + max) * 0.5,
            size: (max - min).abs(),
        }
    }

    pub fn extents(&self) -> Vector3 {
        self.size * 0.5
    }

    pub fn min(&self) -> Vector3 {
        self.center - self.extents()
    }

    pub fn max(&self) -> Vector3 {
        self.center + self.extents()
    }

    pub fn approx_eq(&self, other: &Self, eps: f32) -> bool {
        self.center.approx_eq(other.center, eps) && self.size.approx_eq(other.size, eps)
    }
}

crate::save_struct!(Vector2, Vector3, Vector4, Quaternion, Color, Bounds);
