/// 3D vector utilities for court positions and velocities.
/// Y is up; the net runs along the X axis at z = 0.

#[derive(
    Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize, PartialEq, ts_rs::TS,
)]
#[ts(export)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Authoritative spatial state of an entity.
pub type Position = Vec3;

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Shorthand constructor
pub fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Dot product
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Vector length
pub fn length(v: Vec3) -> f64 {
    (v.x * v.x + v.y * v.y + v.z * v.z).sqrt()
}

/// Length of the XZ (ground plane) projection
pub fn horizontal_length(v: Vec3) -> f64 {
    (v.x * v.x + v.z * v.z).sqrt()
}

/// Distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    length(sub(a, b))
}

/// Normalize vector to unit length
pub fn normalize(v: Vec3) -> Vec3 {
    let len = length(v);
    if len < 1e-10 {
        return Vec3::new(1.0, 0.0, 0.0);
    }
    Vec3::new(v.x / len, v.y / len, v.z / len)
}

/// Scale vector by scalar
pub fn scale(v: Vec3, s: f64) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

/// Add two vectors
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Unit direction on the ground plane for a facing angle.
/// Facing 0 looks down +Z; the angle grows towards +X, matching `atan2(dx, dz)`.
pub fn facing_direction(facing: f64) -> Vec3 {
    Vec3::new(facing.sin(), 0.0, facing.cos())
}

/// Facing angle for a ground-plane direction.
pub fn facing_from_direction(dx: f64, dz: f64) -> f64 {
    dx.atan2(dz)
}
