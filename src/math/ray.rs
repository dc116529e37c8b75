//! Ray type and intersection tests

use crate::core::types::{Vec3, Mat4};
use super::aabb::Aabb;

/// Direction components smaller than this are treated as parallel to a slab
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// A ray defined by origin and direction
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

/// A ray-triangle hit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleHit {
    /// Ray parameter of the hit
    pub t: f32,
    /// Hit position
    pub point: Vec3,
}

impl Ray {
    /// Create a new ray (direction should be normalized)
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get point along ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray-AABB intersection using the slab method.
    ///
    /// Axes where the direction is (nearly) zero never produce parametric
    /// values; the origin must already lie inside that slab.
    /// Returns Some((t_near, t_far)) if intersection, None otherwise.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> Option<(f32, f32)> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.direction[axis];
            let (min, max) = (aabb.min[axis], aabb.max[axis]);

            if dir.abs() < PARALLEL_EPSILON {
                if origin < min || origin > max {
                    return None;
                }
                continue;
            }

            let mut t1 = (min - origin) / dir;
            let mut t2 = (max - origin) / dir;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
            }

            t_near = t_near.max(t1);
            t_far = t_far.min(t2);

            if t_near > t_far || t_far < 0.0 {
                return None;
            }
        }

        Some((t_near.max(0.0), t_far))
    }

    /// Ray-triangle intersection: plane hit followed by a barycentric inside test.
    ///
    /// Hits behind the origin and rays parallel to the plane are rejected.
    pub fn intersects_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<TriangleHit> {
        let normal = (b - a).cross(c - a);
        let denom = normal.dot(self.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = normal.dot(a - self.origin) / denom;
        if t < 0.0 {
            return None;
        }
        let point = self.at(t);

        // Barycentric coordinates of the plane hit
        let v0 = c - a;
        let v1 = b - a;
        let v2 = point - a;
        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);

        let det = dot00 * dot11 - dot01 * dot01;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let u = (dot11 * dot02 - dot01 * dot12) * inv;
        let v = (dot00 * dot12 - dot01 * dot02) * inv;

        const EDGE_TOLERANCE: f32 = 1e-5;
        if u >= -EDGE_TOLERANCE && v >= -EDGE_TOLERANCE && u + v <= 1.0 + EDGE_TOLERANCE {
            Some(TriangleHit { t, point })
        } else {
            None
        }
    }

    /// Transform ray by matrix
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        let new_origin = matrix.transform_point3(self.origin);
        let new_direction = matrix.transform_vector3(self.direction).normalize();
        Ray::new(new_origin, new_direction)
    }
}
