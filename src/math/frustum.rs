//! View frustum for patch culling

use crate::core::types::{Vec3, Vec4, Mat4};
use super::aabb::Aabb;

/// A plane `normal · p + distance = 0` (normal points into the frustum)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Signed distance from point to plane (positive = inside)
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    fn from_coefficients(raw: Vec4) -> Self {
        let normal = raw.truncate();
        let len = normal.length();
        if len > 0.0 {
            Self { normal: normal / len, distance: raw.w / len }
        } else {
            Self { normal: Vec3::ZERO, distance: raw.w }
        }
    }
}

/// View frustum with 6 planes (left, right, bottom, top, near, far)
#[derive(Clone, Copy, Debug)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix (Gribb/Hartmann).
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let raw = [
            rows[3] + rows[0], // left
            rows[3] - rows[0], // right
            rows[3] + rows[1], // bottom
            rows[3] - rows[1], // top
            rows[3] + rows[2], // near
            rows[3] - rows[2], // far
        ];

        Self {
            planes: raw.map(Plane::from_coefficients),
        }
    }

    /// Build the frustum for a camera from separate view and projection matrices
    pub fn from_matrices(view: &Mat4, proj: &Mat4) -> Self {
        Self::from_view_projection(&(*proj * *view))
    }

    /// Test a box given by center and half-extent.
    ///
    /// Returns false only when all 8 corners lie outside the same plane.
    pub fn intersects_box(&self, center: Vec3, half_extent: Vec3) -> bool {
        for plane in &self.planes {
            // Projected radius of the box onto the plane normal
            let radius = plane.normal.abs().dot(half_extent);
            if plane.distance_to_point(center) + radius < 0.0 {
                return false;
            }
        }
        true
    }

    /// Check if AABB intersects frustum (conservative test)
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.intersects_box(aabb.center(), aabb.half_extent())
    }
}
