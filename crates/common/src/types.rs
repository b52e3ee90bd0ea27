use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// A single mesh vertex: object-space position plus texture coordinate.
///
/// Vertex order encodes triangle winding and is preserved unchanged from
/// import through GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Spatial transform: position, Euler rotation, per-axis scale.
///
/// Rotation angles are in degrees and apply X, then Y, then Z. The
/// composition order is fixed: translate ∘ rotX ∘ rotY ∘ rotZ ∘ scale,
/// applied right-to-left to a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    /// Euler angles in degrees, applied X then Y then Z.
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Model-to-world matrix for this transform.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(self.rotation.x.to_radians())
            * Mat4::from_rotation_y(self.rotation.y.to_radians())
            * Mat4::from_rotation_z(self.rotation.z.to_radians())
            * Mat4::from_scale(self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert!(t.matrix().abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn transform_composition_order_is_fixed() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Vec3::new(0.0, 90.0, 0.0),
            scale: Vec3::new(2.0, 1.0, 1.0),
        };
        let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
            * Mat4::from_rotation_y(90.0_f32.to_radians())
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        assert!(t.matrix().abs_diff_eq(expected, 1e-5));

        // Scale applies first, rotation second: the local +X point scales to
        // (2,0,0), then rotates onto -Z, then translates.
        let p = t.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(1.0, 2.0, 1.0), 1e-5), "got {p}");
    }

    #[test]
    fn rotation_axes_do_not_commute() {
        let t = Transform {
            position: Vec3::ZERO,
            rotation: Vec3::new(30.0, 45.0, 0.0),
            scale: Vec3::ONE,
        };
        let swapped = Mat4::from_rotation_y(45.0_f32.to_radians())
            * Mat4::from_rotation_x(30.0_f32.to_radians());
        assert!(!t.matrix().abs_diff_eq(swapped, 1e-5));
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }
}
