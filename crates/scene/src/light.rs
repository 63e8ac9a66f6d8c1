use glam::{Mat3, Mat4, Vec3};

use crate::TimeTagged;

/// Directional light rig for the shadow pass.
///
/// A fixed tilt and heading define the light direction; the rotation,
/// inverse rotation, and light-view transform are memoized per frame
/// timestamp so every pass in a frame reads identical matrices.
#[derive(Debug, Clone)]
pub struct LightRig {
    pub tilt: f32,
    pub heading: f32,
    rotation: TimeTagged<Mat3>,
    inv_rotation: TimeTagged<Mat3>,
    xform: TimeTagged<Mat4>,
}

impl Default for LightRig {
    fn default() -> Self {
        Self {
            tilt: 0.4,
            heading: 0.9,
            rotation: TimeTagged::new(),
            inv_rotation: TimeTagged::new(),
            xform: TimeTagged::new(),
        }
    }
}

impl LightRig {
    /// Orthographic projection sized to the puzzle floor.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh(-1.43, 1.43, -0.55, 0.77, -0.3, 2.2)
    }

    pub fn rotation_at(&self, time: f32) -> Mat3 {
        let (tilt, heading) = (self.tilt, self.heading);
        self.rotation.get_at(time, |_| {
            Mat3::from_mat4(Mat4::from_rotation_x(-tilt) * Mat4::from_rotation_y(heading))
        })
    }

    pub fn inv_rotation_at(&self, time: f32) -> Mat3 {
        let rotation = self.rotation_at(time);
        self.inv_rotation.get_at(time, |_| rotation.transpose())
    }

    /// Direction the light shines along, in world space.
    pub fn direction_at(&self, time: f32) -> Vec3 {
        self.rotation_at(time) * Vec3::NEG_Z
    }

    /// World-to-light-view transform for shadow rendering.
    pub fn xform_at(&self, time: f32) -> Mat4 {
        let eye = self.inv_rotation_at(time) * Vec3::NEG_Z;
        self.xform
            .get_at(time, |_| Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y))
    }

    /// Combined projection × view for the shadow pass.
    pub fn view_projection_at(&self, time: f32) -> Mat4 {
        self.projection() * self.xform_at(time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_orthonormal() {
        let rig = LightRig::default();
        let r = rig.rotation_at(0.0);
        let product = r * r.transpose();
        assert!(product.abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }

    #[test]
    fn inverse_rotation_is_transpose() {
        let rig = LightRig::default();
        let product = rig.rotation_at(1.0) * rig.inv_rotation_at(1.0);
        assert!(product.abs_diff_eq(Mat3::IDENTITY, 1e-5));
    }

    #[test]
    fn light_looks_at_origin() {
        let rig = LightRig::default();
        let eye = rig.inv_rotation_at(0.0) * Vec3::NEG_Z;
        let view = rig.xform_at(0.0);
        // The eye maps to the view origin.
        assert!(view.transform_point3(eye).length() < 1e-5);
    }

    #[test]
    fn same_timestamp_yields_identical_matrices() {
        let rig = LightRig::default();
        assert_eq!(rig.xform_at(2.5), rig.xform_at(2.5));
        assert_eq!(rig.rotation_at(2.5), rig.rotation_at(2.5));
    }
}
