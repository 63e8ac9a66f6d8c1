use glam::{Mat4, Vec3};

use crate::Memo;

/// Orbit camera: pan and tilt around the scene origin at a distance.
///
/// Dragging orbits, the wheel zooms in fixed steps, and arrow keys set
/// pan/tilt rates applied once per frame. The rotation, view, and inverse
/// view matrices are memoized; mutating pan or tilt dirties all three,
/// mutating the distance dirties only the view pair.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pan: f32,
    tilt: f32,
    distance: f32,
    pan_rate: f32,
    tilt_rate: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub drag_sensitivity: f32,
    pub rate_step: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    rotation: Memo<Mat4>,
    view: Memo<Mat4>,
    inv_view: Memo<Mat4>,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            pan: -3.14,
            tilt: -0.4,
            distance: 7.3,
            pan_rate: 0.0,
            tilt_rate: 0.0,
            min_distance: 1.5,
            max_distance: 5.0,
            drag_sensitivity: 0.01,
            rate_step: 0.02,
            fov: std::f32::consts::FRAC_PI_4,
            aspect: 1.0,
            near: 0.1,
            far: 14.0,
            rotation: Memo::new(),
            view: Memo::new(),
            inv_view: Memo::new(),
        }
    }
}

impl OrbitCamera {
    pub fn pan(&self) -> f32 {
        self.pan
    }

    pub fn tilt(&self) -> f32 {
        self.tilt
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Orbit by pointer drag deltas (screen pixels).
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.pan -= dx * self.drag_sensitivity;
        self.tilt -= dy * self.drag_sensitivity;
        self.dirty_rotation();
    }

    /// Zoom one wheel step in or out; the distance scales by 20% per step
    /// and is clamped to the configured range. Zero steps is a no-op.
    pub fn zoom(&mut self, steps: f32) {
        if steps == 0.0 {
            return;
        }
        let factor = 1.0 + steps.signum() * 0.2;
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
        self.dirty_view();
    }

    /// Nudge the key-driven pan rate; rates saturate at ±1.
    pub fn nudge_pan_rate(&mut self, delta: f32) {
        self.pan_rate = (self.pan_rate + delta).clamp(-1.0, 1.0);
    }

    /// Nudge the key-driven tilt rate; rates saturate at ±1.
    pub fn nudge_tilt_rate(&mut self, delta: f32) {
        self.tilt_rate = (self.tilt_rate + delta).clamp(-1.0, 1.0);
    }

    /// Apply the held-key pan/tilt rates for one frame.
    pub fn apply_rates(&mut self) {
        if self.pan_rate != 0.0 || self.tilt_rate != 0.0 {
            self.pan += self.pan_rate * self.rate_step;
            self.tilt += self.tilt_rate * self.rate_step;
            self.dirty_rotation();
        }
    }

    fn dirty_rotation(&self) {
        // Rotation feeds view feeds inverse view; invalidate downstream too.
        self.rotation.invalidate();
        self.dirty_view();
    }

    fn dirty_view(&self) {
        self.view.invalidate();
        self.inv_view.invalidate();
    }

    /// Orbit rotation: pan about +Y composed with tilt about +X.
    pub fn rotation(&self) -> Mat4 {
        let (pan, tilt) = (self.pan, self.tilt);
        self.rotation
            .get_or_compute(|| Mat4::from_rotation_y(pan) * Mat4::from_rotation_x(tilt))
    }

    /// Camera-to-world transform (orbit rotation, then back off by distance).
    pub fn view(&self) -> Mat4 {
        let rotation = self.rotation();
        let distance = self.distance;
        self.view
            .get_or_compute(|| rotation * Mat4::from_translation(Vec3::new(0.0, 0.0, distance)))
    }

    /// World-to-camera transform, the matrix passes actually consume.
    pub fn inv_view(&self) -> Mat4 {
        let view = self.view();
        self.inv_view.get_or_compute(|| view.inverse())
    }

    /// Camera position in world space.
    pub fn eye(&self) -> Vec3 {
        self.view().transform_point3(Vec3::ZERO)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.inv_view()
    }

    #[cfg(test)]
    fn view_is_dirty(&self) -> bool {
        self.view.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_produces_valid_matrices() {
        let cam = OrbitCamera::default();
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
        assert!(cam.eye().length() > 0.0);
    }

    #[test]
    fn matrices_are_lazy_until_read() {
        let cam = OrbitCamera::default();
        assert!(cam.view_is_dirty());
        let _ = cam.view();
        assert!(!cam.view_is_dirty());
    }

    #[test]
    fn orbit_dirties_view_chain() {
        let mut cam = OrbitCamera::default();
        let before = cam.inv_view();
        cam.orbit(10.0, 0.0);
        assert!(cam.view_is_dirty());
        assert_ne!(cam.inv_view(), before);
    }

    #[test]
    fn stationary_camera_reuses_cached_view() {
        let cam = OrbitCamera::default();
        let a = cam.inv_view();
        let b = cam.inv_view();
        assert_eq!(a, b);
        assert!(!cam.view_is_dirty());
    }

    #[test]
    fn zoom_clamps_to_range() {
        let mut cam = OrbitCamera::default();
        for _ in 0..30 {
            cam.zoom(1.0);
        }
        assert_eq!(cam.distance(), cam.max_distance);
        for _ in 0..30 {
            cam.zoom(-1.0);
        }
        assert_eq!(cam.distance(), cam.min_distance);
    }

    #[test]
    fn zero_step_zoom_changes_nothing() {
        let mut cam = OrbitCamera::default();
        let view = cam.view();
        cam.zoom(0.0);
        assert_eq!(cam.distance(), 7.3);
        assert!(!cam.view_is_dirty());
        assert_eq!(cam.view(), view);
    }

    #[test]
    fn zoom_dirties_view_but_not_rotation() {
        let mut cam = OrbitCamera::default();
        let rotation = cam.rotation();
        let view = cam.view();
        cam.zoom(-1.0);
        assert_eq!(cam.rotation(), rotation);
        assert_ne!(cam.view(), view);
    }

    #[test]
    fn rates_saturate_and_apply_per_frame() {
        let mut cam = OrbitCamera::default();
        cam.nudge_pan_rate(-1.0);
        cam.nudge_pan_rate(-1.0);
        let pan = cam.pan();
        cam.apply_rates();
        assert!((cam.pan() - (pan - cam.rate_step)).abs() < 1e-6);

        // Key release restores a zero rate.
        cam.nudge_pan_rate(1.0);
        let settled = cam.pan();
        cam.apply_rates();
        assert_eq!(cam.pan(), settled);
    }

    #[test]
    fn inv_view_inverts_view() {
        let cam = OrbitCamera::default();
        let product = cam.view() * cam.inv_view();
        assert!(product.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }
}
