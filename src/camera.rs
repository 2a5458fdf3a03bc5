//! Follow camera with frame-rate independent smoothing
//!
//! Smoothing rates are tuned as "fraction of the remaining distance closed
//! per 1/60 s frame". Applying that fraction directly every frame makes the
//! camera faster at 144 Hz than at 30 Hz, so each frame re-derives the rate
//! for the actual elapsed time:
//!
//! ```text
//! effective = 1 - (1 - nominal) ^ normalized_dt
//! ```
//!
//! where `normalized_dt` is elapsed time in reference frames. For a fixed
//! target the result depends only on total wall-clock time.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Upper bound for a smoothing rate (1.0 would mean "teleport")
pub const MAX_RATE: f32 = 0.999;

/// Convert a per-reference-frame rate into the fraction to close this frame
#[inline]
pub fn effective_rate(nominal: f32, normalized_dt: f32) -> f32 {
    let nominal = nominal.clamp(0.0, MAX_RATE);
    let ndt = normalized_dt.max(0.0);
    1.0 - (1.0 - nominal).powf(ndt)
}

/// Read-only camera pose handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    pub position: Vec3,
    pub target: Vec3,
    pub orientation: Quat,
}

/// Camera that trails a moving target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraRig {
    /// Smoothed follow target
    target: Vec3,
    /// Camera position (always `target + offset`)
    position: Vec3,
    /// Fixed offset from the follow target to the eye
    offset: Vec3,
    /// Per-axis smoothing rates
    rates: Vec3,
    /// Captured once; never recomputed from noisy positions
    orientation: Quat,
}

impl CameraRig {
    /// Create a rig looking at `target` from `target + offset`
    ///
    /// A zero offset (2D games) yields an identity orientation.
    pub fn new(target: Vec3, offset: Vec3, rates: Vec3) -> Self {
        let clamped = rates.clamp(Vec3::ZERO, Vec3::splat(MAX_RATE));
        if clamped != rates {
            log::warn!("Camera rates {:?} clamped to {:?}", rates, clamped);
        }
        let orientation = if offset.length_squared() > f32::EPSILON {
            let eye = target + offset;
            let up = if offset.cross(Vec3::Y).length_squared() > f32::EPSILON {
                Vec3::Y
            } else {
                Vec3::Z
            };
            Quat::from_mat4(&Mat4::look_at_rh(eye, target, up)).inverse()
        } else {
            Quat::IDENTITY
        };
        Self {
            target,
            position: target + offset,
            offset,
            rates: clamped,
            orientation,
        }
    }

    /// Advance toward `goal` by `normalized_dt` reference frames
    pub fn follow(&mut self, goal: Vec3, normalized_dt: f32) {
        let t = Vec3::new(
            effective_rate(self.rates.x, normalized_dt),
            effective_rate(self.rates.y, normalized_dt),
            effective_rate(self.rates.z, normalized_dt),
        );
        self.target += (goal - self.target) * t;
        self.position = self.target + self.offset;
    }

    /// Jump straight to `goal` (level start, respawn)
    pub fn snap_to(&mut self, goal: Vec3) {
        self.target = goal;
        self.position = goal + self.offset;
    }

    pub fn set_rates(&mut self, rates: Vec3) {
        self.rates = rates.clamp(Vec3::ZERO, Vec3::splat(MAX_RATE));
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn view(&self) -> CameraView {
        CameraView {
            position: self.position,
            target: self.target,
            orientation: self.orientation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rig() -> CameraRig {
        CameraRig::new(Vec3::ZERO, Vec3::new(0.0, 8.0, 10.0), Vec3::new(0.05, 0.05, 0.15))
    }

    #[test]
    fn one_reference_frame_closes_nominal_fraction() {
        assert!((effective_rate(0.15, 1.0) - 0.15).abs() < 1e-6);
        assert_eq!(effective_rate(0.15, 0.0), 0.0);
        assert_eq!(effective_rate(0.0, 5.0), 0.0);
    }

    #[test]
    fn split_frames_converge_identically() {
        let goal = Vec3::new(100.0, -20.0, 300.0);

        let mut at_60hz = rig();
        for _ in 0..120 {
            at_60hz.follow(goal, 1.0);
        }

        let mut at_30hz = rig();
        for _ in 0..60 {
            at_30hz.follow(goal, 2.0);
        }

        let mut jittery = rig();
        let steps = [0.5f32, 1.7, 0.3, 3.5];
        let mut elapsed = 0.0;
        let mut i = 0;
        while elapsed < 120.0 {
            let step = steps[i % steps.len()].min(120.0 - elapsed);
            jittery.follow(goal, step);
            elapsed += step;
            i += 1;
        }

        assert!(at_60hz.position().distance(at_30hz.position()) < 1e-3);
        assert!(at_60hz.position().distance(jittery.position()) < 1e-3);
    }

    #[test]
    fn axes_converge_independently() {
        let mut cam = rig();
        cam.follow(Vec3::new(10.0, 10.0, 10.0), 1.0);
        let t = cam.target();
        assert!((t.x - 0.5).abs() < 1e-5);
        assert!((t.z - 1.5).abs() < 1e-5);
    }

    #[test]
    fn moving_target_is_close_across_frame_rates() {
        let velocity = Vec3::new(0.0, 0.0, 2.0);
        let mut fast = rig();
        let mut slow = rig();
        for frame in 0..240 {
            fast.follow(velocity * (frame as f32 + 1.0), 1.0);
        }
        for frame in 0..120 {
            slow.follow(velocity * (2.0 * frame as f32 + 2.0), 2.0);
        }
        // Integration-order error only
        assert!(fast.position().distance(slow.position()) < 2.0);
    }

    #[test]
    fn orientation_is_fixed() {
        let mut cam = rig();
        let before = cam.orientation();
        for i in 0..30 {
            cam.follow(Vec3::new(i as f32 * 3.0, (i as f32).sin(), i as f32), 1.0);
        }
        assert_eq!(cam.orientation(), before);
        assert_eq!(cam.position(), cam.target() + Vec3::new(0.0, 8.0, 10.0));
    }

    #[test]
    fn flat_rig_has_identity_orientation() {
        let cam = CameraRig::new(Vec3::ZERO, Vec3::ZERO, Vec3::splat(0.1));
        assert_eq!(cam.orientation(), Quat::IDENTITY);
    }

    #[test]
    fn out_of_range_rates_are_clamped() {
        let mut cam = CameraRig::new(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.5, -0.2, 0.5));
        cam.follow(Vec3::splat(1.0), 1.0);
        assert!(cam.target().x < 1.0);
        assert_eq!(cam.target().y, 0.0);
    }

    proptest! {
        #[test]
        fn constant_target_ignores_frame_split(
            steps in prop::collection::vec(0.1f32..4.0, 1..40),
            rate in 0.01f32..0.5,
        ) {
            let goal = Vec3::new(50.0, -30.0, 80.0);
            let total: f32 = steps.iter().sum();

            let mut split = CameraRig::new(Vec3::ZERO, Vec3::ZERO, Vec3::splat(rate));
            for step in &steps {
                split.follow(goal, *step);
            }
            let mut whole = CameraRig::new(Vec3::ZERO, Vec3::ZERO, Vec3::splat(rate));
            whole.follow(goal, total);

            prop_assert!(split.position().distance(whole.position()) < 1e-2);
        }
    }
}
