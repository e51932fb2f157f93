//! Keyframe generation for the curtain panels and window flips.
//!
//! The host interpolates between samples with its own default curve, so the
//! generators only have to place the samples. Angles are authored in degrees
//! and converted to quaternions at the edge.

use glam::{EulerRot, Quat};
use serde::Serialize;

pub const DEGREES_TO_RADIANS: f32 = std::f32::consts::PI / 180.0;

/// One (time, rotation) sample. Every animation in the scene is
/// rotation-only, so the value is a bare quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub rotation: Quat,
}

/// A (time, angle-degrees) sample before quaternion conversion. Kept public
/// so the sweep math stays checkable without decomposing quaternions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepSample {
    pub time: f32,
    pub angle_deg: f32,
}

/// Rotation about the vertical axis.
pub fn yaw_deg(angle_deg: f32) -> Quat {
    Quat::from_rotation_y(angle_deg * DEGREES_TO_RADIANS)
}

/// Euler rotation in degrees, yaw applied first (host convention).
pub fn euler_deg(x_deg: f32, y_deg: f32, z_deg: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        y_deg * DEGREES_TO_RADIANS,
        x_deg * DEGREES_TO_RADIANS,
        z_deg * DEGREES_TO_RADIANS,
    )
}

/// Raw samples for a panel sweep: start, linear midpoint, end, and a short
/// hold at the end so playback stops on the resting pose.
pub fn sweep_samples(duration: f32, from_deg: f32, to_deg: f32, delay: f32) -> [SweepSample; 4] {
    [
        SweepSample {
            time: delay,
            angle_deg: from_deg,
        },
        SweepSample {
            time: delay + 0.5 * duration,
            angle_deg: (from_deg + to_deg) / 2.0,
        },
        SweepSample {
            time: delay + duration,
            angle_deg: to_deg,
        },
        SweepSample {
            time: delay + 1.1 * duration,
            angle_deg: to_deg,
        },
    ]
}

/// Keyframes for one curtain panel rotating about the vertical axis.
pub fn sweep_keyframes(duration: f32, from_deg: f32, to_deg: f32, delay: f32) -> Vec<Keyframe> {
    sweep_samples(duration, from_deg, to_deg, delay)
        .iter()
        .map(|sample| Keyframe {
            time: sample.time,
            rotation: yaw_deg(sample.angle_deg),
        })
        .collect()
}

// Windows are planes laid flat (-90 about X); the lit face shows at yaw 0
// and the dark back at yaw 180.
fn window_pose(yaw: f32) -> Quat {
    euler_deg(-90.0, yaw, 0.0)
}

fn window_flip(from_yaw: f32, to_yaw: f32) -> Vec<Keyframe> {
    vec![
        Keyframe {
            time: 0.0,
            rotation: window_pose(from_yaw),
        },
        Keyframe {
            time: 1.0,
            rotation: window_pose(to_yaw),
        },
        Keyframe {
            time: 1.1,
            rotation: window_pose(to_yaw),
        },
    ]
}

/// Flip a window from its dark back to the lit face.
pub fn window_on_keyframes() -> Vec<Keyframe> {
    window_flip(180.0, 0.0)
}

/// Flip a window from the lit face to its dark back.
pub fn window_off_keyframes() -> Vec<Keyframe> {
    window_flip(0.0, 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_places_four_samples_on_the_schedule() {
        let samples = sweep_samples(4.0, -47.5, 47.5, 1.5);
        let times: Vec<f32> = samples.iter().map(|sample| sample.time).collect();
        assert_eq!(times, vec![1.5, 3.5, 5.5, 5.9]);
        for pair in times.windows(2) {
            assert!(pair[0] <= pair[1], "sample times must not decrease");
        }
    }

    #[test]
    fn sweep_midpoint_is_the_arithmetic_mean() {
        let samples = sweep_samples(2.0, -10.0, 30.0, 0.0);
        assert_eq!(samples[1].angle_deg, 10.0);
    }

    #[test]
    fn sweep_holds_the_final_angle() {
        let samples = sweep_samples(3.0, 12.5, -40.0, 0.25);
        assert_eq!(samples[2].angle_deg, samples[3].angle_deg);
        assert_eq!(samples[3].angle_deg, -40.0);
    }

    #[test]
    fn sweep_keyframes_rotate_about_the_vertical_axis() {
        let frames = sweep_keyframes(1.0, 0.0, 90.0, 0.0);
        assert_eq!(frames.len(), 4);
        let expected = yaw_deg(45.0);
        assert!(frames[1].rotation.abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn window_flips_mirror_each_other() {
        let on = window_on_keyframes();
        let off = window_off_keyframes();
        assert_eq!(on.len(), 3);
        assert_eq!(off.len(), 3);
        assert!(on[0].rotation.abs_diff_eq(off[2].rotation, 1e-6));
        assert!(on[2].rotation.abs_diff_eq(off[0].rotation, 1e-6));
        // The hold sample pins the resting pose.
        assert_eq!(on[1].rotation, on[2].rotation);
    }
}
