//! Timing table for the 20-panel curtain.
//!
//! The rig carries 20 panels fanned 5 degrees apart; only indices 1..=18 are
//! animated (the outermost pair stays fixed). Opening gathers the left half
//! toward -47.5 and the right half toward +47.5, with per-panel durations
//! that grow toward the centre pair so adjacent panels peel off in sequence.
//! Closing plays the same sweeps backwards, delayed so the outermost panels
//! move last and the wave appears to travel back out.

use crate::keyframes::{sweep_keyframes, Keyframe};

/// Total panels hanging from the rig.
pub const PANEL_COUNT: usize = 20;

/// First and last animated panel index.
pub const FIRST_ANIMATED: usize = 1;
pub const LAST_ANIMATED: usize = 18;

/// Upper bound on a whole wave, used as the gate's deadline fallback when the
/// host never reports animation completion.
pub const WAVE_SECONDS: f32 = 4.5;

/// Animation clip names registered on every animated panel.
pub const OPEN_ANIMATION: &str = "Open";
pub const CLOSE_ANIMATION: &str = "Close";

/// The panel whose sweep finishes last in either direction; its completion
/// event releases the wave gate.
pub const TERMINAL_PANEL: usize = 9;

/// Panel indices that carry Open/Close clips.
pub fn animated_panels() -> impl Iterator<Item = usize> {
    FIRST_ANIMATED..=LAST_ANIMATED
}

/// Resting yaw of a panel, fanned 5 degrees per index from -47.5.
pub fn rest_angle(index: usize) -> f32 {
    -47.5 + 5.0 * index as f32
}

/// Yaw the panel gathers to when the curtain opens: the left half stacks at
/// the left edge, the right half at the right edge.
pub fn gather_angle(index: usize) -> f32 {
    if index < 10 {
        -47.5
    } else {
        47.5
    }
}

/// Sweep duration, growing toward the centre pair from either edge.
pub fn wave_duration(index: usize) -> f32 {
    if index < 10 {
        0.5 * index as f32
    } else {
        WAVE_SECONDS - 0.5 * (index as f32 - 10.0)
    }
}

/// Stagger applied to the closing sweep so the outermost panels move last.
pub fn close_delay(index: usize) -> f32 {
    if index < 10 {
        WAVE_SECONDS - 0.5 * index as f32
    } else {
        0.5 * (index as f32 - 10.0)
    }
}

/// One panel's contribution to a wave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelSweep {
    pub duration: f32,
    pub from_deg: f32,
    pub to_deg: f32,
    pub delay: f32,
}

impl PanelSweep {
    /// Timestamp of the final (hold) sample.
    pub fn finish_time(&self) -> f32 {
        self.delay + 1.1 * self.duration
    }

    pub fn keyframes(&self) -> Vec<Keyframe> {
        sweep_keyframes(self.duration, self.from_deg, self.to_deg, self.delay)
    }
}

/// Sweep that opens panel `index`: rest pose to the gathered edge, no delay.
pub fn open_sweep(index: usize) -> PanelSweep {
    PanelSweep {
        duration: wave_duration(index),
        from_deg: rest_angle(index),
        to_deg: gather_angle(index),
        delay: 0.0,
    }
}

/// Sweep that closes panel `index`: gathered edge back to the rest pose,
/// staggered so the wave travels outward.
pub fn close_sweep(index: usize) -> PanelSweep {
    PanelSweep {
        duration: wave_duration(index),
        from_deg: gather_angle(index),
        to_deg: rest_angle(index),
        delay: close_delay(index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_angles_fan_symmetrically() {
        assert_eq!(rest_angle(0), -47.5);
        assert_eq!(rest_angle(19), 47.5);
        for index in 0..PANEL_COUNT {
            assert_eq!(rest_angle(index), -rest_angle(PANEL_COUNT - 1 - index));
        }
    }

    #[test]
    fn wave_durations_peak_at_the_centre_pair() {
        assert_eq!(wave_duration(9), WAVE_SECONDS);
        assert_eq!(wave_duration(10), WAVE_SECONDS);
        for index in animated_panels() {
            assert!(wave_duration(index) <= WAVE_SECONDS);
            assert_eq!(wave_duration(index), wave_duration(19 - index));
        }
    }

    #[test]
    fn open_sweeps_start_from_rest_without_delay() {
        for index in animated_panels() {
            let sweep = open_sweep(index);
            assert_eq!(sweep.delay, 0.0);
            assert_eq!(sweep.from_deg, rest_angle(index));
            assert_eq!(sweep.to_deg, gather_angle(index));
        }
    }

    #[test]
    fn close_sweeps_return_to_rest() {
        for index in animated_panels() {
            let sweep = close_sweep(index);
            assert_eq!(sweep.from_deg, gather_angle(index));
            assert_eq!(sweep.to_deg, rest_angle(index));
        }
    }

    #[test]
    fn terminal_panel_finishes_last_in_both_directions() {
        let slowest_open = animated_panels()
            .max_by(|a, b| {
                open_sweep(*a)
                    .finish_time()
                    .total_cmp(&open_sweep(*b).finish_time())
            })
            .expect("animated panels");
        assert_eq!(
            open_sweep(slowest_open).finish_time(),
            open_sweep(TERMINAL_PANEL).finish_time()
        );

        let slowest_close = animated_panels()
            .max_by(|a, b| {
                close_sweep(*a)
                    .finish_time()
                    .total_cmp(&close_sweep(*b).finish_time())
            })
            .expect("animated panels");
        assert_eq!(
            close_sweep(slowest_close).finish_time(),
            close_sweep(TERMINAL_PANEL).finish_time()
        );
    }

    #[test]
    fn sweeps_produce_four_keyframes_each() {
        let frames = open_sweep(5).keyframes();
        assert_eq!(frames.len(), 4);
    }
}
