//! Window grids and the bitmap-driven state setter.
//!
//! A building owns 100 window planes in a 10x10 grid. Patterns are
//! fixed-length strings of '0'/'1'; named presets resolve to literal strings
//! and anything else is treated as a literal pattern. Applying a pattern only
//! triggers the windows whose state actually changes, so the tag on each
//! window always reflects the last animation that ran and re-applying a
//! pattern is a no-op.

use serde::Serialize;
use thiserror::Error;

use crate::stage::{ActorId, StageGraph};

/// Windows per building: 10 rows of 10 columns.
pub const WINDOW_COUNT: usize = 100;
pub const COLUMNS: usize = 10;

/// Animation clip names registered on every window.
pub const ON_ANIMATION: &str = "On";
pub const OFF_ANIMATION: &str = "Off";

/// Logical state of a window, mirrored into the actor tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowState {
    On,
    Off,
}

impl WindowState {
    /// Clip that moves a window into this state.
    pub fn animation(self) -> &'static str {
        match self {
            WindowState::On => ON_ANIMATION,
            WindowState::Off => OFF_ANIMATION,
        }
    }

    /// String form stored in the host-side actor tag.
    pub fn as_tag(self) -> &'static str {
        match self {
            WindowState::On => "on",
            WindowState::Off => "off",
        }
    }

    fn from_bit(bit: char) -> Self {
        if bit == '0' {
            WindowState::Off
        } else {
            WindowState::On
        }
    }
}

/// Grid slot of window `index`: columns march +2 from x = -9, rows drop -3
/// from y = 33, wrapping every [`COLUMNS`].
pub fn window_position(index: usize) -> (f32, f32) {
    let column = index % COLUMNS;
    let row = index / COLUMNS;
    (-9.0 + 2.0 * column as f32, 33.0 - 3.0 * row as f32)
}

const PRESETS: &[(&str, &str)] = &[
    (
        "off",
        "0000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    ),
    (
        "on",
        "1111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111111",
    ),
    (
        "t",
        "0000000000001111110000111111000000110000000011000000001100000000110000000011000000001100000000000000",
    ),
    (
        "r",
        "0000000000001111000000111111000011001100001111110000111100000011011000001100110000110011000000000000",
    ),
    (
        "checker",
        "0101010101101010101001010101011010101010010101010110101010100101010101101010101001010101011010101010",
    ),
    (
        "smile",
        "0000000000000000000000110011000011001100000000000001000000100010000100000111100000000000000000000000",
    ),
    (
        "star",
        "0000010000000011100000001110000111111111001111111000011111000001111100001110111000110001100000000000",
    ),
    (
        "the",
        "1110000000010000000001000000000101010000000111000000010100000001010111000000011000000001000000000111",
    ),
    (
        "roof",
        "1100000000101001110011000101001010010100000001110001110000000101001110010100110001110010000000001000",
    ),
    (
        "top",
        "1110000000010000000001000000000101110000000101000000010100000001110111000000010100000001110000000100",
    ),
];

/// Resolve a preset keyword; unknown keywords fall through as literals.
pub fn resolve_pattern(spec: &str) -> &str {
    PRESETS
        .iter()
        .find(|(keyword, _)| *keyword == spec)
        .map(|(_, pattern)| *pattern)
        .unwrap_or(spec)
}

/// Ways a pattern can fail to apply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is {actual} characters long but the building has {expected} windows")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("pattern contains {found:?} at index {index}; only '0' and '1' are allowed")]
    InvalidDigit { index: usize, found: char },
    #[error("window {index} carries no state tag")]
    UntaggedWindow { index: usize },
}

/// Parse a pattern (after preset resolution) against an expected length.
pub fn parse_pattern(spec: &str, expected: usize) -> Result<Vec<WindowState>, PatternError> {
    let pattern = resolve_pattern(spec);
    if pattern.chars().count() != expected {
        return Err(PatternError::LengthMismatch {
            expected,
            actual: pattern.chars().count(),
        });
    }
    pattern
        .chars()
        .enumerate()
        .map(|(index, bit)| match bit {
            '0' | '1' => Ok(WindowState::from_bit(bit)),
            other => Err(PatternError::InvalidDigit {
                index,
                found: other,
            }),
        })
        .collect()
}

/// A window whose state changed and needs its animation triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowToggle {
    pub index: usize,
    pub actor: ActorId,
    pub state: WindowState,
}

/// Drive a building's windows toward `spec`, returning only the windows that
/// actually flipped. Tags are updated in step so a repeat application
/// triggers nothing.
pub fn apply_pattern(
    stage: &mut StageGraph,
    windows: &[ActorId],
    spec: &str,
) -> Result<Vec<WindowToggle>, PatternError> {
    let desired = parse_pattern(spec, windows.len())?;

    let mut toggles = Vec::new();
    for (index, (&actor, &state)) in windows.iter().zip(desired.iter()).enumerate() {
        let current = stage
            .tag(actor)
            .ok_or(PatternError::UntaggedWindow { index })?;
        if current != state {
            stage.set_tag(actor, state);
            toggles.push(WindowToggle {
                index,
                actor,
                state,
            });
        }
    }
    Ok(toggles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::ActorSpec;

    fn building(stage: &mut StageGraph, count: usize, initial: WindowState) -> Vec<ActorId> {
        (0..count)
            .map(|_| stage.create(ActorSpec::default().tagged(initial)))
            .collect()
    }

    #[test]
    fn grid_positions_wrap_every_row() {
        assert_eq!(window_position(0), (-9.0, 33.0));
        assert_eq!(window_position(9), (9.0, 33.0));
        assert_eq!(window_position(10), (-9.0, 30.0));
        assert_eq!(window_position(99), (9.0, 6.0));
    }

    #[test]
    fn presets_are_well_formed() {
        for (keyword, pattern) in PRESETS {
            assert_eq!(
                pattern.len(),
                WINDOW_COUNT,
                "preset {keyword:?} has the wrong length"
            );
            assert!(
                pattern.chars().all(|bit| bit == '0' || bit == '1'),
                "preset {keyword:?} contains non-binary digits"
            );
        }
    }

    #[test]
    fn all_off_then_all_off_again_is_idempotent() {
        let mut stage = StageGraph::new();
        let windows = building(&mut stage, 10, WindowState::On);

        let toggles = apply_pattern(&mut stage, &windows, "0000000000").expect("apply");
        assert_eq!(toggles.len(), 10);
        assert!(toggles
            .iter()
            .all(|toggle| toggle.state == WindowState::Off));
        assert!(windows
            .iter()
            .all(|&id| stage.tag(id) == Some(WindowState::Off)));

        let again = apply_pattern(&mut stage, &windows, "0000000000").expect("apply");
        assert!(again.is_empty(), "second application must trigger nothing");
    }

    #[test]
    fn all_on_inverts_all_off() {
        let mut stage = StageGraph::new();
        let windows = building(&mut stage, 10, WindowState::On);
        apply_pattern(&mut stage, &windows, "0000000000").expect("apply");

        let toggles = apply_pattern(&mut stage, &windows, "1111111111").expect("apply");
        assert_eq!(toggles.len(), 10);
        assert!(windows
            .iter()
            .all(|&id| stage.tag(id) == Some(WindowState::On)));
    }

    #[test]
    fn partial_pattern_only_touches_changed_windows() {
        let mut stage = StageGraph::new();
        let windows = building(&mut stage, 4, WindowState::Off);

        let toggles = apply_pattern(&mut stage, &windows, "1010").expect("apply");
        let flipped: Vec<usize> = toggles.iter().map(|toggle| toggle.index).collect();
        assert_eq!(flipped, vec![0, 2]);
        assert!(toggles.iter().all(|toggle| toggle.state == WindowState::On));
        assert_eq!(stage.tag(windows[1]), Some(WindowState::Off));
        assert_eq!(stage.tag(windows[3]), Some(WindowState::Off));
    }

    #[test]
    fn preset_keyword_matches_its_literal_pattern() {
        let mut stage = StageGraph::new();
        let via_keyword = building(&mut stage, WINDOW_COUNT, WindowState::Off);
        let via_literal = building(&mut stage, WINDOW_COUNT, WindowState::Off);

        let keyword_toggles =
            apply_pattern(&mut stage, &via_keyword, "on").expect("apply keyword");
        let literal: String = "1".repeat(WINDOW_COUNT);
        let literal_toggles =
            apply_pattern(&mut stage, &via_literal, &literal).expect("apply literal");

        assert_eq!(keyword_toggles.len(), literal_toggles.len());
        for (a, b) in keyword_toggles.iter().zip(literal_toggles.iter()) {
            assert_eq!(a.index, b.index);
            assert_eq!(a.state, b.state);
        }
    }

    #[test]
    fn mismatched_length_is_rejected() {
        let mut stage = StageGraph::new();
        let windows = building(&mut stage, 4, WindowState::On);
        let err = apply_pattern(&mut stage, &windows, "10101").expect_err("length mismatch");
        assert_eq!(
            err,
            PatternError::LengthMismatch {
                expected: 4,
                actual: 5
            }
        );
    }

    #[test]
    fn non_binary_digits_are_rejected() {
        let mut stage = StageGraph::new();
        let windows = building(&mut stage, 4, WindowState::On);
        let err = apply_pattern(&mut stage, &windows, "10x0").expect_err("bad digit");
        assert_eq!(err, PatternError::InvalidDigit { index: 2, found: 'x' });
    }
}
