//! Scene logic for the rooftop stage.
//!
//! Everything here is host-agnostic: keyframe generation for the curtain
//! wave, the window grid with its bitmap patterns, the local scene-graph
//! mirror with forward-handle bookkeeping, and the session roster. The
//! companion binary crate turns these values into wire commands.

pub mod curtain;
pub mod keyframes;
pub mod session;
pub mod stage;
pub mod windows;
