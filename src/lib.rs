//! Rules engine for chess and its variants: Atomic, Crazyhouse, Circe,
//! Alice, Dark Chess, hexagonal and circular boards, and more, in any
//! combination.

/// Game setup from TOML.
pub mod config;
/// Errors for malformed positions and moves.
pub mod error;
/// Modeling the game of chess.
pub mod model;
/// Text formats for positions and moves.
pub mod notation;
