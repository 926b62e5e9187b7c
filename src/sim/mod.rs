//! Deterministic simulation module
//!
//! Path planning, payout distribution and ball motion. This module must be
//! pure and deterministic:
//! - Seeded RNG only, passed explicitly
//! - Stable iteration order (balls by id)
//! - No rendering or platform dependencies

pub mod path;
pub mod schedule;
pub mod solver;
pub mod state;
pub mod tick;
pub mod trajectory;

pub use path::{Path, PathPlanner, PathPoint, PointKind, add_bounce_inserts, plan_path};
pub use schedule::{SpawnHandle, SpawnQueue};
pub use solver::{DistributionResult, solve_distribution};
pub use state::{Ball, BallId, BatchThrow, Board, RemovalReason, SimEvent, Simulation};
pub use tick::tick;
pub use trajectory::{BallMotion, MotionEvent, MotionMode, MotionParams};
