//! Plinko Planner - outcome-controlled Plinko board core
//!
//! Core modules:
//! - `board`: Peg geometry, path lattice, bin payout table
//! - `sim`: Path planning, payout distribution, per-ball trajectories, tick loop
//! - `config`: Board configuration (serde, per-row presets)
//! - `history`: Landing history for a throw session

pub mod board;
pub mod config;
pub mod error;
pub mod history;
pub mod sim;

pub use board::{Bin, BinId, BinValueTable, Lane, Lattice, LatticeNode, PegLayout, PegSource, StartLane};
pub use config::BoardConfig;
pub use error::PlinkoError;
pub use history::ThrowHistory;
pub use sim::{
    BallId, DistributionResult, Path, PathPoint, PointKind, SimEvent, Simulation, plan_path,
    solve_distribution, tick,
};

/// Tuning constants shared by the planner and the animator
pub mod consts {
    /// Milliseconds covered by one nominal tick (`dt = 1.0`)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;

    /// Closed-form bin curve steepness: `1 + floor(K * d^2)`
    pub const FALLBACK_CURVE_K: f32 = 15.0;

    /// Minimum |dx| for a direction change to earn a bounce insert
    pub const BOUNCE_MIN_DX: f32 = 1.0;
    /// Bins this far left of the last point still count as "below" it
    pub const BIN_X_TOLERANCE: f32 = 10.0;
    /// Drop of the synthesized bin under a dead-end random path
    pub const FALLBACK_BIN_DROP: f32 = 40.0;

    /// Batches up to this size are solved exhaustively
    pub const EXHAUSTIVE_BALL_LIMIT: usize = 5;
    /// Greedy score penalty per previous use of the same bin
    pub const USAGE_PENALTY: f64 = 10.0;
    /// Cell budget for the closest-sum DP pass
    pub const DP_CELL_BUDGET: usize = 4_000_000;

    /// Progress boost on the first segment out of a start lane
    pub const START_SPEED_BOOST: f32 = 1.8;
    /// Shortest distance used to scale arc progress
    pub const MIN_SEGMENT_DISTANCE: f32 = 10.0;
    /// Arc height never exceeds this share of the vertical gap
    pub const ARC_HEIGHT_CAP: f32 = 0.7;
    /// Control point depth for the funnel segment leaving a start lane
    pub const START_CONTROL_RATIO: f32 = 0.3;
    /// Per-ball speed multiplier range fixed at spawn
    pub const SPEED_JITTER: (f32, f32) = (0.8, 1.2);
    /// Visual spin per unit of travel
    pub const SPIN_RATE: f32 = 0.05;

    /// Spawn delay variance (+/- share of the base delay)
    pub const SPAWN_DELAY_VARIANCE: f32 = 0.4;
    /// Balls further than this below the board are dropped
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 100.0;
    /// Pending events kept before the oldest are discarded
    pub const EVENT_QUEUE_CAPACITY: usize = 1024;
}
