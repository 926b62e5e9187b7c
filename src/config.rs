//! Board configuration
//!
//! Immutable scalars read by the lattice builder, the value table, the path
//! planner and the animator. Changing the row count means building a new
//! `BoardConfig` (and a new board), never mutating one in place.

use std::path::Path as FsPath;

use serde::{Deserialize, Serialize};

use crate::error::{PlinkoError, Result};

/// Smallest and largest row counts covered by the size preset table
pub const PRESET_MIN_ROWS: u32 = 9;
pub const PRESET_MAX_ROWS: u32 = 16;

/// (peg radius, ball radius, speed multiplier) per row count, 9..=16
const SIZE_PRESETS: [(f32, f32, f32); 8] = [
    (7.0, 9.5, 2.0),
    (6.5, 9.0, 1.8),
    (6.0, 8.5, 1.6),
    (5.5, 8.0, 1.4),
    (5.2, 7.5, 1.3),
    (5.0, 7.2, 1.2),
    (4.8, 7.0, 1.1),
    (4.5, 6.5, 1.0),
];

/// Base ball speed before the per-row multiplier
pub const BASE_BALL_SPEED: f32 = 2.0;

/// Largest row count a config may ask for
pub const MAX_ROWS: u32 = 64;

/// Largest top row a config may ask for
pub const MAX_TOP_PEGS: u32 = 64;

/// Board parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    // === Lattice ===
    /// Number of peg rows
    pub rows: u32,
    /// Pegs in the top row (each row below adds one)
    pub top_pegs: u32,
    /// Board width in world units
    pub width: f32,
    /// Board height in world units (also the out-of-bounds reference)
    pub height: f32,
    pub peg_radius: f32,
    pub ball_radius: f32,
    /// Gap between the bottom peg row and the top of the bins
    pub bin_distance_from_last_row: f32,
    pub bin_height: f32,

    // === Trajectory ===
    /// Bounce height as a multiple of the ball diameter
    pub bounce_factor: f32,
    /// Share of the bounce height used for row-to-row arcs
    pub bounce_height_ratio: f32,
    /// Probability of an extra hop at a direction change
    pub extra_bounce_chance: f32,
    pub extra_bounce_height_multiplier: f32,
    pub extra_bounce_factor: f32,
    /// Progress units per tick
    pub ball_speed: f32,

    // === Throws ===
    /// Base delay between balls of one batch (ms)
    pub ball_drop_delay_ms: f32,
    /// Largest batch a throw may request
    pub max_balls: u32,
    /// Payout tiers, smallest first. Empty selects the closed-form curve.
    pub tiers: Vec<u32>,
    /// Payout sum a batch aims for
    pub target_sum: u64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            rows: 16,
            top_pegs: 3,
            width: 800.0,
            height: 800.0,
            peg_radius: 4.5,
            ball_radius: 6.5,
            bin_distance_from_last_row: 5.0,
            bin_height: 30.0,

            bounce_factor: 3.0,
            bounce_height_ratio: 0.7,
            extra_bounce_chance: 0.2,
            extra_bounce_height_multiplier: 0.7,
            extra_bounce_factor: 0.7,
            ball_speed: BASE_BALL_SPEED,

            ball_drop_delay_ms: 100.0,
            max_balls: 10,
            tiers: vec![0, 1, 2, 5, 20, 50, 100, 500, 1000],
            target_sum: 1000,
        }
    }
}

impl BoardConfig {
    /// Default config resized for a row count (applies the size preset)
    pub fn for_rows(rows: u32) -> Self {
        Self::default().with_rows(rows)
    }

    /// Copy of this config with a new row count and matching size preset
    pub fn with_rows(&self, rows: u32) -> Self {
        let preset = rows.clamp(PRESET_MIN_ROWS, PRESET_MAX_ROWS) - PRESET_MIN_ROWS;
        let (peg_radius, ball_radius, speed) = SIZE_PRESETS[preset as usize];
        Self {
            rows,
            peg_radius,
            ball_radius,
            ball_speed: BASE_BALL_SPEED * speed,
            ..self.clone()
        }
    }

    /// Number of bins under the bottom row
    pub fn bin_count(&self) -> usize {
        self.top_pegs.saturating_add(self.rows).saturating_sub(2) as usize
    }

    /// Pegs in the bottom row
    pub fn bottom_row_pegs(&self) -> u32 {
        self.top_pegs.saturating_add(self.rows).saturating_sub(1)
    }

    /// Full bounce height (ball diameter times bounce factor)
    pub fn bounce_height(&self) -> f32 {
        self.ball_radius * 2.0 * self.bounce_factor
    }

    /// Arch height of a normal row-to-row arc
    pub fn arc_height(&self) -> f32 {
        self.bounce_height() * self.bounce_height_ratio
    }

    /// Height multiplier applied to extra hops
    pub fn extra_bounce_multiplier(&self) -> f32 {
        self.extra_bounce_height_multiplier * self.extra_bounce_factor
    }

    /// Distance between a peg and the path node above it
    pub fn path_point_offset(&self) -> f32 {
        self.peg_radius / 2.0 + self.ball_radius
    }

    /// Distance between the top row and the start lanes
    pub fn start_lane_offset(&self) -> f32 {
        self.ball_radius * 4.0
    }

    /// Check the config can produce a board
    pub fn validate(&self) -> Result<()> {
        if self.top_pegs < 3 {
            return Err(PlinkoError::Configuration(format!(
                "top row needs at least 3 pegs, got {}",
                self.top_pegs
            )));
        }
        if self.top_pegs > MAX_TOP_PEGS {
            return Err(PlinkoError::Configuration(format!(
                "top row allows at most {MAX_TOP_PEGS} pegs, got {}",
                self.top_pegs
            )));
        }
        if !(1..=MAX_ROWS).contains(&self.rows) {
            return Err(PlinkoError::Configuration(format!(
                "board needs 1..={MAX_ROWS} rows, got {}",
                self.rows
            )));
        }
        let scalars = [
            ("width", self.width),
            ("height", self.height),
            ("peg_radius", self.peg_radius),
            ("ball_radius", self.ball_radius),
            ("ball_speed", self.ball_speed),
        ];
        for (name, value) in scalars {
            if !value.is_finite() || value <= 0.0 {
                return Err(PlinkoError::Configuration(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.extra_bounce_chance) {
            return Err(PlinkoError::Configuration(format!(
                "extra_bounce_chance must be within 0..=1, got {}",
                self.extra_bounce_chance
            )));
        }
        Ok(())
    }

    /// Parse a config from JSON (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file
    pub fn load(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded board config from {} ({} rows)", path.display(), config.rows);
        Ok(config)
    }
}
