//! Peg placement for a triangular board
//!
//! The core never computes pixel geometry on its own: it reads peg
//! coordinates through [`PegSource`]. [`PegLayout`] is the reference
//! implementation, centering every row and spacing rows evenly between the
//! top and bottom margins.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::BoardConfig;
use crate::error::Result;

/// Peg coordinates as supplied by the board-geometry collaborator
pub trait PegSource {
    /// Peg centers grouped by row (row 0 = top), left to right
    fn peg_positions_by_row(&self) -> &[Vec<Vec2>];

    /// X coordinates of the top row
    fn top_row_positions(&self) -> Vec<f32> {
        self.peg_positions_by_row()
            .first()
            .map(|row| row.iter().map(|p| p.x).collect())
            .unwrap_or_default()
    }

    /// X coordinates of the bottom row
    fn bottom_row_positions(&self) -> Vec<f32> {
        self.peg_positions_by_row()
            .last()
            .map(|row| row.iter().map(|p| p.x).collect())
            .unwrap_or_default()
    }

    /// Y coordinate of the top row
    fn top_row_y(&self) -> Option<f32> {
        self.peg_positions_by_row().first()?.first().map(|p| p.y)
    }

    /// Y coordinate of the bottom row
    fn bottom_row_y(&self) -> Option<f32> {
        self.peg_positions_by_row().last()?.first().map(|p| p.y)
    }
}

/// Generated triangular peg layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PegLayout {
    pub rows: Vec<Vec<Vec2>>,
    /// Distance between neighbouring pegs of one row
    pub horizontal_spacing: f32,
    /// Distance between consecutive rows
    pub vertical_spacing: f32,
}

impl PegLayout {
    /// Lay out `config.rows` rows of `top_pegs + row` pegs inside the board
    pub fn triangular(config: &BoardConfig) -> Result<Self> {
        config.validate()?;

        let last_row_pegs = config.bottom_row_pegs();
        let base_width = config.width - config.peg_radius * 2.2;
        let horizontal_spacing = base_width / (last_row_pegs - 1) as f32;

        let top_y = config.start_lane_offset();
        let bottom_y = config.height - config.ball_radius * 2.0 - config.peg_radius;
        let vertical_spacing = if config.rows > 1 {
            (bottom_y - top_y) / (config.rows - 1) as f32
        } else {
            0.0
        };

        let rows = (0..config.rows)
            .map(|row| {
                let pegs_in_row = config.top_pegs + row;
                let row_width = horizontal_spacing * (pegs_in_row - 1) as f32;
                let start_x = (config.width - row_width) / 2.0;
                let y = top_y + vertical_spacing * row as f32;
                (0..pegs_in_row)
                    .map(|col| Vec2::new(start_x + horizontal_spacing * col as f32, y))
                    .collect()
            })
            .collect();

        log::debug!(
            "Peg layout: {} rows, h-spacing {:.2}, v-spacing {:.2}",
            config.rows,
            horizontal_spacing,
            vertical_spacing
        );

        Ok(Self {
            rows,
            horizontal_spacing,
            vertical_spacing,
        })
    }

    /// Total number of pegs
    pub fn peg_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

impl PegSource for PegLayout {
    fn peg_positions_by_row(&self) -> &[Vec<Vec2>] {
        &self.rows
    }
}
