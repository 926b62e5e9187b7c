//! Path lattice derived from peg coordinates
//!
//! Row `r` holds one node per peg, lifted above the peg so a ball resting on
//! the node appears to sit on top of it. Two start lanes sit above the top
//! row in the gaps between pegs 0-1 and 1-2; bins sit under the bottom row in
//! the gaps between consecutive pegs.
//!
//! A ball leaving lane `L` first touches row 1 at column `L + 1` and from
//! then on either keeps its column or moves one column right per row. From
//! column `c` of the bottom row it can fall into bin `c - 1` or bin `c`.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::PegSource;
use super::values::BinValueTable;
use crate::config::BoardConfig;
use crate::error::{PlinkoError, Result};

/// Index of a bin, shared by the planner and the value table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BinId(pub usize);

impl BinId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for BinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0 + 1)
    }
}

/// One of the two descent lanes at the top of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Left, Lane::Right];

    pub fn index(self) -> usize {
        match self {
            Lane::Left => 0,
            Lane::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lane::Left => "S1",
            Lane::Right => "S2",
        }
    }
}

/// Start lane entry point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartLane {
    pub lane: Lane,
    pub pos: Vec2,
}

/// Path node above a peg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatticeNode {
    pub row: usize,
    pub col: usize,
    pub pos: Vec2,
}

/// Bottom slot with its payout multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bin {
    pub id: BinId,
    pub pos: Vec2,
    pub multiplier: u32,
}

/// Nodes, lanes and bins of one board configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lattice {
    rows: Vec<Vec<LatticeNode>>,
    lanes: [StartLane; 2],
    bins: Vec<Bin>,
}

impl Lattice {
    /// Build the lattice from peg coordinates
    ///
    /// Fails with `Configuration` when the top row has fewer than 3 pegs, no
    /// rows exist, or a row is not exactly one peg wider than the row above.
    pub fn build(source: &impl PegSource, config: &BoardConfig) -> Result<Self> {
        let pegs = source.peg_positions_by_row();
        let Some(top) = pegs.first() else {
            return Err(PlinkoError::Configuration("no peg rows".into()));
        };
        if top.len() < 3 {
            return Err(PlinkoError::Configuration(format!(
                "top row has {} pegs, need at least 3",
                top.len()
            )));
        }
        for (row, window) in pegs.windows(2).enumerate() {
            if window[1].len() != window[0].len() + 1 {
                return Err(PlinkoError::Configuration(format!(
                    "row {} has {} pegs, expected {}",
                    row + 1,
                    window[1].len(),
                    window[0].len() + 1
                )));
            }
        }

        let lift = config.path_point_offset();
        let rows: Vec<Vec<LatticeNode>> = pegs
            .iter()
            .enumerate()
            .map(|(row, pegs)| {
                pegs.iter()
                    .enumerate()
                    .map(|(col, peg)| LatticeNode {
                        row,
                        col,
                        pos: Vec2::new(peg.x, peg.y - lift),
                    })
                    .collect()
            })
            .collect();

        let lane_y = top[0].y - config.start_lane_offset();
        let lanes = Lane::ALL.map(|lane| {
            let i = lane.index();
            StartLane {
                lane,
                pos: Vec2::new((top[i].x + top[i + 1].x) / 2.0, lane_y),
            }
        });

        // Rows only grow downward, so the bottom row has at least 3 pegs
        let bottom = pegs.last().unwrap_or(top);
        let bin_y = bottom[0].y + config.bin_distance_from_last_row + config.bin_height / 2.0;
        let values = BinValueTable::new(config.tiers.clone()).values(bottom.len() - 1);
        let bins = bottom
            .windows(2)
            .zip(values)
            .enumerate()
            .map(|(i, (pair, multiplier))| Bin {
                id: BinId(i),
                pos: Vec2::new((pair[0].x + pair[1].x) / 2.0, bin_y),
                multiplier,
            })
            .collect::<Vec<_>>();

        log::info!(
            "Lattice built: {} rows, {} bins, values {:?}",
            rows.len(),
            bins.len(),
            bins.iter().map(|b| b.multiplier).collect::<Vec<_>>()
        );

        Ok(Self { rows, lanes, bins })
    }

    pub fn rows(&self) -> &[Vec<LatticeNode>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn node(&self, row: usize, col: usize) -> Option<&LatticeNode> {
        self.rows.get(row)?.get(col)
    }

    pub fn lane(&self, lane: Lane) -> &StartLane {
        &self.lanes[lane.index()]
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn bin(&self, id: BinId) -> Option<&Bin> {
        self.bins.get(id.0)
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Multiplier of every bin, indexed by `BinId`
    pub fn values(&self) -> Vec<u32> {
        self.bins.iter().map(|b| b.multiplier).collect()
    }

    /// Column of row 1 a ball from `lane` lands on
    #[inline]
    pub fn entry_column(&self, lane: Lane) -> usize {
        lane.index() + 1
    }

    /// Rightmost bin a ball can reach from the start lanes
    ///
    /// Equals `bin_count - 1` for a 3-peg top row; wider top rows leave the
    /// rightmost bins out of reach.
    pub fn max_reachable_bin(&self) -> Option<BinId> {
        let last = self.bins.len().checked_sub(1)?;
        Some(BinId(self.rows.len().min(last)))
    }

    pub fn is_reachable(&self, id: BinId) -> bool {
        self.max_reachable_bin().is_some_and(|max| id <= max)
    }

    /// Vertical distance between consecutive rows (0 for a single row)
    pub fn vertical_spacing(&self) -> f32 {
        match (self.rows.first(), self.rows.get(1)) {
            (Some(a), Some(b)) => b[0].pos.y - a[0].pos.y,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::geometry::PegLayout;

    fn build(rows: u32) -> (BoardConfig, PegLayout, Lattice) {
        let config = BoardConfig::for_rows(rows);
        let layout = PegLayout::triangular(&config).unwrap();
        let lattice = Lattice::build(&layout, &config).unwrap();
        (config, layout, lattice)
    }

    /// Layout whose bottom-row shortcut disagrees with its rows
    struct EmptyBottomRow(PegLayout);

    impl PegSource for EmptyBottomRow {
        fn peg_positions_by_row(&self) -> &[Vec<Vec2>] {
            &self.0.rows
        }

        fn bottom_row_positions(&self) -> Vec<f32> {
            Vec::new()
        }

        fn bottom_row_y(&self) -> Option<f32> {
            None
        }
    }

    #[test]
    fn test_bins_follow_peg_rows() {
        let (config, layout, expected) = build(9);
        let lattice = Lattice::build(&EmptyBottomRow(layout), &config).unwrap();
        assert_eq!(lattice.bin_count(), config.bin_count());
        assert_eq!(lattice.bins(), expected.bins());
    }

    #[test]
    fn test_lattice_dimensions() {
        let (config, _, lattice) = build(16);
        assert_eq!(lattice.row_count(), 16);
        assert_eq!(lattice.rows()[0].len(), 3);
        assert_eq!(lattice.rows()[15].len(), 18);
        assert_eq!(lattice.bin_count(), config.bin_count());
        assert_eq!(lattice.max_reachable_bin(), Some(BinId(16)));
    }

    #[test]
    fn test_nodes_sit_above_pegs() {
        let (config, layout, lattice) = build(10);
        let node = lattice.node(4, 2).unwrap();
        let peg = layout.rows[4][2];
        assert_eq!(node.row, 4);
        assert_eq!(node.col, 2);
        assert_eq!(node.pos.x, peg.x);
        assert!((peg.y - node.pos.y - config.path_point_offset()).abs() < 1e-4);
        assert!(lattice.node(4, 7).is_none());
    }

    #[test]
    fn test_lanes_between_top_pegs() {
        let (config, layout, lattice) = build(12);
        let top = &layout.rows[0];
        let left = lattice.lane(Lane::Left);
        let right = lattice.lane(Lane::Right);
        assert_eq!(left.pos.x, (top[0].x + top[1].x) / 2.0);
        assert_eq!(right.pos.x, (top[1].x + top[2].x) / 2.0);
        assert!((top[0].y - left.pos.y - config.start_lane_offset()).abs() < 1e-4);

        // A lane drops onto the entry column of row 1
        for lane in Lane::ALL {
            let entry = lattice.node(1, lattice.entry_column(lane)).unwrap();
            assert!((entry.pos.x - lattice.lane(lane).pos.x).abs() < 1e-3);
        }
    }

    #[test]
    fn test_bins_between_bottom_pegs() {
        let (config, layout, lattice) = build(9);
        let bottom = layout.rows.last().unwrap();
        assert_eq!(lattice.bin_count(), bottom.len() - 1);
        for (i, bin) in lattice.bins().iter().enumerate() {
            assert_eq!(bin.id, BinId(i));
            assert_eq!(bin.pos.x, (bottom[i].x + bottom[i + 1].x) / 2.0);
            assert!(bin.pos.y > bottom[0].y);
        }
        assert_eq!(lattice.values(), BinValueTable::new(config.tiers.clone()).values(10));
    }

    #[test]
    fn test_rejects_narrow_top_row() {
        let config = BoardConfig::default();
        let layout = PegLayout {
            rows: vec![vec![Vec2::ZERO, Vec2::X]],
            ..Default::default()
        };
        let err = Lattice::build(&layout, &config).unwrap_err();
        assert!(matches!(err, PlinkoError::Configuration(_)));

        let empty = PegLayout::default();
        assert!(Lattice::build(&empty, &config).is_err());
    }

    #[test]
    fn test_rejects_irregular_rows() {
        let config = BoardConfig::default();
        let layout = PegLayout {
            rows: vec![vec![Vec2::ZERO; 3], vec![Vec2::ZERO; 5]],
            ..Default::default()
        };
        assert!(Lattice::build(&layout, &config).is_err());
    }

    #[test]
    fn test_wide_top_row_limits_reach() {
        let config = BoardConfig {
            top_pegs: 5,
            rows: 6,
            ..Default::default()
        };
        let layout = PegLayout::triangular(&config).unwrap();
        let lattice = Lattice::build(&layout, &config).unwrap();
        assert_eq!(lattice.bin_count(), 9);
        assert_eq!(lattice.max_reachable_bin(), Some(BinId(6)));
        assert!(lattice.is_reachable(BinId(6)));
        assert!(!lattice.is_reachable(BinId(7)));
    }

    #[test]
    fn test_bin_id_display() {
        assert_eq!(BinId(0).to_string(), "E1");
        assert_eq!(BinId(16).to_string(), "E17");
    }
}
