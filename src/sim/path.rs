//! Path planning over the peg lattice
//!
//! A path runs start lane -> one node per row (rows 1..) -> bin. Each row the
//! ball either keeps its column (peg miss, drifts left) or moves one column
//! right (peg hit, drifts right), so a path never skips a row and its column
//! never decreases.
//!
//! Targeted paths keep a reachability invariant at every row: with
//! `remaining` rows left before the bins, column `c` is allowed only when
//! `c <= target + 1` and `c + remaining >= target`. Holding it row by row
//! guarantees the walk ends over the requested bin.

use std::cmp::Ordering;
use std::fmt;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{Bin, BinId, Lane, Lattice, LatticeNode, StartLane};
use crate::consts::{BIN_X_TOLERANCE, BOUNCE_MIN_DX, FALLBACK_BIN_DROP};
use crate::error::{PlinkoError, Result};

/// Role of a point within a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Start,
    Lattice,
    /// Decorative extra hop on the previous node
    BounceInsert,
    End,
}

/// A single waypoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub pos: Vec2,
    pub kind: PointKind,
    /// Lattice row (lattice points and bounce inserts)
    pub row: Option<usize>,
    /// Lattice column (lattice points and bounce inserts)
    pub col: Option<usize>,
    pub lane: Option<Lane>,
    /// Destination bin; `None` on a synthesized fallback end
    pub bin: Option<BinId>,
}

impl PathPoint {
    pub fn start(lane: &StartLane) -> Self {
        Self {
            pos: lane.pos,
            kind: PointKind::Start,
            row: None,
            col: None,
            lane: Some(lane.lane),
            bin: None,
        }
    }

    pub fn lattice(node: &LatticeNode) -> Self {
        Self {
            pos: node.pos,
            kind: PointKind::Lattice,
            row: Some(node.row),
            col: Some(node.col),
            lane: None,
            bin: None,
        }
    }

    pub fn end(bin: &Bin) -> Self {
        Self {
            pos: bin.pos,
            kind: PointKind::End,
            row: None,
            col: None,
            lane: None,
            bin: Some(bin.id),
        }
    }

    /// End point with no bin behind it (dead-end random walk)
    pub fn fallback_end(pos: Vec2) -> Self {
        Self {
            pos,
            kind: PointKind::End,
            row: None,
            col: None,
            lane: None,
            bin: None,
        }
    }

    /// Extra hop copy of this point
    pub fn bounce(&self) -> Self {
        Self {
            kind: PointKind::BounceInsert,
            ..*self
        }
    }

    /// Lattice node this point touches, if any
    pub fn node(&self) -> Option<(usize, usize)> {
        Some((self.row?, self.col?))
    }
}

impl fmt::Display for PathPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PointKind::Start => write!(f, "{}", self.lane.map_or("S?", Lane::label)),
            PointKind::End => match self.bin {
                Some(bin) => write!(f, "{bin}"),
                None => write!(f, "E?"),
            },
            PointKind::Lattice | PointKind::BounceInsert => {
                let (row, col) = self.node().unwrap_or_default();
                write!(f, "{}-{}", row + 1, col + 1)?;
                if self.kind == PointKind::BounceInsert {
                    write!(f, "+")?;
                }
                Ok(())
            }
        }
    }
}

/// Ordered waypoints from a start lane to a bin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl From<Vec<PathPoint>> for Path {
    fn from(points: Vec<PathPoint>) -> Self {
        Self { points }
    }
}

impl Path {
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PathPoint> {
        self.points.get(index)
    }

    pub fn first(&self) -> Option<&PathPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    /// Bin the path ends in
    pub fn bin(&self) -> Option<BinId> {
        self.last()?.bin
    }

    /// Lane the path starts from
    pub fn lane(&self) -> Option<Lane> {
        self.first()?.lane
    }

    /// Lattice points, bounce inserts excluded
    pub fn lattice_points(&self) -> impl Iterator<Item = &PathPoint> {
        self.points.iter().filter(|p| p.kind == PointKind::Lattice)
    }

    pub fn bounce_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.kind == PointKind::BounceInsert)
            .count()
    }

    /// Start first, end last, one of each, and lattice steps of exactly one
    /// row with a column change of 0 or +1. Bounce inserts must repeat the
    /// node before them.
    pub fn is_continuous(&self) -> bool {
        let (Some(first), Some(last)) = (self.first(), self.last()) else {
            return false;
        };
        if first.kind != PointKind::Start || last.kind != PointKind::End {
            return false;
        }
        let starts = self.points.iter().filter(|p| p.kind == PointKind::Start).count();
        let ends = self.points.iter().filter(|p| p.kind == PointKind::End).count();
        if starts != 1 || ends != 1 {
            return false;
        }

        let bounces_ok = self.points.windows(2).all(|w| {
            w[1].kind != PointKind::BounceInsert
                || (w[0].node().is_some() && w[0].node() == w[1].node())
        });
        let nodes: Vec<(usize, usize)> = self.lattice_points().filter_map(PathPoint::node).collect();
        let steps_ok = nodes
            .windows(2)
            .all(|w| w[1].0 == w[0].0 + 1 && (w[1].1 == w[0].1 || w[1].1 == w[0].1 + 1));
        bounces_ok && steps_ok
    }

    /// Human readable point sequence (`S1 -> 2-2 -> ... -> E5`)
    pub fn labels(&self) -> String {
        self.points
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

fn random_lane<R: Rng>(rng: &mut R) -> Lane {
    if rng.random_bool(0.5) { Lane::Right } else { Lane::Left }
}

/// Next column toward `target` honouring the reachability invariant
fn next_column<R: Rng>(col: usize, target: usize, remaining: usize, rng: &mut R) -> usize {
    let valid = |c: usize| c <= target + 1 && c + remaining >= target;
    let (stay, drift) = (col, col + 1);
    match (valid(stay), valid(drift)) {
        (true, true) => {
            if rng.random_bool(0.5) {
                drift
            } else {
                stay
            }
        }
        (true, false) => stay,
        (false, true) => drift,
        (false, false) => {
            if stay.abs_diff(target) <= drift.abs_diff(target) {
                stay
            } else {
                drift
            }
        }
    }
}

/// Sign of a horizontal step, with zero kept distinct
fn direction(dx: f32) -> i8 {
    if dx > 0.0 {
        1
    } else if dx < 0.0 {
        -1
    } else {
        0
    }
}

/// Path generator bound to one lattice
#[derive(Debug, Clone, Copy)]
pub struct PathPlanner<'a> {
    lattice: &'a Lattice,
}

impl<'a> PathPlanner<'a> {
    pub fn new(lattice: &'a Lattice) -> Self {
        Self { lattice }
    }

    /// Path guaranteed to end in `target`
    ///
    /// Returns an empty path when `target` is out of range. The leftmost bin
    /// always starts from the left lane and keeps the entry column, the
    /// rightmost reachable bin always starts from the right lane and drifts
    /// right every row; `lane` is only honoured for interior bins.
    pub fn generate<R: Rng>(&self, lane: Option<Lane>, target: BinId, rng: &mut R) -> Path {
        let lattice = self.lattice;
        let Some(max_bin) = lattice.max_reachable_bin() else {
            return Path::default();
        };
        if target > max_bin {
            log::warn!(
                "Target bin {} outside reachable range 0..={}",
                target.index(),
                max_bin.index()
            );
            return Path::default();
        }

        let left_edge = target.index() == 0;
        let right_edge = target == max_bin;
        let lane = if left_edge {
            Lane::Left
        } else if right_edge {
            Lane::Right
        } else {
            lane.unwrap_or_else(|| random_lane(rng))
        };

        let mut points = Vec::with_capacity(lattice.row_count() + 1);
        points.push(PathPoint::start(lattice.lane(lane)));

        let rows = lattice.row_count();
        if rows > 1 {
            let mut col = lattice.entry_column(lane);
            for row in 1..rows {
                if row > 1 {
                    let remaining = rows - 1 - row;
                    col = if left_edge {
                        col
                    } else if right_edge {
                        col + 1
                    } else {
                        next_column(col, target.index(), remaining, rng)
                    };
                }
                let Some(node) = lattice.node(row, col) else {
                    log::error!("Lattice has no node at {row}-{col}");
                    return Path::default();
                };
                points.push(PathPoint::lattice(node));
            }
            debug_assert!(col == target.index() || col == target.index() + 1);
        }

        let Some(bin) = lattice.bin(target) else {
            return Path::default();
        };
        points.push(PathPoint::end(bin));
        Path::from(points)
    }

    /// Unconstrained walk ending in the nearest bin not left of the final node
    pub fn generate_random<R: Rng>(&self, lane: Option<Lane>, rng: &mut R) -> Path {
        let lattice = self.lattice;
        let lane = lane.unwrap_or_else(|| random_lane(rng));
        let mut points = Vec::with_capacity(lattice.row_count() + 1);
        points.push(PathPoint::start(lattice.lane(lane)));

        let rows = lattice.row_count();
        if rows < 2 {
            // Single row: the lane gap is the bin gap
            let Some(bin) = lattice.bin(BinId(lane.index())) else {
                return Path::default();
            };
            points.push(PathPoint::end(bin));
            return Path::from(points);
        }

        let mut col = lattice.entry_column(lane);
        for row in 1..rows {
            if row > 1 && rng.random_bool(0.5) {
                col += 1;
            }
            let Some(node) = lattice.node(row, col) else {
                log::error!("Lattice has no node at {row}-{col}");
                return Path::default();
            };
            points.push(PathPoint::lattice(node));
        }

        let last = points[points.len() - 1].pos;
        let nearest = [col.checked_sub(1), Some(col)]
            .into_iter()
            .flatten()
            .filter_map(|i| lattice.bin(BinId(i)))
            .filter(|bin| bin.pos.x >= last.x - BIN_X_TOLERANCE)
            .min_by(|a, b| {
                (a.pos.x - last.x)
                    .abs()
                    .partial_cmp(&(b.pos.x - last.x).abs())
                    .unwrap_or(Ordering::Equal)
            });

        match nearest {
            Some(bin) => points.push(PathPoint::end(bin)),
            None => {
                log::warn!("No bin below column {col}, synthesizing a fallback end");
                points.push(PathPoint::fallback_end(last + Vec2::new(0.0, FALLBACK_BIN_DROP)));
            }
        }
        Path::from(points)
    }

    /// Targeted path when `target` is reachable, unconstrained otherwise, with
    /// bounce inserts added at `bounce_chance`
    pub fn plan<R: Rng>(&self, target: Option<BinId>, bounce_chance: f32, rng: &mut R) -> Path {
        let path = match target {
            Some(bin) if self.lattice.is_reachable(bin) => self.generate(None, bin, rng),
            Some(bin) => {
                log::warn!(
                    "Invalid target bin {} (bin count {}), falling back to a random path",
                    bin.index(),
                    self.lattice.bin_count()
                );
                self.generate_random(None, rng)
            }
            None => self.generate_random(None, rng),
        };
        if path.is_empty() {
            log::error!("Planner produced an empty path");
            return path;
        }

        let path = add_bounce_inserts(&path, bounce_chance, rng);
        log::debug!("Planned path ({} points): {}", path.len(), path.labels());
        path
    }

    /// Like [`plan`](Self::plan) but reports an unreachable target instead of
    /// degrading
    pub fn try_plan<R: Rng>(
        &self,
        target: Option<BinId>,
        bounce_chance: f32,
        rng: &mut R,
    ) -> Result<Path> {
        if let Some(bin) = target {
            if !self.lattice.is_reachable(bin) {
                return Err(PlinkoError::InvalidTarget {
                    index: bin.index(),
                    bin_count: self.lattice.bin_count(),
                });
            }
        }
        let path = self.plan(target, bounce_chance, rng);
        if path.is_empty() {
            return Err(PlinkoError::DegeneratePath);
        }
        Ok(path)
    }
}

/// Plan a path on `lattice`, degrading an invalid target to a random path
pub fn plan_path<R: Rng>(
    lattice: &Lattice,
    target: Option<BinId>,
    bounce_chance: f32,
    rng: &mut R,
) -> Path {
    PathPlanner::new(lattice).plan(target, bounce_chance, rng)
}

/// Add extra-hop points after direction changes
///
/// A point earns an insert (with probability `chance`) when the horizontal
/// direction flips across it and the outgoing step is wider than
/// `BOUNCE_MIN_DX`. The first two and last two points and start/end points
/// never get one. Lattice and bin points keep their order.
pub fn add_bounce_inserts<R: Rng>(path: &Path, chance: f32, rng: &mut R) -> Path {
    let points = path.points();
    if points.len() < 3 {
        return path.clone();
    }

    let last = points.len() - 1;
    let mut out = Vec::with_capacity(points.len() + points.len() / 2);
    out.push(points[0]);
    for i in 1..last {
        let (prev, cur, next) = (&points[i - 1], &points[i], &points[i + 1]);
        out.push(*cur);

        let special = matches!(cur.kind, PointKind::Start | PointKind::End | PointKind::BounceInsert);
        let near_ends = i <= 1 || i >= last - 1;
        let turns = direction(next.pos.x - cur.pos.x) != direction(cur.pos.x - prev.pos.x)
            && (next.pos.x - cur.pos.x).abs() > BOUNCE_MIN_DX;

        if !special && !near_ends && turns && rng.random::<f32>() < chance {
            out.push(cur.bounce());
        }
    }
    out.push(points[last]);
    Path::from(out)
}
