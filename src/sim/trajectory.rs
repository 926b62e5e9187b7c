//! Per-ball motion along a planned path
//!
//! A ball interpolates between consecutive path points: a quadratic Bezier
//! arc for ordinary segments, a fixed-height parabola for bounce inserts.
//! Progress along a segment is normalised to [0, 1]; reaching 1 snaps the
//! ball onto the target point and moves on to the next segment.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::path::{Path, PathPoint, PointKind};
use crate::board::BinId;
use crate::config::BoardConfig;
use crate::consts::{
    ARC_HEIGHT_CAP, MIN_SEGMENT_DISTANCE, SPIN_RATE, START_CONTROL_RATIO, START_SPEED_BOOST,
};
use crate::error::{PlinkoError, Result};

/// Motion state of a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotionMode {
    /// Spawned, not stepped yet
    Idle,
    /// Row-to-row arc
    Arc,
    /// Extra hop on a bounce insert
    Bounce,
    /// Final point reached
    Landed,
}

/// Board-wide motion parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Progress units per frame before segment scaling
    pub speed: f32,
    /// Arch height of row-to-row arcs
    pub arc_height: f32,
    /// Height multiplier of bounce-insert hops
    pub extra_bounce_multiplier: f32,
    /// Row spacing, the segment scale of bounce hops
    pub vertical_spacing: f32,
}

impl MotionParams {
    pub fn from_config(config: &BoardConfig, vertical_spacing: f32) -> Self {
        Self {
            speed: config.ball_speed,
            arc_height: config.arc_height(),
            extra_bounce_multiplier: config.extra_bounce_multiplier(),
            vertical_spacing,
        }
    }
}

/// Something that happened while stepping a ball
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionEvent {
    /// Ball snapped onto a lattice node
    PegTouched { row: usize, col: usize },
    /// Ball reached its bin (emitted once)
    Landed { bin: BinId },
    /// Ball reached a synthesized end with no bin
    DeadEnd,
}

/// Trajectory state of one ball
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallMotion {
    path: Path,
    /// Index of the point the ball last snapped to
    index: usize,
    progress: f32,
    mode: MotionMode,
    /// Fixed per-ball speed multiplier
    speed_factor: f32,
    /// +1 or -1
    spin_dir: f32,
    pos: Vec2,
    angle: f32,
}

impl BallMotion {
    /// Start a ball on the first point of `path`
    ///
    /// Paths need a start and an end point; anything shorter is
    /// `DegeneratePath`.
    pub fn new(path: Path, speed_factor: f32, spin_dir: f32) -> Result<Self> {
        if path.len() < 2 {
            return Err(PlinkoError::DegeneratePath);
        }
        let pos = path.points()[0].pos;
        Ok(Self {
            path,
            index: 0,
            progress: 0.0,
            mode: MotionMode::Idle,
            speed_factor,
            spin_dir,
            pos,
            angle: 0.0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn speed_factor(&self) -> f32 {
        self.speed_factor
    }

    pub fn is_landed(&self) -> bool {
        self.mode == MotionMode::Landed
    }

    /// Advance by `dt` frames; at most one segment completes per step
    pub fn step(&mut self, params: &MotionParams, dt: f32) -> Option<MotionEvent> {
        if self.mode == MotionMode::Landed {
            return None;
        }
        let points = self.path.points();
        let (Some(&cur), Some(&next)) = (points.get(self.index), points.get(self.index + 1)) else {
            self.mode = MotionMode::Landed;
            return None;
        };

        let bounce = next.kind == PointKind::BounceInsert;
        self.mode = if bounce { MotionMode::Bounce } else { MotionMode::Arc };

        let rate = if bounce {
            params.speed * self.speed_factor / params.vertical_spacing.max(MIN_SEGMENT_DISTANCE)
        } else {
            let boost = if cur.kind == PointKind::Start {
                START_SPEED_BOOST
            } else {
                1.0
            };
            params.speed * boost * self.speed_factor / cur.pos.distance(next.pos).max(MIN_SEGMENT_DISTANCE)
        };
        self.progress += rate * dt;

        let previous = self.pos;
        let event = if self.progress >= 1.0 {
            self.snap_to(&next)
        } else {
            self.pos = if bounce {
                bounce_position(&cur, params, self.progress)
            } else {
                arc_position(&cur, &next, params, self.progress)
            };
            None
        };

        self.angle += SPIN_RATE * (self.pos - previous).length() * self.spin_dir;
        event
    }

    fn snap_to(&mut self, target: &PathPoint) -> Option<MotionEvent> {
        self.pos = target.pos;
        self.progress = 0.0;
        self.index += 1;

        if self.index + 1 >= self.path.len() {
            self.mode = MotionMode::Landed;
            return Some(match target.bin {
                Some(bin) => MotionEvent::Landed { bin },
                None => MotionEvent::DeadEnd,
            });
        }
        let (row, col) = target.node()?;
        Some(MotionEvent::PegTouched { row, col })
    }
}

/// Control point of the Bezier arc between two points (y grows downward)
pub fn arc_control_point(cur: &PathPoint, next: &PathPoint, params: &MotionParams) -> Vec2 {
    let mid_x = (cur.pos.x + next.pos.x) / 2.0;
    let dy = next.pos.y - cur.pos.y;
    if cur.kind == PointKind::Start {
        // Leaving a lane the ball falls in rather than hopping
        Vec2::new(mid_x, cur.pos.y + dy * START_CONTROL_RATIO)
    } else {
        let lift = params.arc_height.min(dy.abs() * ARC_HEIGHT_CAP);
        Vec2::new(mid_x, cur.pos.y.min(next.pos.y) - lift)
    }
}

fn arc_position(cur: &PathPoint, next: &PathPoint, params: &MotionParams, t: f32) -> Vec2 {
    let control = arc_control_point(cur, next, params);
    let u = 1.0 - t;
    cur.pos * (u * u) + control * (2.0 * u * t) + next.pos * (t * t)
}

fn bounce_position(cur: &PathPoint, params: &MotionParams, t: f32) -> Vec2 {
    let height = params.arc_height * params.extra_bounce_multiplier;
    Vec2::new(cur.pos.x, cur.pos.y - height * 4.0 * t * (1.0 - t))
}
