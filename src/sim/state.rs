//! Simulation state and core simulation types
//!
//! The simulation owns one board (config, peg layout, lattice), the seeded
//! RNG, every ball in flight and the pending spawn timers. All randomness
//! flows through the one `Pcg32`, so a seed plus the same calls replays the
//! same paths, delays and trajectories.

use std::collections::VecDeque;
use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::path::{Path, PathPlanner};
use super::schedule::{SpawnHandle, SpawnQueue};
use super::solver::{DistributionResult, solve_distribution};
use super::trajectory::{BallMotion, MotionParams};
use crate::board::{BinId, BinValueTable, Lattice, PegLayout};
use crate::config::BoardConfig;
use crate::consts::{EVENT_QUEUE_CAPACITY, SPAWN_DELAY_VARIANCE, SPEED_JITTER};
use crate::error::{PlinkoError, Result};

/// Ball identifier, unique for the lifetime of a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BallId(pub u32);

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ball #{}", self.0)
    }
}

/// Why a ball left the board without landing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemovalReason {
    /// Fell past the bottom bound
    OutOfBounds,
    /// Reached a synthesized end with no bin
    NoBin,
    /// Cleared by `clear_balls` or a reconfiguration
    Cleared,
}

/// Events for the presentation and scoring collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    BallSpawned { ball: BallId, target: Option<BinId> },
    PegTouched { ball: BallId, row: usize, col: usize },
    BallLanded { ball: BallId, bin: BinId, multiplier: u32 },
    BallRemoved { ball: BallId, reason: RemovalReason },
}

/// Geometry and lattice of one configuration
#[derive(Debug, Clone)]
pub struct Board {
    pub config: BoardConfig,
    pub layout: PegLayout,
    pub lattice: Lattice,
    pub motion: MotionParams,
}

impl Board {
    pub fn build(config: BoardConfig) -> Result<Self> {
        let layout = PegLayout::triangular(&config)?;
        let lattice = Lattice::build(&layout, &config)?;
        let motion = MotionParams::from_config(&config, lattice.vertical_spacing());
        Ok(Self {
            config,
            layout,
            lattice,
            motion,
        })
    }
}

/// A ball in flight
#[derive(Debug, Clone)]
pub struct Ball {
    pub id: BallId,
    /// Bin the path was planned toward, if any
    pub target: Option<BinId>,
    pub motion: BallMotion,
}

/// Balls spawned and scheduled by one throw
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchThrow {
    /// Ball released immediately
    pub first: Option<BallId>,
    /// Timers for the rest of the batch
    pub scheduled: Vec<SpawnHandle>,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    /// Seed for reproducibility
    pub(super) seed: u64,
    pub(super) rng: Pcg32,
    pub(super) board: Board,
    /// Active balls (sorted by id)
    pub(super) balls: Vec<Ball>,
    pub(super) spawns: SpawnQueue,
    pub(super) events: VecDeque<SimEvent>,
    /// Simulation tick counter
    pub(super) time_ticks: u64,
    /// Simulation clock in milliseconds
    pub(super) clock_ms: f64,
    next_id: u32,
}

impl Simulation {
    /// Build a board for `config` with an RNG seeded from `seed`
    pub fn new(config: BoardConfig, seed: u64) -> Result<Self> {
        let board = Board::build(config)?;
        log::info!(
            "Simulation ready: {} rows, {} bins, seed {seed}",
            board.lattice.row_count(),
            board.lattice.bin_count()
        );
        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            board,
            balls: Vec::new(),
            spawns: SpawnQueue::new(),
            events: VecDeque::with_capacity(64),
            time_ticks: 0,
            clock_ms: 0.0,
            next_id: 1,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &BoardConfig {
        &self.board.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn lattice(&self) -> &Lattice {
        &self.board.lattice
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&Ball> {
        self.balls
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|i| &self.balls[i])
    }

    /// Multipliers of the current board
    pub fn bin_values(&self) -> Vec<u32> {
        self.board.lattice.values()
    }

    /// Multipliers the configured tiers give a board of `bin_count` bins
    pub fn compute_bin_values(&self, bin_count: usize) -> Vec<u32> {
        BinValueTable::new(self.board.config.tiers.clone()).values(bin_count)
    }

    /// Plan a path toward `target` (random when `None` or unreachable)
    pub fn plan_path(&mut self, target: Option<BinId>) -> Path {
        let chance = self.board.config.extra_bounce_chance;
        PathPlanner::new(&self.board.lattice).plan(target, chance, &mut self.rng)
    }

    /// Like [`plan_path`](Self::plan_path) but rejects unreachable targets
    pub fn try_plan_path(&mut self, target: Option<BinId>) -> Result<Path> {
        let chance = self.board.config.extra_bounce_chance;
        PathPlanner::new(&self.board.lattice).try_plan(target, chance, &mut self.rng)
    }

    /// Pick bins for `ball_count` balls summing as close to `target_sum` as possible
    ///
    /// Only bins a planned path can reach are offered to the solver. They
    /// form a prefix of the bin list, so the returned ids index the board.
    pub fn solve_distribution(&self, ball_count: usize, target_sum: u64) -> DistributionResult {
        let values = self.bin_values();
        let reachable = self
            .board
            .lattice
            .max_reachable_bin()
            .map_or(0, |bin| bin.index() + 1)
            .min(values.len());
        solve_distribution(ball_count, target_sum, &values[..reachable])
    }

    fn next_ball_id(&mut self) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Put a ball on `path` right away
    pub fn spawn_ball(&mut self, path: Path) -> Result<BallId> {
        let speed_factor = self.rng.random_range(SPEED_JITTER.0..SPEED_JITTER.1);
        let spin_dir = if self.next_id % 2 == 0 { 1.0 } else { -1.0 };
        let target = path.bin();
        let motion = BallMotion::new(path, speed_factor, spin_dir)?;
        let id = self.next_ball_id();

        // Ids only grow, so pushing keeps the list sorted
        self.balls.push(Ball { id, target, motion });
        self.push_event(SimEvent::BallSpawned { ball: id, target });
        log::debug!("Spawned {id} toward {target:?}");
        Ok(id)
    }

    /// Spawn a ball on `path` after `delay_ms` of simulation time
    pub fn schedule_spawn(&mut self, path: Path, delay_ms: f64) -> Result<SpawnHandle> {
        if path.len() < 2 {
            return Err(PlinkoError::DegeneratePath);
        }
        Ok(self.spawns.schedule(path, self.clock_ms + delay_ms.max(0.0)))
    }

    /// Cancel a scheduled spawn; false if it already fired or was cancelled
    pub fn cancel_spawn(&mut self, handle: SpawnHandle) -> bool {
        self.spawns.cancel(handle)
    }

    pub fn pending_spawn_count(&self) -> usize {
        self.spawns.len()
    }

    /// Throw `ball_count` balls, the first `targets.len()` of them aimed
    ///
    /// The first ball drops immediately; each further ball follows after a
    /// jittered base delay, accumulated over the batch.
    pub fn throw_batch(&mut self, targets: &[BinId], ball_count: usize) -> Result<BatchThrow> {
        let max_balls = self.board.config.max_balls as usize;
        let count = if ball_count > max_balls {
            log::warn!("Batch of {ball_count} balls capped at {max_balls}");
            max_balls
        } else {
            ball_count
        };

        let paths = (0..count)
            .map(|i| self.plan_path(targets.get(i).copied()))
            .collect::<Vec<_>>();
        self.launch_batch(paths)
    }

    /// Spawn the first path now and schedule the rest
    ///
    /// Every path is checked before anything is spawned, so a failure never
    /// leaves part of a batch on the board.
    fn launch_batch(&mut self, paths: Vec<Path>) -> Result<BatchThrow> {
        if paths.iter().any(|path| path.len() < 2) {
            return Err(PlinkoError::DegeneratePath);
        }
        let count = paths.len();
        let base_delay = f64::from(self.board.config.ball_drop_delay_ms);
        let jitter = f64::from(SPAWN_DELAY_VARIANCE);
        let mut throw = BatchThrow::default();
        let mut delay = 0.0;

        for (i, path) in paths.into_iter().enumerate() {
            if i == 0 {
                throw.first = Some(self.spawn_ball(path)?);
            } else {
                delay += base_delay * self.rng.random_range(1.0 - jitter..1.0 + jitter);
                throw.scheduled.push(self.schedule_spawn(path, delay)?);
            }
        }

        log::info!("Threw {count} balls over {delay:.0} ms");
        Ok(throw)
    }

    /// Solve the payout distribution and throw one ball per chosen bin
    pub fn throw_for_payout(
        &mut self,
        ball_count: usize,
        target_sum: u64,
    ) -> Result<(DistributionResult, BatchThrow)> {
        let count = ball_count.min(self.board.config.max_balls as usize);
        let distribution = self.solve_distribution(count, target_sum);
        if !distribution.exact {
            log::warn!(
                "Payout target {target_sum} not attainable with {count} balls, throwing for {}",
                distribution.achieved_sum
            );
        }
        let throw = self.throw_batch(&distribution.bins, count)?;
        Ok((distribution, throw))
    }

    /// Remove every ball and pending spawn, returning how many balls were removed
    pub fn clear_balls(&mut self) -> usize {
        let cancelled = self.spawns.clear();
        let removed: Vec<BallId> = self.balls.drain(..).map(|b| b.id).collect();
        for &ball in &removed {
            self.push_event(SimEvent::BallRemoved {
                ball,
                reason: RemovalReason::Cleared,
            });
        }
        if cancelled > 0 || !removed.is_empty() {
            log::info!("Cleared {} balls and {cancelled} pending spawns", removed.len());
        }
        removed.len()
    }

    /// Rebuild the board for a new config
    ///
    /// In-flight balls and pending spawns are cleared before the new lattice
    /// replaces the old one. A config that cannot produce a board is rejected
    /// and leaves the simulation untouched.
    pub fn reconfigure(&mut self, config: BoardConfig) -> Result<()> {
        let board = Board::build(config)?;
        self.clear_balls();
        log::info!(
            "Board rebuilt: {} rows, {} bins",
            board.lattice.row_count(),
            board.lattice.bin_count()
        );
        self.board = board;
        Ok(())
    }

    /// Position of a ball in flight
    pub fn current_position(&self, id: BallId) -> Option<Vec2> {
        self.ball(id).map(|b| b.motion.pos())
    }

    pub fn active_ball_count(&self) -> usize {
        self.balls.len()
    }

    /// No balls in flight and nothing scheduled
    pub fn is_idle(&self) -> bool {
        self.balls.is_empty() && self.spawns.is_empty()
    }

    /// Take every queued event, oldest first
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain(..).collect()
    }

    pub(super) fn push_event(&mut self, event: SimEvent) {
        if self.events.len() >= EVENT_QUEUE_CAPACITY {
            if let Some(dropped) = self.events.pop_front() {
                log::warn!("Event queue full, dropping {dropped:?}");
            }
        }
        self.events.push_back(event);
    }
}
