//! Simulation tick
//!
//! Advances the clock, fires due spawns, steps every ball once and retires
//! balls that landed or fell off the board.

use super::state::{RemovalReason, SimEvent, Simulation};
use super::trajectory::MotionEvent;
use crate::consts::{FRAME_MS, OUT_OF_BOUNDS_MARGIN};

/// Advance the simulation by `dt` nominal frames (1.0 = one 60 Hz frame)
pub fn tick(sim: &mut Simulation, dt: f32) {
    sim.time_ticks += 1;
    sim.clock_ms += f64::from(dt) * FRAME_MS;

    // Timers fire before the step so a freshly spawned ball moves this tick
    for (handle, path) in sim.spawns.take_due(sim.clock_ms) {
        if let Err(err) = sim.spawn_ball(path) {
            log::warn!("Scheduled spawn {handle:?} dropped: {err}");
        }
    }

    let params = sim.board.motion;
    let floor = sim.board.config.height + OUT_OF_BOUNDS_MARGIN;
    let lattice = &sim.board.lattice;
    let mut events = Vec::new();

    // Balls are independent; each one sees only its own state
    sim.balls.retain_mut(|ball| {
        let event = ball.motion.step(&params, dt);
        match event {
            Some(MotionEvent::PegTouched { row, col }) => {
                events.push(SimEvent::PegTouched {
                    ball: ball.id,
                    row,
                    col,
                });
            }
            Some(MotionEvent::Landed { bin }) => {
                let multiplier = lattice.bin(bin).map_or(0, |b| b.multiplier);
                log::debug!("{} landed in {bin} (x{multiplier})", ball.id);
                events.push(SimEvent::BallLanded {
                    ball: ball.id,
                    bin,
                    multiplier,
                });
                return false;
            }
            Some(MotionEvent::DeadEnd) => {
                log::warn!("{} reached a dead end with no bin", ball.id);
                events.push(SimEvent::BallRemoved {
                    ball: ball.id,
                    reason: RemovalReason::NoBin,
                });
                return false;
            }
            None => {}
        }

        if ball.motion.pos().y > floor {
            log::warn!("{} left the board at y = {:.1}", ball.id, ball.motion.pos().y);
            events.push(SimEvent::BallRemoved {
                ball: ball.id,
                reason: RemovalReason::OutOfBounds,
            });
            return false;
        }
        true
    });

    for event in events {
        sim.push_event(event);
    }
}
