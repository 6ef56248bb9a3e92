// src/navigation/controller.rs
// Thread-safe handle around the mission executor. The control loop, the perception
// feed and mission control all go through the same mutex, so every read and write of
// the current cell, the targets and the execution state is serialized.

use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{MissionExecutor, MissionStatus, NavigationError};
use crate::core::Cell;
use crate::interface::{Actuator, LineFollower, PositionFix};

/// Shared, cloneable access to one `MissionExecutor`
pub struct MissionController<A, L> {
    executor: Arc<Mutex<MissionExecutor<A, L>>>,
}

impl<A, L> Clone for MissionController<A, L> {
    fn clone(&self) -> Self {
        MissionController {
            executor: Arc::clone(&self.executor),
        }
    }
}

impl<A: Actuator, L: LineFollower> MissionController<A, L> {
    /// Takes ownership of `executor`
    pub fn new(executor: MissionExecutor<A, L>) -> Self {
        MissionController {
            executor: Arc::new(Mutex::new(executor)),
        }
    }

    /// (Re)starts a mission with `targets`
    pub fn set_mission(&self, targets: Vec<Cell>) {
        self.lock().on_mission_start(targets);
    }

    /// Delivers a position fix. Blocks while a command is being dispatched.
    pub fn on_position_fix(&self, fix: PositionFix) -> Result<(), NavigationError> {
        self.lock().on_position_fix(fix)
    }

    /// Runs one control cycle
    pub fn step(&self) -> Result<(), NavigationError> {
        self.lock().step()
    }

    /// Cancels the current mission
    pub fn stop(&self) -> Result<(), NavigationError> {
        self.lock().stop()
    }

    /// Status snapshot
    pub fn status(&self) -> MissionStatus {
        self.lock().status()
    }

    /// Runs `f` with exclusive access to the executor
    pub fn with_executor<R>(&self, f: impl FnOnce(&mut MissionExecutor<A, L>) -> R) -> R {
        f(&mut self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, MissionExecutor<A, L>> {
        self.executor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<A, L> MissionController<A, L>
where
    A: Actuator + Send + 'static,
    L: LineFollower + Send + 'static,
{
    /// Spawns the control loop: one `step()` every `cycle` until `shutdown` is set
    pub fn spawn(&self, cycle: Duration, shutdown: Arc<AtomicBool>) -> JoinHandle<()> {
        let controller = self.clone();
        thread::spawn(move || {
            info!("Control loop started ({:?} cycle)", cycle);
            while !shutdown.load(Ordering::Relaxed) {
                if let Err(e) = controller.step() {
                    error!("Control step failed: {}", e);
                }
                thread::sleep(cycle);
            }
            info!("Control loop stopped");
        })
    }

    /// Spawns the fix feed: applies every fix received on `fixes` in arrival order and
    /// exits once all senders are dropped. Senders never wait for a dispatch in progress.
    pub fn spawn_fix_feed(&self, fixes: Receiver<PositionFix>) -> JoinHandle<()> {
        let controller = self.clone();
        thread::spawn(move || {
            for fix in fixes {
                if let Err(e) = controller.on_position_fix(fix) {
                    error!("Failed to apply position fix {}: {}", fix.cell, e);
                }
            }
            info!("Fix feed closed");
        })
    }
}
