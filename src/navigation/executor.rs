// src/navigation/executor.rs
// Mission executor: owns the heading, the current cell, the target list and the
// outstanding command queue, and drains the queue one command per step.

use log::{Level, debug, error, info, log, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{DirectionResolver, NavigationError, PathPlanner, PlannedRoute};
use crate::core::{Cell, Command, ExecutionState, GridMap, Heading, TargetSet};
use crate::interface::{Actuator, LineFollower, PositionFix, TransportError};

/// Command pacing and planning limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Forward pulse before a pivot, so the chassis reaches the crossing
    pub forward_pulse_ms: u64,
    /// Wait after a pivot
    pub turn_settle_ms: u64,
    /// Wait after a stop
    pub command_settle_ms: u64,
    /// Upper bound on the forward correction loop
    pub alignment_timeout_ms: u64,
    /// Wait between line follower polls
    pub correction_interval_ms: u64,
    /// Consecutive planning failures tolerated before the mission fails.
    /// `None` retries forever.
    pub max_plan_retries: Option<u32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            forward_pulse_ms: 850,
            turn_settle_ms: 900,
            command_settle_ms: 1000,
            alignment_timeout_ms: 1200,
            correction_interval_ms: 50,
            max_plan_retries: None,
        }
    }
}

impl ExecutorConfig {
    /// No sleeps anywhere; the correction loop gives up after its first unaligned poll
    pub fn without_delays() -> Self {
        ExecutorConfig {
            forward_pulse_ms: 0,
            turn_settle_ms: 0,
            command_settle_ms: 0,
            alignment_timeout_ms: 0,
            correction_interval_ms: 0,
            max_plan_retries: None,
        }
    }
}

/// Optional behaviours of the two robot flavours (shopper and shelf inspector)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionCapabilities {
    /// Re-install the mission's target list once it has been fully visited
    pub cyclic_revisit: bool,
    /// Cells where the AGV halts for a detection pass whenever a fix lands on them
    pub detection_points: Vec<Cell>,
    /// How long to hold at a detection point before planning again
    pub detection_dwell_ms: u64,
}

/// Read-only snapshot for mission control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionStatus {
    /// Last known cell
    pub current_cell: Cell,
    /// Whether `current_cell` comes from a position fix rather than dead reckoning
    pub position_confirmed: bool,
    /// Tracked heading
    pub heading: Heading,
    /// Targets still to be visited, in mission order
    pub remaining_targets: Vec<Cell>,
    /// Executor state
    pub execution_state: ExecutionState,
    /// Commands left in the current plan
    pub pending_commands: usize,
    /// Consecutive planning failures
    pub plan_retries: u32,
    /// Why the mission failed, when `execution_state` is `Failed`
    pub failure: Option<String>,
    /// Last detection point the AGV stopped at
    pub last_detection: Option<Cell>,
}

/// Stateful controller between the planner and the drive layer
pub struct MissionExecutor<A, L> {
    planner: PathPlanner,
    actuator: A,
    follower: L,
    config: ExecutorConfig,
    capabilities: MissionCapabilities,

    state: ExecutionState,
    current_cell: Cell,
    position_confirmed: bool,
    current_heading: Heading,
    targets: TargetSet,
    mission: Vec<Cell>,
    pending: VecDeque<Command>,
    planned_goal: Option<Cell>,
    plan_retries: u32,
    failure: Option<String>,
    dwell_until: Option<Instant>,
    last_detection: Option<Cell>,
}

impl<A: Actuator, L: LineFollower> MissionExecutor<A, L> {
    /// Idle executor at `start` facing `heading`, with default pacing and no
    /// optional capabilities
    pub fn new(grid: Arc<GridMap>, start: Cell, heading: Heading, actuator: A, follower: L) -> Self {
        MissionExecutor {
            planner: PathPlanner::new(grid),
            actuator,
            follower,
            config: ExecutorConfig::default(),
            capabilities: MissionCapabilities::default(),
            state: ExecutionState::Idle,
            current_cell: start,
            position_confirmed: false,
            current_heading: heading,
            targets: TargetSet::default(),
            mission: Vec::new(),
            pending: VecDeque::new(),
            planned_goal: None,
            plan_retries: 0,
            failure: None,
            dwell_until: None,
            last_detection: None,
        }
    }

    /// Replaces the pacing configuration
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Enables optional capabilities
    pub fn with_capabilities(mut self, capabilities: MissionCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Installs a new target list, replacing any mission in progress
    pub fn on_mission_start(&mut self, targets: Vec<Cell>) {
        for target in &targets {
            if !self.planner.grid().free(*target) {
                warn!("Mission target {} is blocked or off the grid", target);
            }
        }
        info!("Mission started with {} target(s): {:?}", targets.len(), targets);

        self.mission = targets.clone();
        self.targets = TargetSet::new(targets);
        self.pending.clear();
        self.planned_goal = None;
        self.plan_retries = 0;
        self.failure = None;
        self.dwell_until = None;
        self.transition(ExecutionState::Planning);
    }

    /// Authoritative position update from a decoded floor marker.
    ///
    /// A fix on a remaining target removes one occurrence of it and stops the AGV.
    /// An active mission is replanned from the new cell on the next step.
    pub fn on_position_fix(&mut self, fix: PositionFix) -> Result<(), NavigationError> {
        let cell = fix.cell;
        if !self.planner.grid().free(cell) {
            warn!("Position fix {} is on a blocked or off-grid cell", cell);
        }
        debug!("Position fix {} (was {})", cell, self.current_cell);

        self.current_cell = cell;
        self.position_confirmed = true;
        self.planned_goal = None;

        let mut stopped = false;
        let mut result = Ok(());
        if self.targets.remove_one(cell) {
            info!(
                "Arrived at target {}, {} remaining",
                cell,
                self.targets.len()
            );
            result = self.emit(Command::Stop);
            stopped = true;
        }

        if self.capabilities.detection_points.contains(&cell) {
            info!("Detection point {}, holding", cell);
            if !stopped {
                result = result.and(self.emit(Command::Stop));
            }
            self.last_detection = Some(cell);
            self.dwell_until =
                Some(Instant::now() + Duration::from_millis(self.capabilities.detection_dwell_ms));
        }

        if self.state.is_active() {
            self.transition(ExecutionState::Replanning);
        }
        result.map_err(NavigationError::from)
    }

    /// Advances the mission by one cycle. Called repeatedly by the host loop.
    ///
    /// Planning failures are absorbed and retried on the next call. Errors returned here
    /// are drive link failures and mission failures.
    pub fn step(&mut self) -> Result<(), NavigationError> {
        match self.state {
            ExecutionState::Idle | ExecutionState::Failed => Ok(()),
            ExecutionState::Planning | ExecutionState::Replanning => self.plan(),
            ExecutionState::Executing => self.execute_next(),
        }
    }

    /// Cancels the mission: drops the queue and the targets and halts the AGV
    pub fn stop(&mut self) -> Result<(), NavigationError> {
        info!("Mission stopped by operator");
        self.pending.clear();
        self.targets.clear();
        self.mission.clear();
        self.planned_goal = None;
        self.dwell_until = None;
        self.transition(ExecutionState::Idle);
        self.emit(Command::Stop)?;
        Ok(())
    }

    /// Snapshot for mission control
    pub fn status(&self) -> MissionStatus {
        MissionStatus {
            current_cell: self.current_cell,
            position_confirmed: self.position_confirmed,
            heading: self.current_heading,
            remaining_targets: self.targets.as_slice().to_vec(),
            execution_state: self.state,
            pending_commands: self.pending.len(),
            plan_retries: self.plan_retries,
            failure: self.failure.clone(),
            last_detection: self.last_detection,
        }
    }

    /// Current execution state
    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Tracked heading
    pub fn current_heading(&self) -> Heading {
        self.current_heading
    }

    /// Last known cell
    pub fn current_cell(&self) -> Cell {
        self.current_cell
    }

    /// Targets still to be visited
    pub fn targets(&self) -> &TargetSet {
        &self.targets
    }

    /// Commands left in the current plan
    pub fn pending_commands(&self) -> Vec<Command> {
        self.pending.iter().copied().collect()
    }

    /// The drive layer
    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    /// The drive layer, mutably
    pub fn actuator_mut(&mut self) -> &mut A {
        &mut self.actuator
    }

    fn plan(&mut self) -> Result<(), NavigationError> {
        if let Some(until) = self.dwell_until {
            if Instant::now() < until {
                return Ok(());
            }
            self.dwell_until = None;
        }

        if self.targets.is_empty() {
            if self.capabilities.cyclic_revisit && !self.mission.is_empty() {
                info!("All targets visited, starting the next cycle");
                self.targets = TargetSet::new(self.mission.clone());
            } else {
                info!("Mission complete");
                self.transition(ExecutionState::Idle);
                self.emit(Command::Stop)?;
                return Ok(());
            }
        }

        let route = match self.planner.find_path(self.current_cell, self.targets.as_slice()) {
            Ok(route) => route,
            Err(NavigationError::NotFound { start, goals }) => {
                self.plan_retries += 1;
                warn!(
                    "No path from {} to {} target(s), attempt {}",
                    start, goals, self.plan_retries
                );
                if let Some(max) = self.config.max_plan_retries {
                    if self.plan_retries > max {
                        let reason = format!(
                            "no reachable target from {} after {} attempts",
                            start, self.plan_retries
                        );
                        self.fail(&reason);
                        return Err(NavigationError::MissionFailed(reason));
                    }
                }
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        self.plan_retries = 0;
        self.install(route)
    }

    // Resolves `route` against the tracked heading and queues the commands.
    // A path that is not a chain of unit moves aborts the mission.
    fn install(&mut self, route: PlannedRoute) -> Result<(), NavigationError> {
        let commands = match DirectionResolver::resolve(&route.path, self.current_heading) {
            Ok(commands) => commands,
            Err(e) => {
                self.fail(&e.to_string());
                return Err(e);
            }
        };

        // zero-move plans repeat every other cycle while waiting for a fix
        let level = if commands.is_empty() {
            Level::Debug
        } else {
            Level::Info
        };
        log!(
            level,
            "Plan to {} facing {}: {}",
            route.goal,
            self.current_heading,
            commands
                .iter()
                .map(|c| c.token())
                .collect::<Vec<_>>()
                .join(" ")
        );
        self.pending = commands.into();
        self.planned_goal = Some(route.goal);
        self.transition(ExecutionState::Executing);
        Ok(())
    }

    fn execute_next(&mut self) -> Result<(), NavigationError> {
        let Some(command) = self.pending.pop_front() else {
            if let Some(goal) = self.planned_goal.take() {
                if goal != self.current_cell {
                    debug!("Plan drained, assuming {} until a fix arrives", goal);
                    self.current_cell = goal;
                    self.position_confirmed = false;
                }
            }
            self.transition(ExecutionState::Replanning);
            return Ok(());
        };

        self.dispatch(command)
    }

    fn dispatch(&mut self, command: Command) -> Result<(), NavigationError> {
        info!("Executing {} facing {}", command, self.current_heading);
        match command {
            Command::Forward => {
                self.emit_or_requeue(Command::Forward, command)?;
                match self.align_on_line() {
                    Ok(nudges) => debug!("Aligned after {} correction(s)", nudges),
                    Err(NavigationError::AlignmentTimeout(limit)) => {
                        warn!("Line alignment timed out after {:?}, continuing", limit);
                    }
                    Err(e) => return Err(e),
                }
            }
            Command::TurnLeft90 | Command::TurnRight90 | Command::Reverse => {
                self.emit_or_requeue(Command::Forward, command)?;
                pause(self.config.forward_pulse_ms);
                self.emit_or_requeue(command, command)?;
                self.current_heading = self.current_heading.apply(command);
                pause(self.config.turn_settle_ms);
            }
            Command::Stop => {
                self.emit_or_requeue(Command::Stop, command)?;
                pause(self.config.command_settle_ms);
            }
        }
        Ok(())
    }

    /// Polls the line follower and forwards its corrections until it reports the AGV
    /// centred. Returns the number of nudges sent.
    fn align_on_line(&mut self) -> Result<usize, NavigationError> {
        let limit = Duration::from_millis(self.config.alignment_timeout_ms);
        let started = Instant::now();
        let mut nudges = 0;

        loop {
            let reading = self.follower.poll();
            if reading.is_some_and(|r| r.aligned) {
                return Ok(nudges);
            }
            if started.elapsed() >= limit {
                return Err(NavigationError::AlignmentTimeout(limit));
            }
            if let Some(reading) = reading {
                self.actuator.correct(reading.direction)?;
                nudges += 1;
            }
            pause(self.config.correction_interval_ms);
        }
    }

    // Puts `requeue` back at the head of the queue when `command` cannot be delivered,
    // so the heading is only ever updated for commands that reached the drive layer.
    fn emit_or_requeue(&mut self, command: Command, requeue: Command) -> Result<(), NavigationError> {
        if let Err(e) = self.emit(command) {
            self.pending.push_front(requeue);
            return Err(e.into());
        }
        Ok(())
    }

    fn emit(&mut self, command: Command) -> Result<(), TransportError> {
        self.actuator.send(command).map_err(|e| {
            error!("Drive link rejected {}: {}", command, e);
            e
        })
    }

    fn fail(&mut self, reason: &str) {
        error!("Mission failed: {}", reason);
        self.failure = Some(reason.to_string());
        self.pending.clear();
        self.planned_goal = None;
        self.transition(ExecutionState::Failed);
        // best effort, the failure is already recorded
        let _ = self.emit(Command::Stop);
    }

    fn transition(&mut self, next: ExecutionState) {
        if self.state != next {
            debug!("State {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

fn pause(ms: u64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms));
    }
}
