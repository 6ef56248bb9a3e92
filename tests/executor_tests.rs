// tests/executor_tests.rs
// Mission executor scenarios driven step by step against a recorded token stream.

use cart_agv::{
    AgvConfig, Cell, Command, ExecutionState, ExecutorConfig, GridMap, Heading, LineCorrection,
    LineDirection, LineFollower, MissionCapabilities, MissionController, MissionExecutor,
    NavigationError, PositionFix, SerialActuator, SharedLineSignal, TransportError,
};
use mockall::mock;
use std::sync::Arc;
use std::sync::mpsc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

mock! {
    pub Tracer {}
    impl LineFollower for Tracer {
        fn poll(&mut self) -> Option<LineCorrection>;
    }
}

type Executor = MissionExecutor<SerialActuator<Vec<u8>>, MockTracer>;

fn centred_tracer() -> MockTracer {
    let mut tracer = MockTracer::new();
    tracer
        .expect_poll()
        .returning(|| Some(LineCorrection::from_direction(LineDirection::Forward)));
    tracer
}

fn shop_executor(start: Cell, heading: Heading) -> Executor {
    let grid = Arc::new(AgvConfig::default().grid_map().unwrap());
    MissionExecutor::new(
        grid,
        start,
        heading,
        SerialActuator::new(Vec::new()),
        centred_tracer(),
    )
    .with_config(ExecutorConfig::without_delays())
}

fn tokens(executor: &Executor) -> Vec<String> {
    String::from_utf8(executor.actuator().writer().clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn run(executor: &mut Executor, steps: usize) {
    for _ in 0..steps {
        executor.step().unwrap();
    }
}

#[test]
fn climbs_column_zero_then_stops_on_arrival() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(0, 0)]);
    assert_eq!(executor.state(), ExecutionState::Planning);

    executor.step().unwrap();
    assert_eq!(executor.state(), ExecutionState::Executing);
    assert_eq!(executor.pending_commands(), vec![Command::Forward; 6]);

    run(&mut executor, 6);
    assert_eq!(tokens(&executor), vec!["F"; 6]);
    assert_eq!(executor.current_heading(), Heading::Up);

    // drained: dead-reckoned onto the goal, but the target stays until a fix confirms it
    executor.step().unwrap();
    let status = executor.status();
    assert_eq!(status.execution_state, ExecutionState::Replanning);
    assert_eq!(status.current_cell, Cell::new(0, 0));
    assert!(!status.position_confirmed);
    assert_eq!(status.remaining_targets, vec![Cell::new(0, 0)]);

    executor.on_position_fix(PositionFix::new(0, 0)).unwrap();
    assert!(executor.targets().is_empty());
    executor.step().unwrap();

    assert_eq!(executor.state(), ExecutionState::Idle);
    let mut expected = vec!["F"; 6];
    expected.extend(["S", "S"]);
    assert_eq!(tokens(&executor), expected);
}

#[test]
fn arrival_removes_one_occurrence() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(0, 1), Cell::new(0, 1)]);

    executor.on_position_fix(PositionFix::new(0, 1)).unwrap();

    assert_eq!(executor.targets().as_slice(), &[Cell::new(0, 1)]);
    assert_eq!(executor.state(), ExecutionState::Replanning);
    assert_eq!(tokens(&executor), vec!["S"]);
}

#[test]
fn fix_off_the_target_list_sends_nothing() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(0, 1)]);
    executor.on_position_fix(PositionFix::new(4, 0)).unwrap();

    assert!(tokens(&executor).is_empty());
    assert_eq!(executor.current_cell(), Cell::new(4, 0));
    assert!(executor.status().position_confirmed);
}

#[test]
fn turn_emits_pulse_then_pivot() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(6, 3)]);

    executor.step().unwrap();
    assert_eq!(
        executor.pending_commands(),
        vec![Command::TurnRight90, Command::Forward, Command::Forward]
    );

    executor.step().unwrap();
    assert_eq!(executor.current_heading(), Heading::Right);
    assert_eq!(tokens(&executor), vec!["F", "R90"]);

    run(&mut executor, 2);
    assert_eq!(tokens(&executor), vec!["F", "R90", "F", "F"]);
    assert_eq!(executor.current_heading(), Heading::Right);
}

#[test]
fn fix_mid_route_replaces_the_plan() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(0, 1)]);
    executor.step().unwrap();
    assert_eq!(executor.pending_commands().len(), 7);

    run(&mut executor, 2);
    executor.on_position_fix(PositionFix::new(4, 0)).unwrap();
    assert_eq!(executor.state(), ExecutionState::Replanning);

    executor.step().unwrap();
    let mut expected = vec![Command::Forward; 4];
    expected.push(Command::TurnRight90);
    assert_eq!(executor.pending_commands(), expected);
}

#[test]
fn unreachable_target_keeps_planning_quietly() {
    let grid = Arc::new(GridMap::with_blocked(
        3,
        3,
        &[Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 2), Cell::new(2, 1)],
    ));
    let mut executor = MissionExecutor::new(
        grid,
        Cell::new(1, 1),
        Heading::Up,
        SerialActuator::new(Vec::new()),
        centred_tracer(),
    )
    .with_config(ExecutorConfig::without_delays());
    executor.on_mission_start(vec![Cell::new(0, 0)]);

    run(&mut executor, 10);

    let status = executor.status();
    assert_eq!(status.execution_state, ExecutionState::Planning);
    assert_eq!(status.plan_retries, 10);
    assert_eq!(status.remaining_targets, vec![Cell::new(0, 0)]);
    assert!(tokens(&executor).is_empty());
}

#[test]
fn empty_mission_goes_idle_with_stop() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![]);
    executor.step().unwrap();
    assert_eq!(executor.state(), ExecutionState::Idle);
    assert_eq!(tokens(&executor), vec!["S"]);
}

#[test]
fn cyclic_revisit_reinstalls_the_mission() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up).with_capabilities(
        MissionCapabilities {
            cyclic_revisit: true,
            ..MissionCapabilities::default()
        },
    );
    executor.on_mission_start(vec![Cell::new(5, 0)]);
    executor.on_position_fix(PositionFix::new(5, 0)).unwrap();
    assert!(executor.targets().is_empty());

    executor.step().unwrap();
    assert_eq!(executor.state(), ExecutionState::Executing);
    assert_eq!(executor.targets().as_slice(), &[Cell::new(5, 0)]);
}

#[test]
fn stop_cancels_everything() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(0, 5)]);
    executor.step().unwrap();

    executor.stop().unwrap();

    let status = executor.status();
    assert_eq!(status.execution_state, ExecutionState::Idle);
    assert_eq!(status.pending_commands, 0);
    assert!(status.remaining_targets.is_empty());
    assert_eq!(tokens(&executor), vec!["S"]);
    // later fixes do not wake an idle executor
    executor.on_position_fix(PositionFix::new(6, 1)).unwrap();
    assert_eq!(executor.state(), ExecutionState::Idle);
}

#[test]
fn closed_link_keeps_command_and_heading() {
    let mut executor = shop_executor(Cell::new(6, 0), Heading::Up);
    executor.on_mission_start(vec![Cell::new(6, 2)]);
    executor.step().unwrap();
    executor.actuator_mut().close();

    let err = executor.step().unwrap_err();
    assert!(matches!(
        err,
        NavigationError::Transport(TransportError::Closed)
    ));
    assert_eq!(executor.current_heading(), Heading::Up);
    assert_eq!(
        executor.pending_commands(),
        vec![Command::TurnRight90, Command::Forward]
    );
}

#[test]
fn controller_serializes_fixes_and_steps() {
    let config = AgvConfig {
        initial_mission: vec![Cell::new(0, 0), Cell::new(6, 6)],
        executor: ExecutorConfig::without_delays(),
        ..AgvConfig::default()
    };
    let executor = config
        .build_executor(SerialActuator::new(Vec::new()), SharedLineSignal::new())
        .unwrap();
    let controller = MissionController::new(executor);

    let shutdown = Arc::new(AtomicBool::new(false));
    let control_loop = controller.spawn(Duration::from_millis(1), Arc::clone(&shutdown));

    let perception = controller.clone();
    let feeder = thread::spawn(move || {
        for row in (0..6).rev() {
            perception.on_position_fix(PositionFix::new(row, 0)).unwrap();
            thread::sleep(Duration::from_millis(5));
        }
    });
    feeder.join().unwrap();
    thread::sleep(Duration::from_millis(50));

    shutdown.store(true, Ordering::Relaxed);
    control_loop.join().unwrap();

    let status = controller.status();
    assert_eq!(status.remaining_targets, vec![Cell::new(6, 6)]);
    assert!(status.execution_state.is_active());
    let written = controller.with_executor(|e| e.actuator().writer().clone());
    assert!(String::from_utf8(written).unwrap().lines().any(|t| t == "S"));
}

#[test]
fn fixes_queue_while_the_executor_is_busy() {
    let config = AgvConfig {
        initial_mission: vec![Cell::new(0, 0), Cell::new(6, 6)],
        executor: ExecutorConfig::without_delays(),
        ..AgvConfig::default()
    };
    let executor = config
        .build_executor(SerialActuator::new(Vec::new()), SharedLineSignal::new())
        .unwrap();
    let controller = MissionController::new(executor);
    let (fixes, feed) = mpsc::channel();
    let fix_feed = controller.spawn_fix_feed(feed);

    // holding the executor stands in for a forward correction loop in progress
    controller.with_executor(|executor| {
        fixes.send(PositionFix::new(0, 0)).unwrap();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(
            executor.targets().as_slice(),
            &[Cell::new(0, 0), Cell::new(6, 6)]
        );
    });
    drop(fixes);
    fix_feed.join().unwrap();

    let status = controller.status();
    assert_eq!(status.current_cell, Cell::new(0, 0));
    assert_eq!(status.remaining_targets, vec![Cell::new(6, 6)]);
    assert_eq!(status.execution_state, ExecutionState::Replanning);
    let written = controller.with_executor(|e| e.actuator().writer().clone());
    assert_eq!(String::from_utf8(written).unwrap(), "S\n");
}
