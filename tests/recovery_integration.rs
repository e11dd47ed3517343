//! Integration tests for error reporting, the recovery cadence and the
//! kind-specific recovery strategies, using injected errors against the
//! in-memory maze world.

use mazebot::controller::{AiState, BotController, ErrorKind};
use mazebot::core::config::BotConfig;
use mazebot::core::types::{EntityId, Vec3};
use mazebot::facts::FactKey;
use mazebot::sim::{MazeGrid, MazeWorld, RecordingSensorRig, ScriptedDecision};
use mazebot::telemetry::{CollectingSink, TelemetryLog};
use mazebot::world::DecisionAsset;

use std::cell::RefCell;
use std::rc::Rc;

const DT: f32 = 0.5;

/// Ticks per recovery interval at DT, plus one so the deadline is due
const TICKS_TO_RECOVERY: usize = 11;

struct Bench {
    world: MazeWorld,
    controller: BotController,
    sensors: RecordingSensorRig,
    decision: ScriptedDecision,
    bot: EntityId,
    log: Rc<RefCell<TelemetryLog>>,
}

impl Bench {
    fn new() -> Self {
        Self::build(ScriptedDecision::default())
    }

    fn build(mut decision: ScriptedDecision) -> Self {
        let mut world = MazeWorld::new(MazeGrid::new(20, 20, 100.0), 7);
        let bot = world.add_bot(Vec3::new(250.0, 250.0, 0.0));
        let sink = CollectingSink::new();
        let log = sink.log();
        let mut controller = BotController::new(
            BotConfig::default(),
            Some(DecisionAsset("maze-bot".into())),
            Box::new(sink),
        );
        let mut sensors = RecordingSensorRig::default();
        controller.possess(bot, &mut world, &mut sensors, &mut decision);
        Self {
            world,
            controller,
            sensors,
            decision,
            bot,
            log,
        }
    }

    fn tick(&mut self, times: usize) {
        for _ in 0..times {
            self.controller
                .tick(DT, &mut self.world, &mut self.sensors, &mut self.decision);
        }
    }
}

#[test]
fn test_recovery_respects_cadence() {
    let mut bench = Bench::new();
    // unrecoverable: every attempt fails, so the cadence is observable
    bench
        .controller
        .report_error(ErrorKind::AssetMissing, "injected");

    // 12 seconds cover exactly two 5-second recovery windows
    bench.tick(24);

    let stats = bench.log.borrow().recovery_stats();
    assert_eq!(stats.attempts, 2);
    assert_eq!(stats.failures, 2);
    assert_eq!(
        bench.controller.current_error_kind(),
        ErrorKind::AssetMissing
    );
    assert_eq!(bench.controller.last_error_message(), "injected");
}

#[test]
fn test_error_overwrite_is_last_write_wins() {
    let mut bench = Bench::new();
    bench
        .controller
        .report_error(ErrorKind::NavigationMissing, "first");
    bench
        .controller
        .report_error(ErrorKind::PerceptionError, "second");

    assert_eq!(
        bench.controller.current_error_kind(),
        ErrorKind::PerceptionError
    );
    assert_eq!(bench.controller.last_error_message(), "second");
    assert_eq!(bench.log.borrow().errors.len(), 2);
}

#[test]
fn test_fact_store_recovery_reseeds_self_and_state() {
    let mut bench = Bench::new();
    bench
        .controller
        .report_error(ErrorKind::BlackboardInitFailed, "injected");

    bench.tick(TICKS_TO_RECOVERY);

    assert!(!bench.controller.is_in_error_state());
    assert_eq!(bench.controller.last_error_message(), "");
    assert_eq!(
        bench.controller.facts().entity(FactKey::SelfActor),
        Some(bench.bot)
    );
    assert_eq!(
        bench.controller.facts().state(FactKey::CurrentState),
        Some(AiState::Exploring)
    );
}

#[test]
fn test_perception_recovery_reconfigures_sensors() {
    let mut bench = Bench::new();
    bench
        .controller
        .report_error(ErrorKind::PerceptionError, "injected");

    bench.tick(TICKS_TO_RECOVERY);

    assert!(!bench.controller.is_in_error_state());
    assert_eq!(bench.sensors.forget_count, 1);
    // once at possession, once during recovery
    assert_eq!(bench.sensors.configured.len(), 2);
}

#[test]
fn test_navigation_recovery_retreats_to_last_valid_location() {
    let mut bench = Bench::new();
    let spawn = Vec3::new(250.0, 250.0, 0.0);
    // a couple of healthy ticks record the spot as valid
    bench.tick(2);
    bench
        .controller
        .report_error(ErrorKind::NavigationMissing, "injected");

    bench.tick(TICKS_TO_RECOVERY);

    assert!(!bench.controller.is_in_error_state());
    assert_eq!(
        bench.controller.facts().point(FactKey::CurrentTarget),
        Some(spawn)
    );
}

#[test]
fn test_task_failure_recovery_restarts_decision_process() {
    let mut bench = Bench::new();
    bench
        .controller
        .report_error(ErrorKind::TaskExecutionFailed, "injected");

    bench.tick(TICKS_TO_RECOVERY);

    assert!(!bench.controller.is_in_error_state());
    assert_eq!(bench.controller.state(), AiState::Exploring);
    assert!(bench.decision.restarts >= 1);
}

#[test]
fn test_failed_decision_start_recovers_on_cadence() {
    let mut decision = ScriptedDecision::default();
    decision.fail_starts = 1;
    let mut bench = Bench::build(decision);
    let exit_spot = Vec3::new(1450.0, 1450.0, 0.0);
    bench.world.add_exit(exit_spot);

    assert_eq!(
        bench.controller.current_error_kind(),
        ErrorKind::BehaviorTreeStartFailed
    );
    assert_eq!(bench.decision.starts, 1);

    bench.tick(TICKS_TO_RECOVERY);

    assert!(!bench.controller.is_in_error_state());
    assert_eq!(bench.decision.starts, 2);
    assert!(bench.decision.running);
    // perception resumed after the recovered start
    assert_eq!(bench.controller.state(), AiState::GoingToExit);
}

#[test]
fn test_errors_suspend_stuck_and_watchdog_checks() {
    let mut bench = Bench::new();
    bench
        .controller
        .report_error(ErrorKind::AssetMissing, "injected");

    // far beyond the 15-second state ceiling, but the error owns the bot
    bench.tick(40);

    assert_eq!(
        bench.controller.current_error_kind(),
        ErrorKind::AssetMissing
    );
    assert_eq!(bench.controller.time_in_state(), 0.0);
    let counts = bench.log.borrow().error_counts();
    assert_eq!(counts.get(&ErrorKind::TaskExecutionFailed), None);
}
