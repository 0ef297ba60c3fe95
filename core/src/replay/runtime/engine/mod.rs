//! Script execution engine
//!
//! Drives a [`Simulation`] through a [`Timeline`] one tick at a time,
//! capturing snapshots and evaluating assertions.
//!
//! ```text
//! Idle -> Initializing -> Running -> { Completed | Failed | TimedOut }
//! ```
//!
//! Each tick T runs in a fixed order: scheduled action, input resolution,
//! pre-capture, `update`, post-capture, assertion. Ticks never overlap.

mod helpers;


use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use super::report::{ExecutionReport, ReportBuilder, RunOutcome};
use crate::debug::{DebugAdapter, DebugRegistry, RuntimeError};
use crate::replay::input::InputResolver;
use crate::replay::script::Timeline;
use crate::replay::types::Snapshot;
use crate::simulation::Simulation;
use helpers::{assertion_result, simulation_error_entry};

/// Default wall-clock limit for one run
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Engine lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Initializing,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl EngineState {
    /// Terminal states are never left
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineState::Completed | EngineState::Failed | EngineState::TimedOut
        )
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Stop on the first failed assertion or runtime error
    pub fail_fast: bool,
    /// Wall-clock limit for the running phase, `None` for no limit
    pub timeout: Option<Duration>,
    /// Script name recorded in the report
    pub script_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            timeout: Some(DEFAULT_TIMEOUT),
            script_name: None,
        }
    }
}

/// Runs one timeline against one simulation instance
pub struct ReplayEngine<S: Simulation> {
    sim: S,
    registry: DebugRegistry,
    timeline: Timeline,
    config: EngineConfig,
    state: EngineState,
    resolver: InputResolver,
    report: ReportBuilder,
    /// Next tick to execute, equal to the number of ticks executed
    current_tick: u64,
    deadline: Option<Instant>,
}

impl<S: Simulation> ReplayEngine<S> {
    pub fn new(sim: S, timeline: Timeline, config: EngineConfig) -> Self {
        let resolver = InputResolver::new(timeline.header.players);
        let report = ReportBuilder::new(&timeline.header, config.script_name.clone());
        Self {
            sim,
            registry: DebugRegistry::new(),
            timeline,
            config,
            state: EngineState::Idle,
            resolver,
            report,
            current_tick: 0,
            deadline: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Next tick to execute
    pub fn current_tick(&self) -> u64 {
        self.current_tick
    }

    /// Registry populated by the simulation's init hook
    pub fn registry(&self) -> &DebugRegistry {
        &self.registry
    }

    pub fn simulation(&self) -> &S {
        &self.sim
    }

    /// Seed and initialize the simulation, then enter `Running`
    pub fn initialize(&mut self) -> EngineState {
        if self.state != EngineState::Idle {
            return self.state;
        }

        self.state = EngineState::Initializing;
        let header = &self.timeline.header;
        info!(
            console = %header.console,
            seed = header.seed,
            players = header.players,
            frames = self.timeline.frame_count(),
            "initializing replay"
        );

        self.sim.seed(header.seed);
        if let Err(e) = self.sim.init(&mut self.registry) {
            error!("simulation init failed: {}", e);
            let (kind, message) = simulation_error_entry(0, &e);
            self.report.add_error(0, kind, message);
            self.state = EngineState::Failed;
            return self.state;
        }
        self.registry.finalize_registration();
        self.report.set_variables(self.registry.variables());

        self.deadline = self.config.timeout.map(|t| Instant::now() + t);
        self.state = EngineState::Running;
        self.complete_if_done();
        self.state
    }

    /// Execute one tick
    ///
    /// Initializes first when still idle. Returns the state after the tick.
    pub fn step(&mut self) -> EngineState {
        if self.state == EngineState::Idle {
            self.initialize();
        }
        if self.state != EngineState::Running {
            return self.state;
        }
        if self.deadline_passed() {
            return self.time_out();
        }

        let tick = self.current_tick;
        let directive = self.timeline.directive_at(tick).cloned();

        // 1. Actions run before the tick is simulated
        if let Some(action) = directive.as_ref().and_then(|d| d.action.as_ref()) {
            let mut adapter = DebugAdapter::new(&mut self.sim, &self.registry);
            if let Err(e) = adapter.invoke_action(&action.name, &action.params) {
                if self.record_runtime_error(tick, &e) {
                    return self.state;
                }
            } else {
                debug!(tick, action = %action.name, "action invoked");
            }
        }

        // 2. Resolve held inputs
        let inputs = self.resolver.resolve(directive.as_ref()).to_vec();
        let snap = directive.as_ref().is_some_and(|d| d.snap);

        // 3. Pre-tick capture
        let pre = if snap {
            let (values, errors) = DebugAdapter::new(&mut self.sim, &self.registry).capture_all();
            if self.record_runtime_errors(tick, &errors) {
                return self.state;
            }
            Some(values)
        } else {
            None
        };

        // 4. Advance exactly one tick
        if let Err(e) = self.sim.update(tick, &inputs) {
            let (kind, message) = simulation_error_entry(tick, &e);
            error!(tick, "{}", message);
            self.report.add_error(tick, kind, message);
            self.state = EngineState::Failed;
            return self.state;
        }

        // A tick that finished past the deadline is not reported
        if self.deadline_passed() {
            return self.time_out();
        }

        // 5. Post-tick capture
        let assertion = directive.as_ref().and_then(|d| d.assertion.as_ref());
        let post = if pre.is_some() || assertion.is_some() {
            let (values, errors) = DebugAdapter::new(&mut self.sim, &self.registry).capture_all();
            if self.record_runtime_errors(tick, &errors) {
                self.current_tick += 1;
                return self.state;
            }
            values
        } else {
            Default::default()
        };

        if let Some(pre) = pre {
            let snapshot = Snapshot::new(tick, self.resolver.describe(), pre, post.clone());
            debug!(tick, changed = snapshot.delta.len(), "snapshot");
            self.report.add_snapshot(snapshot);
        }

        // 6. Assertion against post-tick values
        let mut assertion_failed = false;
        if let Some(condition) = assertion {
            let result = assertion_result(tick, condition, &post);
            if !result.passed {
                warn!(
                    tick,
                    condition = %result.condition,
                    actual = ?result.actual,
                    note = ?result.note,
                    "assertion failed"
                );
                assertion_failed = true;
            }
            self.report.add_assertion(result);
        }

        self.current_tick += 1;

        // 7. Fail-fast
        if assertion_failed && self.config.fail_fast {
            info!(tick, "stopping at first failed assertion");
            self.state = EngineState::Failed;
            return self.state;
        }

        self.complete_if_done();
        self.state
    }

    /// Run to a terminal state and build the report
    pub fn run(mut self) -> ExecutionReport {
        self.initialize();
        while self.state == EngineState::Running {
            self.step();
        }
        self.finish()
    }

    /// Build the report from whatever has been recorded so far
    pub fn finish(self) -> ExecutionReport {
        let outcome = match self.state {
            EngineState::TimedOut => RunOutcome::TimedOut,
            EngineState::Failed => RunOutcome::Aborted,
            _ => RunOutcome::Completed,
        };
        let report = self.report.build(self.current_tick, outcome);
        info!(
            status = %report.status(),
            frames = report.frames_executed,
            passed = report.summary.assertions_passed,
            failed = report.summary.assertions_failed,
            "replay finished"
        );
        report
    }

    fn complete_if_done(&mut self) {
        if self.state == EngineState::Running && self.current_tick >= self.timeline.frame_count() {
            self.state = EngineState::Completed;
        }
    }

    fn deadline_passed(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn time_out(&mut self) -> EngineState {
        warn!(tick = self.current_tick, "replay timed out");
        self.state = EngineState::TimedOut;
        self.state
    }

    /// Record a runtime error; returns true when the run must stop
    fn record_runtime_error(&mut self, tick: u64, e: &RuntimeError) -> bool {
        self.report.add_runtime_error(tick, e);
        if e.is_fatal() {
            error!(tick, "{}", e);
            self.state = EngineState::Failed;
            return true;
        }
        warn!(tick, "{}", e);
        if self.config.fail_fast {
            self.state = EngineState::Failed;
            return true;
        }
        false
    }

    fn record_runtime_errors(&mut self, tick: u64, errors: &[RuntimeError]) -> bool {
        let mut stop = false;
        for e in errors {
            stop |= self.record_runtime_error(tick, e);
        }
        stop
    }
}
