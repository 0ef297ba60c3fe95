//! Integration tests for the replay engine
//!
//! End-to-end runs from TOML script text to serialized report against the
//! reference simulation, plus compiled-format round trips.


#[cfg(test)]
pub(crate) mod test_utils {
    use crate::replay::{EngineConfig, ExecutionReport, ReplayEngine, Timeline};
    use crate::simulation::ReferenceSim;

    /// Compile a script and run it on a fresh reference simulation
    pub fn run_reference(source: &str) -> ExecutionReport {
        run_reference_with(source, EngineConfig::default())
    }

    pub fn run_reference_with(source: &str, config: EngineConfig) -> ExecutionReport {
        let timeline = Timeline::from_toml(source).unwrap();
        ReplayEngine::new(ReferenceSim::new(), timeline, config).run()
    }
}
