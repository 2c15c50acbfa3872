use std::io::BufRead;
use std::time::{Duration, Instant};
use log::warn;
use crate::cache::{AccessResult, CacheModel};
use crate::config::{CacheConfig, ConfigError};
use crate::stats::Stats;
use crate::trace::{TraceError, TraceParser, TraceRecord};

/// The simulator feeds trace records to one cache, and collects results.
///
/// It owns its cache and counters outright, so independent simulators never interfere. It
/// supports calling simulate multiple times, the cache state, results and time taken carry over
pub struct Simulator {
    cache: CacheModel,
    stats: Stats,
    simulation_time: Duration,
}

impl Simulator {

    /// Creates a new simulator with a cold cache
    ///
    /// # Arguments
    ///
    /// * `config`: A validated cache geometry
    ///
    /// returns: Result<Simulator, ConfigError>, fails only if the cache can't be allocated
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            cache: CacheModel::new(config)?,
            stats: Stats::default(),
            simulation_time: Duration::ZERO,
        })
    }

    /// Simulates a single record, reporting each classified access to `on_access`
    pub fn step<F>(&mut self, record: &TraceRecord, on_access: &mut F)
    where
        F: FnMut(&TraceRecord, AccessResult),
    {
        let outcome = self.cache.access(record.address, record.kind);
        for result in outcome.results() {
            self.stats.record(result);
            on_access(record, result);
        }
    }

    /// Simulates every record the parser yields, in order
    ///
    /// `on_access` sees each classified access as it happens, a modify shows up twice. A
    /// trace cut short by a malformed line is logged and the records before it still count;
    /// strict parsers and read errors stop the simulation with an error instead
    ///
    /// # Arguments
    ///
    /// * `trace`: The trace to consume
    /// * `on_access`: Observer for per-access reporting
    ///
    /// returns: Result<&Stats, TraceError>
    pub fn simulate<R, F>(&mut self, trace: &mut TraceParser<R>, mut on_access: F) -> Result<&Stats, TraceError>
    where
        R: BufRead,
        F: FnMut(&TraceRecord, AccessResult),
    {
        let start = Instant::now();
        let outcome = trace
            .by_ref()
            .try_for_each(|record| record.map(|record| self.step(&record, &mut on_access)));
        self.simulation_time += start.elapsed();
        outcome?;
        if let Some(truncation) = trace.truncation() {
            warn!(
                "trace stopped early at line {}, {:?} is not a record",
                truncation.line_number, truncation.line
            );
        }
        Ok(&self.stats)
    }

    /// Simulates a trace with no per-access reporting
    pub fn simulate_quiet<R: BufRead>(&mut self, trace: &mut TraceParser<R>) -> Result<&Stats, TraceError> {
        self.simulate(trace, |_, _| {})
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn cache(&self) -> &CacheModel {
        &self.cache
    }

    /// Gets the wall-clock execution time for processing
    pub fn execution_time(&self) -> Duration {
        self.simulation_time
    }

    /// Gets the number of cache lines that were never filled
    pub fn invalid_line_count(&self) -> usize {
        self.cache.invalid_line_count()
    }
}
