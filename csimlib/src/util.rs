use std::fmt::Write;
use crate::config::{CacheConfig, ConfigError};
use crate::stats::Stats;

/// A small trace with the results a reference simulator produced for it
pub struct TraceCase {
    pub name: &'static str,
    pub trace: &'static str,
    /// `(s, E, b)`
    pub geometry: (i64, i64, i64),
    pub expected: Stats,
}

impl TraceCase {
    pub fn config(&self) -> Result<CacheConfig, ConfigError> {
        let (s, e, b) = self.geometry;
        CacheConfig::new(s, e, b)
    }
}

pub const YI_TRACE: &str = " L 10,1
 M 20,1
 L 22,1
 S 18,1
 L 110,1
 L 210,1
 M 12,1
";

pub const DAVE_TRACE: &str = " L 10,4
 S 18,4
 L 20,4
 S 28,4
 S 50,4
";

/// The fixture traces, each with every geometry it has known results for
pub fn trace_cases() -> Vec<TraceCase> {
    vec![
        TraceCase {
            name: "yi, direct mapped",
            trace: YI_TRACE,
            geometry: (4, 1, 4),
            expected: Stats { hits: 4, misses: 5, evictions: 3 },
        },
        TraceCase {
            name: "yi, 2 way",
            trace: YI_TRACE,
            geometry: (4, 2, 4),
            expected: Stats { hits: 4, misses: 5, evictions: 2 },
        },
        TraceCase {
            name: "dave, direct mapped",
            trace: DAVE_TRACE,
            geometry: (2, 1, 4),
            expected: Stats { hits: 2, misses: 3, evictions: 1 },
        },
    ]
}

/// Generates a deterministic trace of `records` lines mixing every record kind
///
/// Addresses are drawn from a `working_set` byte region with an xorshift generator, so the
/// same seed always produces the same trace. Roughly one line in eight is an instruction fetch
pub fn synthetic_trace(records: usize, working_set: u64, seed: u64) -> String {
    let mut state = seed | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    let mut out = String::with_capacity(records * 16);
    for _ in 0..records {
        let roll = next();
        let address = next() % working_set.max(1);
        let op = match roll % 8 {
            0 => 'I',
            1 | 2 => 'S',
            3 => 'M',
            _ => 'L',
        };
        let size = 1u32 << ((roll >> 3) % 4);
        let indent = if op == 'I' { "" } else { " " };
        // Writing to a String can't fail
        let _ = writeln!(out, "{indent}{op} {address:x},{size}");
    }
    out
}
