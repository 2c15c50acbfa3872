//! # CsimLib
//!
//! CsimLib simulates a set-associative cache with least recently used replacement against a
//! recorded sequence of memory accesses, counting hits, misses and evictions
//!
//! It provides the cache model, a lazy parser for valgrind style traces, and a simulator tying
//! the two together. Data contents are never modelled, only whether each access would hit

/// Contains the cache geometry and its validation
pub mod config;

/// Splits addresses into tag, set index and block offset
pub mod address;

/// Contains the cache model: lines, sets, and the LRU access algorithm
pub mod cache;

/// Hit, miss and eviction counters
pub mod stats;

/// Contains the trace record parser
pub mod trace;

/// Opening trace files
pub mod io;

/// Contains the simulator used to run a trace against a cache configuration
pub mod simulator;

#[cfg(test)]
mod test;

/// Contains fixture and synthetic traces for tests and benchmarks.
pub mod util;
