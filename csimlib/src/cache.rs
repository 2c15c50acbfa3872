use std::fmt;
use log::trace;
use crate::address::decode;
use crate::config::{CacheConfig, ConfigError};

/// The kind of data access a trace record performs
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
    /// A load followed by a store to the same data, which is guaranteed to hit
    Modify,
}

impl AccessKind {
    /// The character used for this access in a trace
    pub fn as_char(&self) -> char {
        match self {
            AccessKind::Load => 'L',
            AccessKind::Store => 'S',
            AccessKind::Modify => 'M',
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// How the cache classified a single access
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessResult {
    Hit,
    /// Missed and filled a line that was never valid
    MissClean,
    /// Missed in a full set and replaced the least recently used line
    MissEviction,
}

impl fmt::Display for AccessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessResult::Hit => "hit",
            AccessResult::MissClean => "miss",
            AccessResult::MissEviction => "miss eviction",
        })
    }
}

/// Everything one call to [`CacheModel::access`] produced
///
/// A modify is a read followed by a write to the same block. Only the read touches the cache,
/// the write is reported as a second hit in `follow_up`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AccessOutcome {
    pub result: AccessResult,
    pub follow_up: Option<AccessResult>,
}

impl AccessOutcome {
    /// The classified results in the order they happened
    pub fn results(&self) -> impl Iterator<Item = AccessResult> {
        std::iter::once(self.result).chain(self.follow_up)
    }
}

/// A single line of the cache. No data is stored, only what's needed to classify accesses
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    /// Only meaningful while `valid`
    pub tag: u64,
    /// Logical time of the last access, `NEVER_USED` until the line is filled
    pub last_used: u64,
}

impl CacheLine {
    pub const NEVER_USED: u64 = u64::MAX;

    const EMPTY: CacheLine = CacheLine {
        valid: false,
        tag: 0,
        last_used: Self::NEVER_USED,
    };

    fn fill(&mut self, tag: u64, now: u64) {
        self.valid = true;
        self.tag = tag;
        self.last_used = now;
    }
}

/// A view over the `E` lines of one set, borrowed out of the cache's line arena
pub struct CacheSet<'a> {
    lines: &'a mut [CacheLine],
}

impl<'a> CacheSet<'a> {
    pub fn new(lines: &'a mut [CacheLine]) -> Self {
        Self { lines }
    }

    /// Way holding `tag`, if any. Valid tags within a set are distinct, so there is at most one
    pub fn find(&self, tag: u64) -> Option<usize> {
        self.lines.iter().position(|line| line.valid && line.tag == tag)
    }

    /// Lowest indexed line that has never been filled
    pub fn first_invalid(&self) -> Option<usize> {
        self.lines.iter().position(|line| !line.valid)
    }

    /// The least recently used way. Ties go to the lowest index
    pub fn lru_victim(&self) -> usize {
        // min_by_key keeps the first of equal minimums
        self.lines
            .iter()
            .enumerate()
            .min_by_key(|(_, line)| line.last_used)
            .map(|(way, _)| way)
            .unwrap_or(0)
    }

    pub fn line(&self, way: usize) -> &CacheLine {
        &self.lines[way]
    }

    fn line_mut(&mut self, way: usize) -> &mut CacheLine {
        &mut self.lines[way]
    }
}

/// A set-associative cache with least recently used replacement
///
/// All `2^s * E` lines live in one contiguous arena; set `i` owns the lines
/// `i * E .. (i + 1) * E`. The arena is allocated once on construction and never resized.
///
/// Recency is tracked with a logical clock that ticks once per access. Every touched line is
/// stamped with the tick of its latest access, so stamps within a set are unique and the victim
/// is always well defined
#[derive(Debug)]
pub struct CacheModel {
    config: CacheConfig,
    lines: Vec<CacheLine>,
    clock: u64,
}

impl CacheModel {
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        let num_lines = config.num_lines();
        let mut lines = Vec::new();
        lines.try_reserve_exact(num_lines).map_err(|_| ConfigError::Allocation {
            set_bits: config.set_bits(),
            associativity: config.associativity(),
        })?;
        lines.resize(num_lines, CacheLine::EMPTY);
        Ok(Self {
            config,
            lines,
            clock: 0,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Simulates one data access, updating the target set and the clock
    ///
    /// The clock advances before the set is searched so the accessed line always ends up with
    /// the newest stamp. On a miss, an empty line is filled if the set has one, otherwise the
    /// least recently used line is replaced.
    ///
    /// A `Modify` additionally reports a second hit without touching any line or the clock
    ///
    /// # Arguments
    ///
    /// * `address`: The address being accessed. Any value is accepted, bits beyond the tag are
    /// simply shifted out
    /// * `kind`: The kind of access
    ///
    /// returns: AccessOutcome
    pub fn access(&mut self, address: u64, kind: AccessKind) -> AccessOutcome {
        let decoded = decode(address, &self.config);
        self.clock += 1;
        let now = self.clock;
        let set_index = decoded.set_index;
        let mut set = self.set_mut(set_index);

        let result = if let Some(way) = set.find(decoded.tag) {
            set.line_mut(way).last_used = now;
            AccessResult::Hit
        } else if let Some(way) = set.first_invalid() {
            set.line_mut(way).fill(decoded.tag, now);
            AccessResult::MissClean
        } else {
            let way = set.lru_victim();
            let victim = set.line_mut(way);
            trace!("set {set_index}: evicting way {way} (tag {:#x}) for tag {:#x}", victim.tag, decoded.tag);
            victim.fill(decoded.tag, now);
            AccessResult::MissEviction
        };

        AccessOutcome {
            result,
            follow_up: (kind == AccessKind::Modify).then_some(AccessResult::Hit),
        }
    }

    /// Read-only view of a set
    ///
    /// # Panics
    ///
    /// If `set_index` is not below `2^s`
    pub fn set(&self, set_index: usize) -> &[CacheLine] {
        let ways = self.config.associativity();
        &self.lines[set_index * ways..(set_index + 1) * ways]
    }

    fn set_mut(&mut self, set_index: usize) -> CacheSet<'_> {
        let ways = self.config.associativity();
        CacheSet::new(&mut self.lines[set_index * ways..(set_index + 1) * ways])
    }

    /// Checks whether the block containing `address` is currently cached, without counting as
    /// an access
    pub fn contains(&self, address: u64) -> bool {
        let decoded = decode(address, &self.config);
        self.set(decoded.set_index)
            .iter()
            .any(|line| line.valid && line.tag == decoded.tag)
    }

    /// The number of accesses processed so far
    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Gets the number of lines that were never filled. Useful for analysing cache utilisation
    pub fn invalid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| !line.valid).count()
    }
}
