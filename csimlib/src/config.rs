use std::io::Read;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised when a cache geometry can't be simulated
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("associativity must be at least 1, got {0}")]
    Associativity(i64),
    #[error("set index bits must not be negative, got {0}")]
    NegativeSetBits(i64),
    #[error("block offset bits must not be negative, got {0}")]
    NegativeBlockBits(i64),
    #[error("{set_bits} set index bits and {block_bits} block offset bits exceed a 64 bit address")]
    AddressBits { set_bits: i64, block_bits: i64 },
    #[error("a cache with 2^{set_bits} sets of {associativity} lines is too large to simulate")]
    Allocation { set_bits: u32, associativity: usize },
    #[error("couldn't parse the configuration: {0}")]
    Parse(String),
}

/// The geometry of a simulated cache: `2^s` sets of `E` lines, each line holding a `2^b` byte
/// block
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawCacheConfig")]
pub struct CacheConfig {
    set_bits: u32,
    associativity: usize,
    block_bits: u32,
}

/// The configuration as it appears in a JSON file, before validation
#[derive(Debug, Deserialize)]
struct RawCacheConfig {
    s: i64,
    #[serde(rename = "E")]
    e: i64,
    b: i64,
}

impl TryFrom<RawCacheConfig> for CacheConfig {
    type Error = ConfigError;

    fn try_from(raw: RawCacheConfig) -> Result<Self, Self::Error> {
        CacheConfig::new(raw.s, raw.e, raw.b)
    }
}

impl CacheConfig {
    /// Validates a geometry given as signed integers, as they come from the command line
    ///
    /// # Arguments
    ///
    /// * `set_bits`: `s`, the number of set index bits
    /// * `associativity`: `E`, the number of lines per set
    /// * `block_bits`: `b`, the number of block offset bits
    ///
    /// returns: Result<CacheConfig, ConfigError>
    pub fn new(set_bits: i64, associativity: i64, block_bits: i64) -> Result<Self, ConfigError> {
        if associativity < 1 {
            return Err(ConfigError::Associativity(associativity));
        }
        if set_bits < 0 {
            return Err(ConfigError::NegativeSetBits(set_bits));
        }
        if block_bits < 0 {
            return Err(ConfigError::NegativeBlockBits(block_bits));
        }
        if set_bits.checked_add(block_bits).map_or(true, |bits| bits > u64::BITS as i64) {
            return Err(ConfigError::AddressBits { set_bits, block_bits });
        }
        let config = Self {
            set_bits: set_bits as u32,
            associativity: usize::try_from(associativity).map_err(|_| ConfigError::Allocation {
                set_bits: set_bits as u32,
                associativity: usize::MAX,
            })?,
            block_bits: block_bits as u32,
        };
        config.checked_num_lines().ok_or(ConfigError::Allocation {
            set_bits: config.set_bits,
            associativity: config.associativity,
        })?;
        Ok(config)
    }

    /// Reads and validates a configuration of the form `{"s": 4, "E": 2, "b": 4}`
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, ConfigError> {
        serde_json::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn set_bits(&self) -> u32 {
        self.set_bits
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn block_bits(&self) -> u32 {
        self.block_bits
    }

    /// `2^s`. Always representable, checked on construction
    pub fn num_sets(&self) -> usize {
        1usize << self.set_bits
    }

    /// `2^b` bytes, saturating for `b = 64`
    pub fn block_size(&self) -> u64 {
        1u64.checked_shl(self.block_bits).unwrap_or(u64::MAX)
    }

    /// Total number of lines in the cache, `2^s * E`
    pub fn num_lines(&self) -> usize {
        self.num_sets() * self.associativity
    }

    fn checked_num_lines(&self) -> Option<usize> {
        if self.set_bits >= usize::BITS {
            return None;
        }
        (1usize << self.set_bits).checked_mul(self.associativity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_geometry() {
        assert_eq!(CacheConfig::new(4, 0, 4), Err(ConfigError::Associativity(0)));
        assert_eq!(CacheConfig::new(-1, 1, 4), Err(ConfigError::NegativeSetBits(-1)));
        assert_eq!(CacheConfig::new(1, 1, -3), Err(ConfigError::NegativeBlockBits(-3)));
        assert!(matches!(CacheConfig::new(40, 1, 30), Err(ConfigError::AddressBits { .. })));
        assert!(matches!(CacheConfig::new(63, 4, 0), Err(ConfigError::Allocation { .. })));
        assert_eq!(
            CacheConfig::new(i64::MAX, 1, 1),
            Err(ConfigError::AddressBits { set_bits: i64::MAX, block_bits: 1 })
        );
        assert!(matches!(CacheConfig::new((1 << 32) + 3, 1, i64::MAX), Err(ConfigError::AddressBits { .. })));
    }

    #[test]
    fn derived_sizes() {
        let config = CacheConfig::new(4, 2, 5).unwrap();
        assert_eq!(config.num_sets(), 16);
        assert_eq!(config.block_size(), 32);
        assert_eq!(config.num_lines(), 32);
        let single = CacheConfig::new(0, 1, 0).unwrap();
        assert_eq!(single.num_sets(), 1);
        assert_eq!(single.block_size(), 1);
    }

    #[test]
    fn reads_json() {
        let config = CacheConfig::from_json_reader(r#"{"s": 2, "E": 4, "b": 3}"#.as_bytes()).unwrap();
        assert_eq!(config, CacheConfig::new(2, 4, 3).unwrap());
        let invalid = CacheConfig::from_json_reader(r#"{"s": 2, "E": 0, "b": 3}"#.as_bytes());
        assert!(matches!(invalid, Err(ConfigError::Parse(_))));
    }
}
