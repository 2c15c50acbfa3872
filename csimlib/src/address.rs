use crate::config::CacheConfig;

/// An address split into the fields the cache uses to find its line
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodedAddress {
    pub tag: u64,
    pub set_index: usize,
    pub block_offset: u64,
}

/// Splits an address into tag, set index and block offset for the given geometry
///
/// `set_index = (address >> b) & (2^s - 1)` and `tag = address >> (s + b)`. Shifts of the full
/// address width produce zero rather than overflowing, so every address decodes.
///
/// # Examples
///
/// ```
/// use csimlib::address::decode;
/// use csimlib::config::CacheConfig;
/// let config = CacheConfig::new(4, 1, 4).unwrap();
/// let decoded = decode(0x2a7, &config);
/// assert_eq!((decoded.tag, decoded.set_index, decoded.block_offset), (0x2, 0xa, 0x7));
/// ```
pub fn decode(address: u64, config: &CacheConfig) -> DecodedAddress {
    let s = config.set_bits();
    let b = config.block_bits();
    DecodedAddress {
        tag: address.checked_shr(s + b).unwrap_or(0),
        set_index: (address.checked_shr(b).unwrap_or(0) & low_bits(s)) as usize,
        block_offset: address & low_bits(b),
    }
}

fn low_bits(bits: u32) -> u64 {
    1u64.checked_shl(bits).map_or(u64::MAX, |v| v - 1)
}
