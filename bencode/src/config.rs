/// What the `Decoder` does when a dictionary contains the same key more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateKeys {
    /// The later entry replaces the earlier one.
    #[default]
    Overwrite,
    /// Decoding fails with `DecodeError::DuplicateKey`.
    Reject,
}

/// Knobs for the `Decoder`. The default accepts everything the grammar allows: nesting is unbounded and
/// duplicate dictionary keys overwrite each other.
///
/// ```
/// use bencode::*;
///
/// let config = DecoderConfig::default().max_depth(2).duplicate_keys(DuplicateKeys::Reject);
/// let mut decoder = Decoder::with_config(&b"llleee"[..], config);
/// assert!(matches!(decoder.decode_value().unwrap_err().into_inner(), DecodeError::Depth(2)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderConfig {
    /// Maximum number of nested lists and dictionaries, `None` for no limit.
    pub max_depth: Option<usize>,
    pub duplicate_keys: DuplicateKeys,
}

impl DecoderConfig {
    /// Rejects every input which is nested deeper than `depth` containers.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    /// Rejects duplicate keys and limits nesting to `depth`. Useful for input from untrusted peers.
    pub fn strict(depth: usize) -> Self {
        Self::default().max_depth(depth).duplicate_keys(DuplicateKeys::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::{DecoderConfig, DuplicateKeys};

    #[test]
    fn defaults_are_permissive() {
        let config = DecoderConfig::default();
        assert_eq!(None, config.max_depth);
        assert_eq!(DuplicateKeys::Overwrite, config.duplicate_keys);
    }

    #[test]
    fn strict() {
        assert_eq!(DecoderConfig { max_depth: Some(64), duplicate_keys: DuplicateKeys::Reject }, DecoderConfig::strict(64));
    }
}
