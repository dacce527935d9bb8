//! Behaviour flags for the normalizer and denormalizer.

// GRCOV_EXCL_START
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct NormalizerSettings: u8 {
        /// Simple values taken from the instance are deep-cloned.
        const DEEP_CLONE = 0x1;
        /// Numeric zeros and `false` are not written.
        const IGNORE_DEFAULT_VALUES = 0x2;
        /// Empty arrays are not written.
        const IGNORE_EMPTY_ARRAYS = 0x4;
        /// Empty dictionaries are not written.
        const IGNORE_EMPTY_DICTIONARIES = 0x8;
    }
}
// GRCOV_EXCL_STOP

impl Default for NormalizerSettings {
    fn default() -> Self {
        NormalizerSettings::IGNORE_DEFAULT_VALUES
    }
}

// GRCOV_EXCL_START
bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DenormalizerSettings: u8 {
        /// Dictionaries assigned to fields are deep-cloned.
        const DEEP_CLONE = 0x1;
        /// Integer targets reject fractional and out-of-range input.
        const STRICT_NUMBER_PARSING = 0x2;
        /// Property validators are not run.
        const DISABLE_VALIDATION = 0x4;
    }
}
// GRCOV_EXCL_STOP
