//! Decoder configuration for strict and lenient script decoding.

/// Maximum script size accepted by standard policy.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Limits applied by `Script::decompile_with`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Reject pushes that use a longer form than necessary.
    pub require_minimal_push: bool,
    /// Reject scripts larger than this many bytes.
    pub max_script_size: Option<usize>,
    /// Accept bytes 0xbb..=0xfc, which have no assigned mnemonic.
    pub allow_unassigned_opcodes: bool,
}

impl DecodeConfig {
    /// Accept anything that is structurally valid.
    pub fn lenient() -> Self {
        DecodeConfig {
            require_minimal_push: false,
            max_script_size: None,
            allow_unassigned_opcodes: true,
        }
    }

    /// Minimal pushes only, standard size limit, no unassigned opcodes.
    pub fn standard() -> Self {
        DecodeConfig {
            require_minimal_push: true,
            max_script_size: Some(MAX_SCRIPT_SIZE),
            allow_unassigned_opcodes: false,
        }
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::lenient()
    }
}
