/// Error types for script operations.
///
/// Covers ASM parsing failures, bytecode decoding problems, push encoding
/// limits and template construction errors. Classification never fails and
/// has no variant here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// An ASM token is neither a mnemonic, a hex literal nor a small integer.
    #[error("unrecognized token: {0}")]
    UnrecognizedToken(String),

    /// A hex-shaped ASM token has odd length or non-hex characters.
    #[error("invalid hex literal: {0}")]
    InvalidHexLiteral(String),

    /// A decimal ASM token lies outside -1..=16.
    #[error("integer out of range: {0}")]
    IntegerOutOfRange(String),

    /// A push declares more bytes than remain in the script.
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        /// Offset of the push opcode.
        offset: usize,
        /// Bytes required by the length field and payload.
        needed: usize,
        /// Bytes left from `offset` to the end of the script.
        available: usize,
    },

    /// A byte has no interpretation under the active decode config.
    #[error("unknown opcode: 0x{0:02x}")]
    UnknownOpcode(u8),

    /// A push uses a longer form than its payload requires.
    #[error("non-minimal push encoding at offset {offset}")]
    NonMinimalEncoding {
        /// Offset of the push opcode.
        offset: usize,
    },

    /// `decode_push` was pointed at a byte that is not a push opcode.
    #[error("not a push opcode: 0x{0:02x}")]
    NotPushOpcode(u8),

    /// A push opcode was used where a plain opcode was expected.
    #[error("use push data for push opcodes: {0}")]
    InvalidOpcodeType(String),

    /// The payload length does not fit the requested push opcode.
    #[error("push opcode 0x{op:02x} cannot carry {len} bytes")]
    PushLengthMismatch {
        /// The push opcode.
        op: u8,
        /// Payload length.
        len: usize,
    },

    /// Invalid hex string.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Push data exceeds the OP_PUSHDATA4 length field.
    #[error("data too big: {0} bytes")]
    DataTooBig(usize),

    /// A push data part exceeds protocol limits.
    #[error("part too big '{0}'")]
    PartTooBig(usize),

    /// Script exceeds the configured size limit.
    #[error("script too large: {0} bytes")]
    ScriptTooLarge(usize),

    /// Template builder input is invalid.
    #[error("invalid template: {0}")]
    InvalidTemplate(String),
}
