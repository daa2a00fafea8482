//! Script chunk parsing and encoding.
//!
//! A script chunk is either a plain opcode or a data push together with the
//! push opcode that carried it. This module decodes raw script bytes into
//! chunks, encodes payloads with the shortest OP_PUSHDATA prefix, and tells
//! minimal pushes apart from longer-than-necessary ones.

use log::debug;

use crate::config::DecodeConfig;
use crate::opcodes::*;
use crate::ScriptError;

/// A data push and the opcode used to encode it.
///
/// The opcode and payload length always agree, so a `PushData` can be
/// serialized without further checks.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PushData {
    op: u8,
    data: Vec<u8>,
}

impl PushData {
    /// Wrap `data` in the shortest length-prefixed form.
    ///
    /// Unlike the ASM parser this never substitutes OP_1..OP_16 for a
    /// one-byte payload: a 1-75 byte payload always gets a direct push.
    pub fn new(data: Vec<u8>) -> Result<Self, ScriptError> {
        let op = match data.len() {
            0 => OP_0,
            len @ 1..=75 => len as u8,
            76..=0xFF => OP_PUSHDATA1,
            0x100..=0xFFFF => OP_PUSHDATA2,
            len if len as u64 <= u32::MAX as u64 => OP_PUSHDATA4,
            len => return Err(ScriptError::DataTooBig(len)),
        };
        Ok(PushData { op, data })
    }

    /// Wrap `data` in a specific push opcode, which may be non-minimal.
    pub fn with_opcode(op: u8, data: Vec<u8>) -> Result<Self, ScriptError> {
        let len = data.len();
        let fits = match lookup_by_value(op).kind() {
            OpcodeKind::Constant(0) => len == 0,
            OpcodeKind::PushBytes(n) => len == n as usize,
            OpcodeKind::PushData(1) => len <= 0xFF,
            OpcodeKind::PushData(2) => len <= 0xFFFF,
            OpcodeKind::PushData(_) => len as u64 <= u32::MAX as u64,
            _ => return Err(ScriptError::NotPushOpcode(op)),
        };
        if !fits {
            return Err(ScriptError::PushLengthMismatch { op, len });
        }
        Ok(PushData { op, data })
    }

    /// The push opcode.
    pub fn op(&self) -> u8 {
        self.op
    }

    /// The pushed payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the push, returning its payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Whether this push uses the canonical encoding for its payload.
    ///
    /// Empty payloads must be OP_0, single bytes 1..=16 and 0x81 must use
    /// their small integer opcode, everything else the shortest length form.
    pub fn is_minimal(&self) -> bool {
        if let Some(op) = minimal_number_op(&self.data) {
            return self.op == op;
        }
        let len = self.data.len();
        if len <= 75 {
            self.op as usize == len
        } else if len <= 0xFF {
            self.op == OP_PUSHDATA1
        } else if len <= 0xFFFF {
            self.op == OP_PUSHDATA2
        } else {
            self.op == OP_PUSHDATA4
        }
    }

    /// Number of bytes this push occupies in a serialized script.
    pub fn encoded_len(&self) -> usize {
        1 + length_field_width(self.op) + self.data.len()
    }

    /// Append the serialized push to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(self.op);
        let len = self.data.len();
        match self.op {
            OP_PUSHDATA1 => buf.push(len as u8),
            OP_PUSHDATA2 => buf.extend_from_slice(&(len as u16).to_le_bytes()),
            OP_PUSHDATA4 => buf.extend_from_slice(&(len as u32).to_le_bytes()),
            _ => {}
        }
        buf.extend_from_slice(&self.data);
    }
}

/// A single parsed element of a Bitcoin script.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScriptChunk {
    /// A non-push opcode, including OP_0, OP_1NEGATE and OP_1..OP_16.
    Op(u8),
    /// A data push.
    Push(PushData),
}

impl ScriptChunk {
    /// Build a push chunk using the shortest length-prefixed form.
    pub fn push(data: impl Into<Vec<u8>>) -> Result<Self, ScriptError> {
        PushData::new(data.into()).map(ScriptChunk::Push)
    }

    /// The opcode byte that starts this chunk.
    pub fn op(&self) -> u8 {
        match self {
            ScriptChunk::Op(op) => *op,
            ScriptChunk::Push(push) => push.op(),
        }
    }

    /// The pushed payload, if this chunk is a push.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            ScriptChunk::Op(_) => None,
            ScriptChunk::Push(push) => Some(push.data()),
        }
    }

    /// True for a data push.
    pub fn is_push(&self) -> bool {
        matches!(self, ScriptChunk::Push(_))
    }

    /// Whether the chunk is canonically encoded. Plain opcodes always are.
    pub fn is_minimal(&self) -> bool {
        match self {
            ScriptChunk::Op(_) => true,
            ScriptChunk::Push(push) => push.is_minimal(),
        }
    }

    /// Convert this chunk to its ASM string representation.
    ///
    /// Data pushes are rendered as lowercase hex; an empty push renders as
    /// OP_0. Opcodes use their canonical OP_xxx name.
    pub fn to_asm_string(&self) -> String {
        match self {
            ScriptChunk::Push(push) if !push.data().is_empty() => hex::encode(push.data()),
            ScriptChunk::Push(_) => opcode_to_string(OP_0).to_string(),
            ScriptChunk::Op(op) => opcode_to_string(*op).to_string(),
        }
    }

    /// Append the serialized chunk to `buf`.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            ScriptChunk::Op(op) => buf.push(*op),
            ScriptChunk::Push(push) => push.write_to(buf),
        }
    }
}

/// The small integer opcode that canonically pushes `data`, if any.
///
/// Empty data maps to OP_0, a single byte 1..=16 to OP_1..OP_16 and 0x81 to
/// OP_1NEGATE.
pub fn minimal_number_op(data: &[u8]) -> Option<u8> {
    match data {
        [] => Some(OP_0),
        [n @ 1..=16] => Some(OP_1 + *n - 1),
        [0x81] => Some(OP_1NEGATE),
        _ => None,
    }
}

fn length_field_width(op: u8) -> usize {
    match op {
        OP_PUSHDATA1 => 1,
        OP_PUSHDATA2 => 2,
        OP_PUSHDATA4 => 4,
        _ => 0,
    }
}

/// Decode the push that starts at `offset`.
///
/// Returns the push and the number of bytes it occupies, length field
/// included. Non-minimal encodings decode successfully; check
/// `PushData::is_minimal` to detect them.
pub fn decode_push(bytes: &[u8], offset: usize) -> Result<(PushData, usize), ScriptError> {
    let available = bytes.len().saturating_sub(offset);
    let truncated = |needed: usize| ScriptError::TruncatedInput {
        offset,
        needed,
        available,
    };

    let op = *bytes.get(offset).ok_or_else(|| truncated(1))?;
    let (header, length) = match lookup_by_value(op).kind() {
        OpcodeKind::Constant(0) => (1, 0),
        OpcodeKind::PushBytes(n) => (1, n as usize),
        OpcodeKind::PushData(width) => {
            let width = width as usize;
            let field = bytes
                .get(offset + 1..offset + 1 + width)
                .ok_or_else(|| truncated(1 + width))?;
            let mut le = [0u8; 4];
            le[..width].copy_from_slice(field);
            (1 + width, u32::from_le_bytes(le) as usize)
        }
        _ => return Err(ScriptError::NotPushOpcode(op)),
    };

    let start = offset + header;
    let data = bytes
        .get(start..start + length)
        .ok_or_else(|| truncated(header + length))?
        .to_vec();
    Ok((PushData { op, data }, header + length))
}

/// Decode raw script bytes into a vector of `ScriptChunk` values.
///
/// Accepts any structurally valid encoding, minimal or not.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    decode_script_with(bytes, &DecodeConfig::lenient())
}

/// Decode raw script bytes, enforcing the limits in `config`.
///
/// Decoding stops at the first error; no partial result is returned.
pub fn decode_script_with(
    bytes: &[u8],
    config: &DecodeConfig,
) -> Result<Vec<ScriptChunk>, ScriptError> {
    if let Some(max) = config.max_script_size {
        if bytes.len() > max {
            return Err(ScriptError::ScriptTooLarge(bytes.len()));
        }
    }

    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let opcode = lookup_by_value(bytes[pos]);
        if opcode.is_push() {
            let (push, consumed) = decode_push(bytes, pos).map_err(|e| {
                debug!("script decode failed at offset {}: {}", pos, e);
                e
            })?;
            if config.require_minimal_push && !push.is_minimal() {
                debug!("non-minimal {} at offset {}", opcode, pos);
                return Err(ScriptError::NonMinimalEncoding { offset: pos });
            }
            chunks.push(ScriptChunk::Push(push));
            pos += consumed;
        } else {
            if opcode.is_unassigned() && !config.allow_unassigned_opcodes {
                debug!("unassigned opcode 0x{:02x} at offset {}", opcode.value(), pos);
                return Err(ScriptError::UnknownOpcode(opcode.value()));
            }
            chunks.push(ScriptChunk::Op(opcode.value()));
            pos += 1;
        }
    }

    Ok(chunks)
}

/// Compute the OP_PUSHDATA prefix bytes for a data payload of the given length.
///
/// # Arguments
/// * `data_len` - The length of the data to be pushed.
///
/// # Returns
/// The prefix to place before the payload, or `DataTooBig` if the length
/// does not fit OP_PUSHDATA4.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= 75 {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len as u64 <= u32::MAX as u64 {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig(data_len))
    }
}

/// Encode `data` as a single push using the shortest length form.
pub fn encode_push(data: &[u8]) -> Result<Vec<u8>, ScriptError> {
    let mut buf = push_data_prefix(data.len())?;
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Encode multiple data payloads into a single byte vector with push prefixes.
///
/// # Returns
/// All pushes concatenated, or `PartTooBig(i)` naming the first part that
/// does not fit.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let prefix = push_data_prefix(part.len())
            .map_err(|_| ScriptError::PartTooBig(i))?;
        result.extend_from_slice(&prefix);
        result.extend_from_slice(part);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    //! Tests for script chunk decoding and push data encoding.

    use super::*;

    // -----------------------------------------------------------------------
    // decode_script - basic cases
    // -----------------------------------------------------------------------

    /// Decode a script with three simple push chunks and verify count.
    #[test]
    fn test_decode_script_simple() {
        let bytes = hex::decode("05000102030401FF02ABCD").expect("valid hex");
        let parts = decode_script(&bytes).expect("should decode");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].data(), Some(&[0xFF][..]));
    }

    /// Decode and re-encode a simple script to verify roundtrip fidelity.
    #[test]
    fn test_decode_and_encode_roundtrip() {
        let script_hex = "05000102030401ff02abcd";
        let bytes = hex::decode(script_hex).expect("valid hex");
        let parts = decode_script(&bytes).expect("should decode");

        let data_parts: Vec<&[u8]> = parts.iter().filter_map(|p| p.data()).collect();
        let encoded = encode_push_datas(&data_parts).expect("should encode");
        assert_eq!(hex::encode(&encoded), script_hex);
    }

    #[test]
    fn test_decode_script_empty() {
        let parts = decode_script(&[]).expect("should decode");
        assert!(parts.is_empty());
    }

    /// OP_0 and OP_RETURN decode as plain opcodes; the bytes after
    /// OP_RETURN are still parsed as chunks.
    #[test]
    fn test_decode_script_op_return_keeps_parsing() {
        let bytes = hex::decode("006a04deadbeef").expect("valid hex");
        let parts = decode_script(&bytes).expect("should decode");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], ScriptChunk::Op(OP_0));
        assert_eq!(parts[1], ScriptChunk::Op(OP_RETURN));
        assert_eq!(parts[2].data(), Some(&[0xde, 0xad, 0xbe, 0xef][..]));
    }

    /// Decode a complex multisig-like script with OP_PUSHDATA1 chunks.
    #[test]
    fn test_decode_script_complex() {
        let script_hex = "524c53ff0488b21e000000000000000000362f7a9030543db8751401c387d6a71e870f1895b3a62569d455e8ee5f5f5e5f03036624c6df96984db6b4e625b6707c017eb0e0d137cd13a0c989bfa77a4473fd000000004c53ff0488b21e0000000000000000008b20425398995f3c866ea6ce5c1828a516b007379cf97b136bffbdc86f75df14036454bad23b019eae34f10aff8b8d6d8deb18cb31354e5a169ee09d8a4560e8250000000052ae";
        let bytes = hex::decode(script_hex).expect("valid hex");
        let parts = decode_script(&bytes).expect("should decode");
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[1].op(), OP_PUSHDATA1);
        assert!(parts[1].is_minimal());
    }

    // -----------------------------------------------------------------------
    // decode_script - error / truncation cases
    // -----------------------------------------------------------------------

    /// 0x05 says "push 5 bytes" but only 2 bytes follow.
    #[test]
    fn test_decode_script_truncated_direct_push() {
        let result = decode_script(&[0x05, 0x00, 0x00]);
        assert_eq!(
            result,
            Err(ScriptError::TruncatedInput { offset: 0, needed: 6, available: 3 })
        );
    }

    /// OP_PUSHDATA1 claims 5 bytes but only 3 follow.
    #[test]
    fn test_decode_script_invalid_pushdata1() {
        let bytes = hex::decode("4c05000000").expect("valid hex");
        assert!(matches!(
            decode_script(&bytes),
            Err(ScriptError::TruncatedInput { offset: 0, .. })
        ));
    }

    #[test]
    fn test_decode_script_pushdata1_valid() {
        let data = b"testing";
        let mut script_bytes = vec![OP_PUSHDATA1, data.len() as u8];
        script_bytes.extend_from_slice(data);
        let parts = decode_script(&script_bytes).expect("should decode");
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].op(), OP_PUSHDATA1);
        assert_eq!(parts[0].data(), Some(&data[..]));
        assert!(!parts[0].is_minimal());
    }

    #[test]
    fn test_decode_script_pushdata_missing_length() {
        for op in [OP_PUSHDATA1, OP_PUSHDATA2, OP_PUSHDATA4] {
            let result = decode_script(&[op]);
            assert!(matches!(result, Err(ScriptError::TruncatedInput { .. })), "op {:02x}", op);
        }
    }

    /// Only 1 length byte instead of 2 for OP_PUSHDATA2.
    #[test]
    fn test_decode_script_pushdata2_too_small() {
        let data = b"testing PUSHDATA2";
        let mut script_bytes = vec![OP_PUSHDATA2, data.len() as u8];
        script_bytes.extend_from_slice(data);
        assert!(decode_script(&script_bytes).is_err());
    }

    #[test]
    fn test_decode_script_pushdata4_too_small() {
        let data = b"testing PUSHDATA4";
        let mut script_bytes = vec![OP_PUSHDATA4, data.len() as u8];
        script_bytes.extend_from_slice(data);
        assert!(decode_script(&script_bytes).is_err());
    }

    /// The truncation error is reported for the push, not for the script start.
    #[test]
    fn test_decode_script_truncation_offset() {
        let result = decode_script(&[OP_DUP, OP_HASH160, 0x14, 0xaa, 0xbb]);
        assert_eq!(
            result,
            Err(ScriptError::TruncatedInput { offset: 2, needed: 21, available: 3 })
        );
    }

    // -----------------------------------------------------------------------
    // decode_script_with
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_strict_rejects_non_minimal() {
        let bytes = [OP_DUP, OP_PUSHDATA1, 0x02, 0xab, 0xcd];
        assert!(decode_script(&bytes).is_ok());
        assert_eq!(
            decode_script_with(&bytes, &DecodeConfig::standard()),
            Err(ScriptError::NonMinimalEncoding { offset: 1 })
        );
    }

    #[test]
    fn test_decode_strict_rejects_single_byte_number_push() {
        let bytes = [0x01, 0x05];
        assert_eq!(
            decode_script_with(&bytes, &DecodeConfig::standard()),
            Err(ScriptError::NonMinimalEncoding { offset: 0 })
        );
    }

    #[test]
    fn test_decode_strict_rejects_unassigned() {
        let bytes = [OP_DUP, 0xc0];
        assert!(decode_script(&bytes).is_ok());
        assert_eq!(
            decode_script_with(&bytes, &DecodeConfig::standard()),
            Err(ScriptError::UnknownOpcode(0xc0))
        );
    }

    #[test]
    fn test_decode_size_limit() {
        let bytes = vec![OP_NOP; 10_001];
        assert_eq!(
            decode_script_with(&bytes, &DecodeConfig::standard()),
            Err(ScriptError::ScriptTooLarge(10_001))
        );
    }

    // -----------------------------------------------------------------------
    // decode_push
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_push_at_offset() {
        let bytes = hex::decode("76a914e2a623699e81b291c0327f408fea765d534baa2a88ac").expect("valid hex");
        let (push, consumed) = decode_push(&bytes, 2).expect("should decode");
        assert_eq!(consumed, 21);
        assert_eq!(push.op(), OP_DATA_20);
        assert_eq!(hex::encode(push.data()), "e2a623699e81b291c0327f408fea765d534baa2a");
    }

    #[test]
    fn test_decode_push_pushdata2() {
        let mut bytes = vec![OP_PUSHDATA2, 0x00, 0x01];
        bytes.extend_from_slice(&[0x11; 256]);
        let (push, consumed) = decode_push(&bytes, 0).expect("should decode");
        assert_eq!(consumed, 259);
        assert_eq!(push.data().len(), 256);
        assert!(push.is_minimal());
    }

    #[test]
    fn test_decode_push_not_a_push() {
        assert_eq!(decode_push(&[OP_DUP], 0), Err(ScriptError::NotPushOpcode(OP_DUP)));
    }

    #[test]
    fn test_decode_push_past_end() {
        assert!(matches!(
            decode_push(&[0x01, 0x02], 2),
            Err(ScriptError::TruncatedInput { offset: 2, available: 0, .. })
        ));
    }

    // -----------------------------------------------------------------------
    // PushData
    // -----------------------------------------------------------------------

    #[test]
    fn test_push_data_new_forms() {
        assert_eq!(PushData::new(vec![0xaa; 75]).expect("push").op(), 75);
        assert_eq!(PushData::new(vec![0xaa; 76]).expect("push").op(), OP_PUSHDATA1);
        assert_eq!(PushData::new(vec![0xaa; 256]).expect("push").op(), OP_PUSHDATA2);
        assert_eq!(PushData::new(vec![0xaa; 65536]).expect("push").op(), OP_PUSHDATA4);
    }

    #[test]
    fn test_push_data_with_opcode_validation() {
        assert!(PushData::with_opcode(OP_PUSHDATA2, vec![1, 2]).is_ok());
        assert_eq!(
            PushData::with_opcode(0x03, vec![1, 2]),
            Err(ScriptError::PushLengthMismatch { op: 0x03, len: 2 })
        );
        assert_eq!(
            PushData::with_opcode(OP_PUSHDATA1, vec![0; 256]),
            Err(ScriptError::PushLengthMismatch { op: OP_PUSHDATA1, len: 256 })
        );
        assert_eq!(
            PushData::with_opcode(OP_DUP, vec![]),
            Err(ScriptError::NotPushOpcode(OP_DUP))
        );
    }

    #[test]
    fn test_push_data_write_preserves_form() {
        let push = PushData::with_opcode(OP_PUSHDATA4, vec![0xab]).expect("push");
        let mut buf = Vec::new();
        push.write_to(&mut buf);
        assert_eq!(buf, vec![OP_PUSHDATA4, 0x01, 0x00, 0x00, 0x00, 0xab]);
        assert_eq!(push.encoded_len(), buf.len());
        assert!(!push.is_minimal());
    }

    #[test]
    fn test_minimal_number_op() {
        assert_eq!(minimal_number_op(&[]), Some(OP_0));
        assert_eq!(minimal_number_op(&[0x01]), Some(OP_1));
        assert_eq!(minimal_number_op(&[0x10]), Some(OP_16));
        assert_eq!(minimal_number_op(&[0x81]), Some(OP_1NEGATE));
        assert_eq!(minimal_number_op(&[0x00]), None);
        assert_eq!(minimal_number_op(&[0x11]), None);
        assert_eq!(minimal_number_op(&[0x01, 0x02]), None);
    }

    // -----------------------------------------------------------------------
    // push_data_prefix boundary tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_push_data_prefix_boundaries() {
        assert_eq!(push_data_prefix(20).expect("ok"), vec![20u8]);
        assert_eq!(push_data_prefix(75).expect("ok"), vec![75u8]);
        assert_eq!(push_data_prefix(76).expect("ok"), vec![OP_PUSHDATA1, 76]);
        assert_eq!(push_data_prefix(255).expect("ok"), vec![OP_PUSHDATA1, 255]);
        assert_eq!(push_data_prefix(256).expect("ok"), vec![OP_PUSHDATA2, 0x00, 0x01]);
        assert_eq!(push_data_prefix(65535).expect("ok"), vec![OP_PUSHDATA2, 0xFF, 0xFF]);
        assert_eq!(
            push_data_prefix(65536).expect("ok"),
            vec![OP_PUSHDATA4, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_push_direct() {
        let encoded = encode_push(&[0x05]).expect("should encode");
        assert_eq!(encoded, vec![0x01, 0x05]);
    }

    // -----------------------------------------------------------------------
    // encode_push_datas
    // -----------------------------------------------------------------------

    #[test]
    fn test_encode_push_datas_multiple() {
        let parts: Vec<&[u8]> = vec![b"hello", b"world"];
        let encoded = encode_push_datas(&parts).expect("should encode");
        let expected = hex::decode("0568656c6c6f05776f726c64").expect("valid hex");
        assert_eq!(encoded, expected);
    }

    #[test]
    fn test_encode_push_datas_empty() {
        let encoded = encode_push_datas(&[]).expect("should encode");
        assert!(encoded.is_empty());
    }

    // -----------------------------------------------------------------------
    // ScriptChunk::to_asm_string
    // -----------------------------------------------------------------------

    #[test]
    fn test_chunk_to_asm_string_data() {
        let chunk = ScriptChunk::push(vec![0xAB; 20]).expect("push");
        assert_eq!(chunk.to_asm_string(), "ab".repeat(20));
    }

    #[test]
    fn test_chunk_to_asm_string_opcode() {
        assert_eq!(ScriptChunk::Op(OP_DUP).to_asm_string(), "OP_DUP");
    }

    #[test]
    fn test_chunk_to_asm_string_empty_push() {
        let chunk = ScriptChunk::Push(PushData::with_opcode(OP_PUSHDATA1, vec![]).expect("push"));
        assert_eq!(chunk.to_asm_string(), "OP_0");
    }
}
