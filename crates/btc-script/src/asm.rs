//! ASM tokenizer, parser and renderer.
//!
//! ASM is the whitespace-separated text form of a script: mnemonics such as
//! `OP_DUP`, hex literals for data pushes and small decimal integers.

use log::debug;

use crate::chunk::{minimal_number_op, ScriptChunk};
use crate::opcodes::*;
use crate::ScriptError;

/// Parse an ASM string into script chunks.
///
/// Each token is resolved, first rule wins, as:
///
/// 1. an `OP_`-prefixed mnemonic (case-insensitive);
/// 2. an even-length hex literal, pushed as data;
/// 3. a decimal integer in -1..=16, as OP_1NEGATE, OP_0 or OP_1..OP_16;
/// 4. a bare mnemonic such as `DUP` or `checksig`;
/// 5. odd-length or partly hex, rejected as an invalid hex literal;
/// 6. anything else, rejected as unrecognized.
///
/// One-byte hex literals that have a small integer opcode (`01`..`10`,
/// `81`) become that opcode, matching what a minimal push requires. An
/// empty or blank string yields no chunks.
pub fn parse(asm: &str) -> Result<Vec<ScriptChunk>, ScriptError> {
    asm.split_whitespace()
        .map(|token| {
            parse_token(token).map_err(|e| {
                debug!("rejected ASM token {:?}: {}", token, e);
                e
            })
        })
        .collect()
}

/// Render chunks as ASM, separated by single spaces.
pub fn render(chunks: &[ScriptChunk]) -> String {
    chunks
        .iter()
        .map(ScriptChunk::to_asm_string)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_token(token: &str) -> Result<ScriptChunk, ScriptError> {
    let prefixed = token
        .get(..3)
        .map_or(false, |p| p.eq_ignore_ascii_case("OP_"));
    if prefixed {
        return resolve_mnemonic(token)?
            .ok_or_else(|| ScriptError::UnrecognizedToken(token.to_string()));
    }

    if is_hex(token) && token.len() % 2 == 0 {
        return hex_literal(token);
    }
    if is_decimal(token) {
        return small_integer(token);
    }
    if let Some(chunk) = resolve_mnemonic(token)? {
        return Ok(chunk);
    }
    if is_hex(token) || looks_like_hex(token) {
        return Err(ScriptError::InvalidHexLiteral(token.to_string()));
    }
    Err(ScriptError::UnrecognizedToken(token.to_string()))
}

fn resolve_mnemonic(token: &str) -> Result<Option<ScriptChunk>, ScriptError> {
    match lookup_by_name(token) {
        Some(opcode) if opcode.is_push() => {
            Err(ScriptError::InvalidOpcodeType(opcode.name().to_string()))
        }
        Some(opcode) => Ok(Some(ScriptChunk::Op(opcode.value()))),
        None => Ok(None),
    }
}

fn hex_literal(token: &str) -> Result<ScriptChunk, ScriptError> {
    let data = hex::decode(token)
        .map_err(|_| ScriptError::InvalidHexLiteral(token.to_string()))?;
    if data.len() == 1 {
        if let Some(op) = minimal_number_op(&data) {
            return Ok(ScriptChunk::Op(op));
        }
    }
    ScriptChunk::push(data)
}

fn small_integer(token: &str) -> Result<ScriptChunk, ScriptError> {
    let out_of_range = || ScriptError::IntegerOutOfRange(token.to_string());
    let value: i64 = token.parse().map_err(|_| out_of_range())?;
    match value {
        -1 => Ok(ScriptChunk::Op(OP_1NEGATE)),
        0..=16 => small_int_op(value as u8)
            .map(ScriptChunk::Op)
            .ok_or_else(out_of_range),
        _ => Err(out_of_range()),
    }
}

fn is_hex(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_hexdigit())
}

fn is_decimal(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// A token that starts like hex data but is not: `0x` prefixed, or with two
/// leading hex digits.
fn looks_like_hex(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() >= 2
        && ((b[0] == b'0' && (b[1] == b'x' || b[1] == b'X'))
            || (b[0].is_ascii_hexdigit() && b[1].is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(asm: &str) -> Vec<u8> {
        parse(asm)
            .expect("should parse")
            .iter()
            .map(ScriptChunk::op)
            .collect()
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse("").expect("empty").is_empty());
        assert!(parse("   \n\t").expect("blank").is_empty());
    }

    #[test]
    fn test_parse_mnemonics() {
        assert_eq!(
            ops("OP_DUP op_hash160 OP_EqualVerify CHECKSIG"),
            vec![OP_DUP, OP_HASH160, OP_EQUALVERIFY, OP_CHECKSIG]
        );
        assert_eq!(ops("OP_FALSE OP_TRUE OP_NOP2"), vec![OP_0, OP_1, OP_CHECKLOCKTIMEVERIFY]);
    }

    #[test]
    fn test_parse_collapses_whitespace() {
        assert_eq!(ops("  OP_DUP \t\n OP_DROP "), vec![OP_DUP, OP_DROP]);
    }

    #[test]
    fn test_parse_hex_literal() {
        let chunks = parse("deadbeef").expect("should parse");
        assert_eq!(chunks, vec![ScriptChunk::push(vec![0xde, 0xad, 0xbe, 0xef]).expect("push")]);
    }

    #[test]
    fn test_parse_hex_before_bare_mnemonic() {
        // "1add" is valid hex, so it is data rather than OP_1ADD.
        let chunks = parse("1add").expect("should parse");
        assert_eq!(chunks[0].data(), Some(&[0x1a, 0xdd][..]));
        // "add" is odd-length, so it falls through to the mnemonic.
        assert_eq!(ops("add"), vec![OP_ADD]);
    }

    #[test]
    fn test_parse_single_byte_numbers_become_opcodes() {
        assert_eq!(ops("01 10 81"), vec![OP_1, OP_16, OP_1NEGATE]);
        let chunks = parse("00 11").expect("should parse");
        assert!(chunks.iter().all(ScriptChunk::is_push));
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(ops("-1 0 1 9"), vec![OP_1NEGATE, OP_0, OP_1, OP_9]);
    }

    #[test]
    fn test_parse_integer_out_of_range() {
        assert_eq!(parse("123"), Err(ScriptError::IntegerOutOfRange("123".into())));
        assert_eq!(parse("-2"), Err(ScriptError::IntegerOutOfRange("-2".into())));
        assert_eq!(
            parse("99999999999999999999999"),
            Err(ScriptError::IntegerOutOfRange("99999999999999999999999".into()))
        );
    }

    #[test]
    fn test_parse_unrecognized() {
        match parse("OP_DUP OP_FOO") {
            Err(e @ ScriptError::UnrecognizedToken(_)) => assert!(e.to_string().contains("FOO")),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(parse("hello"), Err(ScriptError::UnrecognizedToken("hello".into())));
    }

    #[test]
    fn test_parse_invalid_hex() {
        assert_eq!(parse("abc"), Err(ScriptError::InvalidHexLiteral("abc".into())));
        assert_eq!(parse("0xe8"), Err(ScriptError::InvalidHexLiteral("0xe8".into())));
        assert_eq!(parse("e8dsd1"), Err(ScriptError::InvalidHexLiteral("e8dsd1".into())));
    }

    #[test]
    fn test_parse_rejects_push_mnemonic() {
        assert!(matches!(parse("OP_PUSHDATA1"), Err(ScriptError::InvalidOpcodeType(_))));
        assert!(matches!(parse("OP_DATA_20"), Err(ScriptError::InvalidOpcodeType(_))));
    }

    #[test]
    fn test_parse_fails_fast() {
        assert!(parse("OP_DUP zz OP_FOO").is_err());
    }

    #[test]
    fn test_render() {
        let chunks = vec![
            ScriptChunk::Op(OP_DUP),
            ScriptChunk::push(vec![0xab; 3]).expect("push"),
            ScriptChunk::Op(OP_1NEGATE),
        ];
        assert_eq!(render(&chunks), "OP_DUP ababab OP_1NEGATE");
        assert_eq!(render(&[]), "");
    }
}
