/// Bitcoin Script type - a sequence of opcodes and data pushes.
///
/// Scripts are used in transaction inputs (unlocking) and outputs (locking)
/// to define spending conditions. The Script wraps a `Vec<u8>` and provides
/// compilation from chunks or ASM, decompilation, hex and ASM output, and
/// builders for the standard templates.

use std::fmt;

use crate::asm;
use crate::chunk::{decode_script, decode_script_with, PushData, ScriptChunk};
use crate::classify::{classify, Classification};
use crate::config::DecodeConfig;
use crate::opcodes::*;
use crate::ScriptError;

/// A compiled Bitcoin script, represented as a byte vector newtype.
///
/// Values are never modified in place; the `append_*` builders consume the
/// script and return a new one.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Script(Vec<u8>);

impl Script {
    // -----------------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------------

    /// Create a new empty script.
    pub fn new() -> Self {
        Script(Vec::new())
    }

    /// Create a script from a hex-encoded string.
    ///
    /// # Arguments
    /// * `hex_str` - A hex string (e.g. "76a914...88ac").
    ///
    /// # Returns
    /// A `Script` wrapping the decoded bytes, or an error if the hex is invalid.
    pub fn from_hex(hex_str: &str) -> Result<Self, ScriptError> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| ScriptError::InvalidHex(e.to_string()))?;
        Ok(Script(bytes))
    }

    /// Create a script from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }

    /// Create a script from a Bitcoin ASM string.
    ///
    /// # Arguments
    /// * `asm` - A whitespace-separated ASM string.
    ///
    /// # Returns
    /// The compiled `Script`, or the error for the first invalid token.
    pub fn from_asm(asm: &str) -> Result<Self, ScriptError> {
        let chunks = asm::parse(asm)?;
        Ok(Script::compile(&chunks))
    }

    /// Serialize chunks, in order, into a script.
    ///
    /// Each push keeps the opcode it was built or decoded with, so
    /// non-minimal encodings survive a decompile/compile cycle unchanged.
    pub fn compile(chunks: &[ScriptChunk]) -> Self {
        let mut buf = Vec::new();
        for chunk in chunks {
            chunk.write_to(&mut buf);
        }
        Script(buf)
    }

    // -----------------------------------------------------------------------
    // Template builders
    // -----------------------------------------------------------------------

    /// Build `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`.
    pub fn new_p2pkh(pubkey_hash: &[u8]) -> Result<Self, ScriptError> {
        expect_len("public key hash", pubkey_hash, 20)?;
        Script::new()
            .append_opcodes(&[OP_DUP, OP_HASH160])?
            .append_push_data(pubkey_hash)?
            .append_opcodes(&[OP_EQUALVERIFY, OP_CHECKSIG])
    }

    /// Build `OP_HASH160 <hash> OP_EQUAL`.
    pub fn new_p2sh(script_hash: &[u8]) -> Result<Self, ScriptError> {
        expect_len("script hash", script_hash, 20)?;
        Script::new()
            .append_opcodes(&[OP_HASH160])?
            .append_push_data(script_hash)?
            .append_opcodes(&[OP_EQUAL])
    }

    /// Build the version 0 witness program `OP_0 <20-byte hash>`.
    pub fn new_p2wpkh(pubkey_hash: &[u8]) -> Result<Self, ScriptError> {
        expect_len("public key hash", pubkey_hash, 20)?;
        Script::new().append_opcodes(&[OP_0])?.append_push_data(pubkey_hash)
    }

    /// Build the version 0 witness program `OP_0 <32-byte hash>`.
    pub fn new_p2wsh(script_hash: &[u8]) -> Result<Self, ScriptError> {
        expect_len("script hash", script_hash, 32)?;
        Script::new().append_opcodes(&[OP_0])?.append_push_data(script_hash)
    }

    /// Build `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    ///
    /// Requires `1 <= m <= n <= 16` and 33 or 65 byte keys.
    pub fn new_multisig(m: u8, pubkeys: &[Vec<u8>]) -> Result<Self, ScriptError> {
        let n = pubkeys.len();
        if m == 0 || n > 16 || m as usize > n {
            return Err(ScriptError::InvalidTemplate(format!(
                "{}-of-{} multisig is out of range",
                m, n
            )));
        }
        let mut script = Script::new().append_opcodes(&[OP_1 + m - 1])?;
        for pubkey in pubkeys {
            expect_pubkey(pubkey)?;
            script = script.append_push_data(pubkey)?;
        }
        script.append_opcodes(&[OP_1 + n as u8 - 1, OP_CHECKMULTISIG])
    }

    /// Build `OP_RETURN <data>`; an empty payload gives a bare OP_RETURN.
    pub fn new_null_data(data: &[u8]) -> Result<Self, ScriptError> {
        let script = Script::new().append_opcodes(&[OP_RETURN])?;
        if data.is_empty() {
            return Ok(script);
        }
        script.append_push_data(data)
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    /// Encode the script as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Convert the script to its ASM (human-readable assembly) representation.
    ///
    /// Data pushes appear as their hex encoding; opcodes appear by name.
    /// Non-minimal pushes are rendered by payload, so the ASM of such a
    /// script compiles back to its canonical form rather than the original
    /// bytes.
    ///
    /// # Returns
    /// A space-separated ASM string, or an error if the bytecode is truncated.
    pub fn to_asm(&self) -> Result<String, ScriptError> {
        Ok(asm::render(&self.decompile()?))
    }

    /// Return a reference to the underlying bytes.
    pub fn to_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the script and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Return the length of the script in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the script is empty (zero bytes).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // -----------------------------------------------------------------------
    // Decoding and inspection
    // -----------------------------------------------------------------------

    /// Parse the script into chunks, accepting any structurally valid encoding.
    pub fn decompile(&self) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script(&self.0)
    }

    /// Parse the script into chunks under the limits in `config`.
    pub fn decompile_with(&self, config: &DecodeConfig) -> Result<Vec<ScriptChunk>, ScriptError> {
        decode_script_with(&self.0, config)
    }

    /// True if the script decodes and every push uses its minimal form.
    pub fn is_canonical(&self) -> bool {
        self.decompile()
            .map(|chunks| chunks.iter().all(ScriptChunk::is_minimal))
            .unwrap_or(false)
    }

    /// True if the script decodes and contains only pushes and small
    /// integer opcodes.
    pub fn is_push_only(&self) -> bool {
        self.decompile()
            .map(|chunks| {
                chunks.iter().all(|c| match c {
                    ScriptChunk::Push(_) => true,
                    ScriptChunk::Op(op) => *op <= OP_16 && *op != OP_RESERVED,
                })
            })
            .unwrap_or(false)
    }

    /// Classify the script against the standard templates.
    pub fn classify(&self) -> Classification {
        classify(self)
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    /// Append data bytes with the shortest PUSHDATA prefix.
    ///
    /// # Returns
    /// The extended script, or an error if the data is too large.
    pub fn append_push_data(mut self, data: &[u8]) -> Result<Self, ScriptError> {
        PushData::new(data.to_vec())?.write_to(&mut self.0);
        Ok(self)
    }

    /// Append hex-encoded data with the shortest PUSHDATA prefix.
    pub fn append_push_data_hex(self, hex_str: &str) -> Result<Self, ScriptError> {
        let data = hex::decode(hex_str)
            .map_err(|_| ScriptError::InvalidHexLiteral(hex_str.to_string()))?;
        self.append_push_data(&data)
    }

    /// Append raw opcodes to the script.
    ///
    /// Rejects push opcodes (OP_DATA_1..OP_PUSHDATA4); use
    /// `append_push_data` for those.
    pub fn append_opcodes(mut self, opcodes: &[u8]) -> Result<Self, ScriptError> {
        for &op in opcodes {
            if lookup_by_value(op).is_push() {
                return Err(ScriptError::InvalidOpcodeType(
                    opcode_to_string(op).to_string(),
                ));
            }
        }
        self.0.extend_from_slice(opcodes);
        Ok(self)
    }
}

fn expect_len(what: &str, bytes: &[u8], len: usize) -> Result<(), ScriptError> {
    if bytes.len() != len {
        return Err(ScriptError::InvalidTemplate(format!(
            "{} must be {} bytes, got {}",
            what,
            len,
            bytes.len()
        )));
    }
    Ok(())
}

fn expect_pubkey(pubkey: &[u8]) -> Result<(), ScriptError> {
    if pubkey.len() != 33 && pubkey.len() != 65 {
        return Err(ScriptError::InvalidTemplate(format!(
            "public key must be 33 or 65 bytes, got {}",
            pubkey.len()
        )));
    }
    Ok(())
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Script {
    /// Display the script as a lowercase hex string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl serde::Serialize for Script {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Script {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
