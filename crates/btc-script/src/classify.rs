//! Standard script template classification.
//!
//! Templates are tried in a fixed order and the first match wins. Every
//! script classifies; anything that fits no template is `NonStandard`.
//! Apart from null data, templates only match canonical encodings, and the
//! result records whether the script used minimal pushes throughout.

use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};

use crate::chunk::{decode_script, ScriptChunk};
use crate::opcodes::*;
use crate::Script;

/// The standard template a script matches, with its extracted parameters.
///
/// Serializes as `{"type": <tag>, "params": {...}}` with byte fields as
/// lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "params", rename_all = "lowercase")]
pub enum ScriptType {
    /// `OP_0 <20-byte key hash>`.
    P2wpkh {
        #[serde(with = "hex_bytes")]
        hash: Vec<u8>,
    },
    /// `OP_0 <32-byte script hash>`.
    P2wsh {
        #[serde(with = "hex_bytes")]
        hash: Vec<u8>,
    },
    /// `OP_DUP OP_HASH160 <20-byte key hash> OP_EQUALVERIFY OP_CHECKSIG`.
    P2pkh {
        #[serde(with = "hex_bytes")]
        hash: Vec<u8>,
    },
    /// `OP_HASH160 <20-byte script hash> OP_EQUAL`.
    P2sh {
        #[serde(with = "hex_bytes")]
        hash: Vec<u8>,
    },
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    Multisig {
        m: u8,
        n: u8,
        #[serde(with = "hex_list")]
        pubkeys: Vec<Vec<u8>>,
    },
    /// A script starting with OP_RETURN.
    NullData {
        /// Every byte after the OP_RETURN, verbatim.
        #[serde(with = "hex_bytes")]
        data: Vec<u8>,
        /// Pushed payloads when the tail is push-only, otherwise empty.
        #[serde(with = "hex_list")]
        pushes: Vec<Vec<u8>>,
    },
    /// Anything that fits no template.
    NonStandard,
}

impl ScriptType {
    /// Short display name of the template.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptType::P2wpkh { .. } => "P2WPKH",
            ScriptType::P2wsh { .. } => "P2WSH",
            ScriptType::P2pkh { .. } => "P2PKH",
            ScriptType::P2sh { .. } => "P2SH",
            ScriptType::Multisig { .. } => "Multisig",
            ScriptType::NullData { .. } => "NullData",
            ScriptType::NonStandard => "NonStandard",
        }
    }

    /// False only for `NonStandard`.
    pub fn is_standard(&self) -> bool {
        !matches!(self, ScriptType::NonStandard)
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`classify`]: the matched template and whether the script is
/// canonical.
///
/// `canonical` is false when the script fails to decode or uses a push form
/// longer than its payload needs. It serializes next to the template tag:
/// `{"type": <tag>, "params": {...}, "canonical": <bool>}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    /// Matched template.
    #[serde(flatten)]
    pub kind: ScriptType,
    /// Every push is minimal and the bytes decode.
    pub canonical: bool,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.canonical {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{} (non-canonical)", self.kind)
        }
    }
}

/// Classify a script against the standard templates.
///
/// Order: P2WPKH, P2WSH, P2PKH, P2SH, multisig, null data, non-standard.
pub fn classify(script: &Script) -> Classification {
    let b = script.to_bytes();
    let kind = match_p2wpkh(b)
        .or_else(|| match_p2wsh(b))
        .or_else(|| match_p2pkh(b))
        .or_else(|| match_p2sh(b))
        .or_else(|| match_multisig(b))
        .or_else(|| match_null_data(b))
        .unwrap_or(ScriptType::NonStandard);
    let classified = Classification { kind, canonical: script.is_canonical() };
    trace!("classified script {} as {}", script, classified);
    classified
}

fn match_p2wpkh(b: &[u8]) -> Option<ScriptType> {
    (b.len() == 22 && b[0] == OP_0 && b[1] == OP_DATA_20)
        .then(|| ScriptType::P2wpkh { hash: b[2..].to_vec() })
}

fn match_p2wsh(b: &[u8]) -> Option<ScriptType> {
    (b.len() == 34 && b[0] == OP_0 && b[1] == OP_DATA_32)
        .then(|| ScriptType::P2wsh { hash: b[2..].to_vec() })
}

fn match_p2pkh(b: &[u8]) -> Option<ScriptType> {
    let matches = b.len() == 25
        && b[0] == OP_DUP
        && b[1] == OP_HASH160
        && b[2] == OP_DATA_20
        && b[23] == OP_EQUALVERIFY
        && b[24] == OP_CHECKSIG;
    matches.then(|| ScriptType::P2pkh { hash: b[3..23].to_vec() })
}

fn match_p2sh(b: &[u8]) -> Option<ScriptType> {
    let matches = b.len() == 23 && b[0] == OP_HASH160 && b[1] == OP_DATA_20 && b[22] == OP_EQUAL;
    matches.then(|| ScriptType::P2sh { hash: b[2..22].to_vec() })
}

fn match_multisig(b: &[u8]) -> Option<ScriptType> {
    if b.last() != Some(&OP_CHECKMULTISIG) {
        return None;
    }
    let chunks = decode_script(b).ok()?;
    if chunks.len() < 4 {
        return None;
    }
    let m = count_op(&chunks[0])?;
    let n = count_op(&chunks[chunks.len() - 2])?;
    let keys = &chunks[1..chunks.len() - 2];
    if m > n || keys.len() != n as usize {
        return None;
    }
    let pubkeys = keys
        .iter()
        .map(|chunk| match chunk {
            ScriptChunk::Push(push)
                if push.is_minimal() && matches!(push.data().len(), 33 | 65) =>
            {
                Some(push.data().to_vec())
            }
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(ScriptType::Multisig { m, n, pubkeys })
}

/// The key count carried by OP_1..OP_16.
fn count_op(chunk: &ScriptChunk) -> Option<u8> {
    match chunk {
        ScriptChunk::Op(op) => small_int_value(*op).filter(|&v| v >= 1),
        ScriptChunk::Push(_) => None,
    }
}

fn match_null_data(b: &[u8]) -> Option<ScriptType> {
    if b.first() != Some(&OP_RETURN) {
        return None;
    }
    let tail = &b[1..];
    let pushes = decode_script(tail)
        .ok()
        .and_then(|chunks| {
            chunks
                .into_iter()
                .map(|chunk| match chunk {
                    ScriptChunk::Push(push) => Some(push.into_data()),
                    ScriptChunk::Op(_) => None,
                })
                .collect::<Option<Vec<_>>>()
        })
        .unwrap_or_default();
    Some(ScriptType::NullData { data: tail.to_vec(), pushes })
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

mod hex_list {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(items.iter().map(hex::encode))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .into_iter()
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
