//! Opcode definitions and lookup tables.
//!
//! Every byte value 0x00..=0xff has exactly one interpretation: a direct
//! push length, a length-prefixed push, a small integer constant or an
//! operator. The name table is built once on first use and is read-only
//! afterwards.

use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;

// Push value
/// Push an empty array onto the stack.
pub const OP_0: u8 = 0x00;
/// Alias for `OP_0`.
pub const OP_FALSE: u8 = OP_0;

// Direct pushes: the opcode byte is the payload length.
pub const OP_DATA_1: u8 = 0x01;
pub const OP_DATA_2: u8 = 0x02;
pub const OP_DATA_3: u8 = 0x03;
pub const OP_DATA_4: u8 = 0x04;
pub const OP_DATA_5: u8 = 0x05;
pub const OP_DATA_6: u8 = 0x06;
pub const OP_DATA_7: u8 = 0x07;
pub const OP_DATA_8: u8 = 0x08;
pub const OP_DATA_9: u8 = 0x09;
pub const OP_DATA_10: u8 = 0x0a;
pub const OP_DATA_11: u8 = 0x0b;
pub const OP_DATA_12: u8 = 0x0c;
pub const OP_DATA_13: u8 = 0x0d;
pub const OP_DATA_14: u8 = 0x0e;
pub const OP_DATA_15: u8 = 0x0f;
pub const OP_DATA_16: u8 = 0x10;
pub const OP_DATA_17: u8 = 0x11;
pub const OP_DATA_18: u8 = 0x12;
pub const OP_DATA_19: u8 = 0x13;
pub const OP_DATA_20: u8 = 0x14;
pub const OP_DATA_21: u8 = 0x15;
pub const OP_DATA_22: u8 = 0x16;
pub const OP_DATA_23: u8 = 0x17;
pub const OP_DATA_24: u8 = 0x18;
pub const OP_DATA_25: u8 = 0x19;
pub const OP_DATA_26: u8 = 0x1a;
pub const OP_DATA_27: u8 = 0x1b;
pub const OP_DATA_28: u8 = 0x1c;
pub const OP_DATA_29: u8 = 0x1d;
pub const OP_DATA_30: u8 = 0x1e;
pub const OP_DATA_31: u8 = 0x1f;
pub const OP_DATA_32: u8 = 0x20;
pub const OP_DATA_33: u8 = 0x21;
pub const OP_DATA_34: u8 = 0x22;
pub const OP_DATA_35: u8 = 0x23;
pub const OP_DATA_36: u8 = 0x24;
pub const OP_DATA_37: u8 = 0x25;
pub const OP_DATA_38: u8 = 0x26;
pub const OP_DATA_39: u8 = 0x27;
pub const OP_DATA_40: u8 = 0x28;
pub const OP_DATA_41: u8 = 0x29;
pub const OP_DATA_42: u8 = 0x2a;
pub const OP_DATA_43: u8 = 0x2b;
pub const OP_DATA_44: u8 = 0x2c;
pub const OP_DATA_45: u8 = 0x2d;
pub const OP_DATA_46: u8 = 0x2e;
pub const OP_DATA_47: u8 = 0x2f;
pub const OP_DATA_48: u8 = 0x30;
pub const OP_DATA_49: u8 = 0x31;
pub const OP_DATA_50: u8 = 0x32;
pub const OP_DATA_51: u8 = 0x33;
pub const OP_DATA_52: u8 = 0x34;
pub const OP_DATA_53: u8 = 0x35;
pub const OP_DATA_54: u8 = 0x36;
pub const OP_DATA_55: u8 = 0x37;
pub const OP_DATA_56: u8 = 0x38;
pub const OP_DATA_57: u8 = 0x39;
pub const OP_DATA_58: u8 = 0x3a;
pub const OP_DATA_59: u8 = 0x3b;
pub const OP_DATA_60: u8 = 0x3c;
pub const OP_DATA_61: u8 = 0x3d;
pub const OP_DATA_62: u8 = 0x3e;
pub const OP_DATA_63: u8 = 0x3f;
pub const OP_DATA_64: u8 = 0x40;
pub const OP_DATA_65: u8 = 0x41;
pub const OP_DATA_66: u8 = 0x42;
pub const OP_DATA_67: u8 = 0x43;
pub const OP_DATA_68: u8 = 0x44;
pub const OP_DATA_69: u8 = 0x45;
pub const OP_DATA_70: u8 = 0x46;
pub const OP_DATA_71: u8 = 0x47;
pub const OP_DATA_72: u8 = 0x48;
pub const OP_DATA_73: u8 = 0x49;
pub const OP_DATA_74: u8 = 0x4a;
pub const OP_DATA_75: u8 = 0x4b;
/// Read the next byte as N and push the following N bytes.
pub const OP_PUSHDATA1: u8 = 0x4c;
/// Read the next two bytes (LE) as N and push the following N bytes.
pub const OP_PUSHDATA2: u8 = 0x4d;
/// Read the next four bytes (LE) as N and push the following N bytes.
pub const OP_PUSHDATA4: u8 = 0x4e;
/// Push the number -1.
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_RESERVED: u8 = 0x50;
/// Push the number 1.
pub const OP_1: u8 = 0x51;
/// Alias for `OP_1`.
pub const OP_TRUE: u8 = OP_1;
pub const OP_2: u8 = 0x52;
pub const OP_3: u8 = 0x53;
pub const OP_4: u8 = 0x54;
pub const OP_5: u8 = 0x55;
pub const OP_6: u8 = 0x56;
pub const OP_7: u8 = 0x57;
pub const OP_8: u8 = 0x58;
pub const OP_9: u8 = 0x59;
pub const OP_10: u8 = 0x5a;
pub const OP_11: u8 = 0x5b;
pub const OP_12: u8 = 0x5c;
pub const OP_13: u8 = 0x5d;
pub const OP_14: u8 = 0x5e;
pub const OP_15: u8 = 0x5f;
/// Push the number 16.
pub const OP_16: u8 = 0x60;

// Flow control
pub const OP_NOP: u8 = 0x61;
pub const OP_VER: u8 = 0x62;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_VERIF: u8 = 0x65;
pub const OP_VERNOTIF: u8 = 0x66;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;

// Stack
pub const OP_TOALTSTACK: u8 = 0x6b;
pub const OP_FROMALTSTACK: u8 = 0x6c;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_2DUP: u8 = 0x6e;
pub const OP_3DUP: u8 = 0x6f;
pub const OP_2OVER: u8 = 0x70;
pub const OP_2ROT: u8 = 0x71;
pub const OP_2SWAP: u8 = 0x72;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_ROT: u8 = 0x7b;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_TUCK: u8 = 0x7d;

// Splice
pub const OP_CAT: u8 = 0x7e;
pub const OP_SUBSTR: u8 = 0x7f;
pub const OP_LEFT: u8 = 0x80;
pub const OP_RIGHT: u8 = 0x81;
pub const OP_SIZE: u8 = 0x82;

// Bitwise logic
pub const OP_INVERT: u8 = 0x83;
pub const OP_AND: u8 = 0x84;
pub const OP_OR: u8 = 0x85;
pub const OP_XOR: u8 = 0x86;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_RESERVED1: u8 = 0x89;
pub const OP_RESERVED2: u8 = 0x8a;

// Arithmetic
pub const OP_1ADD: u8 = 0x8b;
pub const OP_1SUB: u8 = 0x8c;
pub const OP_2MUL: u8 = 0x8d;
pub const OP_2DIV: u8 = 0x8e;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_0NOTEQUAL: u8 = 0x92;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_LSHIFT: u8 = 0x98;
pub const OP_RSHIFT: u8 = 0x99;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;

// Crypto
pub const OP_RIPEMD160: u8 = 0xa6;
pub const OP_SHA1: u8 = 0xa7;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

// Expansion
pub const OP_NOP1: u8 = 0xb0;
pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xb1;
/// Alias for `OP_CHECKLOCKTIMEVERIFY`.
pub const OP_NOP2: u8 = OP_CHECKLOCKTIMEVERIFY;
pub const OP_CHECKSEQUENCEVERIFY: u8 = 0xb2;
/// Alias for `OP_CHECKSEQUENCEVERIFY`.
pub const OP_NOP3: u8 = OP_CHECKSEQUENCEVERIFY;
pub const OP_NOP4: u8 = 0xb3;
pub const OP_NOP5: u8 = 0xb4;
pub const OP_NOP6: u8 = 0xb5;
pub const OP_NOP7: u8 = 0xb6;
pub const OP_NOP8: u8 = 0xb7;
pub const OP_NOP9: u8 = 0xb8;
pub const OP_NOP10: u8 = 0xb9;
pub const OP_CHECKSIGADD: u8 = 0xba;

// Template matching pseudo-opcodes
pub const OP_PUBKEYHASH: u8 = 0xfd;
pub const OP_PUBKEY: u8 = 0xfe;
pub const OP_INVALIDOPCODE: u8 = 0xff;

/// First byte value without an assigned mnemonic.
pub const FIRST_UNASSIGNED_OP: u8 = 0xbb;
/// Last byte value without an assigned mnemonic.
pub const LAST_UNASSIGNED_OP: u8 = 0xfc;

/// Assigned mnemonics without their `OP_` prefix.
const ASSIGNED: &[(&str, u8)] = &[
    ("0", OP_0),
    ("PUSHDATA1", OP_PUSHDATA1),
    ("PUSHDATA2", OP_PUSHDATA2),
    ("PUSHDATA4", OP_PUSHDATA4),
    ("1NEGATE", OP_1NEGATE),
    ("RESERVED", OP_RESERVED),
    ("1", OP_1),
    ("2", OP_2),
    ("3", OP_3),
    ("4", OP_4),
    ("5", OP_5),
    ("6", OP_6),
    ("7", OP_7),
    ("8", OP_8),
    ("9", OP_9),
    ("10", OP_10),
    ("11", OP_11),
    ("12", OP_12),
    ("13", OP_13),
    ("14", OP_14),
    ("15", OP_15),
    ("16", OP_16),
    ("NOP", OP_NOP),
    ("VER", OP_VER),
    ("IF", OP_IF),
    ("NOTIF", OP_NOTIF),
    ("VERIF", OP_VERIF),
    ("VERNOTIF", OP_VERNOTIF),
    ("ELSE", OP_ELSE),
    ("ENDIF", OP_ENDIF),
    ("VERIFY", OP_VERIFY),
    ("RETURN", OP_RETURN),
    ("TOALTSTACK", OP_TOALTSTACK),
    ("FROMALTSTACK", OP_FROMALTSTACK),
    ("2DROP", OP_2DROP),
    ("2DUP", OP_2DUP),
    ("3DUP", OP_3DUP),
    ("2OVER", OP_2OVER),
    ("2ROT", OP_2ROT),
    ("2SWAP", OP_2SWAP),
    ("IFDUP", OP_IFDUP),
    ("DEPTH", OP_DEPTH),
    ("DROP", OP_DROP),
    ("DUP", OP_DUP),
    ("NIP", OP_NIP),
    ("OVER", OP_OVER),
    ("PICK", OP_PICK),
    ("ROLL", OP_ROLL),
    ("ROT", OP_ROT),
    ("SWAP", OP_SWAP),
    ("TUCK", OP_TUCK),
    ("CAT", OP_CAT),
    ("SUBSTR", OP_SUBSTR),
    ("LEFT", OP_LEFT),
    ("RIGHT", OP_RIGHT),
    ("SIZE", OP_SIZE),
    ("INVERT", OP_INVERT),
    ("AND", OP_AND),
    ("OR", OP_OR),
    ("XOR", OP_XOR),
    ("EQUAL", OP_EQUAL),
    ("EQUALVERIFY", OP_EQUALVERIFY),
    ("RESERVED1", OP_RESERVED1),
    ("RESERVED2", OP_RESERVED2),
    ("1ADD", OP_1ADD),
    ("1SUB", OP_1SUB),
    ("2MUL", OP_2MUL),
    ("2DIV", OP_2DIV),
    ("NEGATE", OP_NEGATE),
    ("ABS", OP_ABS),
    ("NOT", OP_NOT),
    ("0NOTEQUAL", OP_0NOTEQUAL),
    ("ADD", OP_ADD),
    ("SUB", OP_SUB),
    ("MUL", OP_MUL),
    ("DIV", OP_DIV),
    ("MOD", OP_MOD),
    ("LSHIFT", OP_LSHIFT),
    ("RSHIFT", OP_RSHIFT),
    ("BOOLAND", OP_BOOLAND),
    ("BOOLOR", OP_BOOLOR),
    ("NUMEQUAL", OP_NUMEQUAL),
    ("NUMEQUALVERIFY", OP_NUMEQUALVERIFY),
    ("NUMNOTEQUAL", OP_NUMNOTEQUAL),
    ("LESSTHAN", OP_LESSTHAN),
    ("GREATERTHAN", OP_GREATERTHAN),
    ("LESSTHANOREQUAL", OP_LESSTHANOREQUAL),
    ("GREATERTHANOREQUAL", OP_GREATERTHANOREQUAL),
    ("MIN", OP_MIN),
    ("MAX", OP_MAX),
    ("WITHIN", OP_WITHIN),
    ("RIPEMD160", OP_RIPEMD160),
    ("SHA1", OP_SHA1),
    ("SHA256", OP_SHA256),
    ("HASH160", OP_HASH160),
    ("HASH256", OP_HASH256),
    ("CODESEPARATOR", OP_CODESEPARATOR),
    ("CHECKSIG", OP_CHECKSIG),
    ("CHECKSIGVERIFY", OP_CHECKSIGVERIFY),
    ("CHECKMULTISIG", OP_CHECKMULTISIG),
    ("CHECKMULTISIGVERIFY", OP_CHECKMULTISIGVERIFY),
    ("NOP1", OP_NOP1),
    ("CHECKLOCKTIMEVERIFY", OP_CHECKLOCKTIMEVERIFY),
    ("CHECKSEQUENCEVERIFY", OP_CHECKSEQUENCEVERIFY),
    ("NOP4", OP_NOP4),
    ("NOP5", OP_NOP5),
    ("NOP6", OP_NOP6),
    ("NOP7", OP_NOP7),
    ("NOP8", OP_NOP8),
    ("NOP9", OP_NOP9),
    ("NOP10", OP_NOP10),
    ("CHECKSIGADD", OP_CHECKSIGADD),
    ("PUBKEYHASH", OP_PUBKEYHASH),
    ("PUBKEY", OP_PUBKEY),
    ("INVALIDOPCODE", OP_INVALIDOPCODE),
];

/// Alternative spellings accepted by `lookup_by_name`.
const ALIASES: &[(&str, u8)] = &[
    ("FALSE", OP_FALSE),
    ("TRUE", OP_TRUE),
    ("NOP2", OP_NOP2),
    ("NOP3", OP_NOP3),
];

/// How an opcode byte behaves when a script is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeKind {
    /// Direct push: the opcode byte is the payload length (1..=75).
    PushBytes(u8),
    /// Length-prefixed push; the value is the width of the length field (1, 2 or 4).
    PushData(u8),
    /// Small integer constant: OP_0, OP_1NEGATE and OP_1..OP_16.
    Constant(i8),
    /// Everything else.
    Operator,
}

/// A single entry of the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode {
    value: u8,
    name: &'static str,
    kind: OpcodeKind,
}

impl Opcode {
    /// The opcode byte.
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Canonical mnemonic, including the `OP_` prefix.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// How the opcode treats the bytes that follow it.
    pub fn kind(&self) -> OpcodeKind {
        self.kind
    }

    /// True for direct and length-prefixed push opcodes (not OP_0).
    pub fn is_push(&self) -> bool {
        matches!(self.kind, OpcodeKind::PushBytes(_) | OpcodeKind::PushData(_))
    }

    /// True if the byte has no assigned mnemonic.
    pub fn is_unassigned(&self) -> bool {
        (FIRST_UNASSIGNED_OP..=LAST_UNASSIGNED_OP).contains(&self.value)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl From<u8> for Opcode {
    fn from(value: u8) -> Self {
        lookup_by_value(value)
    }
}

lazy_static! {
    static ref GENERATED_NAMES: Vec<String> = (0..=255u8)
        .map(|op| match op {
            0x01..=0x4b => format!("OP_DATA_{}", op),
            FIRST_UNASSIGNED_OP..=LAST_UNASSIGNED_OP => format!("OP_UNKNOWN{}", op),
            _ => String::new(),
        })
        .collect();

    static ref OPCODES: Vec<Opcode> = {
        let mut names: Vec<&'static str> =
            GENERATED_NAMES.iter().map(String::as_str).collect();
        for &(bare, value) in ASSIGNED {
            names[value as usize] = PREFIXED_NAMES[bare].as_str();
        }
        (0..=255u8)
            .map(|value| Opcode {
                value,
                name: names[value as usize],
                kind: kind_of(value),
            })
            .collect()
    };

    static ref PREFIXED_NAMES: HashMap<&'static str, String> = ASSIGNED
        .iter()
        .map(|&(bare, _)| (bare, format!("OP_{}", bare)))
        .collect();

    static ref NAME_TO_VALUE: HashMap<String, u8> = {
        let mut map = HashMap::new();
        for &(bare, value) in ASSIGNED.iter().chain(ALIASES) {
            map.insert(bare.to_string(), value);
        }
        for op in 0x01..=0x4bu8 {
            map.insert(format!("DATA_{}", op), op);
        }
        for op in FIRST_UNASSIGNED_OP..=LAST_UNASSIGNED_OP {
            map.insert(format!("UNKNOWN{}", op), op);
        }
        map
    };
}

fn kind_of(op: u8) -> OpcodeKind {
    match op {
        OP_0 => OpcodeKind::Constant(0),
        0x01..=0x4b => OpcodeKind::PushBytes(op),
        OP_PUSHDATA1 => OpcodeKind::PushData(1),
        OP_PUSHDATA2 => OpcodeKind::PushData(2),
        OP_PUSHDATA4 => OpcodeKind::PushData(4),
        OP_1NEGATE => OpcodeKind::Constant(-1),
        OP_1..=OP_16 => OpcodeKind::Constant((op - OP_1 + 1) as i8),
        _ => OpcodeKind::Operator,
    }
}

/// Look up the table entry for an opcode byte. Total over 0x00..=0xff.
pub fn lookup_by_value(op: u8) -> Opcode {
    OPCODES[op as usize]
}

/// Look up an opcode by mnemonic.
///
/// Matching is case-insensitive and the `OP_` prefix is optional, so
/// `OP_DUP`, `op_dup` and `DUP` all resolve to the same opcode. Aliases such
/// as `OP_FALSE` and `OP_NOP2` are accepted.
pub fn lookup_by_name(name: &str) -> Option<Opcode> {
    let upper = name.to_ascii_uppercase();
    let bare = upper.strip_prefix("OP_").unwrap_or(&upper);
    NAME_TO_VALUE.get(bare).map(|&op| lookup_by_value(op))
}

/// Canonical mnemonic for an opcode byte.
pub fn opcode_to_string(op: u8) -> &'static str {
    OPCODES[op as usize].name
}

/// Resolve a mnemonic to its opcode byte.
pub fn string_to_opcode(name: &str) -> Option<u8> {
    lookup_by_name(name).map(|o| o.value)
}

/// True for OP_0 and OP_1..OP_16.
pub fn is_small_int_op(op: u8) -> bool {
    op == OP_0 || (OP_1..=OP_16).contains(&op)
}

/// The integer pushed by OP_0 or OP_1..OP_16.
pub fn small_int_value(op: u8) -> Option<u8> {
    match op {
        OP_0 => Some(0),
        OP_1..=OP_16 => Some(op - OP_1 + 1),
        _ => None,
    }
}

/// The opcode that pushes `n`, for 0..=16.
pub fn small_int_op(n: u8) -> Option<u8> {
    match n {
        0 => Some(OP_0),
        1..=16 => Some(OP_1 + n - 1),
        _ => None,
    }
}
