//! The instruction word format.
//!
//! This module holds [`SimInstr`], which is the decoded form of an instruction word,
//! and the codec between it and the 40-bit word ([`SimInstr::encode`], [`SimInstr::decode`]).
//!
//! Every word is 5 bytes long and stored little-endian.
//! The opcode tag occupies bits 0-4 of every word. The remaining fields depend on the opcode
//! (bit ranges inclusive, LSB first):
//!
//! ```text
//! LOAD   (15): b = 5..=9   (register)     c = 10..=30 (21-bit immediate)
//! WRITE   (8): b = 5..=9   (register)     c = 10..=36 (27-bit address)
//! READ   (17): b = 5..=17  (13-bit offset) c = 18..=22 (base register)  d = 23..=27 (dest register)
//! BITREV (25): b = 5..=9   (register)     c = 10..=14 (address register)
//! ```
//!
//! Fields are masked to their width when packed. Bits outside of an opcode's fields
//! are zero when encoded and ignored when decoded.

use super::{Addr27, Imm21, Offset13, Reg};

/// The size of one instruction word in bytes.
pub const WORD_BYTES: usize = 5;

const WORD_MASK: u64 = (1 << (8 * WORD_BYTES)) - 1;

macro_rules! opcode_tags {
    ($Type:ident, {$($name:ident = $value:literal), +}) => {
        /// The opcode tag of an instruction, found in bits 0-4 of every word.
        ///
        /// The tags are fixed values, not sequential integers.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        #[repr(u8)]
        pub enum $Type {
            $(
                #[allow(missing_docs)]
                $name = $value
            ),+
        }
        impl TryFrom<u8> for $Type {
            type Error = DecodeErr;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok(Self::$name)),+,
                    _ => Err(DecodeErr::UnknownOpcode(value))
                }
            }
        }
    }
}
opcode_tags!(Opcode, {
    Load = 15,
    Write = 8,
    Read = 17,
    Bitrev = 25
});

/// Errors that can occur when decoding an instruction word.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DecodeErr {
    /// The opcode tag did not match any instruction.
    UnknownOpcode(u8),
}
impl std::fmt::Display for DecodeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeErr::UnknownOpcode(tag) => write!(f, "unknown opcode tag {tag}"),
        }
    }
}
impl std::error::Error for DecodeErr {}
impl crate::err::Error for DecodeErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            DecodeErr::UnknownOpcode(_) => Some("valid tags are 15 (LOAD), 8 (WRITE), 17 (READ) and 25 (BITREV)".into()),
        }
    }
}

/// A decoded instruction word.
///
/// Operands are held in the order of the word's fields (`b`, `c`, `d`).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimInstr {
    /// `reg[b] <- c`
    LOAD(Reg, Imm21),
    /// `mem[c] <- reg[b]`
    WRITE(Reg, Addr27),
    /// `reg[d] <- mem[reg[c] + b]`
    READ(Offset13, Reg, Reg),
    /// `mem[reg[c]] <- bit_reverse32(reg[b])`
    BITREV(Reg, Reg),
}

/// Extracts the field at bits `start..(start + len)` of the word.
fn field(word: u64, start: u32, len: u32) -> u64 {
    (word >> start) & ((1 << len) - 1)
}

impl SimInstr {
    /// Gets the opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            SimInstr::LOAD(..)   => Opcode::Load,
            SimInstr::WRITE(..)  => Opcode::Write,
            SimInstr::READ(..)   => Opcode::Read,
            SimInstr::BITREV(..) => Opcode::Bitrev,
        }
    }

    /// Encodes this instruction into a 40-bit word.
    ///
    /// ```
    /// use tetravm::ast::{Offset, Reg};
    /// use tetravm::ast::sim::SimInstr;
    ///
    /// let instr = SimInstr::LOAD(Reg::new_trunc(3), Offset::new_trunc(5));
    /// assert_eq!(instr.encode(), 15 | (3 << 5) | (5 << 10));
    /// ```
    pub fn encode(self) -> u64 {
        let tag = u64::from(self.opcode() as u8);
        let reg = |r: Reg| u64::from(r.reg_no());

        match self {
            SimInstr::LOAD(b, c)      => tag | (reg(b) << 5) | (u64::from(c.get()) << 10),
            SimInstr::WRITE(b, c)     => tag | (reg(b) << 5) | (u64::from(c.get()) << 10),
            SimInstr::READ(b, c, d)   => tag | (u64::from(b.get()) << 5) | (reg(c) << 18) | (reg(d) << 23),
            SimInstr::BITREV(b, c)    => tag | (reg(b) << 5) | (reg(c) << 10),
        }
    }

    /// Decodes a 40-bit word into an instruction.
    ///
    /// Bits above bit 39 are ignored.
    ///
    /// This fails with [`DecodeErr::UnknownOpcode`] if bits 0-4 don't hold a known tag.
    pub fn decode(word: u64) -> Result<Self, DecodeErr> {
        let word = word & WORD_MASK;
        let reg = |start| Reg::new_trunc(field(word, start, 5));

        let instr = match Opcode::try_from(field(word, 0, 5) as u8)? {
            Opcode::Load   => SimInstr::LOAD(reg(5), Imm21::new_trunc(field(word, 10, 21))),
            Opcode::Write  => SimInstr::WRITE(reg(5), Addr27::new_trunc(field(word, 10, 27))),
            Opcode::Read   => SimInstr::READ(Offset13::new_trunc(field(word, 5, 13)), reg(18), reg(23)),
            Opcode::Bitrev => SimInstr::BITREV(reg(5), reg(10)),
        };

        Ok(instr)
    }

    /// Encodes this instruction into its 5-byte little-endian representation.
    pub fn to_bytes(self) -> [u8; WORD_BYTES] {
        let bytes = self.encode().to_le_bytes();
        let mut out = [0; WORD_BYTES];
        out.copy_from_slice(&bytes[..WORD_BYTES]);
        out
    }

    /// Decodes an instruction from its 5-byte little-endian representation.
    pub fn from_bytes(bytes: [u8; WORD_BYTES]) -> Result<Self, DecodeErr> {
        Self::decode(word_from_bytes(bytes))
    }
}

/// Reads a 5-byte little-endian word.
pub fn word_from_bytes(bytes: [u8; WORD_BYTES]) -> u64 {
    let mut buf = [0; 8];
    buf[..WORD_BYTES].copy_from_slice(&bytes);
    u64::from_le_bytes(buf)
}

impl std::fmt::Display for SimInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimInstr::LOAD(b, c)    => write!(f, "LOAD {b}, {c}"),
            SimInstr::WRITE(b, c)   => write!(f, "WRITE {b}, {c}"),
            SimInstr::READ(b, c, d) => write!(f, "READ {d}, {c}, {b}"),
            SimInstr::BITREV(b, c)  => write!(f, "BITREV {b}, {c}"),
        }
    }
}
