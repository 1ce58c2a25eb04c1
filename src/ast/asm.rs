//! This module holds the instructions as they are written in assembly source.
//!
//! Operands here are stored in source order. See [`crate::ast::sim::SimInstr`]
//! for the order in which the operands are packed into an instruction word.

use super::{Addr27, Imm21, Offset13, Reg};
use super::sim::SimInstr;

/// An instruction as written in assembly source.
///
/// Each variant holds its operands in the order they appear on a source line.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmInstr {
    /// `LOAD reg, imm`: loads a 21-bit immediate into a register.
    LOAD(Reg, Imm21),
    /// `WRITE reg, addr`: stores a register into a fixed memory address.
    WRITE(Reg, Addr27),
    /// `READ dr, br, off`: loads `mem[br + off]` into `dr`.
    READ(Reg, Reg, Offset13),
    /// `BITREV sr, ar`: stores the bit-reversal of `sr` at the address held by `ar`.
    BITREV(Reg, Reg),
}

impl AsmInstr {
    /// The number of operands this instruction takes in source.
    pub fn operand_count(&self) -> usize {
        match self {
            AsmInstr::LOAD(..)   => 2,
            AsmInstr::WRITE(..)  => 2,
            AsmInstr::READ(..)   => 3,
            AsmInstr::BITREV(..) => 2,
        }
    }

    /// Converts this instruction into the form that is packed into an instruction word.
    ///
    /// This is where `READ`'s operands are reordered:
    /// its source order is `(dest, base, offset)`, but it is packed as `(offset, base, dest)`.
    ///
    /// ```
    /// use tetravm::ast::{Offset, Reg};
    /// use tetravm::ast::asm::AsmInstr;
    /// use tetravm::ast::sim::SimInstr;
    ///
    /// let r0 = Reg::new_trunc(0);
    /// let r2 = Reg::new_trunc(2);
    /// let asm = AsmInstr::READ(r0, r2, Offset::new_trunc(4));
    /// assert_eq!(asm.into_sim_instr(), SimInstr::READ(Offset::new_trunc(4), r2, r0));
    /// ```
    pub fn into_sim_instr(self) -> SimInstr {
        match self {
            AsmInstr::LOAD(dr, imm)       => SimInstr::LOAD(dr, imm),
            AsmInstr::WRITE(sr, addr)     => SimInstr::WRITE(sr, addr),
            AsmInstr::READ(dr, br, off)   => SimInstr::READ(off, br, dr),
            AsmInstr::BITREV(sr, ar)      => SimInstr::BITREV(sr, ar),
        }
    }
}
impl std::fmt::Display for AsmInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AsmInstr::LOAD(dr, imm)     => write!(f, "LOAD {}, {imm}", dr.reg_no()),
            AsmInstr::WRITE(sr, addr)   => write!(f, "WRITE {}, {addr}", sr.reg_no()),
            AsmInstr::READ(dr, br, off) => write!(f, "READ {}, {}, {off}", dr.reg_no(), br.reg_no()),
            AsmInstr::BITREV(sr, ar)    => write!(f, "BITREV {}, {}", sr.reg_no(), ar.reg_no()),
        }
    }
}
