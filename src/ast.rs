//! Components relating to the instructions of the ISA.
//!
//! These components together are used to construct...
//! - [`asm::AsmInstr`] (a data structure holding an assembly source code instruction),
//! - and [`sim::SimInstr`] (a data structure holding a decoded instruction word).

pub mod asm;
pub mod sim;

use std::num::TryFromIntError;

/// The number of registers in the register file.
pub const NUM_REGS: usize = 32;

/// A register. Must be between 0 and 31.
///
/// Every register operand of every instruction is a 5-bit field,
/// so any `Reg` can be packed into an instruction word without loss.
///
/// This `Reg` struct can be constructed with [`Reg::try_from`]
/// or (if masking is desired) [`Reg::new_trunc`].
///
/// ## Examples
///
/// ```text
/// LOAD 3, 100
///      ~
/// READ R0, R2, 4
///      ~~  ~~
/// ```
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct Reg(pub(crate) u8);

impl Reg {
    /// Creates a register from the low 5 bits of the given value,
    /// discarding the rest.
    ///
    /// ```
    /// # use tetravm::ast::Reg;
    /// assert_eq!(Reg::new_trunc(3).reg_no(), 3);
    /// assert_eq!(Reg::new_trunc(33).reg_no(), 1);
    /// ```
    pub fn new_trunc(value: u64) -> Self {
        Reg((value & 0x1F) as u8)
    }

    /// Gets the register number of this [`Reg`]. This is always between 0 and 31.
    pub fn reg_no(self) -> u8 {
        self.0
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}
impl From<Reg> for usize {
    // Used for indexing the reg file in [`crate::sim::mem::RegFile`].
    fn from(value: Reg) -> Self {
        usize::from(value.0)
    }
}
impl TryFrom<u8> for Reg {
    type Error = TryFromIntError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0..=31 => Ok(Reg(value)),
            // HACKy, but there's no other way to create this error
            _      => u8::try_from(256).map(|_| unreachable!("should've been TryFromIntError")),
        }
    }
}

/// An unsigned immediate, address, or offset field of an instruction word.
///
/// `N` indicates the bit width of the field in the word.
///
/// ## Examples
///
/// - `Offset<21>` is `LOAD`'s immediate (see [`Imm21`]).
/// - `Offset<27>` is `WRITE`'s absolute address (see [`Addr27`]).
/// - `Offset<13>` is `READ`'s offset from its base register (see [`Offset13`]).
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Offset<const N: u32>(u32);

/// The 21-bit immediate of `LOAD`.
pub type Imm21 = Offset<21>;
/// The 27-bit memory address of `WRITE`.
pub type Addr27 = Offset<27>;
/// The 13-bit offset of `READ`.
pub type Offset13 = Offset<13>;

impl<const N: u32> std::fmt::Display for Offset<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
impl<const N: u32> std::fmt::Binary for Offset<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Binary::fmt(&self.0, f)
    }
}
impl<const N: u32> std::fmt::UpperHex for Offset<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::UpperHex::fmt(&self.0, f)
    }
}

/// The errors that can result from calling [`Offset::new`].
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum OffsetNewErr {
    /// The provided value cannot fit an unsigned integer of the given bitsize.
    CannotFitUnsigned(u32),
}

impl std::fmt::Display for OffsetNewErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OffsetNewErr::CannotFitUnsigned(n) => write!(f, "value is too big for unsigned {n}-bit integer"),
        }
    }
}
impl std::error::Error for OffsetNewErr {}
impl crate::err::Error for OffsetNewErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            OffsetNewErr::CannotFitUnsigned(n) => Some(format!("the range for an unsigned {n}-bit integer is [0, {}]", Offset::<32>::mask_of(*n)).into()),
        }
    }
}

impl<const N: u32> Offset<N> {
    /// The largest value this field can hold.
    pub const MAX: u32 = Self::mask_of(N);

    const fn mask_of(n: u32) -> u32 {
        match n >= 32 {
            true  => u32::MAX,
            false => (1 << n) - 1,
        }
    }

    /// Creates a new field value.
    /// This must fit within `N` bits, otherwise an error is raised.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tetravm::ast::Offset;
    /// #
    /// assert!(Offset::<5>::new(31).is_ok());
    /// assert!(Offset::<5>::new(32).is_err());
    /// ```
    pub fn new(n: u64) -> Result<Self, OffsetNewErr> {
        match n <= u64::from(Self::MAX) {
            true  => Ok(Offset(n as u32)),
            false => Err(OffsetNewErr::CannotFitUnsigned(N)),
        }
    }

    /// Creates a new field value by keeping the low `N` bits of the integer
    /// and discarding the rest.
    ///
    /// This mirrors how a fixed-width hardware field behaves: overflow is
    /// truncated, never raised.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tetravm::ast::Offset;
    /// #
    /// assert_eq!(Offset::<5>::new_trunc(15).get(), 15);
    /// assert_eq!(Offset::<5>::new_trunc(32).get(), 0);
    /// assert_eq!(Offset::<5>::new_trunc(33).get(), 1);
    /// ```
    pub fn new_trunc(n: u64) -> Self {
        Offset((n & u64::from(Self::MAX)) as u32)
    }

    /// Gets the value of the field.
    pub fn get(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::{Addr27, Imm21, Offset, OffsetNewErr, Offset13, Reg};

    #[test]
    fn test_field_bounds() {
        assert_eq!(Imm21::MAX, 0x1F_FFFF);
        assert_eq!(Addr27::MAX, 0x7FF_FFFF);
        assert_eq!(Offset13::MAX, 0x1FFF);

        assert_eq!(Imm21::new(0x1F_FFFF).map(|o| o.get()), Ok(0x1F_FFFF));
        assert_eq!(Imm21::new(0x20_0000), Err(OffsetNewErr::CannotFitUnsigned(21)));
        assert_eq!(Offset::<32>::new(u64::from(u32::MAX)).map(|o| o.get()), Ok(u32::MAX));
    }

    #[test]
    fn test_truncation() {
        assert_eq!(Imm21::new_trunc(0x20_0005).get(), 5);
        assert_eq!(Addr27::new_trunc(u64::MAX).get(), 0x7FF_FFFF);
        assert_eq!(Offset13::new_trunc(0x2000).get(), 0);
        assert_eq!(Reg::new_trunc(u64::MAX), Reg(31));
    }

    #[test]
    fn test_reg_try_from() {
        assert_eq!(Reg::try_from(0), Ok(Reg(0)));
        assert_eq!(Reg::try_from(31), Ok(Reg(31)));
        assert!(Reg::try_from(32).is_err());
        assert_eq!(Reg(7).to_string(), "R7");
    }
}
