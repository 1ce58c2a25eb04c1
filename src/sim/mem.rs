//! Memory handling for the simulator.
//!
//! This module consists of:
//! - [`Mem`]: The memory.
//! - [`RegFile`]: The register file.
//!
//! Both hold 32-bit cells which are zero when created.
//! Out-of-range accesses never panic; the checked accessors return `None` instead,
//! leaving the simulator to decide what an out-of-range access does.

use crate::ast::{Reg, NUM_REGS};

/// The default number of cells in memory.
pub const DEFAULT_MEM_SIZE: usize = 1024;

/// Memory.
///
/// This is a fixed-size array of 32-bit cells, addressed from 0.
/// Its size is chosen when created (see [`SimFlags::mem_size`]).
///
/// Memory can be accessed with [`Mem::get`] and [`Mem::get_mut`],
/// both of which accept any address and return `None` if it is out of range.
///
/// # Example
///
/// ```
/// use tetravm::sim::mem::Mem;
///
/// let mut mem = Mem::new(16);
/// assert_eq!(mem.get(3), Some(0));
///
/// if let Some(cell) = mem.get_mut(3) {
///     *cell = 100;
/// }
/// assert_eq!(mem.get(3), Some(100));
///
/// // Out of range:
/// assert_eq!(mem.get(16), None);
/// assert!(mem.get_mut(9999).is_none());
/// ```
///
/// [`SimFlags::mem_size`]: super::SimFlags::mem_size
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Mem {
    data: Box<[u32]>
}
impl Mem {
    /// Creates a new zeroed memory with the given number of cells.
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size].into_boxed_slice() }
    }

    /// The number of cells in memory.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether memory has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the address lies within memory.
    pub fn contains(&self, addr: u64) -> bool {
        addr < self.data.len() as u64
    }

    /// Gets the value at the given address, or `None` if the address is out of range.
    pub fn get(&self, addr: u64) -> Option<u32> {
        let i = usize::try_from(addr).ok()?;
        self.data.get(i).copied()
    }

    /// Gets a mutable reference to the cell at the given address,
    /// or `None` if the address is out of range.
    pub fn get_mut(&mut self, addr: u64) -> Option<&mut u32> {
        let i = usize::try_from(addr).ok()?;
        self.data.get_mut(i)
    }

    /// Sets every cell back to zero.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Gets the cells of memory as a slice.
    pub fn as_slice(&self) -> &[u32] {
        &self.data
    }
}
impl Default for Mem {
    fn default() -> Self {
        Self::new(DEFAULT_MEM_SIZE)
    }
}

/// The register file.
///
/// This struct can be indexed with a [`Reg`] (which is always in range),
/// or accessed by raw index with [`RegFile::get`] and [`RegFile::get_mut`].
///
/// # Example
///
/// ```
/// use tetravm::sim::mem::RegFile;
/// use tetravm::ast::Reg;
///
/// let mut reg = RegFile::new();
/// let r3 = Reg::try_from(3).unwrap();
/// reg[r3] = 11;
/// assert_eq!(reg[r3], 11);
/// assert_eq!(reg.get(3), Some(11));
/// assert_eq!(reg.get(32), None);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct RegFile([u32; NUM_REGS]);
impl RegFile {
    /// Creates a register file with every register set to zero.
    pub fn new() -> Self {
        Self([0; NUM_REGS])
    }

    /// Gets the value of the register at the given index, or `None` if there is no such register.
    pub fn get(&self, index: usize) -> Option<u32> {
        self.0.get(index).copied()
    }

    /// Gets a mutable reference to the register at the given index, or `None` if there is no such register.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut u32> {
        self.0.get_mut(index)
    }

    /// Sets every register back to zero.
    pub fn clear(&mut self) {
        self.0 = [0; NUM_REGS];
    }

    /// Gets the registers as a slice, ordered by register number.
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}
impl Default for RegFile {
    fn default() -> Self {
        Self::new()
    }
}
impl std::ops::Index<Reg> for RegFile {
    type Output = u32;

    fn index(&self, index: Reg) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}
impl std::ops::IndexMut<Reg> for RegFile {
    fn index_mut(&mut self, index: Reg) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Reg, NUM_REGS};

    use super::{Mem, RegFile, DEFAULT_MEM_SIZE};

    #[test]
    fn test_mem_bounds() {
        let mut mem = Mem::default();
        assert_eq!(mem.len(), DEFAULT_MEM_SIZE);
        assert!(mem.as_slice().iter().all(|&v| v == 0));

        assert!(mem.contains(1023));
        assert!(!mem.contains(1024));
        assert_eq!(mem.get(1023), Some(0));
        assert_eq!(mem.get(1024), None);
        assert_eq!(mem.get(u64::MAX), None);
        assert!(mem.get_mut(u64::MAX).is_none());

        *mem.get_mut(1023).unwrap() = 7;
        assert_eq!(mem.get(1023), Some(7));
        mem.clear();
        assert_eq!(mem.get(1023), Some(0));
    }

    #[test]
    fn test_mem_empty() {
        let mem = Mem::new(0);
        assert!(mem.is_empty());
        assert_eq!(mem.get(0), None);
    }

    #[test]
    fn test_reg_file() {
        let mut reg = RegFile::new();
        assert_eq!(reg.as_slice(), &[0; NUM_REGS]);

        let r31 = Reg::try_from(31).unwrap();
        reg[r31] = u32::MAX;
        assert_eq!(reg.get(31), Some(u32::MAX));
        assert_eq!(reg.get(NUM_REGS), None);
        assert!(reg.get_mut(NUM_REGS).is_none());

        reg.clear();
        assert_eq!(reg[r31], 0);
    }
}
