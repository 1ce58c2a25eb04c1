//! Simulating and execution of assembled images.
//!
//! This module is focused on executing fully assembled code (i.e., [`Image`]).
//!
//! This module consists of:
//! - [`Simulator`]: The struct that simulates assembled code.
//! - [`mem`]: The module handling memory and the register file.
//! - [`inspect`]: The module handling memory dumps of a finished simulation.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Simulator and load an image to it:
//!
//! ```
//! use tetravm::asm::assemble;
//! use tetravm::sim::Simulator;
//!
//! let image = assemble("LOAD 1, 100\nWRITE 1, 10").unwrap();
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_image(&image);
//! simulator.run().unwrap();
//!
//! assert!(simulator.hit_halt());
//! assert_eq!(simulator.mem.get(10), Some(100));
//! ```
//!
//! The instruction stream is executed exactly once, from the top.
//! There are no jumps, so a run always ends once the program counter passes the last complete word.
//!
//! ## Flags
//!
//! Here, we define `simulator` to have the default flags.
//! We could also configure the simulator by editing the flags. For example,
//! if we wish to have a smaller memory, we can edit the flags like so:
//!
//! ```
//! # use tetravm::sim::{Simulator, SimFlags};
//! let mut simulator = Simulator::new(SimFlags { mem_size: 64 });
//! assert_eq!(simulator.mem.len(), 64);
//! ```
//!
//! All of the available flags can be found in [`SimFlags`].
//!
//! ## Execution
//!
//! Beyond the basic [`Simulator::run`] (which runs until the end of the image),
//! [`Simulator::step_in`] executes one instruction at a time.
//! A run can continue from wherever stepping left off.
//!
//! ```
//! use tetravm::asm::assemble;
//! use tetravm::sim::Simulator;
//! use tetravm::ast::Reg;
//!
//! let src = "
//!     LOAD 0, 1
//!     LOAD 0, 2
//!     LOAD 0, 3
//! ";
//! let image = assemble(src).unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_image(&image);
//!
//! // Running step by step:
//! let r0 = Reg::try_from(0).unwrap();
//! sim.step_in().unwrap();
//! assert_eq!(sim.reg_file[r0], 1);
//! sim.step_in().unwrap();
//! assert_eq!(sim.reg_file[r0], 2);
//! sim.step_in().unwrap();
//! assert_eq!(sim.reg_file[r0], 3);
//! assert_eq!(sim.pc, 15);
//! ```
//!
//! ## Querying State
//!
//! - If you wish to access the PC, it can simply be done through the `sim.pc` field.
//!   The PC is a byte offset into the loaded image.
//! - If you wish to access the register file, you can access it through the `sim.reg_file` field.
//! - If you wish to access the memory, you can access it through the `sim.mem` field.
//!
//! ## Unknown opcodes
//!
//! A word whose opcode tag is not one of the four instructions stops the run with
//! [`SimErr::UnknownOpcode`]. The word has no effect and the PC is left pointing at it.
//!
//! ```
//! use tetravm::sim::{Simulator, SimErr};
//!
//! let mut sim = Simulator::new(Default::default());
//! // LOAD 3, 5, then a word with tag 0
//! sim.load_bytes(vec![0x6F, 0x14, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
//!
//! assert_eq!(sim.run(), Err(SimErr::UnknownOpcode { tag: 0, pc: 5 }));
//! assert_eq!(sim.pc, 5);
//! assert!(!sim.hit_halt());
//! ```
pub mod mem;
pub mod inspect;

use crate::asm::Image;
use crate::ast::sim::{word_from_bytes, SimInstr, WORD_BYTES};
use crate::err::DecodeErr;

use self::mem::{Mem, RegFile, DEFAULT_MEM_SIZE};

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimErr {
    /// A word was decoded, but its opcode tag was not recognized.
    ///
    /// This stops the run. The word has no effect, and the PC remains at `pc`.
    UnknownOpcode {
        /// The opcode tag (bits 0-4 of the word).
        tag: u8,
        /// The byte offset of the word in the image.
        pc: usize
    },
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::UnknownOpcode { tag, pc } => write!(f, "unknown opcode tag {tag} at offset {pc}"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::UnknownOpcode { tag, .. } => crate::err::Error::help(&DecodeErr::UnknownOpcode(*tag))
                .map(|h| h.into_owned().into()),
        }
    }
}

/// Anything that can cause a step to abruptly fail to finish.
enum StepBreak {
    /// The end of the image was reached.
    Halt,
    /// A simulation error occurred.
    Err(SimErr),
}
impl From<SimErr> for StepBreak {
    fn from(value: SimErr) -> Self {
        Self::Err(value)
    }
}

/// Configuration flags for [`Simulator`].
///
/// Read the field descriptions for more details.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// The number of cells in memory.
    ///
    /// This flag only goes into effect after a `Simulator::new` or `Simulator::reset` call.
    ///
    /// By default, this is 1024.
    pub mem_size: usize,
}
impl Default for SimFlags {
    fn default() -> Self {
        Self {
            mem_size: DEFAULT_MEM_SIZE,
        }
    }
}

/// Reverses the bits of a 32-bit value (bit 0 swaps with bit 31, bit 1 with bit 30, and so on).
///
/// ```
/// use tetravm::sim::bit_reverse32;
///
/// assert_eq!(bit_reverse32(1), 0x8000_0000);
/// assert_eq!(bit_reverse32(0b1011), 0xD000_0000);
/// ```
pub fn bit_reverse32(v: u32) -> u32 {
    v.reverse_bits()
}

/// Executes assembled code.
#[derive(Debug)]
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset`] resets these values.

    /// The simulator's memory.
    pub mem: Mem,

    /// The simulator's register file.
    pub reg_file: RegFile,

    /// The program counter, a byte offset into the loaded image.
    pub pc: usize,

    /// The number of instructions successfully run since this `Simulator` was initialized.
    ///
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,

    /// Whether the last execution reached the end of the image.
    halted: bool,

    // ------------------ CONFIG STATE ------------------
    // Calling [`Simulator::reset`] does not reset these values.

    /// The loaded image.
    image: Vec<u8>,

    /// Configuration settings for the simulator.
    ///
    /// These are preserved between resets.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,
}

impl Simulator {
    /// Creates a new simulator with the provided flags, with zeroed registers and memory
    /// and without a loaded image.
    pub fn new(flags: SimFlags) -> Self {
        Self {
            mem: Mem::new(flags.mem_size),
            reg_file: RegFile::new(),
            pc: 0,
            instructions_run: 0,
            halted: false,

            image: vec![],
            flags,
        }
    }

    /// Resets the simulator.
    ///
    /// This zeroes registers and memory and moves the PC back to the start,
    /// keeping the flags and the loaded image.
    pub fn reset(&mut self) {
        let flags = self.flags;
        let image = std::mem::take(&mut self.image);

        *self = Simulator::new(flags);
        self.image = image;
    }

    /// Loads an image into the simulator and moves the PC to its start.
    ///
    /// This does not clear registers or memory. Use [`Simulator::reset`] for that.
    pub fn load_image(&mut self, image: &Image) {
        self.load_bytes(image.as_bytes().to_vec());
    }

    /// Loads raw bytes (e.g., a binary read from disk) as the image to execute
    /// and moves the PC to its start.
    ///
    /// A trailing partial word is accepted but never executed.
    ///
    /// This does not clear registers or memory. Use [`Simulator::reset`] for that.
    pub fn load_bytes(&mut self, bytes: Vec<u8>) {
        let trailing = bytes.len() % WORD_BYTES;
        log::debug!("loaded image of {} byte(s), {} word(s)", bytes.len(), bytes.len() / WORD_BYTES);
        if trailing != 0 {
            log::warn!("image ends with a partial word of {trailing} byte(s), which will not be executed");
        }

        self.image = bytes;
        self.pc = 0;
    }

    /// The bytes of the loaded image.
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    /// Whether the PC has passed the last complete word of the image.
    pub fn at_end(&self) -> bool {
        self.fetch().is_none()
    }

    /// Indicates whether the last execution of the simulator ran to the end of the image.
    pub fn hit_halt(&self) -> bool {
        self.halted
    }

    /// Executes the program until the end of the image.
    ///
    /// This stops early if a word has an unknown opcode, returning an error
    /// and leaving the PC on that word.
    pub fn run(&mut self) -> Result<(), SimErr> {
        self.halted = false;
        let start = self.instructions_run;

        let result = loop {
            match self.step() {
                Ok(()) => {},
                Err(StepBreak::Halt) => break Ok(()),
                Err(StepBreak::Err(e)) => break Err(e),
            }
        };

        log::info!("executed {} instruction(s), pc = {}", self.instructions_run.wrapping_sub(start), self.pc);
        self.halted = result.is_ok();
        result
    }

    /// Reads the word at the PC, if there is a complete one.
    fn fetch(&self) -> Option<u64> {
        let end = self.pc.checked_add(WORD_BYTES)?;
        let bytes = self.image.get(self.pc..end)?;

        let mut word = [0; WORD_BYTES];
        word.copy_from_slice(bytes);
        Some(word_from_bytes(word))
    }

    /// Simulate one step, executing one instruction.
    fn step(&mut self) -> Result<(), StepBreak> {
        let word = self.fetch().ok_or(StepBreak::Halt)?;
        let instr = SimInstr::decode(word).map_err(|DecodeErr::UnknownOpcode(tag)| {
            log::warn!("unknown opcode tag {tag} at offset {}, stopping", self.pc);
            SimErr::UnknownOpcode { tag, pc: self.pc }
        })?;

        log::trace!("{:06}: {instr}", self.pc);
        self.execute(instr);

        self.pc += WORD_BYTES;
        self.instructions_run = self.instructions_run.wrapping_add(1);
        Ok(())
    }

    /// Applies the effect of an instruction to the registers and memory.
    ///
    /// Out-of-range memory accesses are never errors:
    /// stores are skipped and loads produce 0.
    fn execute(&mut self, instr: SimInstr) {
        match instr {
            SimInstr::LOAD(dr, imm) => {
                self.reg_file[dr] = imm.get();
            },
            SimInstr::WRITE(sr, addr) => {
                let value = self.reg_file[sr];
                match self.mem.get_mut(u64::from(addr.get())) {
                    Some(cell) => *cell = value,
                    None => log::trace!("WRITE to {addr} is out of range, skipped"),
                }
            },
            SimInstr::READ(off, br, dr) => {
                let addr = u64::from(self.reg_file[br]) + u64::from(off.get());
                self.reg_file[dr] = self.mem.get(addr).unwrap_or(0);
            },
            SimInstr::BITREV(sr, ar) => {
                let value = bit_reverse32(self.reg_file[sr]);
                let addr = self.reg_file[ar];
                match self.mem.get_mut(u64::from(addr)) {
                    Some(cell) => *cell = value,
                    None => log::trace!("BITREV to {addr} is out of range, skipped"),
                }
            },
        }
    }

    /// Simulate one step, executing one instruction.
    ///
    /// This does nothing if the PC is already at the end of the image.
    pub fn step_in(&mut self) -> Result<(), SimErr> {
        match self.step() {
            Ok(()) => Ok(()),
            Err(StepBreak::Halt) => {
                self.halted = true;
                Ok(())
            },
            Err(StepBreak::Err(e)) => Err(e)
        }
    }
}
impl Default for Simulator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{assemble, Image};
    use crate::ast::sim::SimInstr;
    use crate::ast::{Offset, Reg};

    use super::{bit_reverse32, SimErr, SimFlags, Simulator};

    fn reg(n: u8) -> Reg {
        Reg::try_from(n).unwrap()
    }
    fn sim_with(src: &str) -> Simulator {
        let image = assemble(src).unwrap();
        let mut sim = Simulator::new(Default::default());
        sim.load_image(&image);
        sim
    }

    #[test]
    fn test_load() {
        let mut sim = sim_with("LOAD 3, 5");
        sim.step_in().unwrap();

        assert_eq!(sim.reg_file[reg(3)], 5);
        assert_eq!(sim.pc, 5);
        assert!(sim.mem.as_slice().iter().all(|&v| v == 0));
        assert_eq!(sim.instructions_run, 1);

        // nothing left to execute
        sim.step_in().unwrap();
        assert_eq!(sim.pc, 5);
        assert_eq!(sim.instructions_run, 1);
    }

    #[test]
    fn test_write_then_read() {
        let mut sim = sim_with("
            LOAD 1, 100
            WRITE 1, 10
            LOAD 2, 10
            READ 0, 2, 0
        ");
        sim.run().unwrap();

        assert!(sim.hit_halt());
        assert_eq!(sim.mem.get(10), Some(100));
        assert_eq!(sim.reg_file[reg(0)], 100);
        assert_eq!(sim.pc, 20);
    }

    #[test]
    fn test_read_offset() {
        let mut sim = sim_with("
            LOAD 1, 77
            WRITE 1, 14
            LOAD 2, 10
            READ 5, 2, 4
        ");
        sim.run().unwrap();
        assert_eq!(sim.reg_file[reg(5)], 77);
    }

    #[test]
    fn test_out_of_range_accesses() {
        let mut sim = sim_with("
            LOAD 1, 42
            LOAD 0, 7
            WRITE 1, 9999
            LOAD 2, 2000
            BITREV 1, 2
            READ 0, 2, 0
        ");
        sim.run().unwrap();

        assert!(sim.hit_halt());
        assert!(sim.mem.as_slice().iter().all(|&v| v == 0), "memory should be unchanged");
        // out of range READ yields 0
        assert_eq!(sim.reg_file[reg(0)], 0);
    }

    #[test]
    fn test_read_past_memory_end() {
        // base + offset straddles the end of memory
        let mut sim = sim_with("
            LOAD 1, 5
            WRITE 1, 1023
            LOAD 2, 1020
            READ 3, 2, 3
            READ 4, 2, 4
        ");
        sim.run().unwrap();
        assert_eq!(sim.reg_file[reg(3)], 5);
        assert_eq!(sim.reg_file[reg(4)], 0);
    }

    #[test]
    fn test_bitrev() {
        let mut sim = sim_with("
            LOAD 0, 1
            LOAD 1, 3
            BITREV 0, 1
        ");
        sim.run().unwrap();
        assert_eq!(sim.mem.get(3), Some(0x8000_0000));

        assert_eq!(bit_reverse32(0), 0);
        assert_eq!(bit_reverse32(u32::MAX), u32::MAX);
        assert_eq!(bit_reverse32(0x8000_0000), 1);
        assert_eq!(bit_reverse32(0x0000_FFFF), 0xFFFF_0000);
        for v in [0x1234_5678, 0xDEAD_BEEF, 0x0F0F_0F0F] {
            assert_eq!(bit_reverse32(bit_reverse32(v)), v);
        }
    }

    #[test]
    fn test_unknown_opcode() {
        let mut bytes = assemble("LOAD 3, 5").unwrap().into_bytes();
        bytes.extend([0x1F, 0, 0, 0, 0]); // tag 31
        bytes.extend(assemble("LOAD 4, 6").unwrap().into_bytes());

        let mut sim = Simulator::new(Default::default());
        sim.load_bytes(bytes);

        assert_eq!(sim.run(), Err(SimErr::UnknownOpcode { tag: 31, pc: 5 }));
        assert!(!sim.hit_halt());
        assert_eq!(sim.pc, 5);
        assert_eq!(sim.reg_file[reg(3)], 5);
        assert_eq!(sim.reg_file[reg(4)], 0, "instructions after the bad word should not run");
        assert_eq!(sim.instructions_run, 1);

        // stepping again fails the same way
        assert_eq!(sim.step_in(), Err(SimErr::UnknownOpcode { tag: 31, pc: 5 }));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = assemble("LOAD 3, 5").unwrap().into_bytes();
        // a partial LOAD 4, 6
        bytes.extend(&SimInstr::LOAD(reg(4), Offset::new_trunc(6)).to_bytes()[..4]);

        let mut sim = Simulator::new(Default::default());
        sim.load_bytes(bytes);
        sim.run().unwrap();

        assert!(sim.hit_halt());
        assert_eq!(sim.pc, 5);
        assert_eq!(sim.reg_file[reg(4)], 0);
    }

    #[test]
    fn test_empty_image() {
        let mut sim = Simulator::new(Default::default());
        sim.load_image(&Image::empty());
        sim.run().unwrap();

        assert!(sim.hit_halt());
        assert!(sim.at_end());
        assert_eq!(sim.instructions_run, 0);
    }

    #[test]
    fn test_mem_size_flag() {
        let mut sim = Simulator::new(SimFlags { mem_size: 8 });
        sim.load_image(&assemble("LOAD 1, 9\nWRITE 1, 7\nWRITE 1, 8").unwrap());
        sim.run().unwrap();

        assert_eq!(sim.mem.len(), 8);
        assert_eq!(sim.mem.get(7), Some(9));
        assert_eq!(sim.mem.get(8), None);
    }

    #[test]
    fn test_step_then_run() {
        let mut sim = sim_with("LOAD 0, 1\nLOAD 0, 2\nWRITE 0, 4\nLOAD 0, 3");

        sim.step_in().unwrap();
        sim.step_in().unwrap();
        assert!(!sim.hit_halt());
        assert_eq!(sim.reg_file[reg(0)], 2);
        assert_eq!(sim.pc, 10);

        // the run picks up from the current PC
        sim.run().unwrap();
        assert!(sim.hit_halt());
        assert_eq!(sim.mem.get(4), Some(2));
        assert_eq!(sim.reg_file[reg(0)], 3);
        assert_eq!(sim.instructions_run, 4);

        // stepping past the end halts without effect
        sim.step_in().unwrap();
        assert!(sim.hit_halt());
        assert_eq!(sim.pc, 20);
    }

    #[test]
    fn test_reset() {
        let mut sim = sim_with("LOAD 0, 1\nWRITE 0, 0");
        sim.run().unwrap();
        assert_eq!(sim.mem.get(0), Some(1));

        sim.reset();
        assert_eq!(sim.pc, 0);
        assert_eq!(sim.mem.get(0), Some(0));
        assert_eq!(sim.reg_file[reg(0)], 0);
        assert_eq!(sim.instructions_run, 0);
        assert_eq!(sim.image().len(), 10);

        // image is still loaded
        sim.run().unwrap();
        assert_eq!(sim.mem.get(0), Some(1));
    }
}
