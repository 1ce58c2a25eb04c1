//! An assembler and virtual machine for a small four-instruction ISA.
//!
//! Every instruction is a 40-bit word (5 bytes, little-endian),
//! with its opcode in the low 5 bits. There are four instructions:
//! - `LOAD reg, imm`: loads a constant into a register.
//! - `WRITE reg, addr`: stores a register into memory.
//! - `READ dest, base, offset`: loads from memory at a register plus an offset.
//! - `BITREV src, addr_reg`: stores the bit-reversal of a register into memory,
//!     at the address held in another register.
//!
//! # Usage
//!
//! To convert source code to a binary image, it must be assembled:
//! ```
//! use tetravm::asm::{assemble, assemble_debug, Image};
//!
//! let code = "
//!     ; store 100 at address 10
//!     LOAD 1, 100
//!     WRITE 1, 10
//! ";
//!
//! let image: Image = assemble(code).unwrap();
//! assert_eq!(image.len_words(), 2);
//! // OR, keeping track of which line made each word:
//! let image: Image = assemble_debug(code).unwrap();
//! ```
//!
//! Once an image has been created, it can be executed with the simulator
//! and memory can be read back out:
//! ```
//! # use tetravm::asm::assemble;
//! # let image = assemble("LOAD 1, 100\nWRITE 1, 10").unwrap();
//! use tetravm::sim::Simulator;
//! use tetravm::sim::inspect::{AddrRange, MemDump};
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_image(&image);
//! simulator.run().unwrap(); // <-- Result can be handled accordingly
//!
//! let dump = MemDump::new(&simulator.mem, AddrRange::new(10, 10).unwrap());
//! assert_eq!(dump.to_csv(), "Address,Value\r\n10,100\r\n");
//! ```
//!
//! If more granularity is needed for simulation, instructions can also be executed one at a time.
//! See the [`sim`] module for more details.
//!
//! The [`frontend`] module wraps all of this into file-level operations,
//! which the `tetravm` binary exposes on the command line.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod err;
pub mod frontend;
