//! File-level entry points for assembling and executing programs.
//!
//! These functions tie the library together the way a command line driver uses it:
//! - [`assemble`] reads a source file and writes a binary image.
//! - [`execute`] reads a binary image, runs it, and writes a CSV dump of a memory range.
//!
//! Both return an [`Outcome`] that decides the exit status.
//! Failing to read or write a file is fatal and returns [`FrontendErr`] instead.
//!
//! User-facing messages (error reports, listings, summaries) are written to a
//! provided writer (see [`assemble_with`] and [`execute_with`]);
//! [`assemble`] and [`execute`] write them to stderr and stdout.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::asm::encoding::{ImageFormat, TextFormat};
use crate::asm::{assemble_debug, SourceInfo};
use crate::err::report;
use crate::sim::inspect::{AddrRange, MemDump};
use crate::sim::mem::DEFAULT_MEM_SIZE;
use crate::sim::{SimFlags, Simulator};

/// Whether an invocation succeeded.
///
/// This is not an error. A failed outcome has already been reported,
/// and only decides the exit status.
#[must_use]
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Outcome {
    /// Everything completed.
    Success,
    /// Something was reported as failed (e.g., a malformed line).
    Failure
}
impl Outcome {
    /// Whether this is [`Outcome::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// The process exit status for this outcome (0 for success, 1 for failure).
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Success => 0,
            Outcome::Failure => 1,
        }
    }
}

/// Options for [`execute`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ExecOpts {
    /// If true, a run that stops on an unknown opcode is a failure.
    ///
    /// By default, this flag is `false`.
    pub strict: bool,

    /// The number of cells in memory.
    ///
    /// By default, this is 1024.
    pub mem_size: usize,
}
impl Default for ExecOpts {
    fn default() -> Self {
        Self { strict: false, mem_size: DEFAULT_MEM_SIZE }
    }
}

/// Fatal errors from the frontend.
#[derive(Debug)]
pub enum FrontendErr {
    /// A file could not be read or written.
    Io {
        /// The file.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error
    },
    /// A message could not be written to the diagnostic stream.
    Diagnostics(std::io::Error),
}
impl FrontendErr {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| FrontendErr::Io { path: path.to_path_buf(), source }
    }
}
impl std::fmt::Display for FrontendErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrontendErr::Io { path, source } => write!(f, "{}: {source}", path.display()),
            FrontendErr::Diagnostics(e) => write!(f, "could not write diagnostics: {e}"),
        }
    }
}
impl std::error::Error for FrontendErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontendErr::Io { source, .. } => Some(source),
            FrontendErr::Diagnostics(e) => Some(e),
        }
    }
}
impl crate::err::Error for FrontendErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            FrontendErr::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => Some("check that the path exists".into()),
            _ => None
        }
    }
}

/// Assembles the source file at `source` into a binary image at `output`.
///
/// If `diagnostics` is set, a listing of each assembled word is printed.
/// See [`assemble_with`] for more details.
pub fn assemble(source: &Path, output: &Path, diagnostics: bool) -> Result<Outcome, FrontendErr> {
    let outcome = assemble_with(source, output, diagnostics, &mut std::io::stderr().lock())?;
    if outcome.is_success() {
        println!("assembled {}", output.display());
    }
    Ok(outcome)
}

/// Assembles the source file at `source` into a binary image at `output`,
/// writing messages to `out`.
///
/// Every malformed line is reported. The image is still written (without the malformed lines),
/// but the outcome is a failure.
///
/// If `diagnostics` is set, a listing of each assembled word
/// (its hex word, bytes, and source line) is also written.
pub fn assemble_with(source: &Path, output: &Path, diagnostics: bool, out: &mut impl Write) -> Result<Outcome, FrontendErr> {
    let src = std::fs::read_to_string(source).map_err(FrontendErr::io(source))?;

    let (image, errors) = match assemble_debug(&src) {
        Ok(image) => (image, vec![]),
        Err(e) => {
            let errors = e.errors().to_vec();
            (e.into_partial(), errors)
        }
    };

    if !errors.is_empty() {
        let info = SourceInfo::new(&src);
        for e in &errors {
            write!(out, "{}", report(e, &info)).map_err(FrontendErr::Diagnostics)?;
        }
        writeln!(out, "{}: {} malformed line(s)", source.display(), errors.len()).map_err(FrontendErr::Diagnostics)?;
    }
    if diagnostics {
        write!(out, "{}", TextFormat::serialize(&image)).map_err(FrontendErr::Diagnostics)?;
    }

    std::fs::write(output, image.as_bytes()).map_err(FrontendErr::io(output))?;
    log::info!("wrote {} byte(s) to {}", image.as_bytes().len(), output.display());

    match errors.is_empty() {
        true  => Ok(Outcome::Success),
        false => Ok(Outcome::Failure),
    }
}

/// Executes the binary image at `binary` and dumps the memory range `range` (`start-end`)
/// to the CSV file at `dump`.
///
/// See [`execute_with`] for more details.
pub fn execute(binary: &Path, dump: &Path, range: &str, opts: ExecOpts) -> Result<Outcome, FrontendErr> {
    execute_with(binary, dump, range, opts, &mut std::io::stderr().lock())
}

/// Executes the binary image at `binary` and dumps the memory range `range` (`start-end`)
/// to the CSV file at `dump`, writing messages to `out`.
///
/// - If the run stops on an unknown opcode, this is reported and the dump is still written.
///   This is only a failure if `opts.strict` is set.
/// - If the range is invalid, this is reported and the dump is not written.
///   The program is still run, and the outcome only depends on the run.
pub fn execute_with(binary: &Path, dump: &Path, range: &str, opts: ExecOpts, out: &mut impl Write) -> Result<Outcome, FrontendErr> {
    let bytes = std::fs::read(binary).map_err(FrontendErr::io(binary))?;

    let mut sim = Simulator::new(SimFlags { mem_size: opts.mem_size });
    sim.load_bytes(bytes);

    let mut outcome = Outcome::Success;
    if let Err(e) = sim.run() {
        writeln!(out, "{}: execution incomplete: {e}", binary.display()).map_err(FrontendErr::Diagnostics)?;
        if opts.strict {
            outcome = Outcome::Failure;
        }
    }

    let range = match range.parse::<AddrRange>() {
        Ok(range) => range,
        Err(e) => {
            write!(out, "{}", report(&e, &SourceInfo::new(range))).map_err(FrontendErr::Diagnostics)?;
            writeln!(out, "{}: no dump written", dump.display()).map_err(FrontendErr::Diagnostics)?;
            return Ok(outcome);
        }
    };

    let dump_view = MemDump::new(&sim.mem, range);
    let file = File::create(dump).map_err(FrontendErr::io(dump))?;
    dump_view.write_csv(BufWriter::new(file)).map_err(FrontendErr::io(dump))?;
    writeln!(out, "dumped memory {range} to {}", dump.display()).map_err(FrontendErr::Diagnostics)?;

    Ok(outcome)
}
