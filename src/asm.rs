//! Assembling assembly source into program images.
//!
//! This module is used to convert assembly source into [`Image`]s,
//! raw sequences of 5-byte instruction words that can be executed by the simulator.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_debug`]: The main functions which assemble source into an image.
//! - [`Image`]: a struct holding the assembled bytes, which can be loaded into the simulator and executed
//! - [`SourceInfo`]: a struct holding source text, used to map errors and words back to their lines
//!
//! Assembly never stops at the first malformed line. Every line is assembled independently,
//! and if any line is malformed, the error ([`AsmErr`]) holds every line's error
//! along with the image built from the well-formed lines.

pub mod encoding;

use std::ops::Range;

use crate::ast::sim::{word_from_bytes, SimInstr, WORD_BYTES};
use crate::parse::{parse_ast, ParseErr};

/// Assembles assembly source code into an image.
///
/// This function assembles the source *without* including debug symbols
/// in the image.
/// See [`DebugSymbols`] for more details about debug symbols.
///
/// # Example
/// ```
/// use tetravm::asm::assemble;
///
/// let src = "
///     LOAD 3, 5
///     WRITE 3, 10
/// ";
///
/// let image = assemble(src);
/// assert!(image.is_ok());
///
/// // Two words, no debug symbols:
/// let image = image.unwrap();
/// assert_eq!(image.as_bytes().len(), 10);
/// assert!(image.debug_symbols().is_none());
/// ```
pub fn assemble(src: &str) -> Result<Image, AsmErr> {
    assemble_src(src, false)
}
/// Assembles assembly source code into an image.
///
/// This function assembles the source *and* includes debug symbols
/// in the image.
/// See [`DebugSymbols`] for more details about debug symbols.
///
/// # Example
/// ```
/// use tetravm::asm::assemble_debug;
///
/// let src = "
///     LOAD 3, 5
///     WRITE 3, 10
/// ";
///
/// let image = assemble_debug(src);
/// assert!(image.is_ok());
///
/// // Debug symbols exist in the image:
/// let image = image.unwrap();
/// let sym = image.debug_symbols().unwrap();
/// assert_eq!(sym.lookup_line(3), Some(5));
/// ```
pub fn assemble_debug(src: &str) -> Result<Image, AsmErr> {
    assemble_src(src, true)
}

fn assemble_src(src: &str, debug: bool) -> Result<Image, AsmErr> {
    let mut image = Image::empty();
    let mut errors = vec![];
    let mut line_map = vec![];

    for result in parse_ast(src) {
        match result {
            Ok(stmt) => {
                let instr = stmt.instr.into_sim_instr();
                log::debug!("line {}: {} => {:010X}", stmt.line, stmt.instr, instr.encode());

                line_map.push((stmt.line, image.bytes.len()));
                image.push(instr);
            },
            Err(e) => {
                log::debug!("line {}: malformed instruction ({e})", e.line);
                errors.push(e);
            }
        }
    }

    if debug {
        image.sym = Some(DebugSymbols { line_map, src_info: SourceInfo::new(src) });
    }

    log::info!("assembled {} instruction(s), {} malformed line(s)", image.len_words(), errors.len());
    match errors.is_empty() {
        true  => Ok(image),
        false => Err(AsmErr { errors, partial: image }),
    }
}

/// Error from assembling assembly source code.
///
/// This holds every malformed line's [`ParseErr`] (in line order),
/// as well as the image assembled from the remaining lines.
#[derive(Debug)]
pub struct AsmErr {
    errors: Vec<ParseErr>,
    partial: Image
}
impl AsmErr {
    /// The errors of each malformed line, in the order they appear in source.
    ///
    /// This is never empty.
    pub fn errors(&self) -> &[ParseErr] {
        &self.errors
    }

    /// The image assembled from every well-formed line.
    pub fn partial(&self) -> &Image {
        &self.partial
    }

    /// Takes the image assembled from every well-formed line.
    pub fn into_partial(self) -> Image {
        self.partial
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.errors {
            [e] => write!(f, "malformed instruction on line {}: {e}", e.line),
            [e, rest @ ..] => write!(f, "malformed instruction on line {}: {e} (and {} more)", e.line, rest.len()),
            [] => f.write_str("malformed instruction"),
        }
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors.first().map(|e| e as &(dyn std::error::Error + 'static))
    }
}
impl crate::err::Error for AsmErr {
    fn span(&self) -> Option<crate::err::ErrSpan> {
        self.errors.first().map(|e| e.span.clone())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        self.errors.first().and_then(|e| crate::err::Error::help(e))
    }
}

/// Struct holding the source string and contains helpers
/// to index lines and to query position information from a source string.
///
/// Line numbers used by this struct are 0-based.
#[derive(PartialEq, Eq, Clone)]
pub struct SourceInfo {
    /// The source code.
    src: String,
    /// The index of each new line in source code.
    nl_indices: Vec<usize>
}
impl std::fmt::Debug for SourceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceInfo")
            .field("nl_indices", &self.nl_indices)
            .finish_non_exhaustive()
    }
}
impl SourceInfo {
    /// Computes the source info from a given string.
    pub fn new(src: &str) -> Self {
        Self::from_string(src.to_string())
    }
    fn from_string(src: String) -> Self {
        // Index where each new line appears.
        let nl_indices: Vec<_> = src
            .match_indices('\n')
            .map(|(i, _)| i)
            .chain([src.len()])
            .collect();

        Self { src, nl_indices }
    }

    /// Returns the entire source.
    pub fn source(&self) -> &str {
        &self.src
    }

    /// Counts the number of lines in the source string.
    pub fn count_lines(&self) -> usize {
        // The first line, plus every line after (delimited by a new line)
        self.nl_indices.len()
    }

    /// Gets the character range for the provided line, including any whitespace
    /// and the newline character.
    ///
    /// This returns None if line is not in the interval `[0, number of lines)`.
    fn raw_line_span(&self, line: usize) -> Option<Range<usize>> {
        if !(0..self.count_lines()).contains(&line) {
            return None;
        };

        let start = match line {
            0 => 0,
            _ => self.nl_indices[line - 1] + 1
        };

        let eof = self.src.len();
        let end = match self.nl_indices.get(line) {
            Some(i) => (i + 1).min(eof), // incl NL, but don't go over EOF
            None => eof,
        };

        Some(start..end)
    }

    /// Gets the character range for the provided line, excluding any whitespace.
    ///
    /// This returns None if line is not in the interval `[0, number of lines)`.
    pub fn line_span(&self, line: usize) -> Option<Range<usize>> {
        let Range { mut start, mut end } = self.raw_line_span(line)?;

        // shift line span by trim
        let line = &self.src[start..end];
        let end_trimmed = line.trim_end();
        end -= line.len() - end_trimmed.len();

        let line = end_trimmed;
        start += line.len() - line.trim_start().len();

        Some(start..end)
    }

    /// Reads a line from source.
    ///
    /// This returns None if line is not in the interval `[0, number of lines)`.
    pub fn read_line(&self, line: usize) -> Option<&str> {
        self.line_span(line).map(|r| &self.src[r])
    }

    /// Gets the line number of the current position.
    fn get_line(&self, index: usize) -> usize {
        self.nl_indices.partition_point(|&start| start < index)
    }

    /// Calculates the line and character number for a given character index.
    ///
    /// If the index exceeds the length of the string,
    /// the line number is given as the last line and the character number
    /// is given as the number of characters after the start of the line.
    pub fn get_pos_pair(&self, index: usize) -> (usize, usize) {
        let lno = self.get_line(index);

        let Range { start: lstart, .. } = self.raw_line_span(lno)
            .or_else(|| self.raw_line_span(self.nl_indices.len() - 1))
            .unwrap_or(0..0);
        let cno = index.saturating_sub(lstart);
        (lno, cno)
    }
}
impl From<&'_ str> for SourceInfo {
    fn from(value: &'_ str) -> Self {
        Self::new(value)
    }
}
impl From<String> for SourceInfo {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

/// Debug information of an assembled image.
///
/// This maps each assembled word back to the (1-based) source line it was assembled from
/// and keeps the source text, so that the simulator and listings can
/// show which line an instruction came from.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DebugSymbols {
    /// Pairs of (source line, byte offset in image).
    ///
    /// Both elements are strictly increasing.
    line_map: Vec<(usize, usize)>,
    src_info: SourceInfo
}
impl DebugSymbols {
    /// Gets the byte offset of the word assembled from the given 1-based source line.
    ///
    /// This returns `None` if the line didn't produce a word
    /// (e.g., it was blank, a comment, or malformed).
    pub fn lookup_line(&self, line: usize) -> Option<usize> {
        let i = self.line_map.binary_search_by_key(&line, |&(l, _)| l).ok()?;
        Some(self.line_map[i].1)
    }

    /// Gets the 1-based source line the word at the given byte offset was assembled from.
    ///
    /// The offset must be the start of a word for this to return a line.
    pub fn rev_lookup_line(&self, offset: usize) -> Option<usize> {
        let i = self.line_map.binary_search_by_key(&offset, |&(_, o)| o).ok()?;
        Some(self.line_map[i].0)
    }

    /// Reads the source text of the given 1-based source line.
    pub fn read_line(&self, line: usize) -> Option<&str> {
        self.src_info.read_line(line.checked_sub(1)?)
    }

    /// Gets the source information of the assembled source.
    pub fn source_info(&self) -> &SourceInfo {
        &self.src_info
    }

    /// Gets an iterator over the (1-based source line, byte offset) pairs of this image.
    pub fn line_iter(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.line_map.iter().copied()
    }
}

/// An assembled program image.
///
/// An image is a raw sequence of bytes, to be read as consecutive 5-byte little-endian words.
/// There is no header. Images read from disk may have a trailing partial word,
/// which is kept but never executed.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Image {
    bytes: Vec<u8>,
    sym: Option<DebugSymbols>
}
impl Image {
    /// Creates an empty image.
    pub fn empty() -> Self {
        Image { bytes: vec![], sym: None }
    }

    /// Creates an image from raw bytes (e.g., a binary read from disk).
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Image { bytes, sym: None }
    }

    /// Appends an instruction word to the image.
    pub fn push(&mut self, instr: SimInstr) {
        self.bytes.extend_from_slice(&instr.to_bytes());
    }

    /// The raw bytes of this image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Takes the raw bytes of this image.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The number of complete words in this image.
    pub fn len_words(&self) -> usize {
        self.bytes.len() / WORD_BYTES
    }

    /// The number of bytes after the last complete word.
    pub fn trailing_len(&self) -> usize {
        self.bytes.len() % WORD_BYTES
    }

    /// Gets an iterator over each complete word of this image, paired with its byte offset.
    pub fn words(&self) -> impl Iterator<Item=(usize, u64)> + '_ {
        self.bytes.chunks_exact(WORD_BYTES)
            .enumerate()
            .map(|(i, chunk)| {
                let mut word = [0; WORD_BYTES];
                word.copy_from_slice(chunk);
                (i * WORD_BYTES, word_from_bytes(word))
            })
    }

    /// Gets the debug symbols of this image, if it was assembled with [`assemble_debug`].
    pub fn debug_symbols(&self) -> Option<&DebugSymbols> {
        self.sym.as_ref()
    }
}
