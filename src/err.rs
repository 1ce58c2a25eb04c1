//! Error interface for this crate.
//!
//! Every error raised by the assembler, the simulator and the memory inspector
//! implements [`Error`], which adds optional help text and a source span
//! to [`std::error::Error`].
//!
//! [`report`] can be used to render any of these errors against
//! the source text it came from.
use std::borrow::Cow;
use std::fmt::Write;
use std::ops::Range;

use crate::asm::SourceInfo;

pub use crate::parse::lex::LexErr;
pub use crate::parse::{ParseErr, ParseErrKind};
pub use crate::asm::AsmErr;
pub use crate::ast::sim::DecodeErr;
pub use crate::sim::SimErr;
pub use crate::sim::inspect::InspectErr;

/// The byte range in the assembly source associated with an error.
pub type ErrSpan = Range<usize>;

/// Unified error interface for all errors in this crate.
///
/// Note that the [`std::fmt::Display`] implementation is used for the brief message
/// and [`Error::help`] is used for any additional context.
pub trait Error: std::error::Error {
    /// The range of source text associated with this error, if any.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A clarifying message to help aid someone in fixing the error.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// Renders an error against its source.
///
/// If the error has a span, the offending line is printed with its 1-based line number
/// and the span is underlined.
///
/// # Example
/// ```
/// use tetravm::asm::{assemble, SourceInfo};
/// use tetravm::err::report;
///
/// let src = "LOAD 1, 2\nLOAD 1\n";
/// let err = assemble(src).unwrap_err();
///
/// let rendered = report(&err.errors()[0], &SourceInfo::new(src));
/// assert!(rendered.starts_with("error on line 2"));
/// ```
pub fn report(err: &impl Error, src: &SourceInfo) -> String {
    fn _report(err: &impl Error, src: &SourceInfo) -> Result<String, std::fmt::Error> {
        let mut buf = String::new();

        match err.span() {
            Some(span) => {
                let (lno, _) = src.get_pos_pair(span.start);
                writeln!(buf, "error on line {}: {err}", lno + 1)?;

                let gutter = (lno + 1).to_string();
                let pad = " ".repeat(gutter.len());
                writeln!(buf, "{gutter} | {}", src.read_line(lno).unwrap_or(""))?;

                // underline the span, leaving at least one caret
                let line_start = src.line_span(lno).map_or(span.start, |r| r.start);
                let indent = " ".repeat(span.start.saturating_sub(line_start));
                let carets = "^".repeat(span.len().max(1));
                writeln!(buf, "{pad} | {indent}{carets}")?;
            },
            None => writeln!(buf, "error: {err}")?,
        }

        if let Some(help) = err.help() {
            writeln!(buf, "help: {help}")?;
        }

        Ok(buf)
    }

    _report(err, src).unwrap_or_else(|_| err.to_string())
}
