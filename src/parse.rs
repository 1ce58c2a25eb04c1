//! Parsing assembly source code into statements.
//!
//! Source is parsed line by line. Every line holds at most one instruction;
//! blank lines and lines starting with `;` hold none. Operands are separated
//! by commas and/or whitespace, mnemonics are case-insensitive.
//!
//! The main function of this module is [`parse_ast`], which yields a statement
//! (or an error) for each line with content:
//! ```
//! use tetravm::parse::parse_ast;
//!
//! let src = "
//!     ; set R1 and copy it to memory
//!     LOAD 1, 100
//!     WRITE 1, 10
//!     LOAD 2
//! ";
//! let results: Vec<_> = parse_ast(src).collect();
//! assert_eq!(results.len(), 3);
//! assert!(results[0].is_ok());
//! assert!(results[1].is_ok());
//!
//! // LOAD 2 is missing an operand:
//! let err = results[2].as_ref().unwrap_err();
//! assert_eq!(err.line, 5);
//! ```
pub mod lex;

use std::ops::Range;

use logos::Logos;

use crate::ast::asm::AsmInstr;
use crate::ast::{Offset, Reg, NUM_REGS};
use lex::{Ident, LexErr, Token};

/// A parsed instruction along with its position in source.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stmt {
    /// The instruction.
    pub instr: AsmInstr,
    /// The 1-based line number of this statement.
    pub line: usize,
    /// The byte range of this statement in the source.
    pub span: Range<usize>,
}

/// Kinds of errors that can occur when parsing a line.
///
/// All of these describe a malformed instruction.
/// See [`ParseErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum ParseErrKind {
    /// The line did not start with a known instruction mnemonic.
    UnknownMnemonic(String),
    /// The instruction had the wrong number of operands.
    OperandCount {
        /// The instruction.
        instr: Ident,
        /// The number of operands it requires.
        expected: usize,
        /// The number of operands found.
        found: usize,
    },
    /// An operand was not an unsigned integer.
    NonNumericOperand,
    /// A token in the line could not be lexed.
    Lex(LexErr),
}
impl std::fmt::Display for ParseErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownMnemonic(m) => write!(f, "unknown instruction {m:?}"),
            Self::OperandCount { instr, expected, found } => write!(f, "{instr} expects {expected} operands, found {found}"),
            Self::NonNumericOperand => f.write_str("operand is not an unsigned integer"),
            Self::Lex(e) => e.fmt(f),
        }
    }
}

/// A malformed instruction, tagged with the line it occurred on.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ParseErr {
    /// The kind of error.
    pub kind: ParseErrKind,
    /// The 1-based line number of the malformed instruction.
    pub line: usize,
    /// The byte range in the source associated with this error.
    pub span: Range<usize>,
}
impl ParseErr {
    fn new(kind: ParseErrKind, line: usize, span: Range<usize>) -> Self {
        ParseErr { kind, line, span }
    }
}
impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for ParseErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ParseErrKind::Lex(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for ParseErr {
    fn span(&self) -> Option<crate::err::ErrSpan> {
        Some(self.span.clone())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            ParseErrKind::UnknownMnemonic(_) => Some("instructions are LOAD, WRITE, READ, and BITREV".into()),
            ParseErrKind::OperandCount { instr, .. } => Some(format!("usage: {}", usage(instr)).into()),
            ParseErrKind::NonNumericOperand => Some("operands are unsigned integers in decimal, binary (0b), or hex (0x)".into()),
            ParseErrKind::Lex(e) => crate::err::Error::help(e),
        }
    }
}

fn usage(instr: &Ident) -> &'static str {
    match instr {
        Ident::LOAD   => "LOAD reg, imm",
        Ident::WRITE  => "WRITE reg, addr",
        Ident::READ   => "READ dest, base, offset",
        Ident::BITREV => "BITREV src, addr_reg",
        Ident::Other(_) => "",
    }
}

/// Parses assembly source, producing a result for each line that holds content.
///
/// Each malformed line produces a [`ParseErr`]; parsing continues with the next line.
pub fn parse_ast(src: &str) -> impl Iterator<Item=Result<Stmt, ParseErr>> + '_ {
    let mut offset = 0;

    src.split_inclusive('\n')
        .enumerate()
        .filter_map(move |(i, raw)| {
            let start = offset;
            offset += raw.len();
            parse_line(raw, i + 1, start)
        })
}

/// Parses a single line.
///
/// `line` is the 1-based line number and `start` is the byte offset of the line in the full source.
/// This returns `None` if the line is blank or is a comment.
pub fn parse_line(raw: &str, line: usize, start: usize) -> Option<Result<Stmt, ParseErr>> {
    let mut tokens = vec![];
    for (m_token, span) in Token::lexer(raw).spanned() {
        let span = (span.start + start)..(span.end + start);
        match m_token {
            Ok(Token::Comment | Token::NewLine) => {},
            Ok(token) => tokens.push((token, span)),
            Err(e) => return Some(Err(ParseErr::new(ParseErrKind::Lex(e), line, span))),
        }
    }

    let ((first, first_span), rest) = tokens.split_first()?;
    let line_span = first_span.start..rest.last().map_or(first_span.end, |(_, s)| s.end);

    let instr = match first {
        Token::Ident(Ident::Other(m)) => return Some(Err(ParseErr::new(ParseErrKind::UnknownMnemonic(m.clone()), line, first_span.clone()))),
        Token::Ident(id) => id,
        _ => return Some(Err(ParseErr::new(ParseErrKind::UnknownMnemonic(raw.trim().to_string()), line, first_span.clone()))),
    };

    Some(parse_operands(instr, rest, line, line_span.clone()).map(|instr| Stmt { instr, line, span: line_span }))
}

/// Parses the operands following a mnemonic, validating their count and that they are numeric.
fn parse_operands(instr: &Ident, rest: &[(Token, Range<usize>)], line: usize, line_span: Range<usize>) -> Result<AsmInstr, ParseErr> {
    let mut operands = vec![];
    for (token, span) in rest {
        match token {
            Token::Comma => {},
            Token::Unsigned(n) => operands.push((*n, span.clone())),
            Token::Reg(r) => operands.push((u64::from(*r), span.clone())),
            _ => return Err(ParseErr::new(ParseErrKind::NonNumericOperand, line, span.clone())),
        }
    }

    let expected = match instr {
        Ident::READ => 3,
        _ => 2,
    };
    if operands.len() != expected {
        let kind = ParseErrKind::OperandCount { instr: instr.clone(), expected, found: operands.len() };
        return Err(ParseErr::new(kind, line, line_span));
    }

    let reg = |i: usize| {
        let (n, span) = &operands[i];
        if *n >= NUM_REGS as u64 {
            log::warn!("line {line}: register {n} at {span:?} truncated to {}", Reg::new_trunc(*n));
        }
        Reg::new_trunc(*n)
    };
    fn field<const N: u32>(operands: &[(u64, Range<usize>)], i: usize, line: usize) -> Offset<N> {
        let (n, span) = &operands[i];
        Offset::new(*n).unwrap_or_else(|e| {
            let masked = Offset::new_trunc(*n);
            log::warn!("line {line}: operand {n} at {span:?} truncated to {masked} ({e})");
            masked
        })
    }

    let instr = match instr {
        Ident::LOAD   => AsmInstr::LOAD(reg(0), field(&operands, 1, line)),
        Ident::WRITE  => AsmInstr::WRITE(reg(0), field(&operands, 1, line)),
        Ident::READ   => AsmInstr::READ(reg(0), reg(1), field(&operands, 2, line)),
        Ident::BITREV => AsmInstr::BITREV(reg(0), reg(1)),
        Ident::Other(_) => unreachable!("unknown mnemonics should have been rejected"),
    };
    Ok(instr)
}
