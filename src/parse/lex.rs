//! Tokenizing assembly source.
//!
//! This module holds the tokens that characterize the assembly language ([`Token`]).
//! This module is used by the parser to facilitate the conversion of
//! assembly source code into statements.
//!
//! The module's key data structure is the [`Token`] enum,
//! which lists all of the tokens of the assembly language.

use logos::{Lexer, Logos};

/// A unit of information in assembly source code.
#[derive(Debug, Logos, PartialEq, Eq)]
#[logos(skip r"[ \t\r\x0B\x0C\u{A0}]+", error = LexErr)]
pub enum Token {
    // Note, this regex spans over tokens that are technically invalid
    // (e.g., 23trst matches for unsigned even though it shouldn't).
    // This is intended.
    // The regex collects what would be considered one discernable unit
    // and validates it using the validator function.

    /// An unsigned numeric value (e.g., `9`, `0b1011`, `0x7F`).
    #[regex(r"\d\w*", lex_unsigned)]
    Unsigned(u64),

    /// A register value (i.e., `R0`-`R31`)
    #[regex(r"[Rr]\d+", lex_reg)]
    Reg(u8),

    /// An identifier.
    ///
    /// This can refer to either an instruction mnemonic (e.g. `LOAD`, `BITREV`)
    /// or any other word, which is never valid as an operand.
    ///
    /// This token type is case-insensitive.
    #[regex(r"[A-Za-z_]\w*", |lx| lx.slice().parse::<Ident>().expect("should be infallible"))]
    Ident(Ident),

    /// A comma, which delineate operands of an instruction
    #[token(",")]
    Comma,

    /// A comment, which starts with a semicolon and spans the remaining part of the line.
    #[regex(r";.*")]
    Comment,

    /// A new line
    #[regex(r"\r?\n")]
    NewLine
}

macro_rules! ident_enum {
    ($($instr:ident),+) => {
        /// An identifier.
        ///
        /// This can refer to either an instruction mnemonic
        /// or some other word (which is kept as [`Ident::Other`]).
        ///
        /// This token type is case insensitive.
        #[derive(Debug, PartialEq, Eq, Hash, Clone)]
        pub enum Ident {
            $(
                #[allow(missing_docs)]
                $instr
            ),+,
            #[allow(missing_docs)]
            Other(String)
        }

        impl std::str::FromStr for Ident {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_uppercase() {
                    $(stringify!($instr) => Ok(Self::$instr)),*,
                    _ => Ok(Self::Other(s.to_string()))
                }
            }
        }

        impl std::fmt::Display for Ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$instr => f.write_str(stringify!($instr))),*,
                    Self::Other(id) => f.write_str(id)
                }
            }
        }
    };
}
ident_enum! {
    LOAD, WRITE, READ, BITREV
}

/// Any errors raised in attempting to tokenize an input stream.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum LexErr {
    /// Binary literal (starting with 0b) has invalid binary digits
    InvalidBin,
    /// Hex literal (starting with 0x) has invalid hex digits
    InvalidHex,
    /// Numeric literal could not be parsed as a decimal literal because it has invalid digits (i.e., not 0-9)
    InvalidNumeric,
    /// Prefixed literal (0b or 0x) doesn't have digits after it.
    InvalidPrefixedEmpty,
    /// Token had the format R\d+, but the number isn't 0-31.
    InvalidReg,
    /// A symbol was used which is not allowed in assembly files
    #[default]
    InvalidSymbol
}
impl std::fmt::Display for LexErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexErr::InvalidBin           => f.write_str("invalid binary literal"),
            LexErr::InvalidHex           => f.write_str("invalid hex literal"),
            LexErr::InvalidNumeric       => f.write_str("invalid decimal literal"),
            LexErr::InvalidPrefixedEmpty => f.write_str("numeric prefix without digits"),
            LexErr::InvalidReg           => f.write_str("invalid register"),
            LexErr::InvalidSymbol        => f.write_str("unrecognized symbol"),
        }
    }
}
impl std::error::Error for LexErr {}
impl crate::err::Error for LexErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            LexErr::InvalidBin           => Some("a binary literal starts with '0b' and consists of 0 and 1".into()),
            LexErr::InvalidHex           => Some("a hex literal starts with '0x' and consists of 0-9, A-F".into()),
            LexErr::InvalidNumeric       => Some("a decimal literal only consists of digits 0-9".into()),
            LexErr::InvalidPrefixedEmpty => Some("there should be digits after the prefix".into()),
            LexErr::InvalidReg           => Some("this must be R0-R31".into()),
            LexErr::InvalidSymbol        => Some("operands are unsigned integers separated by commas or spaces".into()),
        }
    }
}
/// Parses the digits of a literal in the given radix, keeping only the low 64 bits of the value.
///
/// Every instruction field is narrower than 64 bits, so the bits that reach the word are exact.
fn fold_digits(digits: &str, radix: u32, invalid_digits_err: LexErr) -> Result<u64, LexErr> {
    if digits.is_empty() {
        return Err(LexErr::InvalidPrefixedEmpty);
    }

    digits.chars().try_fold(0u64, |acc, c| {
        let d = c.to_digit(radix).ok_or(invalid_digits_err)?;
        Ok(acc.wrapping_mul(u64::from(radix)).wrapping_add(u64::from(d)))
    })
}
fn lex_unsigned(lx: &Lexer<'_, Token>) -> Result<u64, LexErr> {
    let string = lx.slice();

    if let Some(bin) = string.strip_prefix("0b").or_else(|| string.strip_prefix("0B")) {
        fold_digits(bin, 2, LexErr::InvalidBin)
    } else if let Some(hex) = string.strip_prefix("0x").or_else(|| string.strip_prefix("0X")) {
        fold_digits(hex, 16, LexErr::InvalidHex)
    } else {
        fold_digits(string, 10, LexErr::InvalidNumeric)
    }
}
fn lex_reg(lx: &Lexer<'_, Token>) -> Result<u8, LexErr> {
    lx.slice()[1..].parse::<u8>().ok()
        .filter(|&r| r < 32)
        .ok_or(LexErr::InvalidReg)
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::err::LexErr;
    use crate::parse::lex::{Ident, Token};

    fn other(s: &str) -> Token {
        Token::Ident(Ident::Other(s.to_string()))
    }

    #[test]
    fn test_numeric_dec_success() {
        let mut tokens = Token::lexer("0 123 456 789 2097151");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(123))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(456))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(789))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(2097151))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_numeric_prefixed_success() {
        let mut tokens = Token::lexer("0b0 0b1 0B1010 0x7F 0XaBc 0b11111");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0b1010))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0x7F))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0xABC))));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(31))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_numeric_invalid() {
        assert_eq!(Token::lexer("3Q").next(), Some(Err(LexErr::InvalidNumeric)));
        assert_eq!(Token::lexer("0b102").next(), Some(Err(LexErr::InvalidBin)));
        assert_eq!(Token::lexer("0xFG").next(), Some(Err(LexErr::InvalidHex)));
        assert_eq!(Token::lexer("0b").next(), Some(Err(LexErr::InvalidPrefixedEmpty)));
        assert_eq!(Token::lexer("0x").next(), Some(Err(LexErr::InvalidPrefixedEmpty)));
        assert_eq!(Token::lexer("0b1_0").next(), Some(Err(LexErr::InvalidBin)));
    }

    #[test]
    fn test_numeric_wraps() {
        // only the low 64 bits are kept
        assert_eq!(Token::lexer("99999999999999999999999").next(), Some(Ok(Token::Unsigned(200376420520689663))));
        assert_eq!(Token::lexer("18446744073709551616").next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(Token::lexer("0x10000000000000005").next(), Some(Ok(Token::Unsigned(5))));
        assert_eq!(Token::lexer(&format!("0b1{}", "0".repeat(64))).next(), Some(Ok(Token::Unsigned(0))));
    }

    #[test]
    fn test_negative_is_not_numeric() {
        assert_eq!(Token::lexer("-5").next(), Some(Err(LexErr::InvalidSymbol)));
    }

    #[test]
    fn test_whitespace() {
        // carriage returns, vertical tabs, form feeds and no-break spaces separate tokens
        for ws in ["\r", "\x0B", "\x0C", "\u{A0}"] {
            let src = format!("{ws}LOAD{ws}1,{ws}2{ws}");
            let tokens: Vec<_> = Token::lexer(&src).collect();
            assert_eq!(tokens, [
                Ok(Token::Ident(Ident::LOAD)),
                Ok(Token::Unsigned(1)),
                Ok(Token::Comma),
                Ok(Token::Unsigned(2)),
            ], "{src:?}");
        }

        // CRLF is still one new line
        let tokens: Vec<_> = Token::lexer("1\r\n2").collect();
        assert_eq!(tokens, [Ok(Token::Unsigned(1)), Ok(Token::NewLine), Ok(Token::Unsigned(2))]);
    }

    #[test]
    fn test_regs() {
        let mut tokens = Token::lexer("R0 r1 R15 R31");
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(15))));
        assert_eq!(tokens.next(), Some(Ok(Token::Reg(31))));
        assert_eq!(tokens.next(), None);

        assert_eq!(Token::lexer("R32").next(), Some(Err(LexErr::InvalidReg)));
        assert_eq!(Token::lexer("R99999999").next(), Some(Err(LexErr::InvalidReg)));
    }

    #[test]
    fn test_keywords() {
        let mut tokens = Token::lexer("LOAD write ReAd BitRev");
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::LOAD))));
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::WRITE))));
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::READ))));
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::BITREV))));
        assert_eq!(tokens.next(), None);

        let mut tokens = Token::lexer("JMP loader _");
        assert_eq!(tokens.next(), Some(Ok(other("JMP"))));
        assert_eq!(tokens.next(), Some(Ok(other("loader"))));
        assert_eq!(tokens.next(), Some(Ok(other("_"))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_punct() {
        let mut tokens = Token::lexer("0\n1,2\r\n3 ;; abcdef");
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(0))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(1))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comma)));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(2))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Unsigned(3))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_invalid_symbol() {
        for c in ['#', '@', '$', '.', ':', '(', ')', '[', ']', '+', '-', '"'] {
            let string = c.to_string();
            assert_eq!(
                Token::lexer(&string).next(),
                Some(Err(LexErr::InvalidSymbol)),
                "Expected {string:?} to be an invalid symbol"
            );
        }
    }
}
