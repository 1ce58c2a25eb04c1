//! Formatters which can read and write program images into disk.
//!
//! The [`ImageFormat`] trait describes an implementation of reading/writing images into disk.
//! This module provides two implementations of the trait:
//! - [`BinaryFormat`]: The raw binary, the format the simulator executes
//! - [`TextFormat`]: A human-readable listing of each word

use std::fmt::Write;

use crate::ast::sim::{SimInstr, WORD_BYTES};

use super::Image;

/// A trait defining image formats.
pub trait ImageFormat {
    /// Representation of the serialized format.
    ///
    /// For binary formats, `[u8]` should be used.
    /// For text-based formats,`str` should be used.
    type Stream: ToOwned + ?Sized;
    /// Serializes into the stream format.
    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned;
    /// Deserializes from the stream format, returning `None`
    /// if an error occurred during deserialization.
    fn deserialize(i: &Self::Stream) -> Option<Image>;
}

/// The raw binary format of an image.
///
/// This is a headerless sequence of 5-byte little-endian words.
/// Any bytes are a valid binary; a trailing partial word is kept as is.
pub struct BinaryFormat;

impl ImageFormat for BinaryFormat {
    type Stream = [u8];

    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned {
        o.as_bytes().to_vec()
    }

    fn deserialize(i: &Self::Stream) -> Option<Image> {
        Some(Image::from_bytes(i.to_vec()))
    }
}

/// A text listing of an image.
///
/// Debug symbols are not preserved when deserializing this format,
/// only the bytes of the image are.
pub struct TextFormat;

const TFMT_MAGIC: &str = "TETRAVM IMAGE";
const TFMT_UNKNOWN: &str = "????";
const TFMT_TRAILING: &str = "TRAILING";
const TABLE_DIV: &str = " | ";

impl ImageFormat for TextFormat {
    type Stream = str;

    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned {
        // Text listing layout.
        //
        // ```text
        // TETRAVM IMAGE
        //
        // OFFSET | WORD       | BYTES          | INSTR       | SOURCE
        // 0      | 000000146F | 6F 14 00 00 00 | LOAD R3, 5  | 1: LOAD 3, 5
        // 5      | 0000000868 | 68 08 00 00 00 | WRITE R3, 2 | 2: WRITE 3, 2
        // ...
        // TRAILING | AB CD
        // // Support for comments, as well.
        // ```
        //
        // INSTR is the decoded word (or ???? if it has no valid opcode).
        // SOURCE is only present if the image has debug symbols.
        // The TRAILING row is only present if the image ends in a partial word.
        fn _ser(o: &Image) -> Result<String, std::fmt::Error> {
            let mut buf = String::new();

            writeln!(buf, "{TFMT_MAGIC}")?;
            writeln!(buf)?;

            const OFFSET: &str = "OFFSET";
            const BYTES: &str = "BYTES";
            const INSTR: &str = "INSTR";
            let rows: Vec<_> = o.words()
                .map(|(offset, word)| {
                    let instr = SimInstr::decode(word)
                        .map_or_else(|_| TFMT_UNKNOWN.to_string(), |i| i.to_string());
                    let source = o.debug_symbols()
                        .and_then(|sym| {
                            let line = sym.rev_lookup_line(offset)?;
                            Some(format!("{line}: {}", sym.read_line(line).unwrap_or("")))
                        })
                        .unwrap_or_default();
                    (offset, word, instr, source)
                })
                .collect();

            let instr_col = rows.iter()
                .map(|(_, _, instr, _)| instr.len())
                .fold(INSTR.len(), usize::max);

            writeln!(buf, "{OFFSET}{0}{1:10}{0}{BYTES:14}{0}{INSTR:2$}{0}SOURCE", TABLE_DIV, "WORD", instr_col)?;
            for (offset, word, instr, source) in rows {
                let bytes = hex_bytes(&word.to_le_bytes()[..WORD_BYTES]);
                writeln!(buf, "{offset:<6X}{0}{word:010X}{0}{bytes}{0}{instr:1$}{0}{source}", TABLE_DIV, instr_col)?;
            }

            let trailing = &o.as_bytes()[o.len_words() * WORD_BYTES..];
            if !trailing.is_empty() {
                writeln!(buf, "{TFMT_TRAILING}{TABLE_DIV}{}", hex_bytes(trailing))?;
            }

            Ok(buf)
        }

        _ser(o).unwrap_or_default()
    }

    fn deserialize(string: &Self::Stream) -> Option<Image> {
        // Read all of the non-empty lines:
        let mut lines = string.trim().lines()
            .map(|l| {
                l.split_once("//").map_or(l, |(left, _)| left) // remove comments
            })
            .filter(|&l| !l.trim().is_empty());
        if lines.next().map(str::trim) != Some(TFMT_MAGIC) { return None };

        let header = lines.next()?;
        parse_header(header, &["OFFSET", "WORD", "BYTES", "INSTR", "SOURCE"])?;

        let mut bytes = vec![];
        let mut trailing_seen = false;
        for line in lines {
            // trailing row must be last
            if trailing_seen { return None; }

            match parse_row(line, |[first, second, ..]: [&str; 5]| Some((first.trim(), second.trim())))? {
                (TFMT_TRAILING, hex) => {
                    let trailing: Vec<_> = hex.split_whitespace()
                        .map(|b| u8::from_str_radix(b, 16).ok())
                        .collect::<Option<_>>()?;
                    if trailing.is_empty() || trailing.len() >= WORD_BYTES { return None; }

                    bytes.extend(trailing);
                    trailing_seen = true;
                },
                (offset_hex, word_hex) => {
                    let offset = usize::from_str_radix(offset_hex, 16).ok()?;
                    if offset != bytes.len() { return None; }

                    let word = hex2word(word_hex)?;
                    bytes.extend_from_slice(&word.to_le_bytes()[..WORD_BYTES]);
                }
            }
        }

        Some(Image::from_bytes(bytes))
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    bytes.iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
fn hex2word(s: &str) -> Option<u64> {
    match s.len() == 2 * WORD_BYTES {
        true => u64::from_str_radix(s, 16).ok(),
        false => None
    }
}

fn parse_header(line: &str, columns: &[&str]) -> Option<()> {
    line.splitn(columns.len(), TABLE_DIV)
        .map(str::trim)
        .eq(columns.iter().copied())
        .then_some(())
}
fn parse_row<'a, T, const N: usize>(line: &'a str, f: impl FnOnce([&'a str; N]) -> Option<T>) -> Option<T> {
    let mut segments: Vec<_> = line
        .splitn(N, TABLE_DIV)
        .collect();
    segments.resize(N, "");
    let segments = *<Box<[_; N]>>::try_from(segments).ok()?;
    f(segments)
}

#[cfg(test)]
mod tests {
    use crate::asm::{assemble, assemble_debug, Image};

    use super::{BinaryFormat, ImageFormat, TextFormat};

    const SRC: &str = "
        LOAD 0, 7
        WRITE 0, 2
        READ 1, 0, 2
        BITREV 1, 2
    ";

    #[test]
    fn test_binary_is_raw() {
        let image = assemble("LOAD 3, 5").unwrap();
        assert_eq!(BinaryFormat::serialize(&image), [0x6F, 0x14, 0x00, 0x00, 0x00]);

        let de = BinaryFormat::deserialize(&[0x6F, 0x14, 0x00, 0x00, 0x00, 0x01]).unwrap();
        assert_eq!(de.len_words(), 1);
        assert_eq!(de.trailing_len(), 1);
    }

    #[test]
    fn test_text_listing() {
        let image = assemble_debug("LOAD 3, 5\n\nWRITE 3, 2").unwrap();
        let listing = TextFormat::serialize(&image);

        let lines: Vec<_> = listing.lines().collect();
        assert_eq!(lines[0], "TETRAVM IMAGE");
        assert!(lines[2].starts_with("OFFSET | WORD       | BYTES          | INSTR"), "{}", lines[2]);
        assert!(lines[3].starts_with("0      | 000000146F | 6F 14 00 00 00 | LOAD R3, 5"), "{}", lines[3]);
        assert!(lines[3].ends_with("| 1: LOAD 3, 5"), "{}", lines[3]);
        assert!(lines[4].starts_with("5      | "), "{}", lines[4]);
        assert!(lines[4].ends_with("| 3: WRITE 3, 2"), "{}", lines[4]);
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_text_unknown_and_trailing() {
        let image = Image::from_bytes(vec![0x00, 0x00, 0x00, 0x00, 0x00, 0xAB, 0xCD]);
        let listing = TextFormat::serialize(&image);

        assert!(listing.contains("????"));
        assert!(listing.trim_end().ends_with("TRAILING | AB CD"));
    }

    #[test]
    fn test_ser_deser() {
        let image = assemble_debug(SRC).unwrap();

        // Binary format
        let ser = BinaryFormat::serialize(&image);
        let de = BinaryFormat::deserialize(&ser).expect("binary encoding should've been parseable");
        assert_eq!(de.as_bytes(), image.as_bytes(), "binary encoding could not be roundtripped");

        // Text format
        let ser = TextFormat::serialize(&image);
        let de = TextFormat::deserialize(&ser).expect("text encoding should've been parseable");
        assert_eq!(de.as_bytes(), image.as_bytes(), "text encoding could not be roundtripped");
        assert!(de.debug_symbols().is_none());

        // With trailing bytes
        let mut bytes = image.into_bytes();
        bytes.extend([1, 2, 3]);
        let image = Image::from_bytes(bytes);
        let de = TextFormat::deserialize(&TextFormat::serialize(&image)).expect("text encoding should've been parseable");
        assert_eq!(de, image);
    }

    #[test]
    fn test_deser_invalid() {
        assert!(TextFormat::deserialize("").is_none());
        assert!(TextFormat::deserialize("NOT AN IMAGE").is_none());

        let header = "TETRAVM IMAGE\nOFFSET | WORD | BYTES | INSTR | SOURCE\n";
        assert_eq!(TextFormat::deserialize(header), Some(Image::empty()));
        // word too short
        assert!(TextFormat::deserialize(&format!("{header}0 | 146F | | | \n")).is_none());
        // offsets out of order
        assert!(TextFormat::deserialize(&format!("{header}5 | 000000146F | | | \n")).is_none());
        // trailing row not last
        assert!(TextFormat::deserialize(&format!("{header}TRAILING | AB\n0 | 000000146F | | | \n")).is_none());
    }
}
