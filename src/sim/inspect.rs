//! Exporting memory after a simulation.
//!
//! The key types here are [`AddrRange`] (an inclusive range of addresses, usually
//! parsed from a `start-end` string) and [`MemDump`] (a read-only view of memory over that range).
//!
//! ```
//! use tetravm::asm::assemble;
//! use tetravm::sim::Simulator;
//! use tetravm::sim::inspect::{AddrRange, MemDump};
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_image(&assemble("LOAD 1, 100\nWRITE 1, 10").unwrap());
//! sim.run().unwrap();
//!
//! let range: AddrRange = "9-11".parse().unwrap();
//! let dump = MemDump::new(&sim.mem, range);
//! assert_eq!(dump.to_csv(), "Address,Value\r\n9,0\r\n10,100\r\n11,0\r\n");
//! ```

use std::str::FromStr;

use super::mem::Mem;

/// The header row of a CSV dump.
pub const CSV_HEADER: [&str; 2] = ["Address", "Value"];
const CSV_NEWLINE: &str = "\r\n";

/// Reasons an address range can be invalid.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum RangeErrKind {
    /// The range was not of the form `start-end`.
    MissingSeparator,
    /// A bound was negative.
    Negative,
    /// A bound was not an unsigned integer.
    NonNumeric(String),
    /// The start of the range was after the end.
    Reversed {
        /// The start of the range.
        start: u64,
        /// The end of the range.
        end: u64
    },
}

/// Errors that can occur when inspecting memory.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum InspectErr {
    /// The requested address range is malformed.
    InvalidRange(RangeErrKind),
}
impl std::fmt::Display for InspectErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InspectErr::InvalidRange(RangeErrKind::MissingSeparator) => f.write_str("invalid address range: expected start-end"),
            InspectErr::InvalidRange(RangeErrKind::Negative) => f.write_str("invalid address range: bounds cannot be negative"),
            InspectErr::InvalidRange(RangeErrKind::NonNumeric(s)) => write!(f, "invalid address range: {s:?} is not an address"),
            InspectErr::InvalidRange(RangeErrKind::Reversed { start, end }) => write!(f, "invalid address range: start {start} is after end {end}"),
        }
    }
}
impl std::error::Error for InspectErr {}
impl crate::err::Error for InspectErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            InspectErr::InvalidRange(RangeErrKind::Reversed { .. }) => Some("the start of the range must not exceed its end".into()),
            InspectErr::InvalidRange(_) => Some("ranges are two unsigned integers separated by a hyphen, e.g. 0-15".into()),
        }
    }
}

/// An inclusive range of memory addresses.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AddrRange {
    start: u64,
    end: u64
}
impl AddrRange {
    /// Creates a new range of addresses from `start` to `end` (inclusive).
    ///
    /// This fails if `start > end`.
    pub fn new(start: u64, end: u64) -> Result<Self, InspectErr> {
        match start <= end {
            true  => Ok(AddrRange { start, end }),
            false => Err(InspectErr::InvalidRange(RangeErrKind::Reversed { start, end })),
        }
    }

    /// The first address of the range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The last address of the range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// The number of addresses in this range.
    ///
    /// This is a `u128`, since `0..=u64::MAX` has 2^64 addresses.
    pub fn len(&self) -> u128 {
        u128::from(self.end - self.start) + 1
    }

    /// Whether this range has no addresses. This is never the case.
    pub fn is_empty(&self) -> bool {
        false
    }
}
impl FromStr for AddrRange {
    type Err = InspectErr;

    /// Parses a range of the form `start-end`.
    ///
    /// ```
    /// use tetravm::sim::inspect::AddrRange;
    ///
    /// let range: AddrRange = "0-15".parse().unwrap();
    /// assert_eq!((range.start(), range.end()), (0, 15));
    ///
    /// assert!("15-0".parse::<AddrRange>().is_err());
    /// assert!("-1-5".parse::<AddrRange>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with('-') {
            return Err(InspectErr::InvalidRange(RangeErrKind::Negative));
        }
        let (left, right) = s.split_once('-')
            .ok_or(InspectErr::InvalidRange(RangeErrKind::MissingSeparator))?;
        if right.trim_start().starts_with('-') {
            return Err(InspectErr::InvalidRange(RangeErrKind::Negative));
        }

        let bound = |b: &str| {
            let b = b.trim();
            b.parse::<u64>()
                .map_err(|_| InspectErr::InvalidRange(RangeErrKind::NonNumeric(b.to_string())))
        };
        AddrRange::new(bound(left)?, bound(right)?)
    }
}
impl std::fmt::Display for AddrRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A read-only view of a range of memory.
///
/// Every address in the range has a row.
/// Rows whose address lies outside of memory have no value.
#[derive(Debug, Clone, Copy)]
pub struct MemDump<'m> {
    mem: &'m Mem,
    range: AddrRange
}
impl<'m> MemDump<'m> {
    /// Creates a view of the given memory over the given range.
    pub fn new(mem: &'m Mem, range: AddrRange) -> Self {
        Self { mem, range }
    }

    /// The range of this dump.
    pub fn range(&self) -> AddrRange {
        self.range
    }

    /// Gets an iterator over every address in the range (in ascending order)
    /// paired with its value, or `None` if the address is outside of memory.
    pub fn rows(&self) -> impl Iterator<Item=(u64, Option<u32>)> + 'm {
        let mem = self.mem;
        (self.range.start..=self.range.end).map(move |addr| (addr, mem.get(addr)))
    }

    /// Gets an iterator over the rows of the range that lie within memory.
    pub fn present_rows(&self) -> impl Iterator<Item=(u64, u32)> + 'm {
        let mem = self.mem;
        let last = (mem.len() as u64).checked_sub(1);
        let end = last.map_or(self.range.start, |l| self.range.end.min(l));
        // the range is empty if nothing is in memory
        let start = match last {
            Some(_) => self.range.start,
            None => end.saturating_add(1),
        };

        (start..=end).filter_map(move |addr| Some((addr, mem.get(addr)?)))
    }

    fn fmt_csv(&self, w: &mut impl std::fmt::Write) -> std::fmt::Result {
        let [addr_col, value_col] = CSV_HEADER;
        write!(w, "{addr_col},{value_col}{CSV_NEWLINE}")?;
        for (addr, value) in self.present_rows() {
            write!(w, "{addr},{value}{CSV_NEWLINE}")?;
        }
        Ok(())
    }

    /// Writes the dump as CSV.
    ///
    /// The header row is always written.
    /// Rows whose address lies outside of memory are omitted.
    pub fn write_csv(&self, mut w: impl std::io::Write) -> std::io::Result<()> {
        write!(w, "{self}")?;
        w.flush()
    }

    /// Renders the dump as a CSV string (see [`MemDump::write_csv`]).
    pub fn to_csv(&self) -> String {
        self.to_string()
    }
}
impl std::fmt::Display for MemDump<'_> {
    /// Formats the dump as CSV (see [`MemDump::write_csv`]).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_csv(f)
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::mem::Mem;

    use super::{AddrRange, InspectErr, MemDump, RangeErrKind};

    #[test]
    fn test_parse_range() {
        assert_eq!("0-15".parse::<AddrRange>(), AddrRange::new(0, 15));
        assert_eq!(" 3 - 3 ".parse::<AddrRange>(), AddrRange::new(3, 3));
        assert_eq!("7-7".parse::<AddrRange>().map(|r| r.len()), Ok(1));

        assert_eq!("15-0".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::Reversed { start: 15, end: 0 })));
        assert_eq!("-1-5".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::Negative)));
        assert_eq!("1--5".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::Negative)));
        assert_eq!("15".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::MissingSeparator)));
        assert_eq!("a-5".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::NonNumeric("a".to_string()))));
        assert_eq!("1-".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::NonNumeric(String::new()))));
        assert_eq!("1-2-3".parse::<AddrRange>(), Err(InspectErr::InvalidRange(RangeErrKind::NonNumeric("2-3".to_string()))));

        assert_eq!(AddrRange::new(4, 9).map(|r| r.to_string()), Ok("4-9".to_string()));
    }

    #[test]
    fn test_range_len() {
        assert_eq!(AddrRange::new(0, 0).map(|r| r.len()), Ok(1));
        assert_eq!(AddrRange::new(100, 131).map(|r| r.len()), Ok(32));
        assert_eq!(AddrRange::new(0, u64::MAX).map(|r| r.len()), Ok(1 << 64));
        assert_eq!(AddrRange::new(u64::MAX, u64::MAX).map(|r| r.len()), Ok(1));
    }

    #[test]
    fn test_csv_writers_agree() {
        let mut mem = Mem::new(8);
        *mem.get_mut(5).unwrap() = u32::MAX;
        let dump = MemDump::new(&mem, AddrRange::new(4, 9).unwrap());

        let mut buf = vec![];
        dump.write_csv(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), dump.to_csv());
        assert_eq!(dump.to_csv(), "Address,Value\r\n4,0\r\n5,4294967295\r\n6,0\r\n7,0\r\n");
    }

    #[test]
    fn test_zero_dump() {
        let mem = Mem::default();
        let dump = MemDump::new(&mem, AddrRange::new(100, 131).unwrap());

        let rows: Vec<_> = dump.rows().collect();
        assert_eq!(rows.len(), 32);
        assert!(rows.iter().all(|&(_, v)| v == Some(0)));
        assert_eq!(rows.first(), Some(&(100, Some(0))));
        assert_eq!(rows.last(), Some(&(131, Some(0))));

        let csv = dump.to_csv();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Address,Value");
        assert_eq!(lines.len(), 33);
        assert_eq!(lines[1], "100,0");
    }

    #[test]
    fn test_dump_past_memory() {
        let mut mem = Mem::new(4);
        *mem.get_mut(3).unwrap() = 9;
        let dump = MemDump::new(&mem, AddrRange::new(2, 6).unwrap());

        let rows: Vec<_> = dump.rows().collect();
        assert_eq!(rows, [(2, Some(0)), (3, Some(9)), (4, None), (5, None), (6, None)]);
        assert_eq!(dump.to_csv(), "Address,Value\r\n2,0\r\n3,9\r\n");

        // entirely outside memory: header only
        let dump = MemDump::new(&mem, AddrRange::new(10, u64::MAX).unwrap());
        assert_eq!(dump.to_csv(), "Address,Value\r\n");
        assert_eq!(dump.range().len(), u128::from(u64::MAX - 9));

        // empty memory
        let empty = Mem::new(0);
        assert_eq!(MemDump::new(&empty, AddrRange::new(0, 3).unwrap()).to_csv(), "Address,Value\r\n");
    }
}
