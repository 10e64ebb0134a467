//! A1-notation range addressing. Pure values, no I/O.
//!
//! Columns are integers internally (1-based) and letters only at the wire
//! boundary and in config, so arithmetic like "the manager column for row N"
//! never touches strings.

use std::fmt;

use leadwire_core::error::{LeadwireError, Result};

/// One cell, 1-based in both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", col_letters(self.col), self.row)
    }
}

/// A rectangular region of one sheet. `end = None` means a single cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeAddress {
    pub sheet: String,
    pub start: CellRef,
    pub end: Option<CellRef>,
}

impl RangeAddress {
    pub fn new(sheet: impl Into<String>, start: CellRef, end: Option<CellRef>) -> Self {
        Self { sheet: sheet.into(), start, end }
    }

    /// Build a range from config-style corners ("A", 2, "E", 600).
    pub fn from_corners(
        sheet: &str,
        first_col: &str,
        start_row: u32,
        last_col: &str,
        last_row: u32,
    ) -> Result<Self> {
        let start = CellRef::new(parse_col(first_col)?, start_row);
        let end = CellRef::new(parse_col(last_col)?, last_row);
        Ok(Self::new(sheet, start, Some(end)))
    }

    /// Single-cell range on the same sheet.
    pub fn cell(&self, col: u32, row: u32) -> Self {
        Self::new(self.sheet.clone(), CellRef::new(col, row), None)
    }

    /// Derive a copy with new corners, preserving the sheet name.
    pub fn shifted(&self, start: CellRef, end: Option<CellRef>) -> Self {
        Self::new(self.sheet.clone(), start, end)
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "{}!{}:{}", self.sheet, self.start, end),
            None => write!(f, "{}!{}", self.sheet, self.start),
        }
    }
}

/// Render a 1-based column index as letters (1→A, 26→Z, 27→AA, 703→AAA).
pub fn col_letters(col: u32) -> String {
    let mut n = col;
    let mut out = Vec::new();
    while n > 0 {
        n -= 1;
        out.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Parse column letters back to a 1-based index. Case-insensitive.
pub fn parse_col(s: &str) -> Result<u32> {
    let s = s.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(LeadwireError::Config(format!("Bad column letters: {s:?}")));
    }
    let mut acc: u32 = 0;
    for c in s.chars() {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc = acc
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .ok_or_else(|| LeadwireError::Config(format!("Column letters out of range: {s:?}")))?;
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_col_letters() {
        assert_eq!(col_letters(1), "A");
        assert_eq!(col_letters(26), "Z");
        assert_eq!(col_letters(27), "AA");
        assert_eq!(col_letters(52), "AZ");
        assert_eq!(col_letters(703), "AAA");
    }

    #[test]
    fn test_parse_col_round_trip() {
        for col in [1, 5, 26, 27, 52, 702, 703, 18278] {
            assert_eq!(parse_col(&col_letters(col)).unwrap(), col);
        }
        assert_eq!(parse_col("aa").unwrap(), 27);
    }

    #[test]
    fn test_parse_col_rejects_garbage() {
        assert!(parse_col("").is_err());
        assert!(parse_col("A1").is_err());
        assert!(parse_col("!").is_err());
    }

    #[test]
    fn test_parse_col_rejects_overflow() {
        // past u32 range the fold must error out, not wrap or panic
        assert!(parse_col("ZZZZZZZ").is_err());
        assert!(parse_col(&"Z".repeat(10)).is_err());
    }

    #[test]
    fn test_range_display() {
        let range = RangeAddress::from_corners("LEADS", "A", 2, "E", 600).unwrap();
        assert_eq!(range.to_string(), "LEADS!A2:E600");
        assert_eq!(range.cell(5, 7).to_string(), "LEADS!E7");
    }

    #[test]
    fn test_shifted_keeps_sheet() {
        let range = RangeAddress::from_corners("LEADS", "A", 2, "E", 600).unwrap();
        let shifted = range.shifted(CellRef::new(5, 2), Some(CellRef::new(5, 600)));
        assert_eq!(shifted.sheet, "LEADS");
        assert_eq!(shifted.to_string(), "LEADS!E2:E600");
    }
}
