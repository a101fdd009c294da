//! Parcel identifiers.
//!
//! A parcel key (PNU) is the concatenation of:
//!
//! ```text
//! <district code (10)> <land type (1)> <main lot (4)> <sub lot (4)>
//! ```
//!
//! e.g. lot `366-50` in district `1150010300` → `1150010300` `1` `0366` `0050`.
//! Only ordinary land (`1`) is produced; mountain lots are not part of the
//! reference tables.

use serde::{Deserialize, Serialize};

/// District code of the reference area (Hwagok-dong, Gangseo-gu).
pub const DEFAULT_DISTRICT_CODE: &str = "1150010300";

/// Land-type digit for ordinary land.
const LAND_TYPE_ORDINARY: char = '1';

/// Width of the zero-padded main and sub lot numbers.
const LOT_WIDTH: usize = 4;

/// Canonical parcel identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParcelKey(String);

impl ParcelKey {
    /// Build a key from a free-form lot number (`"366-50"`, `"1036"`, `" 50-120 "`).
    ///
    /// Returns `None` for blank/`nan` input or anything that is not one or two
    /// non-negative lot numbers separated by `-`.
    pub fn from_lot(raw: &str, district_code: &str) -> Option<ParcelKey> {
        let lot = raw.trim();
        if lot.is_empty() || lot.eq_ignore_ascii_case("nan") {
            return None;
        }

        let mut parts = lot.split('-');
        let main = parts.next()?;
        let sub = parts.next().unwrap_or("0");
        if parts.next().is_some() {
            return None;
        }

        let main = parse_lot_number(main)?;
        let sub = parse_lot_number(sub)?;

        let mut key = String::with_capacity(district_code.len() + 1 + 2 * LOT_WIDTH);
        key.push_str(district_code.trim());
        key.push(LAND_TYPE_ORDINARY);
        key.push_str(&format!("{main:0>width$}{sub:0>width$}", width = LOT_WIDTH));
        Some(ParcelKey(key))
    }

    /// Wrap an already-canonical key (as stored in the reference tables).
    pub fn from_canonical(key: &str) -> Option<ParcelKey> {
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        Some(ParcelKey(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParcelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse one lot component. Accepts `"366"`, `"0366"` and spreadsheet-style
/// `"366.0"` (the integer part is kept).
fn parse_lot_number(s: &str) -> Option<u32> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let value: f64 = s.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let n = value.trunc() as u32;
    if n >= 10u32.pow(LOT_WIDTH as u32) {
        return None;
    }
    Some(n)
}

/// Floor number for a floor label as entered on lease forms.
///
/// `"지상 2층"`, `"2층"` and `"2"` → 2; semi-basement (`"반지하"`) → 0;
/// rooftop (`"옥탑"`) → 99; anything else → 1.
pub fn parse_floor_label(label: &str) -> i32 {
    let s = label.trim();
    if let Ok(n) = s.parse::<i32>() {
        return n;
    }

    if let Some(idx) = s.find('층') {
        let digits: String = s[..idx]
            .chars()
            .rev()
            .skip_while(|c| c.is_whitespace())
            .take_while(|c| c.is_ascii_digit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        if let Ok(n) = digits.parse::<i32>() {
            return n;
        }
    }

    if s.contains("반지하") {
        return 0;
    }
    if s.contains("옥탑") {
        return 99;
    }
    1
}
