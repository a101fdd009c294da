//! CSV ingest for the reference tables.
//!
//! Turns the exported trade, lease/auction and parcel-location tables into
//! typed rows.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors, exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Both header dialects**: the English snake_case names and the Korean
//!   column names of the registry exports are accepted
//! - **Separation of concerns**: no modelling logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{AssessmentRequest, LeaseEvent, LocationRecord, ParcelKey, TradeRecord};
use crate::error::{RiskError, RiskResult};

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Parsed rows plus what was skipped.
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub rows: Vec<T>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

// Column name → accepted header spellings (normalized: trimmed, ASCII-lowercased).
const PNU: &[&str] = &["pnu"];
const CONTRACT_DATE: &[&str] = &["contract_date", "계약일"];
const BUILDING_AGE: &[&str] = &["building_age", "건축연령"];
const IN_DISTRICT: &[&str] = &["in_district", "관내"];
const LEASE_AVG_DEPOSIT: &[&str] = &["lease_avg_deposit", "전월세_평균_보증금(만원)"];
const LEASE_AVG_RENT: &[&str] = &["lease_avg_rent", "전월세_평균_월세(만원)"];
const LEASE_COUNT: &[&str] = &["lease_count", "전월세_건수"];
const PARK_DISTANCE: &[&str] = &["park_distance", "공원_최단거리"];
const SCHOOL_DISTANCE: &[&str] = &["school_distance", "교육_최단거리"];
const RETAIL_DISTANCE: &[&str] = &["retail_distance", "유통_최단거리"];
const BUYER_CORPORATE: &[&str] = &["buyer_corporate", "매수자_법인"];
const SELLER_INDIVIDUAL: &[&str] = &["seller_individual", "매도자_개인"];
const SELLER_M: &[&str] = &["seller_m", "매도자_m"];
const DIRECT_TRADE: &[&str] = &["direct_trade", "거래유형_직거래"];

const LATITUDE: &[&str] = &["latitude", "lat", "위도"];
const LONGITUDE: &[&str] = &["longitude", "lon", "경도"];
const AUCTIONED_4Y: &[&str] = &["auctioned_4y", "경매_4년이내"];
const LOCAL_MORANS_I: &[&str] = &["local_morans_i"];

const LOT: &[&str] = &["lot", "jibun", "지번"];
const REQ_AREA: &[&str] = &["area_sqm", "area_m2"];
const REQ_FLOOR: &[&str] = &["floor"];
const DEPOSIT: &[&str] = &["deposit"];
const TERM_YEARS: &[&str] = &["term_years", "term"];

/// Default contract term when a request row leaves it blank.
const DEFAULT_TERM_YEARS: f64 = 2.0;

/// Load the historical trade table.
pub fn read_trades(path: &Path) -> RiskResult<Table<TradeRecord>> {
    let file = open(path)?;
    read_trades_from(file, path)
}

pub fn read_trades_from<R: Read>(reader: R, path: &Path) -> RiskResult<Table<TradeRecord>> {
    read_table(reader, path, &[PNU], |record, cols| {
        let parcel = cols
            .get(record, PNU)
            .map(|raw| ParcelKey::from_canonical(raw).ok_or_else(|| format!("Invalid PNU '{raw}'.")))
            .transpose()?
            .ok_or_else(|| "Missing required value: `pnu`".to_string())?;

        let contract_date = cols.get(record, CONTRACT_DATE).map(parse_date).transpose()?;

        Ok(TradeRecord {
            parcel: Some(parcel),
            contract_date,
            building_age: cols.f64(record, BUILDING_AGE),
            in_district: cols.f64(record, IN_DISTRICT),
            lease_avg_deposit: cols.f64(record, LEASE_AVG_DEPOSIT),
            lease_avg_rent: cols.f64(record, LEASE_AVG_RENT),
            lease_count: cols.f64(record, LEASE_COUNT),
            park_distance: cols.f64(record, PARK_DISTANCE),
            school_distance: cols.f64(record, SCHOOL_DISTANCE),
            retail_distance: cols.f64(record, RETAIL_DISTANCE),
            buyer_corporate: cols.f64(record, BUYER_CORPORATE),
            seller_individual: cols.f64(record, SELLER_INDIVIDUAL),
            seller_m: cols.f64(record, SELLER_M),
            direct_trade: cols.f64(record, DIRECT_TRADE),
        })
    })
}

/// Load the historical lease/auction table.
///
/// Rows with missing coordinates or Moran's I are kept (they still count
/// towards the suspected-case total); the spatial engine skips them.
pub fn read_lease_events(path: &Path) -> RiskResult<Table<LeaseEvent>> {
    let file = open(path)?;
    read_lease_events_from(file, path)
}

pub fn read_lease_events_from<R: Read>(reader: R, path: &Path) -> RiskResult<Table<LeaseEvent>> {
    read_table(
        reader,
        path,
        &[LATITUDE, LONGITUDE, AUCTIONED_4Y, LOCAL_MORANS_I],
        |record, cols| {
            let auctioned_4y = match cols.get(record, AUCTIONED_4Y) {
                Some(raw) => parse_flag(raw).ok_or_else(|| format!("Invalid auction flag '{raw}'."))?,
                None => false,
            };
            Ok(LeaseEvent {
                latitude: cols.f64(record, LATITUDE),
                longitude: cols.f64(record, LONGITUDE),
                auctioned_4y,
                local_morans_i: cols.f64(record, LOCAL_MORANS_I),
            })
        },
    )
}

/// Load the parcel → coordinate table.
pub fn read_locations(path: &Path) -> RiskResult<Table<(ParcelKey, LocationRecord)>> {
    let file = open(path)?;
    read_locations_from(file, path)
}

pub fn read_locations_from<R: Read>(reader: R, path: &Path) -> RiskResult<Table<(ParcelKey, LocationRecord)>> {
    read_table(reader, path, &[PNU, LATITUDE, LONGITUDE], |record, cols| {
        let raw = cols.required(record, PNU)?;
        let parcel = ParcelKey::from_canonical(raw).ok_or_else(|| format!("Invalid PNU '{raw}'."))?;
        let latitude = cols
            .f64(record, LATITUDE)
            .ok_or_else(|| "Missing/invalid `latitude` value.".to_string())?;
        let longitude = cols
            .f64(record, LONGITUDE)
            .ok_or_else(|| "Missing/invalid `longitude` value.".to_string())?;
        Ok((parcel, LocationRecord { latitude, longitude }))
    })
}

/// Load a batch of assessment requests (`lot,area_sqm,floor,deposit[,term_years]`).
pub fn read_requests(path: &Path) -> RiskResult<Table<AssessmentRequest>> {
    let file = open(path)?;
    read_requests_from(file, path)
}

pub fn read_requests_from<R: Read>(reader: R, path: &Path) -> RiskResult<Table<AssessmentRequest>> {
    read_table(reader, path, &[LOT, REQ_AREA, REQ_FLOOR, DEPOSIT], |record, cols| {
        let lot = cols.required(record, LOT)?.to_string();
        let area_sqm = cols
            .f64(record, REQ_AREA)
            .ok_or_else(|| "Missing/invalid `area_sqm` value.".to_string())?;
        let floor = cols
            .get(record, REQ_FLOOR)
            .map(crate::domain::parse_floor_label)
            .ok_or_else(|| "Missing required value: `floor`".to_string())?;
        let deposit = cols
            .f64(record, DEPOSIT)
            .ok_or_else(|| "Missing/invalid `deposit` value.".to_string())?;
        let term_years = cols.f64(record, TERM_YEARS).unwrap_or(DEFAULT_TERM_YEARS);
        Ok(AssessmentRequest {
            lot,
            area_sqm,
            floor,
            deposit,
            term_years,
        })
    })
}

fn open(path: &Path) -> RiskResult<File> {
    File::open(path).map_err(|e| RiskError::data(path, format!("failed to open CSV: {e}")))
}

fn read_table<T, R, F>(reader: R, path: &Path, required: &[&[&str]], parse: F) -> RiskResult<Table<T>>
where
    R: Read,
    F: Fn(&StringRecord, &Columns) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| RiskError::data(path, format!("failed to read CSV headers: {e}")))?
        .clone();
    let cols = Columns::new(&headers);

    for names in required {
        if cols.index(names).is_none() {
            return Err(RiskError::data(
                path,
                format!("missing required column: `{}`", names[0]),
            ));
        }
    }

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: header line, and 1-based line numbers.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse(&record, &cols) {
            Ok(row) => rows.push(row),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        tracing::warn!(file = %path.display(), line = err.line, "skipped row: {}", err.message);
    }

    Ok(Table {
        rows,
        row_errors,
        rows_read,
    })
}

/// Header name → column index.
struct Columns {
    map: HashMap<String, usize>,
}

impl Columns {
    fn new(headers: &StringRecord) -> Self {
        let map = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header_name(name), idx))
            .collect();
        Self { map }
    }

    fn index(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|n| self.map.get(*n).copied())
    }

    fn get<'a>(&self, record: &'a StringRecord, names: &[&str]) -> Option<&'a str> {
        let idx = self.index(names)?;
        record.get(idx).map(str::trim).filter(|s| !s.is_empty())
    }

    fn required<'a>(&self, record: &'a StringRecord, names: &[&str]) -> Result<&'a str, String> {
        self.get(record, names)
            .ok_or_else(|| format!("Missing required value: `{}`", names[0]))
    }

    fn f64(&self, record: &StringRecord, names: &[&str]) -> Option<f64> {
        parse_opt_f64(self.get(record, names))
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    // Registry exports use `YYYYMMDD`; hand-edited sheets drift to ISO or dotted dates.
    const FMTS: [&str; 4] = ["%Y%m%d", "%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYYMMDD, YYYY-MM-DD, YYYY.MM.DD, YYYY/MM/DD."
    ))
}

fn parse_flag(s: &str) -> Option<bool> {
    if let Some(v) = parse_opt_f64(Some(s)) {
        return Some(v != 0.0);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?;
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn trades_accept_korean_headers() {
        let csv = "\u{feff}PNU,계약일,건축연령,매도자_M,전월세_평균_보증금(만원)\n\
                   1150010300103660050,20230115,12,1,21000\n";
        let table = read_trades_from(csv.as_bytes(), path()).unwrap();
        assert_eq!(table.rows.len(), 1);
        let row = &table.rows[0];
        assert_eq!(row.parcel.as_ref().unwrap().as_str(), "1150010300103660050");
        assert_eq!(row.contract_date, NaiveDate::from_ymd_opt(2023, 1, 15));
        assert_eq!(row.building_age, Some(12.0));
        assert_eq!(row.seller_m, Some(1.0));
        assert_eq!(row.lease_avg_deposit, Some(21000.0));
        assert_eq!(row.park_distance, None);
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "pnu,contract_date,floor\n\
                   1150010300103660050,2023-01-15,3\n\
                   ,2023-01-15,3\n\
                   1150010300103660050,15/01/2023,3\n";
        let table = read_trades_from(csv.as_bytes(), path()).unwrap();
        assert_eq!(table.rows_read, 3);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.row_errors.len(), 2);
        assert_eq!(table.row_errors[0].line, 3);
        assert!(table.row_errors[1].message.contains("Invalid date"));
    }

    #[test]
    fn missing_required_column_is_a_hard_error() {
        let csv = "latitude,longitude,auctioned_4y\n37.5,126.8,1\n";
        let err = read_lease_events_from(csv.as_bytes(), path()).unwrap_err();
        assert!(err.to_string().contains("local_morans_i"), "{err}");
    }

    #[test]
    fn lease_events_keep_incomplete_rows() {
        let csv = "위도,경도,경매_4년이내,local_morans_i\n\
                   37.55,126.85,1,0.4\n\
                   ,126.85,1.0,0.2\n\
                   37.56,126.84,,\n";
        let table = read_lease_events_from(csv.as_bytes(), path()).unwrap();
        assert_eq!(table.rows.len(), 3);
        assert!(table.rows[0].auctioned_4y && table.rows[1].auctioned_4y);
        assert!(!table.rows[2].auctioned_4y);
        assert_eq!(table.rows[1].latitude, None);
        assert_eq!(table.rows[2].local_morans_i, None);
    }

    #[test]
    fn columns_without_a_consumer_are_ignored() {
        let csv = "latitude,longitude,auctioned_4y,local_morans_i,residual\n37.55,126.85,1,0.4,-0.31\n";
        let table = read_lease_events_from(csv.as_bytes(), path()).unwrap();
        assert!(table.row_errors.is_empty());
        assert_eq!(table.rows[0].complete(), Some((37.55, 126.85, 0.4)));
    }

    #[test]
    fn requests_parse_floor_labels_and_default_term() {
        let csv = "lot,area_sqm,floor,deposit\n366-50,29.94,지상 4층,27000\n";
        let table = read_requests_from(csv.as_bytes(), path()).unwrap();
        let req = &table.rows[0];
        assert_eq!(req.floor, 4);
        assert_eq!(req.term_years, DEFAULT_TERM_YEARS);
    }
}
