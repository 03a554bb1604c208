use crate::error::{ForecastError, Result};
use crate::schema::TransactionRecord;
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const COL_INVOICE: &str = "InvoiceNo";
const COL_PRODUCT: &str = "StockCode";
const COL_DESCRIPTION: &str = "Description";
const COL_QUANTITY: &str = "Quantity";
const COL_TIMESTAMP: &str = "InvoiceDate";
const COL_UNIT_PRICE: &str = "UnitPrice";
const COL_MARKET: &str = "Country";

const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
];

#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub records: Vec<TransactionRecord>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

struct ColumnLayout {
    invoice: Option<usize>,
    product: usize,
    description: Option<usize>,
    quantity: usize,
    timestamp: usize,
    unit_price: usize,
    market: usize,
}

impl ColumnLayout {
    fn from_headers(headers: &[String]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| ForecastError::MissingColumn(name.to_string()))
        };

        Ok(Self {
            invoice: find(COL_INVOICE),
            product: require(COL_PRODUCT)?,
            description: find(COL_DESCRIPTION),
            quantity: require(COL_QUANTITY)?,
            timestamp: require(COL_TIMESTAMP)?,
            unit_price: require(COL_UNIT_PRICE)?,
            market: require(COL_MARKET)?,
        })
    }
}

pub fn load_transactions_csv<P: AsRef<Path>>(path: P) -> Result<IngestionSummary> {
    let file = File::open(path)?;
    read_transactions(BufReader::new(file))
}

/// Reads invoice-export CSV rows. Rows with a missing or unparseable date, stock code,
/// quantity, unit price or country are dropped and counted, never surfaced as errors.
pub fn read_transactions<R: Read>(reader: R) -> Result<IngestionSummary> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = reader.byte_headers()?.iter().map(decode_field).collect();
    let layout = ColumnLayout::from_headers(&headers)?;

    let mut records = Vec::new();
    let mut rows_read = 0;
    let mut rows_dropped = 0;

    for row in reader.byte_records() {
        let row = row?;
        rows_read += 1;

        let fields: Vec<String> = row.iter().map(decode_field).collect();
        match parse_row(&fields, &layout) {
            Some(record) => records.push(record),
            None => {
                rows_dropped += 1;
                debug!("Dropping malformed transaction row {}", rows_read);
            }
        }
    }

    if rows_dropped > 0 {
        warn!(
            "Dropped {} of {} transaction rows with missing or invalid fields",
            rows_dropped, rows_read
        );
    }

    Ok(IngestionSummary {
        records,
        rows_read,
        rows_dropped,
    })
}

fn parse_row(fields: &[String], layout: &ColumnLayout) -> Option<TransactionRecord> {
    let get = |idx: usize| fields.get(idx).map(|f| f.trim()).filter(|f| !f.is_empty());
    let optional = |idx: Option<usize>| idx.and_then(get).map(str::to_string);

    let timestamp = parse_timestamp(get(layout.timestamp)?)?;
    let product_id = get(layout.product)?.to_string();
    let quantity = parse_quantity(get(layout.quantity)?)?;
    let unit_price = get(layout.unit_price)?
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())?;
    let market = get(layout.market)?.to_string();

    Some(TransactionRecord {
        invoice_id: optional(layout.invoice),
        timestamp,
        product_id,
        description: optional(layout.description),
        quantity,
        unit_price,
        market,
    })
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_quantity(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|q| q.is_finite() && q.fract() == 0.0)
            .map(|q| q as i64)
    })
}

/// Exports are usually Latin-1; valid UTF-8 is taken as-is.
fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Sorted, de-duplicated product identifiers.
pub fn distinct_products(records: &[TransactionRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.product_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sorted, de-duplicated markets.
pub fn distinct_markets(records: &[TransactionRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.market.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country
536365,85123A,WHITE HANGING HEART T-LIGHT HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom
536365,71053,WHITE METAL LANTERN,6,12/1/2010 8:26,3.39,17850,United Kingdom
536366,22633,HAND WARMER UNION JACK,,12/1/2010 8:28,1.85,17850,United Kingdom
536367,84879,ASSORTED COLOUR BIRD ORNAMENT,32,not a date,1.69,13047,United Kingdom
536370,22728,ALARM CLOCK BAKELIKE PINK,24,12/1/2010 8:45,3.75,12583,France
";

    #[test]
    fn test_read_transactions_drops_malformed_rows() {
        let result = read_transactions(SAMPLE.as_bytes()).unwrap();
        assert_eq!(result.rows_read, 5);
        assert_eq!(result.rows_dropped, 2);
        assert_eq!(result.records.len(), 3);

        let first = &result.records[0];
        assert_eq!(first.product_id, "85123A");
        assert_eq!(first.quantity, 6);
        assert_eq!(first.market, "United Kingdom");
        assert_eq!(first.invoice_id.as_deref(), Some("536365"));
        assert_eq!(
            first.timestamp,
            NaiveDate::from_ymd_opt(2010, 12, 1)
                .unwrap()
                .and_hms_opt(8, 26, 0)
                .unwrap()
        );
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "StockCode,Quantity,InvoiceDate,UnitPrice\n85123A,6,2010-12-01,2.55\n";
        let result = read_transactions(csv.as_bytes());
        assert!(matches!(result, Err(ForecastError::MissingColumn(col)) if col == "Country"));
    }

    #[test]
    fn test_latin1_fields_are_decoded() {
        let mut bytes = b"StockCode,Quantity,InvoiceDate,UnitPrice,Country\n".to_vec();
        bytes.extend_from_slice(b"21000,1,2011-01-05 10:00:00,4.95,R\xe9union\n");
        let result = read_transactions(bytes.as_slice()).unwrap();
        assert_eq!(result.records[0].market, "Réunion");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("12/9/2011 12:50").is_some());
        assert!(parse_timestamp("2011-12-09 12:50:00").is_some());
        assert!(parse_timestamp("2011-12-09T12:50:00").is_some());
        assert!(parse_timestamp("2011-12-09").is_some());
        assert!(parse_timestamp("09.12.2011").is_none());
    }

    #[test]
    fn test_parse_quantity_accepts_integral_floats() {
        assert_eq!(parse_quantity("12"), Some(12));
        assert_eq!(parse_quantity("-3"), Some(-3));
        assert_eq!(parse_quantity("4.0"), Some(4));
        assert_eq!(parse_quantity("4.5"), None);
    }

    #[test]
    fn test_distinct_selectors_are_sorted() {
        let result = read_transactions(SAMPLE.as_bytes()).unwrap();
        assert_eq!(distinct_products(&result.records), vec!["22728", "71053", "85123A"]);
        assert_eq!(distinct_markets(&result.records), vec!["France", "United Kingdom"]);
    }
}
