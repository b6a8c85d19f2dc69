//! Source record loader: delimited text and Excel workbooks to typed records.
//!
//! Only a missing configured column is fatal. Unparseable dates and amounts
//! load as typed absences so the engine can report them.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;

use crate::config::SourceConfig;
use crate::error::ReconError;
use crate::normalize::RawIdentifier;
use crate::record::{
    DateField, DocumentKind, GrnRecord, IssueRecord, MovementRecord, RecordOrigin, SourceRecord,
    SupplierTransaction, VoucherRecord,
};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%Y/%m/%d",
];

/// Tried only after every four-digit-year format has failed.
const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y", "%d-%b-%y", "%d %b %y"];

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// One cell, as loosely typed as the file format allows.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Integer(i64),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Load `path` as records of `kind`, dispatching on the file extension.
pub fn load_records(
    kind: DocumentKind,
    source_name: &str,
    path: &Path,
    config: &SourceConfig,
) -> Result<Vec<SourceRecord>, ReconError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
        load_workbook(kind, source_name, path, config)
    } else {
        let bytes = std::fs::read(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        let text = String::from_utf8_lossy(&bytes);
        load_delimited(kind, source_name, &file_label(path), &text, config)
    }
}

/// Load delimited text. The delimiter is sniffed unless configured.
pub fn load_delimited(
    kind: DocumentKind,
    source_name: &str,
    file_label: &str,
    text: &str,
    config: &SourceConfig,
) -> Result<Vec<SourceRecord>, ReconError> {
    let delimiter = match config.delimiter {
        Some(c) if c.is_ascii() => c as u8,
        Some(c) => {
            return Err(ReconError::ConfigValidation(format!(
                "source '{source_name}': delimiter '{c}' is not ASCII"
            )))
        }
        None => sniff_delimiter(text),
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let line = record.position().map(|p| p.line() as usize).unwrap_or(i + 2);
        let cells = record
            .iter()
            .map(|v| {
                if v.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(v.to_string())
                }
            })
            .collect();
        rows.push((line, cells));
    }

    build_records(kind, source_name, file_label, &headers, rows, config)
}

fn load_workbook(
    kind: DocumentKind,
    source_name: &str,
    path: &Path,
    config: &SourceConfig,
) -> Result<Vec<SourceRecord>, ReconError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| ReconError::Workbook(format!("cannot open {}: {e}", path.display())))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet = match &config.sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| *s == name)
            .cloned()
            .ok_or_else(|| {
                ReconError::Workbook(format!("{}: no sheet named '{name}'", path.display()))
            })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ReconError::Workbook(format!("{}: workbook has no sheets", path.display())))?,
    };

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ReconError::Workbook(format!("cannot read sheet '{sheet}': {e}")))?;
    let start_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

    let mut header: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    for (i, row) in range.rows().enumerate() {
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        if header.is_none() {
            header = Some(cells.iter().map(cell_text).map(|s| s.trim().to_string()).collect());
            continue;
        }
        rows.push((start_row + i + 1, cells));
    }

    let Some(headers) = header else {
        log::warn!("source '{source_name}': sheet '{sheet}' is empty");
        return Ok(Vec::new());
    };

    build_records(kind, source_name, &file_label(path), &headers, rows, config)
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Int(n) => Cell::Integer(*n),
        // Reference columns often come back as floats; keep them integral.
        Data::Float(n) if n.fract() == 0.0 && n.abs() < 1e15 => Cell::Integer(*n as i64),
        Data::Float(n) => Cell::Number(*n),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => excel_serial_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Number(dt.as_f64())),
    }
}

fn cell_text(cell: &Cell) -> String {
    match cell {
        Cell::Empty => String::new(),
        Cell::Text(s) => s.clone(),
        Cell::Integer(n) => n.to_string(),
        Cell::Number(n) => n.to_string(),
        Cell::Date(d) => d.to_string(),
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ---------------------------------------------------------------------------
// Row → record
// ---------------------------------------------------------------------------

struct Row<'a> {
    cells: &'a [Cell],
    columns: &'a BTreeMap<&'a str, usize>,
}

impl Row<'_> {
    fn cell(&self, name: &str) -> &Cell {
        self.columns
            .get(name)
            .and_then(|&i| self.cells.get(i))
            .unwrap_or(&Cell::Empty)
    }

    fn raw(&self, name: &str) -> RawIdentifier {
        match self.cell(name) {
            Cell::Empty => RawIdentifier::Missing,
            Cell::Integer(n) => RawIdentifier::Integer(*n),
            other if other.is_blank() => RawIdentifier::Missing,
            other => RawIdentifier::Text(cell_text(other)),
        }
    }

    fn text(&self, name: &str) -> Option<String> {
        let cell = self.cell(name);
        if cell.is_blank() {
            None
        } else {
            Some(cell_text(cell).trim().to_string())
        }
    }

    fn date(&self, name: &str) -> DateField {
        match self.cell(name) {
            Cell::Empty => DateField::Missing,
            Cell::Date(d) => DateField::Parsed(*d),
            Cell::Integer(n) => excel_serial_date(*n as f64)
                .map(DateField::Parsed)
                .unwrap_or_else(|| DateField::Unparseable(n.to_string())),
            Cell::Number(n) => excel_serial_date(*n)
                .map(DateField::Parsed)
                .unwrap_or_else(|| DateField::Unparseable(n.to_string())),
            Cell::Text(s) if s.trim().is_empty() => DateField::Missing,
            Cell::Text(s) => parse_date(s)
                .map(DateField::Parsed)
                .unwrap_or_else(|| DateField::Unparseable(s.clone())),
        }
    }

    fn amount(&self, name: &str) -> Option<Decimal> {
        match self.cell(name) {
            Cell::Integer(n) => Some(Decimal::from(*n)),
            Cell::Number(n) => Decimal::try_from(*n).ok(),
            Cell::Text(s) => parse_amount(s),
            Cell::Empty | Cell::Date(_) => None,
        }
    }
}

fn build_records(
    kind: DocumentKind,
    source_name: &str,
    file_label: &str,
    headers: &[String],
    rows: Vec<(usize, Vec<Cell>)>,
    config: &SourceConfig,
) -> Result<Vec<SourceRecord>, ReconError> {
    let mut columns: BTreeMap<&str, usize> = BTreeMap::new();
    for (logical, header) in &config.columns {
        let wanted = header.trim();
        let idx = headers
            .iter()
            .position(|h| h == wanted)
            .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case(wanted)))
            .ok_or_else(|| ReconError::MissingColumn {
                source_name: source_name.to_string(),
                column: header.clone(),
            })?;
        columns.insert(logical.as_str(), idx);
    }

    let mut records = Vec::with_capacity(rows.len());
    let mut bad_dates = 0;
    let mut bad_amounts = 0;

    for (line, cells) in rows {
        if cells.iter().all(Cell::is_blank) {
            continue;
        }
        let row = Row {
            cells: &cells,
            columns: &columns,
        };
        let origin = RecordOrigin::new(file_label, line);
        let date = row.date("date");
        let amount = row.amount("amount");
        if matches!(date, DateField::Unparseable(_)) {
            bad_dates += 1;
        }
        if amount.is_none() && columns.contains_key("amount") && !row.cell("amount").is_blank() {
            bad_amounts += 1;
        }

        let record = match kind {
            DocumentKind::Grn => SourceRecord::Grn(GrnRecord {
                origin,
                grn_number: row.raw("grn_number"),
                invoice_number: row.raw("invoice_number"),
                voucher_number: row.raw("voucher_number"),
                supplier: row.text("supplier"),
                date,
                amount,
            }),
            DocumentKind::Issue => SourceRecord::Issue(IssueRecord {
                origin,
                issue_number: row.raw("issue_number"),
                requisition_number: row.raw("requisition_number"),
                department: row.text("department"),
                date,
                amount,
            }),
            DocumentKind::Voucher => SourceRecord::Voucher(VoucherRecord {
                origin,
                voucher_number: row.raw("voucher_number"),
                payee: row.text("payee"),
                date,
                amount,
            }),
            DocumentKind::SupplierTransaction => {
                SourceRecord::SupplierTransaction(SupplierTransaction {
                    origin,
                    reference: row.raw("reference"),
                    transaction_type: row.text("transaction_type"),
                    counterparty: row.text("counterparty"),
                    date,
                    amount,
                })
            }
            DocumentKind::Movement => SourceRecord::Movement(MovementRecord {
                origin,
                document_number: row.raw("document_number"),
                requisition_number: row.raw("requisition_number"),
                voucher_number: row.raw("voucher_number"),
                counterparty: row.text("counterparty"),
                item: row.text("item"),
                date,
                amount,
            }),
        };
        records.push(record);
    }

    if bad_dates > 0 || bad_amounts > 0 {
        log::warn!(
            "source '{source_name}' ({file_label}): {bad_dates} unparseable date(s), {bad_amounts} unparseable amount(s)"
        );
    }
    log::debug!("source '{source_name}': loaded {} {kind} records", records.len());

    Ok(records)
}

// ---------------------------------------------------------------------------
// Value parsing
// ---------------------------------------------------------------------------

/// Detect the most likely field delimiter by checking consistency across the
/// first few lines. Candidates: tab, semicolon, comma, pipe.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    let mut best = b',';
    let mut best_score = 0usize;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let first = counts.first().copied().unwrap_or(0);
        if first <= 1 {
            continue;
        }
        // Lines agreeing with the header width, weighted by that width.
        let score = counts.iter().filter(|&&c| c == first).count() * first;
        if score > best_score {
            best = delim;
            best_score = score;
        }
    }

    best
}

/// Parse a date in any of the formats seen in stock-management exports.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    // `%Y` happily reads "22" as year 22, so a two-digit year has to fall
    // through to the `%y` formats.
    let parse = |candidate: &str| {
        DATE_FORMATS
            .iter()
            .filter_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
            .find(|d| d.year() >= 100)
            .or_else(|| {
                SHORT_YEAR_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(candidate, fmt).ok())
            })
    };
    if let Some(d) = parse(s) {
        return Some(d);
    }
    // Datetime exports: `2022-07-21T00:00:00`, `21/07/2022 14:03`.
    let date_part = match s.find(['T', ' ']) {
        Some(i) => &s[..i],
        None => return None,
    };
    parse(date_part)
}

/// Parse a monetary amount: thousands separators, a currency prefix and
/// parenthesised negatives are accepted.
pub fn parse_amount(s: &str) -> Option<Decimal> {
    let mut t = s.trim();
    let negative = t.len() >= 2 && t.starts_with('(') && t.ends_with(')');
    if negative {
        t = &t[1..t.len() - 1];
    }
    let cleaned: String = t
        .trim_start_matches(|c: char| c.is_alphabetic() || c == '$' || c.is_whitespace())
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value = Decimal::from_str(&cleaned).ok()?;
    Some(if negative { -value } else { value })
}

/// Excel 1900-system serial to date. Rejects values outside the valid range.
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !(1.0..2_958_466.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(serial.floor() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(columns: &[(&str, &str)]) -> SourceConfig {
        SourceConfig {
            file: "x.csv".into(),
            sheet: None,
            delimiter: None,
            columns: columns
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn loads_grn_csv() {
        let csv = "\
GRN No,Invoice No,Voucher No,Supplier,Date,Amount
G1,0001015775,PV0012,Acme Ltd,21/07/2022,\"84,588.37\"
G2,,PV0013,Beta,2022-07-22,(100.00)
";
        let cfg = config(&[
            ("grn_number", "GRN No"),
            ("invoice_number", "Invoice No"),
            ("voucher_number", "Voucher No"),
            ("supplier", "Supplier"),
            ("date", "Date"),
            ("amount", "Amount"),
        ]);
        let records = load_delimited(DocumentKind::Grn, "grn", "grn.csv", csv, &cfg).unwrap();
        assert_eq!(records.len(), 2);

        let SourceRecord::Grn(first) = &records[0] else {
            panic!("expected GRN record");
        };
        assert_eq!(first.invoice_number, "0001015775".into());
        assert_eq!(first.supplier.as_deref(), Some("Acme Ltd"));
        assert_eq!(first.date, DateField::Parsed(NaiveDate::from_ymd_opt(2022, 7, 21).unwrap()));
        assert_eq!(first.amount, Decimal::from_str("84588.37").ok());
        assert_eq!(first.origin, RecordOrigin::new("grn.csv", 2));

        let SourceRecord::Grn(second) = &records[1] else {
            panic!("expected GRN record");
        };
        assert_eq!(second.invoice_number, RawIdentifier::Missing);
        assert_eq!(second.amount, Decimal::from_str("-100.00").ok());
    }

    #[test]
    fn sniffs_tab_and_semicolon() {
        assert_eq!(sniff_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
        assert_eq!(sniff_delimiter("a;b;c\n1;2,5;3\n"), b';');
        assert_eq!(sniff_delimiter("a,b\n1,2\n"), b',');
    }

    #[test]
    fn missing_configured_column_is_structural() {
        let cfg = config(&[("voucher_number", "Voucher")]);
        let err = load_delimited(DocumentKind::Voucher, "voucher", "v.csv", "PV No,Amount\n1,2\n", &cfg)
            .unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
        assert!(err.to_string().contains("Voucher"));
    }

    #[test]
    fn unmapped_columns_are_absent_not_errors() {
        let cfg = config(&[("voucher_number", "PV No")]);
        let records =
            load_delimited(DocumentKind::Voucher, "voucher", "v.csv", "PV No,Other\n7,x\n", &cfg).unwrap();
        let SourceRecord::Voucher(v) = &records[0] else {
            panic!("expected voucher");
        };
        assert_eq!(v.date, DateField::Missing);
        assert_eq!(v.amount, None);
        assert_eq!(v.payee, None);
    }

    #[test]
    fn header_match_falls_back_to_case_insensitive() {
        let cfg = config(&[("reference", "REFERENCE"), ("date", "date")]);
        let records = load_delimited(
            DocumentKind::SupplierTransaction,
            "statement",
            "s.csv",
            "Reference,Date\nINVI005662,not a date\n",
            &cfg,
        )
        .unwrap();
        let SourceRecord::SupplierTransaction(t) = &records[0] else {
            panic!("expected transaction");
        };
        assert_eq!(t.reference, "INVI005662".into());
        assert_eq!(t.date, DateField::Unparseable("not a date".into()));
    }

    #[test]
    fn loads_movement_counterparty() {
        let cfg = config(&[("document_number", "Doc"), ("counterparty", "Party"), ("item", "Item")]);
        let records = load_delimited(
            DocumentKind::Movement,
            "movement",
            "movements.csv",
            "Doc|Party|Item\nSIV0042| Stores East |Cement 50kg\n",
            &cfg,
        )
        .unwrap();
        let SourceRecord::Movement(m) = &records[0] else {
            panic!("expected movement");
        };
        assert_eq!(m.document_number, "SIV0042".into());
        assert_eq!(m.counterparty.as_deref(), Some("Stores East"));
        assert_eq!(m.item.as_deref(), Some("Cement 50kg"));
    }

    #[test]
    fn blank_rows_are_skipped() {
        let cfg = config(&[("voucher_number", "PV")]);
        let records =
            load_delimited(DocumentKind::Voucher, "voucher", "v.csv", "PV\n1\n\n,\n2\n", &cfg).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn date_formats() {
        let d = NaiveDate::from_ymd_opt(2022, 7, 21).unwrap();
        for s in ["2022-07-21", "21/07/2022", "21-07-2022", "21.07.2022", "21-Jul-2022", "21 Jul 2022", "2022-07-21T08:15:00", "21/07/2022 14:03"] {
            assert_eq!(parse_date(s), Some(d), "{s}");
        }
        assert_eq!(parse_date("July"), None);
    }

    #[test]
    fn two_digit_years_are_this_century() {
        let d = NaiveDate::from_ymd_opt(2022, 7, 21).unwrap();
        for s in ["21/07/22", "21-07-22", "21.07.22", "21-Jul-22", "21 Jul 22", "21/07/22 14:03"] {
            assert_eq!(parse_date(s), Some(d), "{s}");
        }
        assert_eq!(parse_date("21/07/2022"), Some(d));
    }

    #[test]
    fn amount_formats() {
        assert_eq!(parse_amount("1,234.50"), Decimal::from_str("1234.50").ok());
        assert_eq!(parse_amount("KES 1,000"), Decimal::from_str("1000").ok());
        assert_eq!(parse_amount("(12.5)"), Decimal::from_str("-12.5").ok());
        assert_eq!(parse_amount("-3"), Decimal::from_str("-3").ok());
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("n/a"), None);
    }

    #[test]
    fn workbook_cells() {
        use calamine::{CellErrorType, ExcelDateTime, ExcelDateTimeType};

        assert_eq!(cell_from_data(&Data::Float(1015775.0)), Cell::Integer(1015775));
        assert_eq!(cell_from_data(&Data::Float(12.5)), Cell::Number(12.5));
        assert_eq!(cell_from_data(&Data::Int(7)), Cell::Integer(7));
        assert_eq!(cell_from_data(&Data::Error(CellErrorType::NA)), Cell::Empty);
        assert_eq!(
            cell_from_data(&Data::DateTime(ExcelDateTime::new(44763.25, ExcelDateTimeType::DateTime, false))),
            Cell::Date(NaiveDate::from_ymd_opt(2022, 7, 21).unwrap())
        );
        assert_eq!(cell_from_data(&Data::Bool(true)), Cell::Text("TRUE".into()));
    }

    #[test]
    fn float_reference_links_to_padded_text() {
        let cells = vec![cell_from_data(&Data::Float(1015775.0))];
        let columns = BTreeMap::from([("reference", 0usize)]);
        let row = Row { cells: &cells, columns: &columns };
        let norm = crate::normalize::Normalizer::default();
        assert!(crate::normalize::same_reference(
            norm.normalize(&row.raw("reference")).as_ref(),
            norm.normalize(&RawIdentifier::from("0001015775")).as_ref(),
        ));
    }

    fn workbook_fixture() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/statement.xlsx")
    }

    fn statement_columns(sheet: Option<&str>) -> SourceConfig {
        let mut cfg = config(&[
            ("reference", "Reference"),
            ("transaction_type", "Type"),
            ("counterparty", "Supplier"),
            ("date", "Date"),
            ("amount", "Amount"),
        ]);
        cfg.file = "statement.xlsx".into();
        cfg.sheet = sheet.map(str::to_string);
        cfg
    }

    #[test]
    fn loads_named_sheet_from_workbook() {
        let records = load_records(
            DocumentKind::SupplierTransaction,
            "statement",
            &workbook_fixture(),
            &statement_columns(Some("Statement")),
        )
        .unwrap();
        assert_eq!(records.len(), 2);

        let SourceRecord::SupplierTransaction(invoice) = &records[0] else {
            panic!("expected transaction");
        };
        assert_eq!(invoice.reference, RawIdentifier::Integer(1015775));
        assert_eq!(invoice.transaction_type.as_deref(), Some("Invoice"));
        assert_eq!(invoice.date, DateField::Parsed(NaiveDate::from_ymd_opt(2022, 7, 21).unwrap()));
        let amount = invoice.amount.unwrap();
        assert!((amount - Decimal::new(8458837, 2)).abs() < Decimal::new(1, 4));
        // Header sits on sheet row 3, so the first record is row 4.
        assert_eq!(invoice.origin, RecordOrigin::new("statement.xlsx", 4));

        let SourceRecord::SupplierTransaction(settlement) = &records[1] else {
            panic!("expected transaction");
        };
        assert_eq!(settlement.reference, "INVI005662".into());
        assert_eq!(settlement.amount, Some(Decimal::from(500)));
    }

    #[test]
    fn first_sheet_is_the_default() {
        let err = load_records(
            DocumentKind::SupplierTransaction,
            "statement",
            &workbook_fixture(),
            &statement_columns(None),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::MissingColumn { .. }));
    }

    #[test]
    fn unknown_sheet_is_a_workbook_error() {
        let err = load_records(
            DocumentKind::SupplierTransaction,
            "statement",
            &workbook_fixture(),
            &statement_columns(Some("Ledger")),
        )
        .unwrap_err();
        assert!(matches!(err, ReconError::Workbook(_)));
        assert!(err.to_string().contains("Ledger"));
    }

    #[test]
    fn excel_serials() {
        assert_eq!(excel_serial_date(44763.0), NaiveDate::from_ymd_opt(2022, 7, 21));
        assert_eq!(excel_serial_date(0.0), None);
    }
}
