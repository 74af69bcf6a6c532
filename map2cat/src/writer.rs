//! Delimited-text catalogue output.
//!
//! The catalogue is a header line `#ra<d>dec<d>z<d>e1<d>e2` followed by one
//! newline-terminated row per galaxy. Numbers are printed with
//! [`SIGNIFICANT_DIGITS`] significant digits in the style of C's `%g`.

use crate::error::CatalogueError;
use crate::generator::{CatalogueRecord, RecordSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Significant digits written for every catalogue value
pub const SIGNIFICANT_DIGITS: usize = 10;

/// Column names in output order
pub const COLUMNS: [&str; 5] = ["ra", "dec", "z", "e1", "e2"];

/// Format `value` with `precision` significant digits like C's `%.{precision}g`.
///
/// Fixed notation is used when the decimal exponent lies in
/// `[-4, precision)`, scientific notation (`1.5e-07`, `2e+12`) otherwise.
/// Trailing zeros in the fraction are removed in both cases.
pub fn format_significant(value: f64, precision: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let precision = precision.max(1);
    // Rounding to `precision` digits first decides the exponent, as in C
    let scientific = format!("{:.*e}", precision - 1, value);
    // `{:e}` always renders as `<mantissa>e<exponent>`; anything else is
    // passed through untouched rather than reinterpreted
    let parsed = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));
    let Some((mantissa, exponent)) = parsed else {
        return scientific;
    };

    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction_zeros(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent) as usize;
        let fixed = format!("{value:.decimals$}");
        trim_fraction_zeros(&fixed).to_string()
    }
}

fn trim_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Header line, without the trailing newline
pub fn header_line(delimiter: &str) -> String {
    format!("#{}", COLUMNS.join(delimiter))
}

/// Append one newline-terminated row for `record` to `line`
pub fn format_record(record: &CatalogueRecord, delimiter: &str, line: &mut String) {
    let values = [record.ra, record.dec, record.z, record.e1, record.e2];
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push_str(delimiter);
        }
        line.push_str(&format_significant(*value, SIGNIFICANT_DIGITS));
    }
    line.push('\n');
}

/// In-memory block of formatted rows
#[derive(Debug, Clone, Default)]
pub struct RowBuffer {
    text: String,
    rows: u64,
    delimiter: String,
}

impl RowBuffer {
    pub fn new(delimiter: &str) -> Self {
        Self {
            text: String::new(),
            rows: 0,
            delimiter: delimiter.to_string(),
        }
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl RecordSink for RowBuffer {
    fn accept(&mut self, record: &CatalogueRecord) -> Result<(), CatalogueError> {
        format_record(record, &self.delimiter, &mut self.text);
        self.rows += 1;
        Ok(())
    }
}

/// Streaming catalogue writer.
///
/// The header is written on construction; rows follow one by one as records
/// arrive. The underlying sink is closed when the writer is dropped, whether
/// or not [`CatalogueWriter::finish`] was reached.
pub struct CatalogueWriter<W: Write = BufWriter<File>> {
    out: W,
    delimiter: String,
    line: String,
    rows: u64,
}

impl CatalogueWriter<BufWriter<File>> {
    /// Create or truncate the catalogue file at `path` and write its header
    pub fn create<P: AsRef<Path>>(path: P, delimiter: &str) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        info!("Output catalogue file name is {}", path.display());
        let file = File::create(path).map_err(|source| CatalogueError::OutputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(BufWriter::new(file), delimiter)
    }
}

impl<W: Write> CatalogueWriter<W> {
    /// Wrap an open sink and write the header line
    pub fn new(mut out: W, delimiter: &str) -> Result<Self, CatalogueError> {
        writeln!(out, "{}", header_line(delimiter))?;
        Ok(Self {
            out,
            delimiter: delimiter.to_string(),
            line: String::with_capacity(128),
            rows: 0,
        })
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Rows written so far, excluding the header
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Write one record as a row
    pub fn write_record(&mut self, record: &CatalogueRecord) -> Result<(), CatalogueError> {
        self.line.clear();
        format_record(record, &self.delimiter, &mut self.line);
        self.out.write_all(self.line.as_bytes())?;
        self.rows += 1;
        Ok(())
    }

    /// Empty row block that formats with this writer's delimiter
    pub fn row_buffer(&self) -> RowBuffer {
        RowBuffer::new(&self.delimiter)
    }

    /// Append a block of rows formatted with this writer's delimiter
    pub fn write_rows(&mut self, block: &RowBuffer) -> Result<(), CatalogueError> {
        debug_assert_eq!(
            block.delimiter(),
            self.delimiter,
            "row block formatted with a different delimiter"
        );
        self.out.write_all(block.as_str().as_bytes())?;
        self.rows += block.rows();
        Ok(())
    }

    /// Flush everything and hand back the sink with the number of rows written
    pub fn finish(mut self) -> Result<(W, u64), CatalogueError> {
        self.out.flush()?;
        Ok((self.out, self.rows))
    }
}

impl<W: Write> RecordSink for CatalogueWriter<W> {
    fn accept(&mut self, record: &CatalogueRecord) -> Result<(), CatalogueError> {
        self.write_record(record)
    }
}
