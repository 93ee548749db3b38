//! CSV Output

use crate::report::Ranking;
use crate::sink::{ReportError, Reporter};
use std::io::Write;

/// Column header shared by every CSV report
pub const CSV_HEADER: &str = "suite,input_size_bytes,rank,candidate,status,ops_per_sec,margin_of_error_pct,samples,mean_ns,std_dev_ns,throughput_bytes_per_sec,outliers_rejected,low_confidence,message";

/// Generate a CSV document for a set of rankings
pub fn generate_csv_report(rankings: &[Ranking]) -> String {
    let mut output = String::new();
    output.push_str(CSV_HEADER);
    output.push('\n');
    for ranking in rankings {
        push_rows(&mut output, ranking);
    }
    output
}

fn push_rows(output: &mut String, ranking: &Ranking) {
    let suite = escape_csv(&ranking.label);

    for (i, result) in ranking.results.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{},ok,{:.2},{},{},{:.3},{:.3},{:.2},{},{},\n",
            suite,
            ranking.input_size_bytes,
            i + 1,
            escape_csv(&result.candidate),
            result.ops_per_sec,
            result
                .margin_of_error_pct
                .map(|m| format!("{:.4}", m))
                .unwrap_or_default(),
            result.sample_count,
            result.mean_ns,
            result.std_dev_ns,
            result.throughput_bytes_per_sec,
            result.outliers_rejected,
            result.low_confidence,
        ));
    }

    for failure in &ranking.failures {
        output.push_str(&format!(
            "{},{},,{},{},,,,,,,,,{}\n",
            suite,
            ranking.input_size_bytes,
            escape_csv(&failure.candidate),
            failure.reason,
            escape_csv(&failure.message),
        ));
    }
}

/// Quote a field when it contains a separator, quote or line break
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Streams one row per result and failure as each ranking arrives
pub struct CsvReporter<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> CsvReporter<W> {
    /// Create a reporter writing to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    /// Return the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_header(&mut self) -> Result<(), ReportError> {
        if !self.header_written {
            writeln!(self.writer, "{}", CSV_HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> Reporter for CsvReporter<W> {
    fn report(&mut self, ranking: &Ranking) -> Result<(), ReportError> {
        self.write_header()?;
        let mut rows = String::new();
        push_rows(&mut rows, ranking);
        self.writer.write_all(rows.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ReportError> {
        // An empty run still yields a valid document
        self.write_header()?;
        self.writer.flush()?;
        Ok(())
    }
}
