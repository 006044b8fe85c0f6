//! CSV table sink for daily summaries

use crate::models::DailySummary;
use crate::{Result, WeatherStreamError};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Materializes summary rows as a table
pub trait TableSink {
    /// Write all rows, header first; returns the number of rows written
    fn write(&mut self, rows: &[DailySummary]) -> Result<usize>;
}

/// Writes CSV to any `io::Write`, typically stdout or a file
pub struct CsvTableSink<W: Write> {
    writer: W,
    destination: String,
}

impl CsvTableSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            writer: std::io::stdout(),
            destination: "stdout".to_string(),
        }
    }
}

impl CsvTableSink<std::fs::File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = std::fs::File::create(path).map_err(|e| {
            WeatherStreamError::sink(format!("cannot create {}: {e}", path.display()))
        })?;
        Ok(Self {
            writer: file,
            destination: path.display().to_string(),
        })
    }
}

impl<W: Write> CsvTableSink<W> {
    pub fn new(writer: W, destination: &str) -> Self {
        Self {
            writer,
            destination: destination.to_string(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for CsvTableSink<W> {
    fn write(&mut self, rows: &[DailySummary]) -> Result<usize> {
        info!(destination = %self.destination, rows = rows.len(), "Writing table");

        let mut wtr = csv::Writer::from_writer(&mut self.writer);
        wtr.write_record(DailySummary::HEADERS).map_err(csv_error)?;
        for row in rows {
            let avg = row.avg_temp_c.map_or(String::new(), |v| v.to_string());
            let max = row.max_temp_c.map_or(String::new(), |v| v.to_string());
            let min = row.min_temp_c.map_or(String::new(), |v| v.to_string());
            wtr.write_record([
                row.date.as_str(),
                row.location.as_deref().unwrap_or_default(),
                row.country.as_deref().unwrap_or_default(),
                avg.as_str(),
                max.as_str(),
                min.as_str(),
                row.condition.as_deref().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;

        Ok(rows.len())
    }
}

fn csv_error(e: csv::Error) -> WeatherStreamError {
    WeatherStreamError::sink(format!("CSV write failed: {e}"))
}

/// Open the configured table destination
pub fn open(path: Option<&str>) -> Result<Box<dyn TableSink>> {
    Ok(match path {
        Some(path) => Box::new(CsvTableSink::create(&PathBuf::from(path))?),
        None => Box::new(CsvTableSink::stdout()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_output() {
        let rows = vec![
            DailySummary {
                date: "2025-08-01".to_string(),
                location: Some("Bangalore".to_string()),
                country: Some("India".to_string()),
                avg_temp_c: Some(23.4),
                max_temp_c: Some(27.0),
                min_temp_c: Some(20.1),
                condition: Some("Patchy rain, later clear".to_string()),
            },
            DailySummary {
                date: "2025-08-02".to_string(),
                ..Default::default()
            },
        ];

        let mut sink = CsvTableSink::new(Vec::new(), "memory");
        assert_eq!(sink.write(&rows).unwrap(), 2);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![
                "date,location,country,avg_temp_c,max_temp_c,min_temp_c,condition",
                "2025-08-01,Bangalore,India,23.4,27,20.1,\"Patchy rain, later clear\"",
                "2025-08-02,,,,,,",
            ]
        );
    }

    #[test]
    fn test_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weather.csv");
        let mut sink = open(Some(path.to_str().unwrap())).unwrap();
        sink.write(&[]).unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents.trim_end(),
            "date,location,country,avg_temp_c,max_temp_c,min_temp_c,condition"
        );
    }
}
