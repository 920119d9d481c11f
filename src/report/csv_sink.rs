use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::analyte::ReferenceTable;

use super::{BatchReport, FigureDocument, ReportError, ReportSink};

/// Writes `<stamp>_*.csv` tables and `<stamp>_*.json` figure documents into a directory
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    dir: PathBuf,
    stamp: String,
}

#[derive(Serialize)]
struct SettingRow<'a> {
    setting: &'a str,
    value: &'a str,
}

#[derive(Serialize)]
struct SumSpectrumRow {
    time: f64,
    window: f64,
    calibrate: bool,
    sn_cutoff: String,
}

impl CsvReportSink {
    pub fn new<P: AsRef<Path>>(dir: P, stamp: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            stamp: stamp.to_string(),
        }
    }

    /// `<dir>/<stamp>_<suffix>`
    pub fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}", self.stamp, suffix))
    }

    fn write_csv<T, I>(&self, suffix: &str, rows: I) -> Result<PathBuf, ReportError>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        let path = self.path(suffix);
        let mut writer = csv::Writer::from_writer(BufWriter::new(File::create(&path)?));
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

impl ReportSink for CsvReportSink {
    fn write_reference(&mut self, reference: &ReferenceTable) -> Result<PathBuf, ReportError> {
        let path = self.path("analytes_ref.csv");
        reference.write_csv(BufWriter::new(File::create(&path)?))?;
        info!("Reference table written to {}", path.display());
        Ok(path)
    }

    fn write_figures(&mut self, name: &str, document: &FigureDocument) -> Result<PathBuf, ReportError> {
        let path = self.path(&format!("{}.json", name));
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), document)?;
        info!("{} {} figures written to {}", document.len(), name, path.display());
        Ok(path)
    }

    fn export(&mut self, report: &BatchReport) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::new();

        if let Some(results) = &report.results {
            written.push(self.write_csv("results.csv", results)?);
        }

        written.push(self.write_csv(
            "settings.csv",
            report.settings.iter().map(|(setting, value)| SettingRow { setting, value }),
        )?);

        if let Some(features) = &report.alignment_features {
            written.push(self.write_csv("alignment_features.csv", features)?);
        }

        if let Some(settings) = &report.sum_spectrum_settings {
            written.push(self.write_csv(
                "sum_spectrum_settings.csv",
                settings.iter().map(|s| SumSpectrumRow {
                    time: s.time,
                    window: s.time_window,
                    calibrate: s.calibrate,
                    sn_cutoff: if s.calibrate {
                        s.sn_cutoff.to_string()
                    } else {
                        "N/A".to_string()
                    },
                }),
            )?);
        }

        info!("Exported {} report files to {}", written.len(), self.dir.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::SumSpectrumSetting;
    use crate::quantitation::{read_rows, QuantitationRow};

    #[test]
    fn test_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvReportSink::new(dir.path(), "01-01-2026_0930");
        let report = BatchReport {
            results: Some(vec![QuantitationRow::blank("run", "H5N4", 1, Some(1000.0))]),
            settings: vec![("Charge carrier".to_string(), "proton".to_string())],
            alignment_features: None,
            sum_spectrum_settings: Some(vec![SumSpectrumSetting {
                time: 300.0,
                time_window: 20.0,
                calibrate: false,
                sn_cutoff: 9.0,
            }]),
        };
        let written = sink.export(&report).unwrap();
        assert_eq!(written.len(), 3);

        let results = read_rows(File::open(sink.path("results.csv")).unwrap()).unwrap();
        assert_eq!(results, report.results.unwrap());

        let settings = std::fs::read_to_string(sink.path("settings.csv")).unwrap();
        assert_eq!(settings, "setting,value\nCharge carrier,proton\n");

        let windows = std::fs::read_to_string(sink.path("sum_spectrum_settings.csv")).unwrap();
        assert_eq!(windows, "time,window,calibrate,sn_cutoff\n300.0,20.0,false,N/A\n");
        assert!(!sink.path("alignment_features.csv").exists());
    }
}
