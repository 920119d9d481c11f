//! Fixture builders shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use mzquant::mzxml::{encode_peaks, ByteOrder, CompressionType, Precision};

/// One synthetic MS1 scan
pub struct ScanFixture {
    pub retention_time: f64,
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

/// Write an mzXML document with zlib-compressed 64-bit peak lists
pub fn write_mzxml(path: &Path, scans: &[ScanFixture]) -> PathBuf {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<mzXML>\n<msRun scanCount=\"{}\">\n",
        scans.len()
    );
    for (i, scan) in scans.iter().enumerate() {
        let payload = encode_peaks(
            &scan.mz,
            &scan.intensity,
            Precision::Float64,
            ByteOrder::Big,
            CompressionType::Zlib,
        )
        .unwrap();
        xml.push_str(&format!(
            "<scan num=\"{}\" msLevel=\"1\" peaksCount=\"{}\" retentionTime=\"PT{}S\">\n\
             <peaks precision=\"64\" byteOrder=\"network\" compressionType=\"zlib\" \
             pairOrder=\"m/z-int\">{}</peaks>\n</scan>\n",
            i + 1,
            scan.mz.len(),
            scan.retention_time,
            payload
        ));
    }
    xml.push_str("</msRun>\n</mzXML>\n");
    fs::write(path, xml).unwrap();
    path.to_path_buf()
}

/// Deterministic baseline intensity between 100 and 110
pub fn baseline(i: usize, j: usize) -> f64 {
    100.0 + ((i * 7 + j * 3) % 11) as f64
}

/// Run whose alignment features peak at `apexes` (one per m/z in `feature_mz`)
pub fn alignment_run(feature_mz: &[f64], apexes: &[f64], scan_count: usize) -> Vec<ScanFixture> {
    (0..scan_count)
        .map(|i| {
            let time = i as f64;
            let intensity = feature_mz
                .iter()
                .zip(apexes)
                .enumerate()
                .map(|(j, (_, &apex))| {
                    if (time - apex).abs() < 0.5 {
                        10_000.0
                    } else {
                        baseline(i, j)
                    }
                })
                .collect();
            ScanFixture {
                retention_time: time,
                mz: feature_mz.to_vec(),
                intensity,
            }
        })
        .collect()
}

/// Write `name.block` into `dir`
pub fn write_block(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(format!("{}.block", name)), content).unwrap();
}
