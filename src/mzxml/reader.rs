use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::binary::{BinaryDecoder, ByteOrder, CompressionType, Precision};
use super::MzXmlError;

/// One decoded scan
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scan {
    pub scan_number: Option<u32>,
    pub ms_level: Option<u8>,
    /// Retention time in seconds
    pub retention_time: f64,
    /// Ascending m/z values
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl Scan {
    pub fn new(retention_time: f64, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        Self {
            retention_time,
            mz,
            intensity,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }
}

#[derive(Debug)]
struct PeaksContext {
    precision: Precision,
    byte_order: ByteOrder,
    compression: CompressionType,
    base64_data: String,
}

#[derive(Debug)]
struct PendingScan {
    scan: Scan,
    peaks: Option<PeaksContext>,
    emitted: bool,
}

/// Streaming reader yielding scans in the order their `<scan>` elements open.
///
/// Nested scans (MS/MS inside a survey scan) are yielded after their parent,
/// because a parent's `<peaks>` precedes its children.
pub struct MzXmlReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: Vec<PendingScan>,
}

impl MzXmlReader<BufReader<File>> {
    /// Open an mzXML file for streaming
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MzXmlError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> MzXmlReader<R> {
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self {
            reader: xml_reader,
            buf: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Read the next scan, `None` at end of document
    pub fn next_scan(&mut self) -> Result<Option<Scan>, MzXmlError> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"scan" => {
                        let scan = parse_scan_start(e)?;
                        self.pending.push(PendingScan {
                            scan,
                            peaks: None,
                            emitted: false,
                        });
                    }
                    b"peaks" => {
                        if let Some(top) = self.pending.last_mut() {
                            top.peaks = Some(parse_peaks_start(e)?);
                        }
                    }
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                    b"scan" => return Ok(Some(parse_scan_start(e)?)),
                    b"peaks" => {
                        if let Some(top) = self.pending.last_mut() {
                            if !top.emitted {
                                top.emitted = true;
                                return Ok(Some(top.scan.clone()));
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Text(ref t)) => {
                    if let Some(ctx) = self.pending.last_mut().and_then(|p| p.peaks.as_mut()) {
                        ctx.base64_data.push_str(&t.unescape()?);
                    }
                }
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"peaks" => {
                        if let Some(top) = self.pending.last_mut() {
                            if let Some(ctx) = top.peaks.take() {
                                let (mz, intensity) = BinaryDecoder::decode_peaks(
                                    &ctx.base64_data,
                                    ctx.precision,
                                    ctx.byte_order,
                                    ctx.compression,
                                )?;
                                if !top.emitted {
                                    top.emitted = true;
                                    let mut scan = std::mem::take(&mut top.scan);
                                    scan.mz = mz;
                                    scan.intensity = intensity;
                                    return Ok(Some(scan));
                                }
                            }
                        }
                    }
                    b"scan" => {
                        if let Some(done) = self.pending.pop() {
                            if !done.emitted {
                                return Ok(Some(done.scan));
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    if !self.pending.is_empty() {
                        return Err(MzXmlError::InvalidStructure(
                            "Unexpected EOF in scan".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                Err(e) => return Err(MzXmlError::XmlError(e)),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for MzXmlReader<R> {
    type Item = Result<Scan, MzXmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_scan().transpose()
    }
}

/// Parse `PT12.345S` (or a bare number of seconds)
pub fn parse_retention_time(value: &str) -> Result<f64, MzXmlError> {
    let trimmed = value.trim();
    let seconds = trimmed
        .strip_prefix("PT")
        .and_then(|rest| rest.strip_suffix('S'))
        .unwrap_or(trimmed);
    seconds
        .parse::<f64>()
        .map_err(|_| MzXmlError::InvalidAttributeValue(format!("retentionTime=\"{}\"", value)))
}

fn parse_scan_start(e: &BytesStart) -> Result<Scan, MzXmlError> {
    let retention_time = get_attribute(e, "retentionTime")?
        .ok_or_else(|| MzXmlError::MissingAttribute("retentionTime".to_string()))?;
    Ok(Scan {
        scan_number: get_attribute(e, "num")?.and_then(|v| v.trim().parse().ok()),
        ms_level: get_attribute(e, "msLevel")?.and_then(|v| v.trim().parse().ok()),
        retention_time: parse_retention_time(&retention_time)?,
        mz: Vec::new(),
        intensity: Vec::new(),
    })
}

fn parse_peaks_start(e: &BytesStart) -> Result<PeaksContext, MzXmlError> {
    Ok(PeaksContext {
        precision: Precision::from_attribute(get_attribute(e, "precision")?.as_deref()),
        byte_order: ByteOrder::from_attribute(get_attribute(e, "byteOrder")?.as_deref()),
        compression: CompressionType::from_attribute(
            get_attribute(e, "compressionType")?.as_deref(),
        ),
        base64_data: String::new(),
    })
}

/// Get attribute value from an element
pub(crate) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzXmlError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzXmlError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// All scans of one mzXML file
#[derive(Debug, Clone, Default)]
pub struct MzXmlRun {
    /// File name without extension
    pub name: String,
    pub path: Option<PathBuf>,
    /// Scans in document order
    pub scans: Vec<Scan>,
}

impl MzXmlRun {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, MzXmlError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let scans = MzXmlReader::from_path(path)?.collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} scans from {}", scans.len(), path.display());
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            scans,
        })
    }

    pub fn from_reader<R: BufRead>(name: &str, reader: R) -> Result<Self, MzXmlError> {
        let scans = MzXmlReader::new(reader).collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            name: name.to_string(),
            path: None,
            scans,
        })
    }

    pub fn from_scans(name: &str, scans: Vec<Scan>) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            scans,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub fn retention_times(&self) -> Vec<f64> {
        self.scans.iter().map(|s| s.retention_time).collect()
    }

    /// Scans with retention time in `[time - window, time + window]`.
    ///
    /// Assumes scans are in ascending retention time.
    pub fn scans_in_window(&self, time: f64, window: f64) -> &[Scan] {
        let start = self
            .scans
            .partition_point(|s| s.retention_time < time - window);
        let end = self
            .scans
            .partition_point(|s| s.retention_time <= time + window)
            .max(start);
        &self.scans[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mzxml::binary::encode_peaks;

    fn document(scans: &[(f64, &str)]) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<mzXML>\n<msRun scanCount=\"2\">\n",
        );
        for (i, (rt, payload)) in scans.iter().enumerate() {
            xml.push_str(&format!(
                "<scan num=\"{}\" msLevel=\"1\" peaksCount=\"2\" retentionTime=\"PT{}S\">\n\
                 <peaks precision=\"32\" byteOrder=\"network\" pairOrder=\"m/z-int\">{}</peaks>\n</scan>\n",
                i + 1,
                rt,
                payload
            ));
        }
        xml.push_str("</msRun>\n</mzXML>\n");
        xml
    }

    #[test]
    fn test_read_scans() {
        let payload = encode_peaks(
            &[100.0, 101.0],
            &[5.0, 7.0],
            Precision::Float32,
            ByteOrder::Big,
            CompressionType::None,
        )
        .unwrap();
        let xml = document(&[(1.5, &payload), (3.25, &payload)]);
        let run = MzXmlRun::from_reader("run", xml.as_bytes()).unwrap();
        assert_eq!(run.scans.len(), 2);
        assert_eq!(run.retention_times(), vec![1.5, 3.25]);
        assert_eq!(run.scans[0].mz, vec![100.0, 101.0]);
        assert_eq!(run.scans[1].intensity, vec![5.0, 7.0]);
        assert_eq!(run.scans[1].scan_number, Some(2));
        assert_eq!(run.scans[0].ms_level, Some(1));
    }

    #[test]
    fn test_nested_scans_in_start_order() {
        let payload = encode_peaks(
            &[200.0],
            &[1.0],
            Precision::Float64,
            ByteOrder::Little,
            CompressionType::Zlib,
        )
        .unwrap();
        let xml = format!(
            "<mzXML><msRun>\
             <scan num=\"1\" retentionTime=\"PT10S\">\
             <peaks precision=\"64\" byteOrder=\"little\" compressionType=\"zlib\">{p}</peaks>\
             <scan num=\"2\" msLevel=\"2\" retentionTime=\"PT11S\">\
             <peaks precision=\"64\" byteOrder=\"little\" compressionType=\"zlib\">{p}</peaks>\
             </scan></scan>\
             <scan num=\"3\" retentionTime=\"PT12S\"><peaks precision=\"32\"/></scan>\
             </msRun></mzXML>",
            p = payload
        );
        let run = MzXmlRun::from_reader("nested", xml.as_bytes()).unwrap();
        let numbers: Vec<Option<u32>> = run.scans.iter().map(|s| s.scan_number).collect();
        assert_eq!(numbers, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(run.scans[1].mz, vec![200.0]);
        assert!(run.scans[2].is_empty());
    }

    #[test]
    fn test_empty_document_has_no_scans() {
        let run = MzXmlRun::from_reader("empty", "".as_bytes()).unwrap();
        assert!(run.is_empty());
    }

    #[test]
    fn test_truncated_document() {
        let result = MzXmlRun::from_reader("bad", "<mzXML><scan retentionTime=\"PT1S\">".as_bytes());
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_retention_time() {
        assert_eq!(parse_retention_time("PT12.345S").unwrap(), 12.345);
        assert_eq!(parse_retention_time("60").unwrap(), 60.0);
        assert!(parse_retention_time("PT1M30S").is_err());
    }

    #[test]
    fn test_scans_in_window_inclusive() {
        let scans = (0..10).map(|i| Scan::new(i as f64, vec![], vec![])).collect();
        let run = MzXmlRun::from_scans("r", scans);
        let window = run.scans_in_window(5.0, 2.0);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].retention_time, 3.0);
        assert!(run.scans_in_window(50.0, 1.0).is_empty());
    }
}
