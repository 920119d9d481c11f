use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use super::MzXmlError;

/// Prefix of a run whose retention times were rewritten
pub const ALIGNED_PREFIX: &str = "aligned_";
/// Prefix of the empty marker left for a run that could not be aligned
pub const UNALIGNED_PREFIX: &str = "unaligned_";

/// Copy an mzXML document, replacing the `retentionTime` of the i-th `<scan>`
/// with `PT{times[i]:.3}S`. Everything else passes through untouched.
///
/// Returns the number of rewritten scans.
pub fn rewrite_retention_times<R: BufRead, W: Write>(
    input: R,
    output: W,
    times: &[f64],
) -> Result<usize, MzXmlError> {
    let mut reader = Reader::from_reader(input);
    let mut writer = Writer::new(output);
    let mut buf = Vec::new();
    let mut index = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"scan" => {
                let updated = with_retention_time(e, next_time(times, &mut index)?)?;
                writer.write_event(Event::Start(updated))?;
            }
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"scan" => {
                let updated = with_retention_time(e, next_time(times, &mut index)?)?;
                writer.write_event(Event::Empty(updated))?;
            }
            Ok(Event::Eof) => break,
            Ok(event) => writer.write_event(event)?,
            Err(e) => return Err(MzXmlError::XmlError(e)),
        }
        buf.clear();
    }

    if index != times.len() {
        return Err(MzXmlError::InvalidStructure(format!(
            "{} retention times supplied for {} scans",
            times.len(),
            index
        )));
    }
    Ok(index)
}

fn next_time(times: &[f64], index: &mut usize) -> Result<f64, MzXmlError> {
    let time = times.get(*index).copied().ok_or_else(|| {
        MzXmlError::InvalidStructure(format!(
            "more scans than the {} supplied retention times",
            times.len()
        ))
    })?;
    *index += 1;
    Ok(time)
}

fn with_retention_time(e: &BytesStart, time: f64) -> Result<BytesStart<'static>, MzXmlError> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let formatted = format!("PT{:.3}S", time);
    let mut updated = BytesStart::new(name);
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzXmlError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == b"retentionTime" {
            updated.push_attribute(("retentionTime", formatted.as_str()));
        } else {
            updated.push_attribute(attr);
        }
    }
    Ok(updated)
}

/// Output path for `input` under `prefix` in `dir` (`aligned_run.mzXML`)
pub fn prefixed_path(dir: &Path, input: &Path, prefix: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{}{}", prefix, file_name))
}

/// Write `aligned_<name>` next to `input` with the given scan times
pub fn write_aligned<P: AsRef<Path>>(input: P, times: &[f64]) -> Result<PathBuf, MzXmlError> {
    let input = input.as_ref();
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let target = prefixed_path(dir, input, ALIGNED_PREFIX);

    let reader = BufReader::new(File::open(input)?);
    let mut writer = BufWriter::new(File::create(&target)?);
    let count = rewrite_retention_times(reader, &mut writer, times)?;
    writer.flush()?;

    info!("Wrote {} aligned scans to {}", count, target.display());
    Ok(target)
}

/// Leave an empty `unaligned_<name>` marker next to `input`
pub fn write_unaligned_marker<P: AsRef<Path>>(input: P) -> Result<PathBuf, MzXmlError> {
    let input = input.as_ref();
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let target = prefixed_path(dir, input, UNALIGNED_PREFIX);
    File::create(&target)?;
    debug!("Created alignment failure marker {}", target.display());
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mzxml::MzXmlRun;

    const DOC: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<mzXML xmlns="http://sashimi.sourceforge.net/schema_revision/mzXML_3.2">
  <msRun scanCount="2" startTime="PT0S">
    <scan num="1" msLevel="1" retentionTime="PT1.0S">
      <peaks precision="32" byteOrder="network"></peaks>
    </scan>
    <scan num="2" msLevel="1" retentionTime="PT2.0S"/>
  </msRun>
</mzXML>
"#;

    #[test]
    fn test_rewrite_replaces_only_scan_times() {
        let mut out = Vec::new();
        let count = rewrite_retention_times(DOC.as_bytes(), &mut out, &[7.0, 9.12345]).unwrap();
        assert_eq!(count, 2);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(r#"retentionTime="PT7.000S""#));
        assert!(text.contains(r#"retentionTime="PT9.123S""#));
        assert!(text.contains(r#"startTime="PT0S""#));
        assert!(text.contains(r#"num="2""#));

        let run = MzXmlRun::from_reader("aligned", text.as_bytes()).unwrap();
        assert_eq!(run.retention_times(), vec![7.0, 9.123]);
    }

    #[test]
    fn test_rewrite_count_mismatch() {
        let mut out = Vec::new();
        assert!(rewrite_retention_times(DOC.as_bytes(), &mut out, &[1.0]).is_err());
        let mut out = Vec::new();
        assert!(rewrite_retention_times(DOC.as_bytes(), &mut out, &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("run.mzXML");
        std::fs::write(&input, DOC).unwrap();

        let aligned = write_aligned(&input, &[3.0, 4.0]).unwrap();
        assert_eq!(aligned.file_name().unwrap(), "aligned_run.mzXML");
        assert!(std::fs::read_to_string(&aligned).unwrap().contains("PT3.000S"));

        let marker = write_unaligned_marker(&input).unwrap();
        assert_eq!(marker.file_name().unwrap(), "unaligned_run.mzXML");
        assert_eq!(std::fs::metadata(&marker).unwrap().len(), 0);
    }
}
