//! Raw log → filtered log pipeline
//!
//! Streams the raw file line by line, drops every line the filter set
//! matches and writes the rest, in order and byte-for-byte, to the parallel
//! `processed_logs` area. Output goes to a hidden temporary file next to the
//! destination and is renamed into place only after it has been flushed,
//! synced and hashed, so a failed run never leaves a file at the final path.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use super::error::FilterError;
use super::matcher::FilterSet;
use crate::utils::crypto::sha256_file;

/// Directory component holding uploaded logs
pub const RAW_LOGS_DIR: &str = "raw_logs";

/// Directory component holding filtered logs
pub const PROCESSED_LOGS_DIR: &str = "processed_logs";

/// Result of a successful filter run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOutcome {
    pub filtered_path: PathBuf,
    /// Hex SHA-256 of the filtered file
    pub checksum: String,
    pub lines_read: u64,
    pub lines_removed: u64,
}

/// Map `.../raw_logs/.../name` to `.../processed_logs/.../name`.
///
/// The last `raw_logs` directory component is replaced; the file name is
/// never rewritten.
pub fn filtered_path_for(raw_path: &Path) -> Result<PathBuf, FilterError> {
    let components: Vec<Component<'_>> = raw_path.components().collect();
    let dirs = components.len().saturating_sub(1);

    let raw_idx = components[..dirs]
        .iter()
        .rposition(|c| c.as_os_str() == RAW_LOGS_DIR)
        .ok_or_else(|| FilterError::OutsideRawArea(raw_path.to_path_buf()))?;

    let mut out = PathBuf::new();
    for (i, component) in components.iter().enumerate() {
        if i == raw_idx {
            out.push(PROCESSED_LOGS_DIR);
        } else {
            out.push(component.as_os_str());
        }
    }
    Ok(out)
}

/// Filter `source` into its processed-area counterpart.
pub fn filter_file(source: &Path, filters: &FilterSet) -> Result<FilterOutcome, FilterError> {
    let input = File::open(source).map_err(|e| FilterError::io(source, e))?;
    let destination = filtered_path_for(source)?;

    let parent = destination
        .parent()
        .ok_or_else(|| FilterError::OutsideRawArea(source.to_path_buf()))?;
    fs::create_dir_all(parent).map_err(|e| FilterError::io(parent, e))?;

    let temp_path = parent.join(temp_file_name(&destination));

    let result = write_filtered(BufReader::new(input), source, &temp_path, filters).and_then(
        |(lines_read, lines_removed)| {
            // Hash only after the writer has been flushed and closed
            let checksum = sha256_file(&temp_path).map_err(|e| FilterError::io(&temp_path, e))?;
            fs::rename(&temp_path, &destination).map_err(|e| FilterError::io(&destination, e))?;
            Ok(FilterOutcome {
                filtered_path: destination.clone(),
                checksum,
                lines_read,
                lines_removed,
            })
        },
    );

    match result {
        Ok(outcome) => {
            tracing::debug!(
                source = %source.display(),
                destination = %outcome.filtered_path.display(),
                lines_read = outcome.lines_read,
                lines_removed = outcome.lines_removed,
                checksum = %outcome.checksum,
                "Log filtered"
            );
            Ok(outcome)
        }
        Err(e) => {
            if let Err(cleanup) = fs::remove_file(&temp_path)
                && cleanup.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(
                    path = %temp_path.display(),
                    error = %cleanup,
                    "Failed to remove partial filtered file"
                );
            }
            Err(e)
        }
    }
}

fn temp_file_name(destination: &Path) -> OsString {
    let mut name = OsString::from(".");
    if let Some(base) = destination.file_name() {
        name.push(base);
    }
    name.push(format!(".{}.partial", Uuid::new_v4().simple()));
    name
}

/// Copy non-matching lines; returns (lines read, lines removed)
fn write_filtered<R: BufRead>(
    mut reader: R,
    source: &Path,
    temp_path: &Path,
    filters: &FilterSet,
) -> Result<(u64, u64), FilterError> {
    let file = File::create(temp_path).map_err(|e| FilterError::io(temp_path, e))?;
    let mut writer = BufWriter::new(file);

    let mut buf = Vec::new();
    let mut lines_read = 0u64;
    let mut lines_removed = 0u64;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| FilterError::io(source, e))?;
        if n == 0 {
            break;
        }
        lines_read += 1;

        let line = String::from_utf8_lossy(&buf);
        let drop_line = filters
            .matches(&line)
            .map_err(|source| FilterError::MalformedRecord {
                line: lines_read,
                source,
            })?;

        if drop_line {
            lines_removed += 1;
        } else {
            writer
                .write_all(&buf)
                .map_err(|e| FilterError::io(temp_path, e))?;
        }
    }

    let file = writer
        .into_inner()
        .map_err(|e| FilterError::io(temp_path, e.into_error()))?;
    file.sync_all().map_err(|e| FilterError::io(temp_path, e))?;

    Ok((lines_read, lines_removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::sha256_hex;

    const LOG: &str = "\
a0 a1 open /cvmfs/software.eessi.io/lib.so\n\
b0 b1 open /home/user/data.csv\n\
c0 c1 stat /cvmfs/software.eessi.io/bin\r\n\
d0 d1 openat /cvmfs/software.eessi.io/x";

    fn raw_file(dir: &Path, content: &str) -> PathBuf {
        let raw_dir = dir.join("proj_1").join(RAW_LOGS_DIR);
        fs::create_dir_all(&raw_dir).unwrap();
        let path = raw_dir.join("run.log");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_filtered_path_mapping() {
        let raw = Path::new("/data/uploads/proj_1/raw_logs/run.log");
        assert_eq!(
            filtered_path_for(raw).unwrap(),
            PathBuf::from("/data/uploads/proj_1/processed_logs/run.log")
        );
    }

    #[test]
    fn test_filtered_path_keeps_file_name() {
        let raw = Path::new("/u/raw_logs/raw_logs");
        assert_eq!(
            filtered_path_for(raw).unwrap(),
            PathBuf::from("/u/processed_logs/raw_logs")
        );
    }

    #[test]
    fn test_filtered_path_uses_last_raw_component() {
        let raw = Path::new("/raw_logs/p/raw_logs/a.log");
        assert_eq!(
            filtered_path_for(raw).unwrap(),
            PathBuf::from("/raw_logs/p/processed_logs/a.log")
        );
    }

    #[test]
    fn test_filtered_path_outside_raw_area() {
        let err = filtered_path_for(Path::new("/tmp/a.log")).unwrap_err();
        assert!(matches!(err, FilterError::OutsideRawArea(_)));
    }

    #[test]
    fn test_filter_file_removes_matching_lines() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), LOG);
        let filters = FilterSet::parse([r"3@@@^/cvmfs/software\.eessi\.io"]).unwrap();

        let outcome = filter_file(&raw, &filters).unwrap();
        let expected = "b0 b1 open /home/user/data.csv\n";

        assert_eq!(
            outcome.filtered_path,
            dir.path().join("proj_1/processed_logs/run.log")
        );
        assert_eq!(fs::read_to_string(&outcome.filtered_path).unwrap(), expected);
        assert_eq!(outcome.checksum, sha256_hex(expected.as_bytes()));
        assert_eq!(outcome.lines_read, 4);
        assert_eq!(outcome.lines_removed, 3);
    }

    #[test]
    fn test_filter_file_preserves_bytes_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), LOG);

        let outcome = filter_file(&raw, &FilterSet::default()).unwrap();
        assert_eq!(fs::read(&outcome.filtered_path).unwrap(), LOG.as_bytes());
        assert_eq!(outcome.lines_removed, 0);
    }

    #[test]
    fn test_filter_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), LOG);
        let filters = FilterSet::parse(["2@@@^open$"]).unwrap();

        let first = filter_file(&raw, &filters).unwrap();
        let first_bytes = fs::read(&first.filtered_path).unwrap();
        let second = filter_file(&raw, &filters).unwrap();

        assert_eq!(first.checksum, second.checksum);
        assert_eq!(first_bytes, fs::read(&second.filtered_path).unwrap());
    }

    #[test]
    fn test_filter_file_drops_blank_lines_with_zero_pair_filter() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), "a b\n\nc d\n");

        let outcome = filter_file(&raw, &FilterSet::parse([""]).unwrap()).unwrap();
        assert_eq!(fs::read_to_string(&outcome.filtered_path).unwrap(), "");
        assert_eq!(outcome.lines_removed, 3);
    }

    #[test]
    fn test_filter_file_blank_line_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), "a b\n\nc d\n");

        let err = filter_file(&raw, &FilterSet::parse(["1@@@b"]).unwrap()).unwrap_err();
        assert!(matches!(err, FilterError::MalformedRecord { line: 2, .. }));
        assert!(!dir.path().join("proj_1/processed_logs/run.log").exists());
    }

    #[test]
    fn test_filter_file_read_error_names_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("raw_logs").join("run.log");
        let temp = dir.path().join(".run.log.partial");

        let err = write_filtered(FailingReader, &source, &temp, &FilterSet::default()).unwrap_err();
        match err {
            FilterError::Io { path, .. } => assert_eq!(path, source),
            other => panic!("unexpected error: {other}"),
        }
    }

    struct FailingReader;

    impl std::io::Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("device gone"))
        }
    }

    impl BufRead for FailingReader {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            Err(std::io::Error::other("device gone"))
        }

        fn consume(&mut self, _amt: usize) {}
    }

    #[test]
    fn test_filter_file_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(RAW_LOGS_DIR).join("gone.log");
        let err = filter_file(&missing, &FilterSet::default()).unwrap_err();
        match err {
            FilterError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_file_malformed_record_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let raw = raw_file(dir.path(), LOG);
        let filters = FilterSet::parse(["12@@@^open$"]).unwrap();

        let err = filter_file(&raw, &filters).unwrap_err();
        assert!(matches!(err, FilterError::MalformedRecord { line: 1, .. }));

        let processed = dir.path().join("proj_1").join(PROCESSED_LOGS_DIR);
        assert!(!processed.join("run.log").exists());
        assert_eq!(fs::read_dir(&processed).unwrap().count(), 0);
    }
}
