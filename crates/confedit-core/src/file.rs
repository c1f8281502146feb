//! Ensuring state in a document on disk.
//!
//! Copyright (c) 2025 Posit, PBC
//!
//! [`ensure_file`] checks the source, loads it, runs [`crate::ensure`], and
//! only when the tree actually changed takes the optional backup and writes
//! the result, either back to the source or to a separate destination.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::ensure::{EnsureRequest, ensure};
use crate::error::{Error, Result};
use crate::mutate::Mutation;
use crate::node::Node;
use crate::store::{self, Format};

/// Where to read from and how to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRequest {
    src: PathBuf,
    dest: Option<PathBuf>,
    backup: bool,
    dry_run: bool,
}

impl FileRequest {
    pub fn new(src: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: None,
            backup: false,
            dry_run: false,
        }
    }

    /// Write the result here instead of over the source. The format is
    /// still taken from the source extension.
    pub fn with_dest(mut self, dest: impl Into<PathBuf>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Copy the source to `<src>_<YYYYmmddHHMMSS>` before overwriting it.
    pub fn with_backup(mut self, backup: bool) -> Self {
        self.backup = backup;
        self
    }

    /// Report what would change without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn src(&self) -> &Path {
        &self.src
    }

    /// The file that a change is written to.
    pub fn target(&self) -> &Path {
        self.dest.as_deref().unwrap_or(&self.src)
    }
}

/// The result of [`ensure_file`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    /// Whether the document changed (or would have, for a dry run).
    pub changed: bool,
    /// What was at the path before the operation.
    pub matched: Option<Node>,
    pub mutation: Mutation,
    /// The backup copy, if one was taken.
    pub backup: Option<PathBuf>,
    /// Bytes written, if the document was persisted.
    pub written: Option<usize>,
}

/// Apply `request` to the document at `file.src()`.
pub fn ensure_file(file: &FileRequest, request: &EnsureRequest) -> Result<FileOutcome> {
    let format = check_source(&file.src)?;
    let content = fs::read_to_string(&file.src).map_err(|e| Error::io(&file.src, e))?;
    let mut tree = store::load_str(&content, format)?;

    let outcome = ensure(&mut tree, request)?;
    let mut result = FileOutcome {
        changed: outcome.changed,
        matched: outcome.matched,
        mutation: outcome.mutation,
        backup: None,
        written: None,
    };
    if !result.changed {
        debug!(src = %file.src.display(), "no change needed");
        return Ok(result);
    }
    if file.dry_run {
        info!(src = %file.src.display(), mutation = ?result.mutation, "dry run, not writing");
        return Ok(result);
    }

    if file.backup {
        result.backup = Some(backup(&file.src)?);
    }
    result.written = Some(store::dump(&tree, file.target(), format)?);
    Ok(result)
}

/// Verify the source exists, is readable, is a regular file and has a
/// supported extension, in that order.
pub fn check_source(src: &Path) -> Result<Format> {
    let metadata = match fs::metadata(src) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::SourceNotFound(src.to_path_buf()));
        }
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(Error::SourceNotReadable(src.to_path_buf()));
        }
        Err(e) => return Err(Error::io(src, e)),
    };
    if metadata.is_file() {
        if let Err(e) = fs::File::open(src) {
            return Err(if e.kind() == ErrorKind::PermissionDenied {
                Error::SourceNotReadable(src.to_path_buf())
            } else {
                Error::io(src, e)
            });
        }
    } else {
        return Err(Error::SourceNotAFile(src.to_path_buf()));
    }
    Format::from_path(src)
}

/// Copy `src` next to itself with a timestamp suffix.
fn backup(src: &Path) -> Result<PathBuf> {
    let mut name = src.as_os_str().to_owned();
    name.push(format!("_{}", Local::now().format("%Y%m%d%H%M%S")));
    let copy = PathBuf::from(name);
    fs::copy(src, &copy).map_err(|e| Error::io(&copy, e))?;
    info!(src = %src.display(), backup = %copy.display(), "backed up source");
    Ok(copy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensure::State;
    use tempfile::TempDir;

    const SAMPLE: &str = "config:\n  a: 1\n  a-b: ~\nlists:\n  - 10\n  - 20\n  - 30\n";

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn request(path: &str, value: Option<Node>, state: State) -> EnsureRequest {
        EnsureRequest::new(path, value, state).unwrap()
    }

    #[test]
    fn test_present_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);

        let outcome = ensure_file(
            &FileRequest::new(&src),
            &request("config.c", Some(Node::from("x")), State::Present),
        )
        .unwrap();
        assert!(outcome.changed);
        assert!(outcome.written.is_some());
        assert!(outcome.backup.is_none());

        let doc = store::load(&src).unwrap();
        assert_eq!(doc.as_mapping().unwrap()["config"].as_mapping().unwrap()["c"], Node::from("x"));
    }

    #[test]
    fn test_second_run_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);
        let req = request("lists[2]", Some(Node::from(100)), State::Present);

        assert!(ensure_file(&FileRequest::new(&src), &req).unwrap().changed);
        let after_first = fs::read_to_string(&src).unwrap();

        let second = ensure_file(&FileRequest::new(&src), &req).unwrap();
        assert!(!second.changed);
        assert!(second.written.is_none());
        assert_eq!(fs::read_to_string(&src).unwrap(), after_first);

        let doc = store::load(&src).unwrap();
        assert_eq!(
            doc.as_mapping().unwrap()["lists"],
            Node::from(vec![Node::from(10), Node::from(20), Node::from(100), Node::from(30)])
        );
    }

    #[test]
    fn test_check_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yaml", SAMPLE);
        let outcome = ensure_file(
            &FileRequest::new(&src),
            &request("config.a-b", None, State::Check),
        )
        .unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.matched, Some(Node::null()));
        assert_eq!(fs::read_to_string(&src).unwrap(), SAMPLE);
    }

    #[test]
    fn test_backup_keeps_the_original() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);
        let outcome = ensure_file(
            &FileRequest::new(&src).with_backup(true),
            &request("config.a", Some(Node::from(1)), State::Absent),
        )
        .unwrap();
        let backup = outcome.backup.unwrap();
        assert!(backup.to_string_lossy().starts_with(&*src.to_string_lossy()));
        assert_eq!(fs::read_to_string(&backup).unwrap(), SAMPLE);
        assert_ne!(fs::read_to_string(&src).unwrap(), SAMPLE);
    }

    #[test]
    fn test_no_backup_when_nothing_changes() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);
        let outcome = ensure_file(
            &FileRequest::new(&src).with_backup(true),
            &request("config.a", Some(Node::from(1)), State::Present),
        )
        .unwrap();
        assert!(!outcome.changed);
        assert!(outcome.backup.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_dest_leaves_source_alone() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);
        let dest = dir.path().join("out.yml");
        ensure_file(
            &FileRequest::new(&src).with_dest(&dest),
            &request("config.d", Some(Node::from(30)), State::Present),
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&src).unwrap(), SAMPLE);
        let doc = store::load(&dest).unwrap();
        assert_eq!(doc.as_mapping().unwrap()["config"].as_mapping().unwrap()["d"], Node::from(30));
    }

    #[test]
    fn test_dry_run_reports_change_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.yml", SAMPLE);
        let outcome = ensure_file(
            &FileRequest::new(&src).with_dry_run(true).with_backup(true),
            &request("config.d", Some(Node::from(30)), State::Present),
        )
        .unwrap();
        assert!(outcome.changed);
        assert!(outcome.written.is_none());
        assert!(outcome.backup.is_none());
        assert_eq!(fs::read_to_string(&src).unwrap(), SAMPLE);
    }

    #[test]
    fn test_json_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "test.json", r#"{"b": 1, "a": {"x": [1, 2]}}"#);
        ensure_file(
            &FileRequest::new(&src),
            &request("a.x[-1]", Some(Node::from(3)), State::Present),
        )
        .unwrap();
        let text = fs::read_to_string(&src).unwrap();
        insta::assert_snapshot!(text, @r#"
        {
          "b": 1,
          "a": {
            "x": [
              1,
              2,
              3
            ]
          }
        }
        "#);
    }

    #[test]
    fn test_source_preconditions() {
        let dir = tempfile::tempdir().unwrap();
        let req = request("a", None, State::Check);

        let missing = dir.path().join("missing.yml");
        assert!(matches!(
            ensure_file(&FileRequest::new(&missing), &req),
            Err(Error::SourceNotFound(_))
        ));

        let sub = dir.path().join("sub.yml");
        fs::create_dir(&sub).unwrap();
        assert!(matches!(
            ensure_file(&FileRequest::new(&sub), &req),
            Err(Error::SourceNotAFile(_))
        ));

        let toml = write(&dir, "conf.toml", "a = 1\n");
        assert!(matches!(
            ensure_file(&FileRequest::new(&toml), &req),
            Err(Error::UnsupportedExtension(ext)) if ext == ".toml"
        ));
    }

    #[test]
    fn test_malformed_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = write(&dir, "broken.json", "{not json");
        assert!(matches!(
            ensure_file(&FileRequest::new(&src), &request("a", None, State::Check)),
            Err(Error::Format { format: Format::Json, .. })
        ));
        assert_eq!(fs::read_to_string(&src).unwrap(), "{not json");
    }
}
