//! `confedit file`

use std::path::PathBuf;

use anyhow::{Context, Result};
use confedit_core::{FileRequest, Node, ensure_file};
use serde::Serialize;

use super::{print_report, reported_value, request};

pub struct FileArgs {
    pub src: PathBuf,
    pub key: String,
    pub value: Option<String>,
    pub state: String,
    pub backup: bool,
    pub dest: Option<PathBuf>,
    pub dry_run: bool,
}

#[derive(Serialize)]
struct FileReport {
    changed: bool,
    value: Option<Node>,
    backup: Option<PathBuf>,
}

pub fn execute(args: FileArgs) -> Result<()> {
    let request = request(&args.key, args.value.as_deref(), &args.state)?;

    let mut file = FileRequest::new(&args.src)
        .with_backup(args.backup)
        .with_dry_run(args.dry_run);
    if let Some(dest) = &args.dest {
        file = file.with_dest(dest);
    }

    let outcome = ensure_file(&file, &request)
        .with_context(|| format!("failed to ensure '{}' in {}", args.key, args.src.display()))?;

    print_report(&FileReport {
        changed: outcome.changed,
        value: reported_value(&request, outcome.matched),
        backup: outcome.backup,
    })
}
