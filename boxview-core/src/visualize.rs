//! File handling for the batch visualizer.

use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use snafu::ResultExt;
use tracing::*;

use crate::{
    consts::SKIPPED_EXTENSIONS,
    error::{BoxviewError, IoReadSnafu, IoWriteSnafu},
};

/// Regular files of `dir` in sorted name order.
///
/// Files whose extension (the part after the last dot) is in
/// [`SKIPPED_EXTENSIONS`] and all subdirectories are left out.
pub fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>, BoxviewError> {
    let read_error = || IoReadSnafu {
        path: dir.to_string_lossy(),
    };

    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir).context(read_error())? {
        let path = entry.context(read_error())?.path();
        if !path.is_file() {
            continue;
        }

        if is_skipped(&path) {
            debug!("skip {}", path.display());
            continue;
        }
        inputs.push(path);
    }

    inputs.sort();
    Ok(inputs)
}

fn is_skipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SKIPPED_EXTENSIONS.contains(&ext))
}

/// Appends every non-empty text as its own line, creating the file when
/// needed. Returns the number of lines written.
pub fn append_texts<'a>(
    path: &Path,
    texts: impl IntoIterator<Item = &'a str>,
) -> Result<usize, BoxviewError> {
    let write_error = || IoWriteSnafu {
        path: path.to_string_lossy(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context(write_error())?;

    let mut written = 0;
    for text in texts.into_iter().filter(|text| !text.is_empty()) {
        writeln!(file, "{text}").context(write_error())?;
        written += 1;
    }
    Ok(written)
}
