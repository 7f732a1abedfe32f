//! Output path derivation and all-or-nothing file writes.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

const COMPRESSED_SUFFIX: &str = "_compressed";
const DECOMPRESSED_SUFFIX: &str = "_decompressed";

/// `dir/name.txt` -> `dir/name_compressed.<extension>`
pub fn compressed_path(input: &Path, extension: &str) -> PathBuf {
    sibling(input, &format!("{}{COMPRESSED_SUFFIX}.{extension}", stem(input)))
}

/// `dir/name_compressed.bin` -> `dir/name_decompressed.<extension>`
///
/// Only one trailing `_compressed` is removed from the stem; an artifact that
/// was renamed by the user keeps its whole stem.
pub fn decompressed_path(artifact: &Path, extension: &str) -> PathBuf {
    let stem = stem(artifact);
    let base = stem.strip_suffix(COMPRESSED_SUFFIX).unwrap_or(stem.as_str());

    sibling(artifact, &format!("{base}{DECOMPRESSED_SUFFIX}.{extension}"))
}

/// Lowercased extension of a path, if it has one
pub fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Size of a file on disk in bytes.
pub fn file_size<P: AsRef<Path>>(path: P) -> Result<u64> {
    Ok(fs::metadata(path)?.len())
}

/// Write `bytes` to `path` so that the file either appears complete or not at
/// all.
///
/// The data goes to a hidden sibling first and is renamed over `path` once
/// fully written. The temporary file is removed on every failure path.
pub fn persist(path: &Path, bytes: &[u8]) -> Result<()> {
    let partial = partial_path(path);

    let written = fs::write(&partial, bytes).and_then(|_| fs::rename(&partial, path));
    if let Err(err) = written {
        let _ = fs::remove_file(&partial);
        return Err(err.into());
    }

    Ok(())
}

/// Persist several artifacts that only make sense together. If any of them
/// fails, the ones already written are removed again.
pub fn persist_all(files: &[(&Path, &[u8])]) -> Result<()> {
    for (i, (path, bytes)) in files.iter().enumerate() {
        if let Err(err) = persist(path, bytes) {
            for (written, _) in &files[..i] {
                let _ = fs::remove_file(written);
            }
            return Err(err);
        }
    }

    Ok(())
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sibling(path: &Path, file_name: &str) -> PathBuf {
    path.with_file_name(file_name)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".partial");

    path.with_file_name(name)
}
