use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Read a manifest-style text file, replacing invalid UTF-8 with the replacement character.
///
/// Dependency manifests occasionally carry Latin-1 comments; a stray byte
/// should not make the whole file unreadable.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Atomically replace `path` with `bytes` by writing a sibling temp file and renaming it.
///
/// Readers of `path` see either the previous export or the new one, never a
/// half-written document.
///
/// # Errors
/// Returns an error if the write or rename fails.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("export");
    let temp_path = parent.join(format!(".{file_name}.depsize-tmp.{}", std::process::id()));

    {
        let mut file = File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        // Windows refuses to rename over an existing file.
        if cfg!(windows) {
            let copied = fs::copy(&temp_path, path).map(|_| ());
            let _ = fs::remove_file(&temp_path);
            return copied;
        }
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    Ok(())
}

/// Write `bytes` to `path`, creating any missing parent directories first.
///
/// # Errors
/// Returns an error if a parent directory cannot be created or the write fails.
pub fn write_creating_parents(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    atomic_write(path, bytes)
}
