use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes through a sibling temp file so a crash never leaves a truncated file behind.
pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, bytes)?;
    replace_file(&tmp_path, path)
}

pub fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    write_bytes_atomic(path, text.as_bytes())
}

/// `Ok(None)` when the file does not exist.
pub fn read_text_if_exists(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(error),
    }
}

fn replace_file(tmp_path: &Path, final_path: &Path) -> io::Result<()> {
    let result = match fs::rename(tmp_path, final_path) {
        // Windows refuses to rename over an existing file.
        Err(_) if cfg!(windows) && final_path.is_file() => {
            fs::remove_file(final_path).and_then(|()| fs::rename(tmp_path, final_path))
        }
        other => other,
    };
    if result.is_err() {
        let _ = fs::remove_file(tmp_path);
    }
    result
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("data");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
