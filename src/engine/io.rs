// src/engine/io.rs
//
// I/O operations: reading the source, writing the result atomically.
// A path of "-" means stdin or stdout.

use crate::engine::common::EngineResult;
use crate::error::RecompressError;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const STDIO_PATH: &str = "-";

/// Read the whole input into memory.
pub fn read_input(path: &str) -> EngineResult<Vec<u8>> {
    if path == STDIO_PATH {
        let mut data = Vec::new();
        std::io::stdin()
            .lock()
            .read_to_end(&mut data)
            .map_err(|e| RecompressError::file_read_failed("<stdin>", e))?;
        return Ok(data);
    }
    std::fs::read(path).map_err(|e| RecompressError::file_read_failed(path.to_string(), e))
}

/// Write `data` to `path`, or to stdout for "-".
///
/// Files are written to a temporary file in the destination directory and
/// renamed over the destination, so a failed run never leaves a truncated
/// output behind.
pub fn write_output(path: &str, data: &[u8]) -> EngineResult<()> {
    if path == STDIO_PATH {
        let mut stdout = std::io::stdout().lock();
        return stdout
            .write_all(data)
            .and_then(|_| stdout.flush())
            .map_err(|e| RecompressError::file_write_failed("<stdout>", e));
    }

    let output_dir = match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    // Same directory as the target so the rename cannot cross filesystems
    let mut temp_file = NamedTempFile::new_in(output_dir).map_err(|e| {
        RecompressError::file_write_failed(output_dir.display().to_string(), e)
    })?;
    let temp_path = temp_file.path().display().to_string();

    temp_file
        .write_all(data)
        .map_err(|e| RecompressError::file_write_failed(temp_path.clone(), e))?;
    temp_file
        .as_file_mut()
        .sync_all()
        .map_err(|e| RecompressError::file_write_failed(temp_path.clone(), e))?;

    // NamedTempFile is created 0600; outputs get regular file permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(|e| RecompressError::file_write_failed(temp_path.clone(), e))?;
    }

    temp_file
        .persist(path)
        .map_err(|e| RecompressError::file_write_failed(path.to_string(), e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        let path = path.to_str().unwrap();

        write_output(path, b"first").unwrap();
        write_output(path, b"second, longer").unwrap();
        assert_eq!(read_input(path).unwrap(), b"second, longer");

        // Only the destination is left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_input_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.jpg");
        let err = read_input(path.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, RecompressError::FileReadFailed { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_unwritable_destination_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.jpg");
        let err = write_output(path.to_str().unwrap(), b"data").unwrap_err();
        assert!(matches!(err, RecompressError::FileWriteFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_output_permissions_are_not_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jpg");
        write_output(path.to_str().unwrap(), b"x").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
