//! Capability-safe filesystem helpers.
//!
//! The backend forbids direct `std::fs` calls. File access opens the parent
//! directory through `cap_std` and works relative to it.

use std::ffi::OsString;
use std::io;
use std::path::Path;

use cap_std::{ambient_authority, fs::Dir};

/// Read a UTF-8 text file through `cap_std`.
///
/// # Examples
///
/// ```rust
/// use profile_sync::cap_fs::{read_file_to_string, write_file};
///
/// let path = std::env::temp_dir().join("cap-fs-read-example.json");
/// write_file(&path, b"{}\n")?;
///
/// assert_eq!(read_file_to_string(&path)?, "{}\n");
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn read_file_to_string(path: &Path) -> io::Result<String> {
    let (parent, file_name) = parent_and_file_name(path)?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read_to_string(Path::new(&file_name))
}

/// Write bytes to a file through `cap_std`.
pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
    let (parent, file_name) = parent_and_file_name(path)?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.write(Path::new(&file_name), contents)
}

fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path must include a file name")
    })?;
    Ok((parent, file_name.to_os_string()))
}
