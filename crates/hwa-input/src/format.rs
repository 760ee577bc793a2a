use std::fs;
use std::path::Path;

use crate::{InputError, InputResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Plain,
    VoTable,
}

/// Sniff the input format from the file contents.
pub fn detect_format(path: &Path) -> InputResult<InputFormat> {
    let bytes = fs::read(path).map_err(|source| InputError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    detect_format_bytes(&bytes)
}

pub fn detect_format_bytes(bytes: &[u8]) -> InputResult<InputFormat> {
    if bytes.starts_with(b"CDF") || bytes.starts_with(b"\x89HDF") {
        return Err(InputError::format("netCDF sample input is not supported"));
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    if head.trim_start().starts_with('<') {
        Ok(InputFormat::VoTable)
    } else {
        Ok(InputFormat::Plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffing() {
        assert_eq!(
            detect_format_bytes(b"  <?xml version=\"1.0\"?><VOTABLE/>").unwrap(),
            InputFormat::VoTable
        );
        assert_eq!(
            detect_format_bytes(b"# x y z\n1 2 3\n").unwrap(),
            InputFormat::Plain
        );
        assert!(detect_format_bytes(b"CDF\x01rest").is_err());
    }
}
