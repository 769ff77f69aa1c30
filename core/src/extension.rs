//! Recovers the trailing `.ext` appended by the encoder and cuts it off the payload

use crate::error::{ByteToneError, Result};
use crate::{EXTENSION_SEPARATOR, MAX_EXTENSION_LEN};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

/// Storage that can be shortened in place
pub trait Truncate {
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl Truncate for File {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

impl Truncate for Cursor<Vec<u8>> {
    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.get_mut().truncate(len as usize);
        Ok(())
    }
}

/// Position of the extension within `tail`: the shortest suffix (growing from 1 byte)
/// whose first byte is the separator. An embedded separator therefore wins over an
/// earlier one, so `.tar.gz` yields `.gz`.
pub fn find_extension_start(tail: &[u8]) -> Option<usize> {
    (1..=tail.len())
        .map(|k| tail.len() - k)
        .find(|&start| tail[start] == EXTENSION_SEPARATOR)
}

/// Scan at most MAX_EXTENSION_LEN bytes back from the end of `stream`, truncate the
/// stream to the payload and return the extension (separator included).
pub fn extract_extension<F: Read + Seek + Truncate>(stream: &mut F) -> Result<Vec<u8>> {
    let len = stream.seek(SeekFrom::End(0))?;
    let scanned = len.min(MAX_EXTENSION_LEN as u64);

    let mut tail = vec![0u8; scanned as usize];
    stream.seek(SeekFrom::Start(len - scanned))?;
    stream.read_exact(&mut tail)?;

    let start = find_extension_start(&tail).ok_or(ByteToneError::ExtensionNotFound {
        scanned: scanned as usize,
    })?;

    let payload_len = len - scanned + start as u64;
    stream.truncate(payload_len)?;
    stream.seek(SeekFrom::Start(payload_len))?;

    Ok(tail[start..].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(bytes: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut cursor = Cursor::new(bytes.to_vec());
        let ext = extract_extension(&mut cursor)?;
        Ok((cursor.into_inner(), ext))
    }

    #[test]
    fn test_splits_payload_and_extension() {
        let (payload, ext) = extract(&[0, 255, 65, b'.', b'b', b'i', b'n']).unwrap();
        assert_eq!(payload, vec![0, 255, 65]);
        assert_eq!(ext, b".bin");
    }

    #[test]
    fn test_embedded_separator_keeps_final_component() {
        let (payload, ext) = extract(b"data.tar.gz").unwrap();
        assert_eq!(payload, b"data.tar");
        assert_eq!(ext, b".gz");
    }

    #[test]
    fn test_separator_inside_payload_is_ignored() {
        let (payload, ext) = extract(b"a.b.c\x00.txt").unwrap();
        assert_eq!(payload, b"a.b.c\x00");
        assert_eq!(ext, b".txt");
    }

    #[test]
    fn test_bare_separator() {
        let (payload, ext) = extract(b"hello.").unwrap();
        assert_eq!(payload, b"hello");
        assert_eq!(ext, b".");
    }

    #[test]
    fn test_extension_only_stream() {
        let (payload, ext) = extract(b".png").unwrap();
        assert!(payload.is_empty());
        assert_eq!(ext, b".png");
    }

    #[test]
    fn test_missing_separator_fails() {
        assert!(matches!(
            extract(b"no separator here"),
            Err(ByteToneError::ExtensionNotFound { scanned: 17 })
        ));
        assert!(matches!(
            extract(b""),
            Err(ByteToneError::ExtensionNotFound { scanned: 0 })
        ));
    }

    #[test]
    fn test_scan_is_bounded() {
        // Separator sits just beyond the scan limit
        let mut bytes = vec![b'.'];
        bytes.extend(std::iter::repeat(b'x').take(MAX_EXTENSION_LEN));
        assert!(matches!(
            extract(&bytes),
            Err(ByteToneError::ExtensionNotFound { scanned }) if scanned == MAX_EXTENSION_LEN
        ));

        // One byte closer and it is found
        bytes.pop();
        let (payload, ext) = extract(&bytes).unwrap();
        assert!(payload.is_empty());
        assert_eq!(ext.len(), MAX_EXTENSION_LEN);
    }

    #[test]
    fn test_truncates_real_file() {
        let mut file = tempfile::tempfile().unwrap();
        std::io::Write::write_all(&mut file, b"payload.md").unwrap();
        assert_eq!(extract_extension(&mut file).unwrap(), b".md");
        assert_eq!(file.metadata().unwrap().len(), 7);
    }
}
