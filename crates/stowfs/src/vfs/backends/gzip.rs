//! Gzip-compressed file nodes and their handles.
//!
//! A [`CompressedNode`] holds content compressed once at insertion time.
//! Opening it yields a [`CompressedFile`], which offers ordinary
//! random-access reads on top of a forward-only [`GzDecoder`]:
//!
//! - `seek` only records the requested offset;
//! - `read` reconciles the decoder with that offset first, restarting the
//!   decoder from the beginning for backward moves and reading-and-
//!   discarding for forward ones.
//!
//! Sequential consumption never restarts the decoder. Alternating far
//! seeks are correct but pay a full restart each time.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::SystemTime;

use crate::config::StoreConfig;
use crate::vfs::error::{VfsError, VfsResult};
use crate::vfs::ops::VfsFile;
use crate::vfs::types::FileInfo;

/// Static definition of a gzip-compressed file.
///
/// `compressed` always decompresses to exactly `size` bytes; nodes are
/// only built from fresh content by [`CompressedNode::compress`].
pub struct CompressedNode {
    name: String,
    mod_time: SystemTime,
    compressed: Arc<[u8]>,
    size: u64,
}

impl fmt::Debug for CompressedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedNode")
            .field("name", &self.name)
            .field("size", &self.size)
            .field("compressed_len", &self.compressed.len())
            .finish()
    }
}

impl CompressedNode {
    /// Compress `content` into a new node named `name`.
    pub fn compress(
        name: impl Into<String>,
        content: &[u8],
        config: &StoreConfig,
    ) -> VfsResult<Self> {
        let name = name.into();
        let mut encoder = GzEncoder::new(Vec::new(), config.compression());
        encoder.write_all(content)?;
        let compressed = encoder.finish()?;

        if config.verify_on_insert {
            verify(&name, &compressed, content)?;
        }

        Ok(Self {
            name,
            mod_time: SystemTime::now(),
            compressed: compressed.into(),
            size: content.len() as u64,
        })
    }

    /// Leaf name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decompressed length in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The stored gzip stream.
    pub fn gzip_bytes(&self) -> &[u8] {
        &self.compressed
    }

    /// Metadata view of this node.
    pub fn info(&self) -> FileInfo {
        FileInfo::file(&self.name, self.size, self.mod_time)
    }

    fn decoder(&self) -> GzDecoder<Cursor<Arc<[u8]>>> {
        GzDecoder::new(Cursor::new(Arc::clone(&self.compressed)))
    }
}

fn verify(name: &str, compressed: &[u8], original: &[u8]) -> VfsResult<()> {
    let mut decoded = Vec::with_capacity(original.len());
    GzDecoder::new(compressed)
        .read_to_end(&mut decoded)
        .map_err(|e| VfsError::corrupt(format!("{name}: fresh gzip stream unreadable: {e}")))?;
    if decoded != original {
        return Err(VfsError::corrupt(format!(
            "{name}: gzip round trip produced {} bytes, expected {}",
            decoded.len(),
            original.len()
        )));
    }
    Ok(())
}

/// An opened [`CompressedNode`].
pub struct CompressedFile {
    path: String,
    node: Arc<CompressedNode>,
    stream: Option<GzDecoder<Cursor<Arc<[u8]>>>>,
    /// Decompressed offset the decoder has actually produced.
    stream_pos: u64,
    /// Offset the caller last sought or read to.
    requested_pos: u64,
}

impl fmt::Debug for CompressedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedFile")
            .field("path", &self.path)
            .field("size", &self.node.size)
            .field("stream_pos", &self.stream_pos)
            .field("requested_pos", &self.requested_pos)
            .field("closed", &self.stream.is_none())
            .finish()
    }
}

impl CompressedFile {
    pub(crate) fn open(path: impl Into<String>, node: Arc<CompressedNode>) -> Self {
        let stream = Some(node.decoder());
        Self {
            path: path.into(),
            node,
            stream,
            stream_pos: 0,
            requested_pos: 0,
        }
    }

    /// Path this handle was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn corrupt(&self, err: io::Error) -> VfsError {
        tracing::error!(path = %self.path, error = %err, "stored gzip stream failed to decode");
        VfsError::corrupt(format!("{}: {err}", self.path))
    }

    /// Bring the decoder to `requested_pos`.
    fn reconcile(&mut self) -> VfsResult<()> {
        if self.stream.is_none() {
            return Err(VfsError::Closed(self.path.clone()));
        }

        if self.stream_pos > self.requested_pos {
            tracing::trace!(
                path = %self.path,
                from = self.stream_pos,
                to = self.requested_pos,
                "restarting decoder for backward seek"
            );
            self.stream = Some(self.node.decoder());
            self.stream_pos = 0;
        }

        if self.stream_pos < self.requested_pos {
            let gap = self.requested_pos - self.stream_pos;
            tracing::trace!(path = %self.path, gap, "skipping forward");
            let Some(stream) = self.stream.as_mut() else {
                return Err(VfsError::Closed(self.path.clone()));
            };
            let copied = io::copy(&mut stream.take(gap), &mut io::sink());
            let skipped = match copied {
                Ok(n) => n,
                Err(e) => return Err(self.corrupt(e)),
            };
            self.stream_pos += skipped;
            if skipped < gap {
                return Err(VfsError::ShortStream {
                    path: self.path.clone(),
                    expected: self.requested_pos,
                    reached: self.stream_pos,
                });
            }
        }

        Ok(())
    }

    fn read_at_requested(&mut self, buf: &mut [u8]) -> VfsResult<usize> {
        if self.stream.is_none() {
            return Err(VfsError::Closed(self.path.clone()));
        }
        // Past the end: EOF without consuming the decoder.
        if buf.is_empty() || self.requested_pos >= self.node.size {
            return Ok(0);
        }

        self.reconcile()?;

        let Some(stream) = self.stream.as_mut() else {
            return Err(VfsError::Closed(self.path.clone()));
        };
        let read = stream.read(buf);
        let n = match read {
            Ok(n) => n,
            Err(e) => return Err(self.corrupt(e)),
        };
        self.stream_pos += n as u64;
        self.requested_pos = self.stream_pos;
        Ok(n)
    }

    fn seek_to(&mut self, pos: SeekFrom) -> VfsResult<u64> {
        let target: i128 = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::Current(delta) => self.requested_pos as i128 + delta as i128,
            SeekFrom::End(delta) => self.node.size as i128 + delta as i128,
        };
        if target < 0 || target > u64::MAX as i128 {
            return Err(VfsError::InvalidSeek {
                path: self.path.clone(),
                offset: target,
            });
        }
        self.requested_pos = target as u64;
        Ok(self.requested_pos)
    }
}

impl Read for CompressedFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_at_requested(buf).map_err(io::Error::from)
    }
}

impl Seek for CompressedFile {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.seek_to(pos).map_err(io::Error::from)
    }
}

impl VfsFile for CompressedFile {
    fn stat(&self) -> VfsResult<FileInfo> {
        Ok(self.node.info())
    }

    fn readdir(&mut self, _count: isize) -> VfsResult<Vec<FileInfo>> {
        Err(VfsError::not_a_directory(self.path.clone()))
    }

    fn close(&mut self) -> VfsResult<()> {
        self.stream = None;
        Ok(())
    }

    fn precompressed(&self) -> Option<&[u8]> {
        Some(self.node.gzip_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(content: &[u8]) -> CompressedFile {
        let node = CompressedNode::compress("t.bin", content, &StoreConfig::default()).unwrap();
        CompressedFile::open("/t.bin", Arc::new(node))
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_compress_records_size() {
        let node = CompressedNode::compress("a", b"hello", &StoreConfig::default()).unwrap();
        assert_eq!(node.size(), 5);
        assert_eq!(node.name(), "a");
        // gzip magic
        assert_eq!(&node.gzip_bytes()[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn test_compress_with_verification() {
        let config = StoreConfig::new()
            .with_compression_level(9)
            .with_verify_on_insert(true);
        let data = sample(10_000);
        let node = CompressedNode::compress("v", &data, &config).unwrap();
        assert_eq!(node.size(), 10_000);
        assert!(node.gzip_bytes().len() < data.len());
    }

    #[test]
    fn test_sequential_read() {
        let data = sample(4096);
        let mut file = open(&data);
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_hello_scenario() {
        let mut file = open(b"hello");
        assert_eq!(file.stat().unwrap().size, 5);

        assert_eq!(file.seek(SeekFrom::Start(2)).unwrap(), 2);
        let mut buf = [0u8; 3];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"llo");

        assert_eq!(file.seek(SeekFrom::Start(0)).unwrap(), 0);
        let mut buf = [0u8; 5];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn test_seek_variants() {
        let mut file = open(b"0123456789");
        assert_eq!(file.seek(SeekFrom::End(-3)).unwrap(), 7);
        assert_eq!(file.seek(SeekFrom::Current(-2)).unwrap(), 5);

        let mut buf = [0u8; 2];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"56");
        assert_eq!(file.stream_position().unwrap(), 7);
    }

    #[test]
    fn test_seek_does_not_touch_stream() {
        let mut file = open(b"0123456789");
        file.seek(SeekFrom::Start(8)).unwrap();
        assert_eq!(file.stream_pos, 0);
        assert_eq!(file.requested_pos, 8);
    }

    #[test]
    fn test_negative_seek_fails_and_keeps_position() {
        let mut file = open(b"abc");
        file.seek(SeekFrom::Start(1)).unwrap();

        let err = file.seek(SeekFrom::Current(-5)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(matches!(
            VfsError::from_io(err),
            VfsError::InvalidSeek { offset: -4, .. }
        ));

        assert!(file.seek(SeekFrom::End(-4)).is_err());
        assert_eq!(file.stream_position().unwrap(), 1);
    }

    #[test]
    fn test_seek_past_end_reads_eof() {
        let mut file = open(b"abc");
        assert_eq!(file.seek(SeekFrom::Start(100)).unwrap(), 100);
        let mut buf = [0u8; 8];
        assert_eq!(file.read(&mut buf).unwrap(), 0);

        // And it is still usable afterwards.
        file.seek(SeekFrom::Start(1)).unwrap();
        assert_eq!(file.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"bc");
    }

    #[test]
    fn test_empty_content() {
        let mut file = open(b"");
        assert_eq!(file.stat().unwrap().size, 0);
        let mut buf = [0u8; 4];
        assert_eq!(file.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_backward_seek_restarts_decoder() {
        let data = sample(1000);
        let mut file = open(&data);

        file.seek(SeekFrom::Start(900)).unwrap();
        let mut buf = [0u8; 10];
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, &data[900..910]);
        assert_eq!(file.stream_pos, 910);

        file.seek(SeekFrom::Start(5)).unwrap();
        file.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, &data[5..15]);
        assert_eq!(file.stream_pos, 15);
    }

    #[test]
    fn test_short_stream_reported() {
        // Lie about the size to force the decoder to run dry early.
        let mut node = CompressedNode::compress("s", b"abc", &StoreConfig::default()).unwrap();
        node.size = 10;
        let mut file = CompressedFile::open("/s", Arc::new(node));

        file.seek(SeekFrom::Start(6)).unwrap();
        let mut buf = [0u8; 2];
        let err = VfsError::from_io(file.read(&mut buf).unwrap_err());
        match err {
            VfsError::ShortStream {
                expected, reached, ..
            } => {
                assert_eq!(expected, 6);
                assert_eq!(reached, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_corrupt_stream_is_fatal() {
        let mut node = CompressedNode::compress("c", b"abcdef", &StoreConfig::default()).unwrap();
        let mut bytes = node.gzip_bytes().to_vec();
        bytes.truncate(10);
        bytes.extend_from_slice(&[0xff; 8]);
        node.compressed = bytes.into();
        let mut file = CompressedFile::open("/c", Arc::new(node));

        let mut buf = [0u8; 6];
        let err = VfsError::from_io(file.read(&mut buf).unwrap_err());
        assert!(err.is_fatal(), "expected corrupt error, got {err}");
    }

    #[test]
    fn test_readdir_on_file_fails() {
        let mut file = open(b"x");
        assert!(matches!(file.readdir(-1), Err(VfsError::NotADirectory(_))));
    }

    #[test]
    fn test_read_after_close_fails() {
        let mut file = open(b"x");
        file.close().unwrap();
        let mut buf = [0u8; 1];
        let err = VfsError::from_io(file.read(&mut buf).unwrap_err());
        assert!(matches!(err, VfsError::Closed(_)));
    }

    #[test]
    fn test_precompressed_bytes_decode() {
        let file = open(b"served as-is");
        let raw = file.precompressed().unwrap();
        let mut out = String::new();
        GzDecoder::new(raw).read_to_string(&mut out).unwrap();
        assert_eq!(out, "served as-is");
    }
}
