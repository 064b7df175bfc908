//! Tail: follow an access log as it grows, across truncation and rotation.
//!
//! The file must exist when the tailer opens it and is read from the
//! beginning. Only complete lines are emitted; a trailing fragment stays
//! buffered until its newline arrives, up to a size cap past which the
//! whole line is dropped. At end of file the tailer polls the
//! path: a shorter file means truncation (restart at offset 0), a different
//! file identity or a missing path means rotation (reopen once it is back).

use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ExporterError, ExporterResult};

const READ_CHUNK: usize = 8 * 1024;

/// Default cap for a buffered, still unterminated line.
pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;

/// Which file a path currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
}

impl FileIdentity {
    fn of(meta: &std::fs::Metadata) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::fs::MetadataExt;
            Self {
                dev: meta.dev(),
                ino: meta.ino(),
            }
        }
        #[cfg(not(unix))]
        {
            let _ = meta;
            Self {}
        }
    }
}

/// Accumulates raw bytes and hands out complete lines.
///
/// `scanned` marks the prefix already searched for a newline, so each
/// chunk is scanned once. A fragment that grows past `max_len` without a
/// newline is dropped together with the rest of its line.
struct LineBuffer {
    buf: Vec<u8>,
    scanned: usize,
    max_len: usize,
    discarding: bool,
}

impl LineBuffer {
    fn new(max_len: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            max_len,
            discarding: false,
        }
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(rel) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let end = self.scanned + rel;
            self.scanned = end + 1;
            let mut raw = &self.buf[start..end];
            start = end + 1;
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if raw.last() == Some(&b'\r') {
                raw = &raw[..raw.len() - 1];
            }
            lines.push(String::from_utf8_lossy(raw).into_owned());
        }
        self.buf.drain(..start);
        self.scanned = self.buf.len();

        if self.buf.len() > self.max_len {
            if !self.discarding {
                warn!(
                    bytes = self.buf.len(),
                    max = self.max_len,
                    "Log line exceeds the buffer limit, dropping it"
                );
            }
            self.buf.clear();
            self.scanned = 0;
            self.discarding = true;
        }
        lines
    }

    /// Forget any partial line. Returns how many bytes were dropped.
    fn clear(&mut self) -> usize {
        let dropped = self.buf.len();
        self.buf.clear();
        self.scanned = 0;
        self.discarding = false;
        dropped
    }
}

enum Step {
    Read,
    Idle,
    Stop,
}

pub struct FileTailer {
    path: PathBuf,
    poll_interval: Duration,
    file: File,
    identity: FileIdentity,
    offset: u64,
    pending: LineBuffer,
    missing: bool,
}

impl FileTailer {
    /// Open `path` for tailing. Fails if the file does not exist or is not readable.
    pub async fn open(path: impl Into<PathBuf>, poll_interval: Duration) -> ExporterResult<Self> {
        let path = path.into();
        let (file, identity) = open_regular(&path)
            .await
            .map_err(|source| ExporterError::SourceUnavailable {
                path: path.clone(),
                source,
            })?;

        Ok(Self {
            path,
            poll_interval,
            file,
            identity,
            offset: 0,
            pending: LineBuffer::new(DEFAULT_MAX_LINE_BYTES),
            missing: false,
        })
    }

    /// Cap on a partial line held while waiting for its newline.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.pending.max_len = max_line_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send complete lines to `lines` until `cancel` fires or the receiver is dropped.
    pub async fn run(
        mut self,
        lines: mpsc::Sender<String>,
        cancel: CancellationToken,
    ) -> ExporterResult<()> {
        info!(path = %self.path.display(), "Tailing log file");

        loop {
            if cancel.is_cancelled() {
                break;
            }
            match self.read_available(&lines, &cancel).await? {
                Step::Read => continue,
                Step::Stop => break,
                Step::Idle => {}
            }

            self.check_source().await?;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        debug!(path = %self.path.display(), offset = self.offset, "Tailer stopped");
        Ok(())
    }

    /// Read one chunk and forward every complete line in the buffer.
    async fn read_available(
        &mut self,
        lines: &mpsc::Sender<String>,
        cancel: &CancellationToken,
    ) -> ExporterResult<Step> {
        let mut chunk = [0u8; READ_CHUNK];
        let n = self
            .file
            .read(&mut chunk)
            .await
            .map_err(|source| source_read(&self.path, source))?;
        if n == 0 {
            return Ok(Step::Idle);
        }
        self.offset += n as u64;

        for line in self.pending.push(&chunk[..n]) {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Step::Stop),
                sent = lines.send(line) => {
                    if sent.is_err() {
                        debug!("Line receiver dropped, stopping tailer");
                        return Ok(Step::Stop);
                    }
                }
            }
        }
        Ok(Step::Read)
    }

    /// At end of file: detect truncation and rotation.
    async fn check_source(&mut self) -> ExporterResult<()> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !self.missing {
                    warn!(path = %self.path.display(), "Log file disappeared, waiting for it to reappear");
                    self.missing = true;
                }
                return Ok(());
            }
            Err(e) => return Err(source_read(&self.path, e)),
        };

        if self.missing || FileIdentity::of(&meta) != self.identity {
            return self.reopen().await;
        }

        if meta.len() < self.offset {
            info!(
                path = %self.path.display(),
                size = meta.len(),
                offset = self.offset,
                "Log file truncated, reading from the start"
            );
            self.file
                .seek(SeekFrom::Start(0))
                .await
                .map_err(|source| source_read(&self.path, source))?;
            self.offset = 0;
            self.pending.clear();
        }
        Ok(())
    }

    async fn reopen(&mut self) -> ExporterResult<()> {
        match open_regular(&self.path).await {
            Ok((file, identity)) => {
                let dropped = self.pending.clear();
                if dropped > 0 {
                    debug!(bytes = dropped, "Dropping unterminated line from rotated file");
                }
                info!(path = %self.path.display(), "Log file rotated, reopened");
                self.file = file;
                self.identity = identity;
                self.offset = 0;
                self.missing = false;
                Ok(())
            }
            // Renamed away between the stat and the open; try again next poll.
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(source_read(&self.path, e)),
        }
    }
}

fn source_read(path: &Path, source: io::Error) -> ExporterError {
    ExporterError::SourceRead {
        path: path.to_path_buf(),
        source,
    }
}

async fn open_regular(path: &Path) -> io::Result<(File, FileIdentity)> {
    let file = File::open(path).await?;
    let meta = file.metadata().await?;
    if meta.is_dir() {
        return Err(io::Error::new(io::ErrorKind::Other, "is a directory"));
    }
    Ok((file, FileIdentity::of(&meta)))
}
