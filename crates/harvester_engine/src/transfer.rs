use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{engine_debug, engine_trace, engine_warn};
use harvester_core::{FileProgress, TransferProgress};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;

use crate::{Credentials, EngineEvent, Fetcher, HarvestError, ProgressSink};

/// Bytes copied between two progress observations.
pub const DEFAULT_CHUNK_SIZE: usize = 102_400;

/// One resource to copy to disk, plus where it sits in the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub name: String,
    pub url: String,
    pub destination: PathBuf,
    pub file_size: u64,
    /// Session bytes already written before this resource.
    pub total_done_before: u64,
    pub total_size: u64,
}

/// Streams resources to disk in fixed-size chunks, one at a time.
pub struct TransferEngine {
    fetcher: Arc<dyn Fetcher>,
    chunk_size: usize,
}

impl TransferEngine {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_chunk_size(fetcher, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(fetcher: Arc<dyn Fetcher>, chunk_size: usize) -> Self {
        Self {
            fetcher,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Copies the resource and returns the number of bytes written.
    ///
    /// A `ChunkWritten` event follows every chunk, and an empty body still
    /// gets a single one at 0 bytes. The destination is
    /// truncated first; a failed transfer leaves whatever was written so far.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        credentials: &Credentials,
        sink: &dyn ProgressSink,
    ) -> Result<u64, HarvestError> {
        let stream = self.fetcher.open_stream(&request.url, credentials).await?;
        let mut reader = StreamReader::new(stream);
        let mut file = tokio::fs::File::create(&request.destination)
            .await
            .map_err(|err| HarvestError::io(&request.destination, err))?;

        let mut progress = FileProgress::new(request.file_size);
        let mut buffer = vec![0u8; self.chunk_size];
        loop {
            let read = read_chunk(&mut reader, &mut buffer)
                .await
                .map_err(|err| read_error(&request.url, err))?;
            if read == 0 {
                break;
            }
            file.write_all(&buffer[..read])
                .await
                .map_err(|err| HarvestError::io(&request.destination, err))?;
            progress.advance(read as u64);
            engine_trace!("{}: {} bytes so far", request.name, progress.file_done);
            report_progress(request, &progress, sink);
        }
        if progress.file_done == 0 {
            // Nothing was read; still show one 0-byte observation.
            report_progress(request, &progress, sink);
        }
        file.flush()
            .await
            .map_err(|err| HarvestError::io(&request.destination, err))?;

        if progress.file_done != request.file_size {
            engine_warn!(
                "{}: wrote {} bytes but probe reported {}",
                request.name,
                progress.file_done,
                request.file_size
            );
        }
        engine_debug!("{} -> {:?}", request.url, request.destination);
        Ok(progress.file_done)
    }
}

fn report_progress(request: &TransferRequest, progress: &FileProgress, sink: &dyn ProgressSink) {
    sink.emit(EngineEvent::ChunkWritten(TransferProgress::new(
        &request.name,
        progress,
        request.total_done_before,
        request.total_size,
    )));
}

/// Fills `buffer` unless the stream ends first; 0 means end of data.
async fn read_chunk<R>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buffer.len() {
        let read = reader.read(&mut buffer[filled..]).await?;
        if read == 0 {
            break;
        }
        filled += read;
    }
    Ok(filled)
}

fn read_error(url: &str, err: io::Error) -> HarvestError {
    if err.kind() == io::ErrorKind::TimedOut {
        return HarvestError::Timeout {
            url: url.to_string(),
        };
    }
    HarvestError::Transport {
        url: url.to_string(),
        message: err.to_string(),
    }
}
