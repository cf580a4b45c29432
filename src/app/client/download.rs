//! Streaming download of the bulk CSV export
//!
//! The export is tens of gigabytes, so the body is never buffered whole: it
//! is read in bounded chunks and each chunk is written before the next is
//! requested. There is no retry and no resume. A broken stream leaves the
//! partial file on disk for the user to inspect.

use std::io;
use std::path::Path;

use futures::TryStreamExt;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info};
use url::Url;

use crate::app::client::Session;
use crate::app::models::DownloadSummary;
use crate::app::progress::DownloadProgress;
use crate::constants::download;
use crate::errors::{ConfigError, FilesystemError, Result, TransferError};

/// Streams one URL to one file
pub struct BulkDownloader<'a> {
    session: &'a Session,
    url: &'a Url,
    chunk_size: usize,
    verbose: bool,
}

impl<'a> BulkDownloader<'a> {
    /// Creates a downloader with the default chunk size and no progress output
    pub fn new(session: &'a Session, url: &'a Url) -> Self {
        Self {
            session,
            url,
            chunk_size: download::DEFAULT_CHUNK_SIZE,
            verbose: false,
        }
    }

    /// Maximum bytes read from the body per iteration
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Report progress while streaming
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Download the export to `destination`, truncating any existing file
    ///
    /// # Errors
    ///
    /// Returns `AppError` if:
    /// - The chunk size is zero (`ConfigError`)
    /// - The request fails or the server answers with an error status (`TransferError`)
    /// - The body stream breaks part way (`TransferError`, partial file kept)
    /// - The destination cannot be created or written (`FilesystemError`)
    pub async fn download(&self, destination: &Path) -> Result<DownloadSummary> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize.into());
        }

        info!("Requesting bulk export from {}", self.url);
        let response = self
            .session
            .client()
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| TransferError::Request {
                url: self.url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(TransferError::ServerError {
                url: self.url.to_string(),
                status: response.status().as_u16(),
            }
            .into());
        }

        let total_bytes = response.content_length();
        match total_bytes {
            Some(total) => debug!("Server announced {} bytes", total),
            None => debug!("Server did not announce a content length"),
        }

        let file = open_destination(destination).await?;

        let body = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let reader = StreamReader::new(Box::pin(body));

        let mut progress = DownloadProgress::new(total_bytes, self.verbose);
        let result = stream_to_file(reader, file, destination, self.chunk_size, &mut progress).await;

        match &result {
            Ok(_) => progress.finish(),
            Err(_) => progress.abandon(),
        }
        let bytes_written = result?;

        Ok(DownloadSummary {
            destination: destination.to_path_buf(),
            bytes_written,
            expected_bytes: progress.total_bytes(),
            elapsed: progress.elapsed(),
        })
    }
}

/// Create the parent directory if needed and open the destination for writing
///
/// An existing file is truncated.
pub async fn open_destination(destination: &Path) -> Result<File> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| FilesystemError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    if tokio::fs::try_exists(destination).await.unwrap_or(false) {
        info!("Overwriting existing file {}", destination.display());
    }

    let file = File::create(destination)
        .await
        .map_err(|source| FilesystemError::Open {
            path: destination.to_path_buf(),
            source,
        })?;
    Ok(file)
}

/// Copy `reader` into `writer` in reads of at most `chunk_size` bytes
///
/// Every chunk is written in full before `progress` is advanced, so the
/// progress counter always equals the bytes handed to `writer`. On a read
/// failure whatever was written is flushed before the error is returned.
/// `destination` is only used in error values.
///
/// Returns the total number of bytes written.
pub async fn stream_to_file<R, W>(
    mut reader: R,
    mut writer: W,
    destination: &Path,
    chunk_size: usize,
    progress: &mut DownloadProgress,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if chunk_size == 0 {
        return Err(ConfigError::InvalidChunkSize.into());
    }

    let mut buffer = vec![0_u8; chunk_size];

    loop {
        let read = match reader.read(&mut buffer).await {
            Ok(0) => break,
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                if let Err(e) = writer.flush().await {
                    debug!("Flush after interrupted transfer failed: {}", e);
                }
                return Err(TransferError::Interrupted {
                    path: destination.to_path_buf(),
                    bytes_written: progress.bytes_transferred(),
                    source,
                }
                .into());
            }
        };

        writer
            .write_all(&buffer[..read])
            .await
            .map_err(|source| FilesystemError::Write {
                path: destination.to_path_buf(),
                bytes_written: progress.bytes_transferred(),
                source,
            })?;
        progress.advance(read as u64);
    }

    writer
        .flush()
        .await
        .map_err(|source| FilesystemError::Write {
            path: destination.to_path_buf(),
            bytes_written: progress.bytes_transferred(),
            source,
        })?;

    debug!(
        "Finished writing {} bytes to {}",
        progress.bytes_transferred(),
        destination.display()
    );
    Ok(progress.bytes_transferred())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;
    use tempfile::tempdir;

    use crate::app::client::ClientConfig;
    use crate::errors::AppError;

    fn chunked_reader(
        chunks: Vec<io::Result<Bytes>>,
    ) -> StreamReader<stream::Iter<std::vec::IntoIter<io::Result<Bytes>>>, Bytes> {
        StreamReader::new(stream::iter(chunks))
    }

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn split(data: &[u8], sizes: &[usize]) -> Vec<io::Result<Bytes>> {
        let mut chunks = Vec::new();
        let mut offset = 0;
        let mut sizes = sizes.iter().cycle();
        while offset < data.len() {
            let size = (*sizes.next().unwrap()).min(data.len() - offset);
            chunks.push(Ok(Bytes::copy_from_slice(&data[offset..offset + size])));
            offset += size;
        }
        chunks
    }

    #[tokio::test]
    async fn test_writes_exact_length_for_any_chunking() {
        let data = payload(10_000);
        let network_splits: [&[usize]; 5] = [&[1], &[7, 3], &[4096], &[10_000], &[999, 1, 5000]];
        let chunk_sizes = [1, 13, 1024, 64 * 1024];

        for splits in network_splits {
            for chunk_size in chunk_sizes {
                let reader = chunked_reader(split(&data, splits));
                let mut output: Vec<u8> = Vec::new();
                let mut progress = DownloadProgress::silent(Some(data.len() as u64));

                let written = stream_to_file(
                    reader,
                    &mut output,
                    Path::new("memory"),
                    chunk_size,
                    &mut progress,
                )
                .await
                .unwrap();

                assert_eq!(written, data.len() as u64);
                assert_eq!(progress.bytes_transferred(), data.len() as u64);
                assert_eq!(output, data);
            }
        }
    }

    #[tokio::test]
    async fn test_reads_never_exceed_chunk_size() {
        // One large network chunk, small read buffer
        let data = payload(5000);
        let reader = chunked_reader(vec![Ok(Bytes::from(data.clone()))]);
        let mut output: Vec<u8> = Vec::new();
        let mut progress = DownloadProgress::silent(None);

        stream_to_file(reader, &mut output, Path::new("memory"), 100, &mut progress)
            .await
            .unwrap();

        assert_eq!(output.len(), 5000);
        assert_eq!(progress.bytes_transferred(), 5000);
    }

    #[tokio::test]
    async fn test_empty_body_writes_empty_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("empty.csv");
        let file = open_destination(&path).await.unwrap();
        let mut progress = DownloadProgress::silent(None);

        let written = stream_to_file(chunked_reader(Vec::new()), file, &path, 1024, &mut progress)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_interrupted_stream_keeps_partial_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("partial.csv");
        let data = payload(500);

        let mut chunks = split(&data, &[200, 300]);
        chunks.push(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        )));

        let file = open_destination(&path).await.unwrap();
        let mut progress = DownloadProgress::silent(Some(1000));
        let result = stream_to_file(chunked_reader(chunks), file, &path, 64, &mut progress).await;

        match result {
            Err(AppError::Transfer(TransferError::Interrupted {
                path: error_path,
                bytes_written,
                ..
            })) => {
                assert_eq!(error_path, path);
                assert_eq!(bytes_written, 500);
            }
            other => panic!("Expected TransferError::Interrupted, got {:?}", other),
        }

        assert_eq!(progress.bytes_transferred(), 500);
        assert_eq!(std::fs::read(&path).unwrap(), data);
    }

    #[tokio::test]
    async fn test_zero_chunk_size_is_rejected() {
        let mut output: Vec<u8> = Vec::new();
        let mut progress = DownloadProgress::silent(None);
        let result = stream_to_file(
            chunked_reader(Vec::new()),
            &mut output,
            Path::new("memory"),
            0,
            &mut progress,
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidChunkSize))
        ));
    }

    #[tokio::test]
    async fn test_open_destination_creates_parents_and_truncates() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested/dir/out.csv");

        let mut file = open_destination(&path).await.unwrap();
        file.write_all(b"previous run contents").await.unwrap();
        file.flush().await.unwrap();
        drop(file);

        let file = open_destination(&path).await.unwrap();
        drop(file);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_open_destination_reports_filesystem_error() {
        let temp_dir = tempdir().unwrap();
        // A directory cannot be opened as a file
        let result = open_destination(temp_dir.path()).await;

        assert!(matches!(
            result,
            Err(AppError::Filesystem(FilesystemError::Open { .. }))
        ));
    }

    #[tokio::test]
    async fn test_downloader_rejects_zero_chunk_size_before_network() {
        let session = Session::builder(ClientConfig::default())
            .app_token("abc123")
            .build()
            .unwrap();
        // Unroutable; must never be contacted
        let url = Url::parse("http://127.0.0.1:9/rows.csv").unwrap();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("never.csv");

        let result = BulkDownloader::new(&session, &url)
            .chunk_size(0)
            .download(&path)
            .await;

        assert!(matches!(
            result,
            Err(AppError::Config(ConfigError::InvalidChunkSize))
        ));
        assert!(!path.exists());
    }
}
