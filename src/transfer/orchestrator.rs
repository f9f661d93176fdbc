//! Transfer orchestrator driving planner, encoder and publisher
//!
//! Runs a single transfer sequentially, chunk by chunk: read a window from
//! the file, encode it, hand it to the publisher, report progress. No
//! acknowledgment is awaited between chunks and nothing is retried here;
//! delivery guarantees belong to the MQTT client library behind the
//! [`ChunkPublisher`] capability.
//!
//! ```text
//! File ──► ChunkPlan ──► PayloadEncoding ──► ChunkPublisher
//!                                │
//!                                └──► TransferEvent::Progress
//! ```

use std::future::Future;
use std::io::SeekFrom;
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::mqtt::connection::ConnectionState;

use super::chunk::ChunkPlan;
use super::encoder::PayloadEncoding;
use super::error::TransferError;
use super::events::{TransferEvent, TransferProgress};

/// Capability of publishing one payload to a topic
///
/// The only contract the orchestrator depends on. QoS, retained flags and
/// ack tracking are the implementation's concern.
pub trait ChunkPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;
}

/// One file transfer as requested by the host layer
///
/// `chunk_index: None` runs the full streaming transfer; `Some(i)` publishes
/// only the window at that index and emits no progress events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendFileRequest {
    pub file_path: PathBuf,
    pub encoding: String,
    pub topic: String,
    pub chunk_size: u64,
    pub chunk_index: Option<u64>,
}

pub struct TransferOrchestrator<P: ChunkPublisher> {
    publisher: P,
    connection: watch::Receiver<ConnectionState>,
    events: mpsc::Sender<TransferEvent>,
}

impl<P: ChunkPublisher> TransferOrchestrator<P> {
    pub fn new(
        publisher: P,
        connection: watch::Receiver<ConnectionState>,
        events: mpsc::Sender<TransferEvent>,
    ) -> Self {
        Self {
            publisher,
            connection,
            events,
        }
    }

    fn ensure_connected(&self) -> Result<(), TransferError> {
        if self.connection.borrow().is_connected() {
            Ok(())
        } else {
            Err(TransferError::NotConnected)
        }
    }

    /// Publishes a file to the request's topic, either as one explicit chunk
    /// or as a full streaming transfer
    pub async fn send_file(&self, request: &SendFileRequest) -> Result<(), TransferError> {
        self.ensure_connected()?;

        let metadata = tokio::fs::metadata(&request.file_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    TransferError::FileNotFound(request.file_path.clone())
                }
                _ => TransferError::Io(e),
            })?;

        let plan = ChunkPlan::new(metadata.len(), request.chunk_size)?;
        let encoding = PayloadEncoding::from_name(&request.encoding);

        match request.chunk_index {
            Some(index) => self.send_single_chunk(request, &plan, encoding, index).await,
            None => self.stream_all_chunks(request, &plan, encoding).await,
        }
    }

    async fn send_single_chunk(
        &self,
        request: &SendFileRequest,
        plan: &ChunkPlan,
        encoding: PayloadEncoding,
        index: u64,
    ) -> Result<(), TransferError> {
        let window = plan.window(index)?;

        let mut file = File::open(&request.file_path).await?;
        file.seek(SeekFrom::Start(window.offset)).await?;
        let mut data = vec![0u8; window.len as usize];
        file.read_exact(&mut data).await?;

        let payload = encoding.encode(&data)?;
        self.publisher.publish(&request.topic, payload).await?;

        debug!(
            "Published chunk {} ({} bytes at offset {}) to '{}'",
            window.index, window.len, window.offset, request.topic
        );
        Ok(())
    }

    async fn stream_all_chunks(
        &self,
        request: &SendFileRequest,
        plan: &ChunkPlan,
        encoding: PayloadEncoding,
    ) -> Result<(), TransferError> {
        let total_chunks = plan.total_chunks();
        if total_chunks == 0 {
            info!("File {:?} is empty, nothing to publish", request.file_path);
            return Ok(());
        }

        let mut file = File::open(&request.file_path).await?;
        for window in plan.windows() {
            let mut data = vec![0u8; window.len as usize];
            file.read_exact(&mut data).await?;

            let payload = encoding.encode(&data)?;
            self.publisher.publish(&request.topic, payload).await?;
            debug!("Sent chunk {}", window.index);

            let progress = TransferProgress::new(window.index, total_chunks);
            if let Err(e) = self.events.send(TransferEvent::progress(progress)).await {
                warn!("Failed to deliver progress event: {}", e);
            }
        }

        info!(
            "Transfer complete: {} chunks of {:?} published to '{}'",
            total_chunks, request.file_path, request.topic
        );
        Ok(())
    }

    /// Publishes a short fixed payload to verify the broker path end to end
    pub async fn publish_test_message(&self, topic: &str) -> Result<(), TransferError> {
        self.ensure_connected()?;
        self.publisher
            .publish(topic, b"Hello from mqtt-filetransfer!".to_vec())
            .await?;
        info!("Test message published to '{}'", topic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::NamedTempFile;

    /// Records publishes instead of talking to a broker
    #[derive(Clone, Default)]
    struct RecordingPublisher {
        published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
        fail: bool,
    }

    impl ChunkPublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransferError> {
            if self.fail {
                return Err(TransferError::Channel("publisher rejected".into()));
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    fn orchestrator(
        publisher: RecordingPublisher,
        state: ConnectionState,
    ) -> (
        TransferOrchestrator<RecordingPublisher>,
        mpsc::Receiver<TransferEvent>,
    ) {
        let (_state_tx, state_rx) = watch::channel(state);
        let (event_tx, event_rx) = mpsc::channel(100);
        (
            TransferOrchestrator::new(publisher, state_rx, event_tx),
            event_rx,
        )
    }

    fn temp_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn request(file: &NamedTempFile, chunk_size: u64, chunk_index: Option<u64>) -> SendFileRequest {
        SendFileRequest {
            file_path: file.path().to_path_buf(),
            encoding: "passthrough".into(),
            topic: "files/out".into(),
            chunk_size,
            chunk_index,
        }
    }

    #[tokio::test]
    async fn streaming_publishes_every_chunk_in_order() {
        let contents: Vec<u8> = (0..=255).cycle().take(2500).map(|b: u16| b as u8).collect();
        let file = temp_file(&contents);
        let publisher = RecordingPublisher::default();
        let (orchestrator, mut events) = orchestrator(publisher.clone(), ConnectionState::Connected);

        orchestrator
            .send_file(&request(&file, 1024, None))
            .await
            .unwrap();

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 3);
        let reassembled: Vec<u8> = published
            .iter()
            .flat_map(|(_, payload)| payload.clone())
            .collect();
        assert_eq!(reassembled, contents);

        let mut percentages = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let TransferEvent::Progress { progress, .. } = event {
                assert_eq!(progress.total_chunks, 3);
                percentages.push(progress.percentage);
            }
        }
        assert_eq!(percentages.len(), 3);
        assert_eq!(*percentages.last().unwrap(), 100.0);
    }

    #[tokio::test]
    async fn streaming_base64_encodes_each_chunk() {
        let contents = vec![0xab_u8; 300];
        let file = temp_file(&contents);
        let publisher = RecordingPublisher::default();
        let (orchestrator, _events) = orchestrator(publisher.clone(), ConnectionState::Connected);

        let mut req = request(&file, 256, None);
        req.encoding = "base64".into();
        orchestrator.send_file(&req).await.unwrap();

        let published = publisher.published.lock().unwrap();
        let decoded: Vec<u8> = published
            .iter()
            .flat_map(|(_, payload)| general_purpose::STANDARD.decode(payload).unwrap())
            .collect();
        assert_eq!(decoded, contents);
    }

    #[tokio::test]
    async fn single_chunk_mode_reads_only_that_window() {
        let contents: Vec<u8> = (0..100u8).collect();
        let file = temp_file(&contents);
        let publisher = RecordingPublisher::default();
        let (orchestrator, mut events) = orchestrator(publisher.clone(), ConnectionState::Connected);

        orchestrator
            .send_file(&request(&file, 30, Some(3)))
            .await
            .unwrap();

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1, &contents[90..100]);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn single_chunk_out_of_range_fails() {
        let file = temp_file(&[0u8; 64]);
        let (orchestrator, _events) =
            orchestrator(RecordingPublisher::default(), ConnectionState::Connected);

        let result = orchestrator.send_file(&request(&file, 64, Some(1))).await;
        assert!(matches!(
            result,
            Err(TransferError::InvalidChunkRange { index: 1, .. })
        ));
    }

    #[tokio::test]
    async fn empty_file_streams_nothing_and_succeeds() {
        let file = temp_file(&[]);
        let publisher = RecordingPublisher::default();
        let (orchestrator, mut events) = orchestrator(publisher.clone(), ConnectionState::Connected);

        orchestrator
            .send_file(&request(&file, 1024, None))
            .await
            .unwrap();

        assert!(publisher.published.lock().unwrap().is_empty());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn publish_while_disconnected_fails() {
        let file = temp_file(b"data");
        let (orchestrator, _events) =
            orchestrator(RecordingPublisher::default(), ConnectionState::Disconnected);

        let result = orchestrator.send_file(&request(&file, 4, None)).await;
        assert!(matches!(result, Err(TransferError::NotConnected)));

        let result = orchestrator.publish_test_message("test/topic").await;
        assert!(matches!(result, Err(TransferError::NotConnected)));
    }

    #[tokio::test]
    async fn missing_file_fails_with_file_not_found() {
        let (orchestrator, _events) =
            orchestrator(RecordingPublisher::default(), ConnectionState::Connected);

        let result = orchestrator
            .send_file(&SendFileRequest {
                file_path: PathBuf::from("/no/such/file.bin"),
                encoding: "base64".into(),
                topic: "files/out".into(),
                chunk_size: 1024,
                chunk_index: None,
            })
            .await;
        assert!(matches!(result, Err(TransferError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn publisher_failure_aborts_the_transfer() {
        let file = temp_file(&[1u8; 256]);
        let publisher = RecordingPublisher {
            fail: true,
            ..RecordingPublisher::default()
        };
        let (orchestrator, mut events) = orchestrator(publisher, ConnectionState::Connected);

        let result = orchestrator.send_file(&request(&file, 64, None)).await;
        assert!(matches!(result, Err(TransferError::Channel(_))));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn invalid_utf8_chunk_fails_encoding() {
        let file = temp_file(&[0xff, 0xfe, 0xfd]);
        let (orchestrator, _events) =
            orchestrator(RecordingPublisher::default(), ConnectionState::Connected);

        let mut req = request(&file, 1024, None);
        req.encoding = "utf8".into();
        let result = orchestrator.send_file(&req).await;
        assert!(matches!(result, Err(TransferError::EncodingFailed)));
    }

    #[tokio::test]
    async fn test_message_reaches_the_publisher() {
        let publisher = RecordingPublisher::default();
        let (orchestrator, _events) = orchestrator(publisher.clone(), ConnectionState::Connected);

        orchestrator.publish_test_message("test/topic").await.unwrap();

        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "test/topic");
    }
}
