//! Events emitted towards the host layer during a transfer

use chrono::NaiveDateTime;
use std::fmt;

/// Progress of a streaming transfer after one chunk was published
///
/// `chunk_index` increases monotonically within a transfer; the percentage of
/// the final chunk is exactly 100.0.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub chunk_index: u64,
    pub total_chunks: u64,
    pub percentage: f64,
}

impl TransferProgress {
    pub fn new(chunk_index: u64, total_chunks: u64) -> Self {
        let percentage = ((chunk_index + 1) as f64 / total_chunks as f64) * 100.0;
        Self {
            chunk_index,
            total_chunks,
            percentage,
        }
    }
}

impl fmt::Display for TransferProgress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "chunk {}/{} ({:.1}%)",
            self.chunk_index + 1,
            self.total_chunks,
            self.percentage
        )
    }
}

/// Event stream delivered over the service's mpsc channel
#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    /// Broker connection came up or went down
    StateChanged {
        connected: bool,
        timestamp: NaiveDateTime,
    },
    /// One chunk of a streaming transfer was published
    Progress {
        progress: TransferProgress,
        timestamp: NaiveDateTime,
    },
}

impl TransferEvent {
    pub fn state_changed(connected: bool) -> Self {
        Self::StateChanged {
            connected,
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    pub fn progress(progress: TransferProgress) -> Self {
        Self::Progress {
            progress,
            timestamp: chrono::Local::now().naive_local(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_chunk_reaches_exactly_one_hundred_percent() {
        for total in [1u64, 3, 7, 1000] {
            let progress = TransferProgress::new(total - 1, total);
            assert_eq!(progress.percentage, 100.0);
        }
    }

    #[test]
    fn intermediate_percentage_is_proportional() {
        let progress = TransferProgress::new(0, 4);
        assert_eq!(progress.percentage, 25.0);
        let progress = TransferProgress::new(1, 4);
        assert_eq!(progress.percentage, 50.0);
    }
}
