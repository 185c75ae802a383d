/// Percentage of `done` over `total`, in `0.0..=100.0` for in-range inputs.
///
/// A `total` of zero reports `0.0`: a probed size may legitimately be zero.
pub fn percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    done as f64 * 100.0 / total as f64
}

/// Byte counters for the resource currently being transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FileProgress {
    pub file_done: u64,
    pub file_size: u64,
}

impl FileProgress {
    pub fn new(file_size: u64) -> Self {
        Self {
            file_done: 0,
            file_size,
        }
    }

    pub fn advance(&mut self, bytes: u64) {
        self.file_done += bytes;
    }

    pub fn percent(&self) -> f64 {
        percent(self.file_done, self.file_size)
    }

    pub fn is_complete(&self) -> bool {
        self.file_done >= self.file_size
    }
}

/// Byte counters for a whole harvest run.
///
/// `total_done` only grows; it is the sum of the bytes written for every
/// resource completed so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionProgress {
    pub total_size: u64,
    pub total_done: u64,
}

impl SessionProgress {
    pub fn new(total_size: u64) -> Self {
        Self {
            total_size,
            total_done: 0,
        }
    }

    /// Folds a finished resource into the running total.
    pub fn complete_resource(&mut self, bytes: u64) {
        self.total_done += bytes;
    }

    pub fn percent(&self) -> f64 {
        percent(self.total_done, self.total_size)
    }

    /// Snapshot for an in-flight resource whose transfer began at `self.total_done`.
    pub fn snapshot(&self, name: &str, file: &FileProgress) -> TransferProgress {
        TransferProgress::new(name, file, self.total_done, self.total_size)
    }
}

/// One progress observation, emitted after every chunk written.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferProgress {
    pub name: String,
    pub file_done: u64,
    pub file_size: u64,
    pub total_done: u64,
    pub total_size: u64,
    pub file_percent: f64,
    pub total_percent: f64,
}

impl TransferProgress {
    /// Builds a snapshot from the file counters and the session offset the
    /// transfer started at.
    pub fn new(
        name: &str,
        file: &FileProgress,
        total_done_before: u64,
        total_size: u64,
    ) -> Self {
        let total_done = total_done_before + file.file_done;
        Self {
            name: name.to_string(),
            file_done: file.file_done,
            file_size: file.file_size,
            total_done,
            total_size,
            file_percent: percent(file.file_done, file.file_size),
            total_percent: percent(total_done, total_size),
        }
    }
}
