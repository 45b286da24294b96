use crate::core::Sample;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Number of values retained per channel; the model consumes exactly one
/// window of this length.
pub const WINDOW_LEN: usize = 20;

/// Read-only copy of the three channel windows taken at one instant.
///
/// All three channels always have equal length; a snapshot never observes a
/// torn update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub channels: [Vec<i32>; 3],
}

impl WindowSnapshot {
    /// Values per channel at snapshot time.
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
struct Windows {
    channels: [VecDeque<i32>; 3],
}

/// Per-channel sliding windows of the most recent [`WINDOW_LEN`] values.
///
/// The one piece of state shared between the ingestion path and the
/// inference-trigger path. `push` and `snapshot` are atomic with respect to
/// each other; eviction is strict FIFO once a channel reaches capacity.
#[derive(Debug)]
pub struct SlidingWindowStore {
    inner: Mutex<Windows>,
}

impl SlidingWindowStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Windows {
                channels: [
                    VecDeque::with_capacity(WINDOW_LEN),
                    VecDeque::with_capacity(WINDOW_LEN),
                    VecDeque::with_capacity(WINDOW_LEN),
                ],
            }),
        }
    }

    /// Append one sample, updating all three channels together. Evicts the
    /// oldest value per channel when at capacity.
    pub fn push(&self, sample: Sample) {
        let mut inner = self.inner.lock().unwrap();
        for (window, value) in inner.channels.iter_mut().zip(sample.channels) {
            if window.len() == WINDOW_LEN {
                window.pop_front();
            }
            window.push_back(value);
        }
    }

    /// True from the push that first brings every channel to capacity; the
    /// windows keep sliding but never shrink, so this latches.
    pub fn is_full(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.channels[0].len() == WINDOW_LEN
    }

    /// Read-only copy of all three windows taken under the same lock as
    /// `push`.
    pub fn snapshot(&self) -> WindowSnapshot {
        let inner = self.inner.lock().unwrap();
        WindowSnapshot {
            channels: [
                inner.channels[0].iter().copied().collect(),
                inner.channels[1].iter().copied().collect(),
                inner.channels[2].iter().copied().collect(),
            ],
        }
    }
}

impl Default for SlidingWindowStore {
    fn default() -> Self {
        Self::new()
    }
}
