//! Scrolling waveform window
//!
//! [`WindowBuffer`] turns the queued sample stream into the plot's point
//! list. Each redraw tick drains whatever is pending and appends it at the
//! running cursor; once the window is full, old points are evicted and the
//! survivors shifted left so the trace scrolls.
//!
//! Eviction removes [`EVICTION_SLACK`] fewer points than the shift
//! amount, so each overflow tick leaves one extra point accumulating just
//! left of the origin (off-screen). That is the long-observed behavior of
//! this display; it is isolated in the one constant so a strict-window
//! variant is a one-line change. The catch-up path clears the sequence,
//! which also sheds the accumulated surplus.

use crate::backend::queue::SampleConsumer;

/// How many fewer points eviction removes than the x-shift amount
pub const EVICTION_SLACK: i64 = 1;

/// Fixed-capacity scrolling buffer of plot points
#[derive(Debug)]
pub struct WindowBuffer {
    capacity: usize,
    points: Vec<[f64; 2]>,
    cursor: i64,
}

impl WindowBuffer {
    /// Create an empty window holding `capacity` points once full
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: Vec::with_capacity(capacity),
            cursor: 0,
        }
    }

    /// Drain pending samples into the window; returns how many were drawn
    ///
    /// When more than a full window is pending (the renderer fell behind),
    /// the oldest pending samples are discarded and the window restarts
    /// from a cleared state showing only the newest `capacity` samples.
    pub fn on_tick(&mut self, consumer: &SampleConsumer) -> usize {
        let pending = consumer.len();
        if pending == 0 {
            return 0;
        }

        if pending > self.capacity {
            for _ in 0..pending - self.capacity {
                if consumer.try_pop().is_none() {
                    break;
                }
            }
            self.points.clear();
            self.cursor = 0;
        }

        let take = pending.min(self.capacity);
        let mut batch = Vec::with_capacity(take);
        for _ in 0..take {
            match consumer.try_pop() {
                Some(sample) => batch.push(sample),
                None => break,
            }
        }

        self.apply_batch(&batch);
        batch.len()
    }

    /// Append one batch at the cursor, scrolling the window as needed
    fn apply_batch(&mut self, batch: &[i32]) {
        if batch.is_empty() {
            return;
        }

        let overflow = self.cursor + batch.len() as i64 - self.capacity as i64;
        if overflow > 0 {
            let evict = ((overflow - EVICTION_SLACK).max(0) as usize).min(self.points.len());
            self.points.drain(..evict);
            for point in &mut self.points {
                point[0] -= overflow as f64;
            }
            self.cursor = self.capacity as i64 - overflow;
        }

        for &sample in batch {
            self.points.push([self.cursor as f64, sample as f64]);
            self.cursor += 1;
        }
    }

    /// The points to plot, oldest first
    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Position the next sample will be appended at
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Window capacity in points
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Forget everything and restart from the origin
    pub fn clear(&mut self) {
        self.points.clear();
        self.cursor = 0;
    }
}
