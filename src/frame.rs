use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Frame metadata - carries frame number and timing info
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub number: u64,
    /// Seconds since the loop started
    pub time: f32,
    /// Seconds since the previous frame
    pub delta: f32,
}

impl FrameInfo {
    pub fn new(number: u64, time: f32, delta: f32) -> Self {
        Self { number, time, delta }
    }
}

/// Cancellation token for a running frame loop
///
/// Clones share the same flag; cancelling any of them stops the loop.
#[derive(Debug, Clone, Default)]
pub struct LoopHandle {
    cancelled: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// Self-rescheduling frame source
///
/// Yields one `FrameInfo` per display refresh until its handle is cancelled,
/// after which it is exhausted for good.
#[derive(Debug)]
pub struct FrameLoop {
    frame_number: u64,
    start_time: Instant,
    last_frame_time: Instant,
    handle: LoopHandle,
}

impl FrameLoop {
    pub fn start() -> Self {
        Self::start_at(Instant::now())
    }

    pub fn start_at(now: Instant) -> Self {
        Self {
            frame_number: 0,
            start_time: now,
            last_frame_time: now,
            handle: LoopHandle::default(),
        }
    }

    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_cancelled()
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Advance to a frame observed at `now`
    pub fn next_frame_at(&mut self, now: Instant) -> Option<FrameInfo> {
        if self.handle.is_cancelled() {
            return None;
        }

        let delta = now.saturating_duration_since(self.last_frame_time).as_secs_f32();
        let time = now.saturating_duration_since(self.start_time).as_secs_f32();
        let info = FrameInfo::new(self.frame_number, time, delta);

        self.frame_number += 1;
        self.last_frame_time = now;

        Some(info)
    }
}

impl Iterator for FrameLoop {
    type Item = FrameInfo;

    fn next(&mut self) -> Option<FrameInfo> {
        self.next_frame_at(Instant::now())
    }
}
