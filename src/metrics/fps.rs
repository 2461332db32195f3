use super::FpsSample;

/// Minimum wall-clock span a frame window must cover before it closes.
pub const FPS_WINDOW_MS: u64 = 1000;

/// Running frame count for the current ~1 s measurement window.
///
/// Each frame tick bumps the counter; once the window has covered at
/// least [`FPS_WINDOW_MS`] of wall time the window closes, yielding one
/// `FpsSample`, and a fresh window starts at the closing tick.
#[derive(Debug)]
pub struct FrameWindow {
    window_start_ms: u64,
    frames: u64,
}

impl FrameWindow {
    pub fn new(now_ms: u64) -> Self {
        Self { window_start_ms: now_ms, frames: 0 }
    }

    /// Count one frame at `now_ms`. Returns the closed window's sample
    /// when this tick completes a window, `None` otherwise.
    pub fn on_frame(&mut self, now_ms: u64) -> Option<FpsSample> {
        self.frames += 1;
        let elapsed = now_ms.saturating_sub(self.window_start_ms);
        if elapsed < FPS_WINDOW_MS {
            return None;
        }

        let value =
            (self.frames as f64 * 1000.0 / elapsed as f64).round() as u32;
        self.window_start_ms = now_ms;
        self.frames = 0;
        Some(FpsSample { value, timestamp_ms: now_ms })
    }

    /// Restart the window at `now_ms`, discarding counted frames.
    pub fn reset(&mut self, now_ms: u64) {
        self.window_start_ms = now_ms;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twenty_five_frames_over_one_second_reads_25() {
        let mut window = FrameWindow::new(0);
        // 24 ticks inside the window, the 25th lands on the boundary
        for i in 1..25u64 {
            assert!(window.on_frame(i * 40).is_none());
        }
        let sample = window.on_frame(1000).expect("window must close");
        assert_eq!(sample.value, 25);
        assert_eq!(sample.timestamp_ms, 1000);
    }

    #[test]
    fn window_does_not_close_early() {
        let mut window = FrameWindow::new(0);
        for i in 1..=50u64 {
            assert!(window.on_frame(i * 10).is_none());
        }
    }

    #[test]
    fn next_window_starts_at_closing_tick() {
        let mut window = FrameWindow::new(0);
        for i in 1..=25u64 {
            window.on_frame(i * 40);
        }
        // 60 frames over the following second
        for i in 1..60u64 {
            assert!(window.on_frame(1000 + i * 16).is_none());
        }
        let sample = window.on_frame(2000).expect("second window closes");
        assert_eq!(sample.value, 60);
    }

    #[test]
    fn sparse_frames_normalize_to_per_second_rate() {
        let mut window = FrameWindow::new(0);
        // 10 frames in the first 500 ms, then a long stall; the stall
        // stretches the window to 2000 ms before the next tick closes it
        for i in 1..=10u64 {
            assert!(window.on_frame(i * 50).is_none());
        }
        let sample = window.on_frame(2000).expect("window closes late");
        // 11 frames over 2000 ms → round(5.5) = 6
        assert_eq!(sample.value, 6);
    }

    #[test]
    fn reset_discards_partial_window() {
        let mut window = FrameWindow::new(0);
        for i in 1..=20u64 {
            window.on_frame(i * 10);
        }
        window.reset(500);
        // Only one frame counted since reset; closing at 1500 → ~1 fps
        let sample = window.on_frame(1500).expect("window closes");
        assert_eq!(sample.value, 1);
    }
}
