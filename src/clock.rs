use crate::foundation::core::{Fps, FrameIndex};

/// Maps continuous playback time onto clamped frame indices and detects frame changes.
#[derive(Clone, Debug)]
pub struct FrameClock {
    fps: Fps,
    total_frames: u64,
    current: Option<FrameIndex>,
}

impl FrameClock {
    pub fn new(fps: Fps, total_frames: u64) -> Self {
        Self {
            fps,
            total_frames,
            current: None,
        }
    }

    /// `min(floor(time * fps), total_frames - 1)`.
    pub fn frame_at(&self, time_secs: f64) -> FrameIndex {
        let raw = self.fps.secs_to_frames_floor(time_secs);
        FrameIndex(raw.min(self.total_frames.saturating_sub(1)))
    }

    /// Advance to `time_secs`. Returns the new frame when it differs from the last tick.
    ///
    /// Backward jumps (seeks) are reported like any other change.
    pub fn tick(&mut self, time_secs: f64) -> Option<FrameIndex> {
        let frame = self.frame_at(time_secs);
        if self.current == Some(frame) {
            return None;
        }
        self.current = Some(frame);
        Some(frame)
    }

    pub fn current(&self) -> Option<FrameIndex> {
        self.current
    }

    /// Forget the last frame so the next tick always reports a change.
    pub fn invalidate(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock() -> FrameClock {
        FrameClock::new(Fps::new(2997, 100).unwrap(), 282)
    }

    #[test]
    fn frame_at_floors_and_clamps() {
        let c = clock();
        assert_eq!(c.frame_at(0.0), FrameIndex(0));
        assert_eq!(c.frame_at(1.0), FrameIndex(29));
        assert_eq!(c.frame_at(1.0011), FrameIndex(30));
        assert_eq!(c.frame_at(60.0), FrameIndex(281));
        assert_eq!(c.frame_at(-0.5), FrameIndex(0));
        assert_eq!(c.frame_at(f64::NAN), FrameIndex(0));
    }

    #[test]
    fn frame_at_matches_formula_over_a_sweep() {
        let c = clock();
        for step in 0..2_000u32 {
            let t = f64::from(step) * 0.005;
            let expected = ((t * 29.97).floor() as u64).min(281);
            assert_eq!(c.frame_at(t), FrameIndex(expected), "t={t}");
        }
    }

    #[test]
    fn tick_reports_only_changes() {
        let mut c = clock();
        assert_eq!(c.tick(0.0), Some(FrameIndex(0)));
        assert_eq!(c.tick(0.01), None);
        assert_eq!(c.tick(0.5), Some(FrameIndex(14)));
        assert_eq!(c.tick(0.5), None);
        // Seek backwards.
        assert_eq!(c.tick(0.1), Some(FrameIndex(2)));
        assert_eq!(c.current(), Some(FrameIndex(2)));

        c.invalidate();
        assert_eq!(c.tick(0.1), Some(FrameIndex(2)));
    }
}
