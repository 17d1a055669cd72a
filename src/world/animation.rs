use bevy::prelude::*;
use std::time::Duration;

/// Looping frame counter for a map backdrop or an NPC idle loop.
#[derive(Debug, Clone)]
pub struct AmbientAnimation {
    timer: Timer,
    frame: usize,
    frame_count: usize,
}

impl AmbientAnimation {
    pub fn new(frame_count: usize, frame_secs: f32) -> Self {
        Self {
            timer: Timer::from_seconds(frame_secs, TimerMode::Repeating),
            frame: 0,
            frame_count: frame_count.max(1),
        }
    }

    pub fn tick(&mut self, delta: Duration) {
        self.timer.tick(delta);
        let advanced = self.timer.times_finished_this_tick() as usize;
        self.frame = (self.frame + advanced) % self.frame_count;
    }

    pub fn pause(&mut self) {
        self.timer.pause();
    }

    pub fn resume(&mut self) {
        self.timer.unpause();
    }

    pub fn is_paused(&self) -> bool {
        self.timer.paused()
    }

    pub fn frame(&self) -> usize {
        self.frame
    }
}

impl Default for AmbientAnimation {
    fn default() -> Self {
        Self::new(2, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_wrap() {
        let mut anim = AmbientAnimation::new(2, 0.5);
        anim.tick(Duration::from_millis(600));
        assert_eq!(anim.frame(), 1);
        anim.tick(Duration::from_millis(500));
        assert_eq!(anim.frame(), 0);
    }

    #[test]
    fn test_paused_animation_holds_frame() {
        let mut anim = AmbientAnimation::new(4, 0.25);
        anim.pause();
        anim.tick(Duration::from_secs(2));
        assert_eq!(anim.frame(), 0);
        assert!(anim.is_paused());

        anim.resume();
        anim.tick(Duration::from_millis(260));
        assert_eq!(anim.frame(), 1);
    }
}
