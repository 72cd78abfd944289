//! Time-based animation: per-entity tweens and a time-ordered action queue.
//!
//! Nothing here blocks. Tweens and scheduled actions advance only when the
//! owner calls `advance` from its frame tick, so a long sequence resumes
//! across frames.

use crate::color::Color;

/// A property interpolated linearly from `from` to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Tween {
    Scale { from: f32, to: f32 },
    Alpha { from: f32, to: f32 },
    Fill { from: Color, to: Color },
    LabelColor { from: Color, to: Color },
    MoveX { from: f32, to: f32 },
    MoveY { from: f32, to: f32 },
}

/// The property a [`Tween`] writes. At most one tween per channel runs at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    Scale,
    Alpha,
    Fill,
    LabelColor,
    MoveX,
    MoveY,
}

impl Tween {
    pub fn channel(&self) -> Channel {
        match self {
            Tween::Scale { .. } => Channel::Scale,
            Tween::Alpha { .. } => Channel::Alpha,
            Tween::Fill { .. } => Channel::Fill,
            Tween::LabelColor { .. } => Channel::LabelColor,
            Tween::MoveX { .. } => Channel::MoveX,
            Tween::MoveY { .. } => Channel::MoveY,
        }
    }

    /// Linear sample; `t >= 1` yields `to` exactly.
    pub fn sample_f32(from: f32, to: f32, t: f32) -> f32 {
        if t >= 1.0 {
            to
        } else {
            from + (to - from) * t.max(0.0)
        }
    }

    pub fn sample_color(from: Color, to: Color, t: f32) -> Color {
        from.lerp(to, t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Animation {
    pub tween: Tween,
    pub duration: f32,
    elapsed: f32,
}

impl Animation {
    pub fn new(tween: Tween, duration: f32) -> Self {
        Self {
            tween,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// The set of tweens running on one entity.
#[derive(Clone, Debug, Default)]
pub struct Animator {
    running: Vec<Animation>,
}

impl Animator {
    /// Starts `tween`, replacing any tween already running on its channel.
    pub fn run(&mut self, tween: Tween, duration: f32) {
        let channel = tween.channel();
        self.running.retain(|a| a.tween.channel() != channel);
        self.running.push(Animation::new(tween, duration));
    }

    /// Advances every tween by `dt` and hands each its new progress.
    ///
    /// Finished tweens are reported one last time with `t = 1.0` and then
    /// dropped.
    pub fn advance(&mut self, dt: f32, mut apply: impl FnMut(&Tween, f32)) {
        for anim in &mut self.running {
            anim.elapsed += dt;
            apply(&anim.tween, anim.progress());
        }
        self.running.retain(|a| !a.is_finished());
    }

    pub fn is_running(&self, channel: Channel) -> bool {
        self.running.iter().any(|a| a.tween.channel() == channel)
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn clear(&mut self) {
        self.running.clear();
    }
}

/// An action due at a point on the scheduler clock.
#[derive(Clone, Debug, PartialEq)]
pub struct Scheduled<A> {
    pub at: f64,
    seq: u64,
    pub action: A,
}

/// A single queue of `(time, action)` pairs consumed in time order.
///
/// Actions due at the same instant come out in the order they were queued.
#[derive(Clone, Debug)]
pub struct Scheduler<A> {
    clock: f64,
    next_seq: u64,
    queue: Vec<Scheduled<A>>,
}

impl<A> Default for Scheduler<A> {
    fn default() -> Self {
        Self {
            clock: 0.0,
            next_seq: 0,
            queue: Vec::new(),
        }
    }
}

impl<A> Scheduler<A> {
    pub fn now(&self) -> f64 {
        self.clock
    }

    pub fn schedule_after(&mut self, delay: f64, action: A) {
        let at = self.clock + delay.max(0.0);
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self
            .queue
            .partition_point(|s| s.at < at || (s.at == at && s.seq < seq));
        self.queue.insert(idx, Scheduled { at, seq, action });
    }

    /// Moves the clock forward and returns every action now due, in order.
    pub fn advance(&mut self, dt: f64) -> Vec<A> {
        self.clock += dt.max(0.0);
        // Tolerate rounding in accumulated frame times.
        let horizon = self.clock + 1e-9;
        let due = self.queue.partition_point(|s| s.at <= horizon);
        self.queue.drain(..due).map(|s| s.action).collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = &Scheduled<A>> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn animator_replaces_same_channel_and_reports_completion() {
        let mut animator = Animator::default();
        animator.run(Tween::Scale { from: 1.0, to: 2.0 }, 1.0);
        animator.run(Tween::Scale { from: 1.0, to: 0.5 }, 1.0);
        animator.run(Tween::Alpha { from: 0.0, to: 1.0 }, 0.5);

        let mut seen = Vec::new();
        animator.advance(0.5, |tween, t| seen.push((*tween, t)));

        assert_eq!(
            seen,
            vec![
                (Tween::Scale { from: 1.0, to: 0.5 }, 0.5),
                (Tween::Alpha { from: 0.0, to: 1.0 }, 1.0),
            ]
        );
        assert!(animator.is_running(Channel::Scale));
        assert!(!animator.is_running(Channel::Alpha));

        animator.advance(0.75, |_, t| assert_eq!(t, 1.0));
        assert!(animator.is_idle());
    }

    #[test]
    fn samples_end_exactly_on_the_target() {
        assert_eq!(Tween::sample_f32(10.0, 0.1 + 0.2, 1.0), 0.1 + 0.2);
        assert_eq!(Tween::sample_f32(-3.7, 123.456, 2.0), 123.456);
        assert_eq!(Tween::sample_f32(4.0, 8.0, -1.0), 4.0);
        assert_eq!(Tween::sample_f32(4.0, 8.0, 0.5), 6.0);
    }

    #[test]
    fn zero_duration_completes_on_first_advance() {
        let mut animator = Animator::default();
        animator.run(Tween::MoveX { from: 0.0, to: 10.0 }, 0.0);
        let mut last = None;
        animator.advance(0.0, |_, t| last = Some(t));
        assert_eq!(last, Some(1.0));
        assert!(animator.is_idle());
    }

    #[test]
    fn scheduler_releases_in_time_then_insertion_order() {
        let mut scheduler = Scheduler::default();
        scheduler.schedule_after(0.004, "c");
        scheduler.schedule_after(0.0, "a");
        scheduler.schedule_after(0.002, "b");
        scheduler.schedule_after(0.002, "b2");

        assert_eq!(scheduler.advance(0.0), vec!["a"]);
        assert_eq!(scheduler.advance(0.002), vec!["b", "b2"]);
        assert!(scheduler.advance(0.001).is_empty());
        assert_eq!(scheduler.advance(0.001), vec!["c"]);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn delays_are_relative_to_the_current_clock() {
        let mut scheduler = Scheduler::default();
        scheduler.advance(1.0);
        scheduler.schedule_after(0.5, 1);
        let at: Vec<f64> = scheduler.pending().map(|s| s.at).collect();
        assert_eq!(at, vec![1.5]);
    }
}
