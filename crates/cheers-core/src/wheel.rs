//! Turn-order wheel: the seed-to-animation mapping and slice math.
//!
//! The server decides the outcome; every client replays the same
//! animation from the published seed. Same seed means same duration and
//! initial swing on every client, not a shared RNG sequence — clients
//! whose polls land at different instants still render different angles
//! at the same wall-clock moment. The winner index therefore always
//! comes from the server, never from where a local animation stopped.

use std::time::Duration;

/// Fixed animation tick.
pub const TICK: Duration = Duration::from_millis(30);

/// Seeds are issued in `1..=10000`.
pub const SEED_RANGE: u32 = 10_000;

/// Parameters derived deterministically from a spin seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpinParams {
    /// Total animation time in milliseconds, 4000–7000.
    pub total_ms: f64,
    /// Initial swing in degrees per tick, 10–20.
    pub arc_start: f64,
}

impl SpinParams {
    /// Map a seed to its animation parameters.
    pub fn from_seed(seed: u32) -> SpinParams {
        let u = (f64::from(seed) / f64::from(SEED_RANGE)).clamp(0.0, 1.0);
        SpinParams {
            total_ms: 4_000.0 + u * 3_000.0,
            arc_start: 10.0 + u * 10.0,
        }
    }

    pub fn total(&self) -> Duration {
        Duration::from_millis(self.total_ms as u64)
    }
}

/// Cubic ease-out over `d` with start value `b` and change `c`.
fn ease_out(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    b + c * (t * t * t - 3.0 * t * t + 3.0 * t)
}

/// Replays one spin, one [`TICK`] at a time.
///
/// Each tick the swing decays along the ease-out curve and the wheel
/// angle accumulates the difference, so the wheel starts fast and
/// coasts to a stop exactly at `total_ms`.
#[derive(Debug, Clone)]
pub struct WheelAnimation {
    params: SpinParams,
    elapsed_ms: f64,
    /// Accumulated wheel rotation in degrees.
    pub angle: f64,
}

impl WheelAnimation {
    pub fn new(seed: u32) -> WheelAnimation {
        WheelAnimation {
            params: SpinParams::from_seed(seed),
            elapsed_ms: 0.0,
            angle: 0.0,
        }
    }

    /// Advance one tick. Returns `false` once the animation has finished.
    pub fn step(&mut self) -> bool {
        self.elapsed_ms += TICK.as_millis() as f64;
        if self.elapsed_ms >= self.params.total_ms {
            return false;
        }
        let swing = self.params.arc_start
            - ease_out(self.elapsed_ms, 0.0, self.params.arc_start, self.params.total_ms);
        self.angle = (self.angle + swing) % 360.0;
        true
    }

    pub fn finished(&self) -> bool {
        self.elapsed_ms >= self.params.total_ms
    }

    /// Fraction of the animation completed, for progress display.
    pub fn progress(&self) -> f64 {
        (self.elapsed_ms / self.params.total_ms).clamp(0.0, 1.0)
    }
}

/// The slice index under the top pointer for a wheel of `n` equal
/// slices rotated by `angle` degrees.
pub fn pointer_slice(angle: f64, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let arc = 360.0 / n as f64;
    let degrees = (angle + 90.0).rem_euclid(360.0);
    ((360.0 - degrees) / arc).floor() as usize % n
}

/// The turn order produced by a draw: candidate indices starting at the
/// winner and wrapping around the wheel.
pub fn spin_order(candidates: usize, winner_index: usize) -> Vec<usize> {
    if candidates == 0 {
        return Vec::new();
    }
    let winner = winner_index % candidates;
    (winner..candidates).chain(0..winner).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_mapping_is_deterministic() {
        for seed in [0, 1, 777, 4242, 9999, 10_000] {
            let a = SpinParams::from_seed(seed);
            let b = SpinParams::from_seed(seed);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn seed_mapping_stays_in_range() {
        for seed in 0..=SEED_RANGE {
            let p = SpinParams::from_seed(seed);
            assert!((4_000.0..=7_000.0).contains(&p.total_ms), "seed {seed}");
            assert!((10.0..=20.0).contains(&p.arc_start), "seed {seed}");
        }
    }

    #[test]
    fn seed_extremes() {
        let low = SpinParams::from_seed(0);
        assert_eq!(low.total_ms, 4_000.0);
        assert_eq!(low.arc_start, 10.0);
        let high = SpinParams::from_seed(SEED_RANGE);
        assert_eq!(high.total_ms, 7_000.0);
        assert_eq!(high.arc_start, 20.0);
    }

    #[test]
    fn animation_runs_for_the_computed_duration() {
        let mut anim = WheelAnimation::new(4242);
        let expected_ticks = (SpinParams::from_seed(4242).total_ms / 30.0).ceil() as usize;
        let mut ticks = 0;
        while anim.step() {
            ticks += 1;
            assert!(ticks < 1_000, "animation never finished");
        }
        assert!(anim.finished());
        // The last step is the one that crosses total_ms.
        assert_eq!(ticks + 1, expected_ticks);
    }

    #[test]
    fn swing_decays_monotonically() {
        let mut anim = WheelAnimation::new(5000);
        let mut last_angle = 0.0;
        let mut last_delta = f64::MAX;
        while anim.step() {
            let delta = (anim.angle - last_angle).rem_euclid(360.0);
            assert!(delta <= last_delta + 1e-9, "swing increased mid-spin");
            last_delta = delta;
            last_angle = anim.angle;
        }
    }

    #[test]
    fn replaying_a_seed_gives_identical_angles() {
        let mut a = WheelAnimation::new(1234);
        let mut b = WheelAnimation::new(1234);
        loop {
            let more_a = a.step();
            let more_b = b.step();
            assert_eq!(more_a, more_b);
            assert_eq!(a.angle, b.angle);
            if !more_a {
                break;
            }
        }
    }

    #[test]
    fn pointer_slice_quarters() {
        // Four slices, pointer at the top. Slice boundaries land exactly
        // on the pointer at multiples of 90 degrees.
        assert_eq!(pointer_slice(0.0, 4), 3);
        assert_eq!(pointer_slice(45.0, 4), 2);
        assert_eq!(pointer_slice(90.0, 4), 2);
        assert_eq!(pointer_slice(180.0, 4), 1);
        assert_eq!(pointer_slice(270.0, 4), 0);
        assert_eq!(pointer_slice(360.0, 4), 3);
        assert_eq!(pointer_slice(-90.0, 4), 0);
    }

    #[test]
    fn pointer_slice_empty_wheel() {
        assert_eq!(pointer_slice(123.0, 0), 0);
    }

    #[test]
    fn spin_order_wraps_from_the_winner() {
        assert_eq!(spin_order(4, 2), vec![2, 3, 0, 1]);
        assert_eq!(spin_order(4, 0), vec![0, 1, 2, 3]);
        assert_eq!(spin_order(3, 2), vec![2, 0, 1]);
        assert_eq!(spin_order(1, 0), vec![0]);
        assert!(spin_order(0, 0).is_empty());
    }
}
