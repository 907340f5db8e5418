//! Dice helpers: the real roll and the cosmetic shuffle shown while the
//! acting player's dice "spin".

use rand::Rng;
use std::time::Duration;

/// Ticks in the cosmetic shuffle.
pub const SHUFFLE_TICKS: u32 = 10;

/// Time between shuffle ticks (10 × 50 ms = 500 ms total).
pub const SHUFFLE_TICK: Duration = Duration::from_millis(50);

/// Roll one die.
pub fn roll_die<R: Rng>(rng: &mut R) -> u8 {
    rng.random_range(1..=6)
}

/// A 500 ms visual shuffle ending on the pair that gets submitted.
///
/// Observers never see this; they only render the server-synced faces.
#[derive(Debug, Clone, Copy)]
pub struct DiceShuffle {
    ticks_left: u32,
    /// The final faces, fixed up front so the submit does not depend on
    /// how far the animation got.
    pub final_faces: (u8, u8),
    /// Faces currently shown.
    pub faces: (u8, u8),
}

impl DiceShuffle {
    pub fn start<R: Rng>(rng: &mut R) -> DiceShuffle {
        let final_faces = (roll_die(rng), roll_die(rng));
        DiceShuffle {
            ticks_left: SHUFFLE_TICKS,
            final_faces,
            faces: final_faces,
        }
    }

    /// Advance one tick, showing random faces until the last tick locks
    /// in the final pair. Returns `false` when the shuffle is done.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> bool {
        if self.ticks_left == 0 {
            return false;
        }
        self.ticks_left -= 1;
        if self.ticks_left == 0 {
            self.faces = self.final_faces;
            false
        } else {
            self.faces = (roll_die(rng), roll_die(rng));
            true
        }
    }

    pub fn sum(&self) -> u8 {
        self.final_faces.0 + self.final_faces.1
    }

    pub fn is_double(&self) -> bool {
        self.final_faces.0 == self.final_faces.1
    }
}
