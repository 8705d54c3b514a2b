//! RNG trait abstraction for the simulation
//!
//! Every random decision in a tick draws from one explicit generator, so a
//! world built from a fixed seed replays bit for bit.

/// Random number generator trait for the simulation
pub trait WorldRng {
    /// Generate random boolean with 50% probability
    fn gen_bool(&mut self) -> bool;

    /// Generate random f32 in [0.0, 1.0)
    fn gen_f32(&mut self) -> f32;

    /// Check if random value is less than probability threshold
    fn check_probability(&mut self, probability: f32) -> bool {
        self.gen_f32() < probability
    }

    /// Uniform f32 in [min, max); returns `min` for an empty range
    fn gen_range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + self.gen_f32() * (max - min)
    }

    /// Uniform i32 in [min, max] (inclusive); returns `min` for an empty range
    fn gen_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        let offset = ((self.gen_f32() * span) as i32).min(max - min);
        min + offset
    }

    /// -1 or 1 with equal probability
    fn gen_sign(&mut self) -> i32 {
        if self.gen_bool() { 1 } else { -1 }
    }
}

// Blanket implementation for any type implementing rand::Rng
// (seeded Xoshiro in worlds and tests, thread_rng elsewhere)
impl<T: ?Sized + rand::Rng> WorldRng for T {
    fn gen_bool(&mut self) -> bool {
        rand::Rng::r#gen(self)
    }

    fn gen_f32(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn gen_range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        rand::Rng::gen_range(self, min..=max)
    }
}
