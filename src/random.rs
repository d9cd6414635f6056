//! Uniform index selection behind a trait so tests can script the outcome.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Adapter for any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.0.random_range(0..len)
    }
}

/// Replays a fixed sequence of indices, wrapping around, each reduced modulo `len`.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    script: Vec<usize>,
    pos: usize,
}

impl ScriptedSource {
    pub fn new(script: Vec<usize>) -> Self {
        ScriptedSource { script, pos: 0 }
    }

    /// 0, 1, 2, ... wrapping: covers every index once per `len` calls.
    pub fn counting(len: usize) -> Self {
        ScriptedSource::new((0..len).collect())
    }
}

impl RandomSource for ScriptedSource {
    fn pick(&mut self, len: usize) -> usize {
        if self.script.is_empty() {
            return 0;
        }
        let value = self.script[self.pos % self.script.len()];
        self.pos += 1;
        value % len
    }
}
