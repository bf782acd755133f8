use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hasher};

/// Source of the identifiers that pair a checkbox with its label.
pub trait IdGenerator {
    /// A fresh identifier for an element scoped by `scope` (the item class).
    fn next_id(&mut self, scope: &str) -> String;
}

impl<F> IdGenerator for F
where
    F: FnMut(&str) -> String,
{
    fn next_id(&mut self, scope: &str) -> String {
        self(scope)
    }
}

/// Identifiers of the form `{scope}--{n}` with `n` drawn at random from
/// `-1000..=9_999_000`.
#[derive(Debug, Default)]
pub struct RandomIds {
    keys: RandomState,
    draws: u64,
}

impl RandomIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uniform-ish value in `[0, 1)`.
    fn next_fraction(&mut self) -> f64 {
        let mut hasher = self.keys.build_hasher();
        hasher.write_u64(self.draws);
        self.draws = self.draws.wrapping_add(1);
        // 53 high bits fill an f64 mantissa exactly
        (hasher.finish() >> 11) as f64 / (1u64 << 53) as f64
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&mut self, scope: &str) -> String {
        let n = scaled(self.next_fraction());
        format!("{scope}--{n}")
    }
}

/// Map a fraction in `[0, 1)` onto the identifier range.
fn scaled(fraction: f64) -> i64 {
    (fraction * 10_000_000.0 - 1000.0).ceil() as i64
}

/// Identifiers `{scope}--1`, `{scope}--2`, ... for reproducible output.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self, scope: &str) -> String {
        self.next += 1;
        format!("{scope}--{}", self.next)
    }
}
