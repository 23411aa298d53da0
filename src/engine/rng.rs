//! Hash-seeded deterministic RNG.
//!
//! A seed string is folded into one 32-bit integer by [`hash_seed`], which then
//! drives a small Weyl-sequence generator: every step adds a fixed odd
//! increment and runs two xorshift-multiply rounds. All arithmetic is wrapping
//! `u32`, so a given seed string yields the same stream on every platform.
//!
//! Every derived operation (`int`, `pick`, `weighted`, ...) is built only on
//! [`SeededRng::next`], so the whole decision sequence of a generation call is
//! reproducible from the seed alone.
//!
//! `SeededRng` also implements [`rand::RngCore`], so authored handlers can use
//! `rand::Rng` helpers without leaving the deterministic stream.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::engine::error::GenError;

/// Upper bound on rejection-sampling retries before a fallback value is used.
pub const MAX_REJECTION_ATTEMPTS: usize = 200;

const WEYL_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;
/// Largest slot index `step` draws; integers above 2^53 are not exact in `f64`.
const MAX_GRID_SLOTS: f64 = 9_007_199_254_740_992.0;

/// Fold a seed string into a 32-bit integer.
///
/// Character-wise multiply-xor-rotate accumulation over UTF-16 code units,
/// followed by a final avalanche mix.
pub fn hash_seed(seed: &str) -> u32 {
    let len = seed.encode_utf16().count() as u32;
    let mut h: u32 = 1_779_033_703 ^ len;
    for unit in seed.encode_utf16() {
        h = (h ^ u32::from(unit)).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// One entry for [`SeededRng::weighted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weighted<T> {
    pub value: T,
    pub w: f64,
}

impl<T> Weighted<T> {
    pub fn new(value: T, w: f64) -> Self {
        Weighted { value, w }
    }
}

fn usable_weight(w: f64) -> bool {
    w.is_finite() && w > 0.0
}

/// Deterministic, sequential-only RNG.
///
/// Not meant to be shared between threads or branches: call [`SeededRng::fork`]
/// to get an independent stream instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    seed: String,
    state: u32,
}

impl SeededRng {
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let state = hash_seed(&seed);
        SeededRng { seed, state }
    }

    /// The seed string this stream was created from.
    pub fn seed(&self) -> &str {
        &self.seed
    }

    fn next_raw(&mut self) -> u32 {
        self.state = self.state.wrapping_add(WEYL_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next value in `[0, 1)`.
    pub fn next(&mut self) -> f64 {
        f64::from(self.next_raw()) / TWO_POW_32
    }

    /// Uniform integer in `[min, max]` (bounds are swapped if reversed).
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let width = i128::from(hi) - i128::from(lo);
        let offset = (self.next() * (width as f64 + 1.0)).floor() as i128;
        // In range for any i64 bounds: lo + [0, width] never leaves [lo, hi].
        (i128::from(lo) + offset.clamp(0, width)) as i64
    }

    /// Uniform float in `[min, max)`.
    pub fn float(&mut self, min: f64, max: f64) -> f64 {
        min + self.next() * (max - min)
    }

    /// `true` with probability `p`, clamped to `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.next() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Result<&'a T, GenError> {
        if items.is_empty() {
            return Err(GenError::EmptyInput);
        }
        let idx = (self.next() * items.len() as f64).floor() as usize;
        Ok(&items[idx.min(items.len() - 1)])
    }

    /// Fisher-Yates shuffle on the same stream.
    pub fn shuffle_in_place<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.int(0, i as i64) as usize;
            items.swap(i, j);
        }
    }

    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut out = items.to_vec();
        self.shuffle_in_place(&mut out);
        out
    }

    pub fn weighted<'a, T>(&mut self, items: &'a [Weighted<T>]) -> Result<&'a T, GenError> {
        self.weighted_by(items, |item| item.w).map(|item| &item.value)
    }

    /// Weighted draw where the weight is read off each item.
    ///
    /// Non-positive and non-finite weights carry no mass. If float rounding
    /// lets the scan fall through, the last positive-weight item wins.
    /// Weights whose sum overflows are scaled down by the largest one first.
    pub fn weighted_by<'a, T>(
        &mut self,
        items: &'a [T],
        weight: impl Fn(&T) -> f64,
    ) -> Result<&'a T, GenError> {
        let usable = || items.iter().map(&weight).filter(|w| usable_weight(*w));
        let mut divisor = 1.0;
        let mut total: f64 = usable().sum();
        if total.is_infinite() {
            divisor = usable().fold(0.0, f64::max);
            total = usable().map(|w| w / divisor).sum();
        }
        if total.is_nan() || total <= 0.0 {
            return Err(GenError::NoPositiveWeight { len: items.len() });
        }

        let mut r = self.next() * total;
        let mut last = None;
        for item in items {
            let w = weight(item);
            if !usable_weight(w) {
                continue;
            }
            let mass = w / divisor;
            if mass <= 0.0 {
                continue;
            }
            last = Some(item);
            r -= mass;
            if r <= 0.0 {
                return Ok(item);
            }
        }
        last.ok_or(GenError::NoPositiveWeight { len: items.len() })
    }

    /// Draw from the grid `min, min + step, ...` not exceeding `max`.
    ///
    /// Returns `min` when the grid is degenerate. Grids with more than 2^53
    /// slots only reach their first 2^53 + 1 points.
    pub fn step(&mut self, min: f64, max: f64, step: f64) -> f64 {
        if !step.is_finite() || step <= 0.0 || min.is_nan() || max.is_nan() || max < min {
            return min;
        }
        let slots = ((max - min) / step + 1e-9).floor().min(MAX_GRID_SLOTS) as i64;
        let k = self.int(0, slots);
        round_grid(min + k as f64 * step)
    }

    /// Independent child stream seeded from `"<parent seed>::<salt>"`.
    ///
    /// The parent's position is left untouched.
    pub fn fork(&self, salt: &str) -> SeededRng {
        SeededRng::new(format!("{}::{}", self.seed, salt))
    }

    /// Rejection sampling capped at [`MAX_REJECTION_ATTEMPTS`].
    ///
    /// Draws until `accept` passes; on exhaustion returns `fallback()` instead
    /// of looping forever.
    pub fn sample_until<T>(
        &mut self,
        mut draw: impl FnMut(&mut Self) -> T,
        accept: impl Fn(&T) -> bool,
        fallback: impl FnOnce() -> T,
    ) -> T {
        for _ in 0..MAX_REJECTION_ATTEMPTS {
            let candidate = draw(self);
            if accept(&candidate) {
                return candidate;
            }
        }
        tracing::debug!(seed = %self.seed, "rejection sampling exhausted, using fallback");
        fallback()
    }
}

fn round_grid(v: f64) -> f64 {
    let scaled = v * 1e10;
    if scaled.is_finite() {
        scaled.round() / 1e10
    } else {
        v
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.next_raw()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = u64::from(self.next_raw());
        let lo = u64::from(self.next_raw());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn hash_seed_known_values() {
        assert_eq!(hash_seed(""), 167_010_153);
        assert_eq!(hash_seed("abc"), 1_792_905_582);
    }

    #[test]
    fn stream_known_values() {
        let mut rng = SeededRng::new("abc");
        assert_eq!(rng.next_u32(), 3_807_890_421);
        assert_eq!(rng.next_u32(), 2_150_340_831);
        assert_eq!(rng.next_u32(), 579_508_299);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = SeededRng::new("learner-7|dot");
        let mut b = SeededRng::new("learner-7|dot");
        for _ in 0..100 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn next_stays_in_unit_interval() {
        let mut rng = SeededRng::new("unit");
        for _ in 0..10_000 {
            let v = rng.next();
            assert!((0.0..1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn int_is_inclusive_and_covers_range() {
        let mut rng = SeededRng::new("int");
        let mut seen = [false; 6];
        for _ in 0..1_000 {
            let v = rng.int(-2, 3);
            assert!((-2..=3).contains(&v));
            seen[(v + 2) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s), "not every value drawn: {seen:?}");
        assert_eq!(rng.int(4, 4), 4);
    }

    #[test]
    fn int_handles_the_full_i64_range() {
        let mut rng = SeededRng::new("wide");
        let mut negative = 0;
        for _ in 0..1_000 {
            if rng.int(i64::MIN, i64::MAX) < 0 {
                negative += 1;
            }
        }
        assert!((400..=600).contains(&negative), "{negative} negative draws out of 1000");
        assert_eq!(rng.int(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(rng.int(i64::MIN, i64::MIN), i64::MIN);
        for _ in 0..100 {
            assert!(rng.int(i64::MAX - 1, i64::MAX) >= i64::MAX - 1);
        }
    }

    #[test]
    fn chance_clamps_probability() {
        let mut rng = SeededRng::new("chance");
        for _ in 0..200 {
            assert!(rng.chance(7.0));
            assert!(!rng.chance(-1.0));
            assert!(!rng.chance(f64::NAN));
        }
    }

    #[test]
    fn pick_empty_is_an_error() {
        let mut rng = SeededRng::new("pick");
        let empty: [u8; 0] = [];
        assert_eq!(rng.pick(&empty), Err(GenError::EmptyInput));
        assert_eq!(rng.pick(&[9]), Ok(&9));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = SeededRng::new("shuffle");
        let items: Vec<u32> = (0..20).collect();
        let mut shuffled = rng.shuffle(&items);
        assert_ne!(shuffled, items, "20 items should not come back in order");
        shuffled.sort_unstable();
        assert_eq!(shuffled, items);
    }

    #[test]
    fn weighted_skips_zero_weight() {
        for seed in 0..200 {
            let mut rng = SeededRng::new(format!("w{seed}"));
            let items = [Weighted::new("a", 0.0), Weighted::new("b", 5.0)];
            assert_eq!(*rng.weighted(&items).unwrap(), "b");
        }
    }

    #[test]
    fn weighted_ignores_non_finite_weights() {
        let mut rng = SeededRng::new("nan");
        let items = [
            Weighted::new("nan", f64::NAN),
            Weighted::new("inf", f64::INFINITY),
            Weighted::new("neg", -3.0),
            Weighted::new("ok", 0.5),
        ];
        for _ in 0..50 {
            assert_eq!(*rng.weighted(&items).unwrap(), "ok");
        }
    }

    #[test]
    fn weighted_survives_overflowing_total() {
        let items = [Weighted::new("a", f64::MAX), Weighted::new("b", f64::MAX)];
        let mut a_drawn = 0;
        for seed in 0..1_000 {
            let mut rng = SeededRng::new(format!("huge{seed}"));
            if *rng.weighted(&items).unwrap() == "a" {
                a_drawn += 1;
            }
        }
        assert!((400..=600).contains(&a_drawn), "a drawn {a_drawn}/1000");
    }

    #[test]
    fn weighted_without_mass_fails() {
        let mut rng = SeededRng::new("none");
        let items = [Weighted::new("a", 0.0), Weighted::new("b", -1.0)];
        assert_eq!(rng.weighted(&items), Err(GenError::NoPositiveWeight { len: 2 }));
        let empty: [Weighted<&str>; 0] = [];
        assert!(rng.weighted(&empty).is_err());
    }

    #[test]
    fn step_snaps_to_grid() {
        let mut rng = SeededRng::new("step");
        for _ in 0..500 {
            let v = rng.step(-1.0, 1.0, 0.25);
            assert!((-1.0..=1.0).contains(&v));
            let slots = (v + 1.0) / 0.25;
            assert!((slots - slots.round()).abs() < 1e-9, "{v} is off the grid");
        }
        for _ in 0..50 {
            let v = rng.step(0.1, 0.3, 0.1);
            assert!([0.1, 0.2, 0.3].contains(&v), "float drift leaked through: {v}");
        }
        assert_eq!(rng.step(2.0, 5.0, 0.0), 2.0);
        assert_eq!(rng.step(5.0, 2.0, 1.0), 5.0);
    }

    #[test]
    fn step_on_an_enormous_grid_stays_in_range() {
        let mut rng = SeededRng::new("fine-grid");
        for _ in 0..200 {
            let v = rng.step(0.0, 1e300, 1e-300);
            assert!(v.is_finite() && (0.0..=1e300).contains(&v), "{v}");
            let v = rng.step(-1e300, 1e300, 1e290);
            assert!(v.is_finite() && (-1e300..=1e300).contains(&v), "{v}");
        }
    }

    #[test]
    fn fork_is_independent_of_parent() {
        let parent = SeededRng::new("parent");
        let mut child_a = parent.fork("part-1");
        let mut child_b = parent.fork("part-1");
        let mut other = parent.fork("part-2");

        assert_eq!(child_a.seed(), "parent::part-1");
        let a: Vec<u32> = (0..8).map(|_| child_a.next_u32()).collect();
        let b: Vec<u32> = (0..8).map(|_| child_b.next_u32()).collect();
        let c: Vec<u32> = (0..8).map(|_| other.next_u32()).collect();
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Forking does not advance the parent.
        let mut untouched = SeededRng::new("parent");
        let mut forked_from = parent.clone();
        let _ = forked_from.fork("x");
        assert_eq!(untouched.next_u32(), forked_from.next_u32());
    }

    #[test]
    fn sample_until_falls_back_after_cap() {
        let mut rng = SeededRng::new("reject");
        let mut calls = 0;
        let v = rng.sample_until(
            |r| {
                calls += 1;
                r.int(1, 10)
            },
            |_| false,
            || 0,
        );
        assert_eq!(v, 0);
        assert_eq!(calls, MAX_REJECTION_ATTEMPTS);

        let v = rng.sample_until(|r| r.int(1, 10), |v| *v > 5, || 0);
        assert!(v > 5);
    }

    #[test]
    fn rand_traits_stay_on_stream() {
        let mut a = SeededRng::new("rand");
        let mut b = SeededRng::new("rand");
        let x: u32 = a.gen_range(0..1000);
        let y: u32 = b.gen_range(0..1000);
        assert_eq!(x, y);
        let mut buf = [0u8; 7];
        a.fill_bytes(&mut buf);
        let mut buf2 = [0u8; 7];
        b.fill_bytes(&mut buf2);
        assert_eq!(buf, buf2);
    }
}
