// record-fuzzing/src/random.rs
//! Probabilistic decisions used by every mutator

use crate::config::FuzzConfig;
use crate::constants::{DATE_SCALE_MILLIS, DEFAULT_PERCENT};
use crate::error::FuzzError;
use chrono::{DateTime, TimeZone, Utc};
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use record_types::Enumerated;

/// Source of every random choice made during a run.
///
/// Seeding it makes a whole run reproducible.
#[derive(Debug, Clone)]
pub struct RandomDecisionSource {
    rng: StdRng,
}

impl Default for RandomDecisionSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomDecisionSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// True with probability `percent`/100. NaN counts as the default percentage.
    pub fn bernoulli(&mut self, percent: f64) -> bool {
        let percent = if percent.is_nan() { DEFAULT_PERCENT } else { percent };
        self.rng.gen_range(0.0..100.0) < percent
    }

    /// Value in `[0, |bound|)`; a zero bound yields 0
    pub fn bounded_long(&mut self, bound: i64) -> i64 {
        let bound = bound.unsigned_abs();
        if bound == 0 {
            return 0;
        }
        self.rng.gen_range(0..bound) as i64
    }

    /// Index in `[0, len)`; an empty range yields 0
    pub fn bounded_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Draw a random part of `items` according to the sampling knobs of `config`.
    ///
    /// Elements are drawn independently, so the result may repeat an element
    /// and its order is the draw order.
    pub fn sample<T: Clone>(&mut self, items: &[T], config: &FuzzConfig) -> Vec<T> {
        let used_percent = if config.used_percent_of_mutators.is_nan() {
            DEFAULT_PERCENT
        } else {
            config.used_percent_of_mutators
        };

        if config.use_all_mutators || used_percent > 100.0 {
            return items.to_vec();
        }
        if items.is_empty() {
            return Vec::new();
        }

        let factor = used_percent / 100.0;
        if factor <= 0.0 {
            return Vec::new();
        }

        let len = items.len();
        let upper = if len < 3 {
            2.0
        } else if len < 5 {
            3.0
        } else {
            len as f64 * factor
        };
        let cap = self.rng.gen_range(0.0..upper).min(len as f64);
        let take = cap.ceil() as usize;

        (0..take)
            .map(|_| items[self.rng.gen_range(0..len)].clone())
            .collect()
    }

    /// Uniform choice among the variants of `E` that are not excluded
    pub fn uniform_enum<E: Enumerated>(&mut self, excluding: &[E]) -> Result<E, FuzzError> {
        let candidates: Vec<E> = E::variants()
            .iter()
            .copied()
            .filter(|variant| !excluding.contains(variant))
            .collect();

        candidates.choose(&mut self.rng).copied().ok_or_else(|| {
            FuzzError::InvalidArgument(format!(
                "every variant of {} is excluded: {:?}",
                std::any::type_name::<E>(),
                excluding
            ))
        })
    }

    /// Random instant; `year_skew` 1 lands mostly before 2000, 10 mostly after
    pub fn bounded_date(&mut self, year_skew: i64) -> DateTime<Utc> {
        let millis = self.bounded_long(DATE_SCALE_MILLIS.saturating_mul(year_skew));
        Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
    }

    /// A random i32 different from `current`
    pub fn another_i32(&mut self, current: i32) -> i32 {
        loop {
            let candidate: i32 = self.rng.gen();
            if candidate != current {
                return candidate;
            }
        }
    }

    pub fn alphanumeric(&mut self, len: usize) -> String {
        (&mut self.rng)
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect()
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use record_types::{Gender, UnitOfTime};

    fn config(used_percent: f64, use_all: bool) -> FuzzConfig {
        FuzzConfig {
            used_percent_of_mutators: used_percent,
            use_all_mutators: use_all,
            ..Default::default()
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn bernoulli_frequency_matches_percentage(percent in 0.0f64..=100.0, seed in any::<u64>()) {
            let mut random = RandomDecisionSource::seeded(seed);
            let trials = 20_000;
            let hits = (0..trials).filter(|_| random.bernoulli(percent)).count();
            let observed = hits as f64 / trials as f64;
            prop_assert!((observed - percent / 100.0).abs() < 0.02, "observed {} for {}%", observed, percent);
        }

        #[test]
        fn bounded_long_stays_in_range(bound in any::<i64>(), seed in any::<u64>()) {
            let mut random = RandomDecisionSource::seeded(seed);
            let value = random.bounded_long(bound);
            prop_assert!(value >= 0);
            if bound != 0 {
                prop_assert!((value as u64) < bound.unsigned_abs());
            }
        }
    }

    #[test]
    fn test_bernoulli_nan_matches_default() {
        let mut nan_source = RandomDecisionSource::seeded(11);
        let mut default_source = RandomDecisionSource::seeded(11);
        for _ in 0..1_000 {
            assert_eq!(nan_source.bernoulli(f64::NAN), default_source.bernoulli(DEFAULT_PERCENT));
        }
    }

    #[test]
    fn test_bernoulli_extremes() {
        let mut random = RandomDecisionSource::seeded(3);
        assert!((0..1_000).all(|_| random.bernoulli(100.0)));
        assert!((0..1_000).all(|_| !random.bernoulli(0.0)));
    }

    #[test]
    fn test_bounded_long_zero_bound() {
        let mut random = RandomDecisionSource::seeded(1);
        assert_eq!(random.bounded_long(0), 0);
    }

    #[test]
    fn test_sample_use_all_returns_list() {
        let mut random = RandomDecisionSource::seeded(5);
        let items = vec![1, 2, 3, 4, 5, 6];
        assert_eq!(random.sample(&items, &config(0.0, true)), items);
        assert_eq!(random.sample(&items, &config(150.0, false)), items);
    }

    #[test]
    fn test_sample_empty_list() {
        let mut random = RandomDecisionSource::seeded(5);
        let items: Vec<u8> = Vec::new();
        assert!(random.sample(&items, &config(50.0, false)).is_empty());
    }

    #[test]
    fn test_sample_non_positive_percentage() {
        let mut random = RandomDecisionSource::seeded(5);
        let items = vec!['a', 'b', 'c'];
        for _ in 0..100 {
            assert!(random.sample(&items, &config(0.0, false)).is_empty());
            assert!(random.sample(&items, &config(-20.0, false)).is_empty());
        }
    }

    #[test]
    fn test_sample_size_caps() {
        let mut random = RandomDecisionSource::seeded(9);
        let short = vec![1, 2];
        let medium = vec![1, 2, 3, 4];
        let long: Vec<u32> = (0..100).collect();
        for _ in 0..500 {
            assert!(random.sample(&short, &config(100.0, false)).len() <= 2);
            assert!(random.sample(&medium, &config(100.0, false)).len() <= 3);
            let drawn = random.sample(&long, &config(10.0, false));
            assert!(drawn.len() <= 10);
            assert!(drawn.iter().all(|item| long.contains(item)));
        }
    }

    #[test]
    fn test_uniform_enum_respects_exclusion() {
        let mut random = RandomDecisionSource::seeded(2);
        for _ in 0..200 {
            let gender = random.uniform_enum(&[Gender::Male, Gender::Female]).unwrap();
            assert!(gender == Gender::Other || gender == Gender::Unknown);
        }
    }

    #[test]
    fn test_uniform_enum_full_exclusion_is_invalid() {
        let mut random = RandomDecisionSource::seeded(2);
        let result = random.uniform_enum(UnitOfTime::variants());
        assert!(matches!(result, Err(FuzzError::InvalidArgument(_))));
    }

    #[test]
    fn test_bounded_date_skew() {
        let mut random = RandomDecisionSource::seeded(4);
        let cutoff = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        for _ in 0..200 {
            assert!(random.bounded_date(1) < cutoff);
        }
        let after = (0..1_000).filter(|_| random.bounded_date(10) >= cutoff).count();
        assert!(after > 850);
    }

    #[test]
    fn test_another_i32_differs() {
        let mut random = RandomDecisionSource::seeded(8);
        for current in [0, -1, i32::MAX] {
            assert_ne!(random.another_i32(current), current);
        }
    }
}
