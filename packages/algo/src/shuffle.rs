//! Randomisation helpers
//!
//! All ordering randomness goes through `rand`'s Fisher–Yates implementation
//! (`SliceRandom::shuffle` / `choose_multiple`), never through a random
//! comparator sort.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::types::{VocabularyEntry, WordId};

/// Build the engine RNG. Without a seed, the current time is used.
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    let seed = seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    });
    ChaCha8Rng::seed_from_u64(seed)
}

/// Unbiased in-place shuffle
pub fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    items.shuffle(rng);
}

/// Moves the entry with `anchor` to the front, keeping the relative order of
/// everything else. Returns `false` if the id is absent.
pub fn move_to_front(words: &mut [VocabularyEntry], anchor: WordId) -> bool {
    match words.iter().position(|w| w.id == anchor) {
        Some(pos) => {
            words[..=pos].rotate_right(1);
            true
        }
        None => false,
    }
}

/// Shuffles `words` and then pins `anchor` (if present) to position 0.
pub fn shuffle_with_anchor<R: Rng + ?Sized>(
    words: &mut [VocabularyEntry],
    anchor: Option<WordId>,
    rng: &mut R,
) {
    shuffle(words, rng);
    if let Some(anchor) = anchor {
        move_to_front(words, anchor);
    }
}

/// Samples up to `amount` items without replacement, in random order.
pub fn sample<'a, T, R: Rng + ?Sized>(items: &'a [T], amount: usize, rng: &mut R) -> Vec<&'a T> {
    items.choose_multiple(rng, amount).collect()
}
