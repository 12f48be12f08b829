//! Seeded pseudorandom stream used by curriculum generation.
//!
//! The same seed string must produce the same catalog on every platform, so
//! both the seed hash and the generator work in wrapping 32-bit arithmetic.

const FNV_OFFSET: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;
const MULBERRY_INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// FNV-1a hash of a seed string, folded over its UTF-16 code units.
pub fn hash_seed(seed: &str) -> u32 {
    seed.encode_utf16().fold(FNV_OFFSET, |hash, unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Mulberry32 generator. Yields floats in `[0, 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Generator seeded from `hash_seed(seed)`.
    pub fn from_seed_str(seed: &str) -> Self {
        Self::new(hash_seed(seed))
    }

    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn next_f64(&mut self) -> f64 {
        self.state = self.state.wrapping_add(MULBERRY_INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        f64::from(t ^ (t >> 14)) / TWO_POW_32
    }
}

/// Pick `list[floor(rng() * len)]`. `None` only for an empty list.
pub fn pick<'a, T>(list: &'a [T], rng: &mut Mulberry32) -> Option<&'a T> {
    if list.is_empty() {
        return None;
    }
    let index = (rng.next_f64() * list.len() as f64).floor() as usize;
    list.get(index.min(list.len() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_seed_reference_values() {
        assert_eq!(hash_seed(""), 2_166_136_261);
        assert_eq!(hash_seed("20260202"), 1_252_913_779);
    }

    #[test]
    fn test_mulberry32_reference_stream() {
        let mut rng = Mulberry32::new(0);
        assert_eq!(rng.next_f64(), 0.266_429_208_684_712_65);
        assert_eq!(rng.next_f64(), 0.000_329_745_700_582_861_9);

        let mut rng = Mulberry32::from_seed_str("20260202");
        assert_eq!(rng.next_f64(), 0.777_778_740_040_957_9);
        assert_eq!(rng.next_f64(), 0.272_951_387_101_784_35);
        assert_eq!(rng.next_f64(), 0.120_835_997_862_741_35);
    }

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = Mulberry32::from_seed_str("year-seed");
        let mut b = Mulberry32::from_seed_str("year-seed");
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
        assert_eq!(a.state(), b.state());
    }

    #[test]
    fn test_output_range() {
        let mut rng = Mulberry32::new(u32::MAX);
        for _ in 0..10_000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_pick() {
        let empty: [u8; 0] = [];
        let mut rng = Mulberry32::new(7);
        assert!(pick(&empty, &mut rng).is_none());

        let mut rng = Mulberry32::new(0);
        // first draw is 0.266..., so floor(0.266 * 4) == 1
        assert_eq!(pick(&["a", "b", "c", "d"], &mut rng), Some(&"b"));
    }
}
