use rand::rngs::OsRng;
use rand::Rng;

/// Characters a generated password is drawn from: A-Z, a-z, 0-9 and `!@#$%^&*`.
pub const PASSWORD_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

pub const DEFAULT_PASSWORD_LENGTH: usize = 12;

/// Random password generator over [`PASSWORD_CHARSET`].
///
/// The randomness source is passed in by the caller so production code can use
/// the OS CSPRNG while tests use a seeded generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordGenerator {
    length: usize,
}

impl PasswordGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a password, sampling every character uniformly with replacement.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        (0..self.length)
            .map(|_| {
                let idx = rng.gen_range(0..PASSWORD_CHARSET.len());
                PASSWORD_CHARSET[idx] as char
            })
            .collect()
    }
}

impl Default for PasswordGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_PASSWORD_LENGTH)
    }
}

/// Generate a password of `length` characters using the operating system RNG
pub fn generate_password(length: usize) -> String {
    PasswordGenerator::new(length).generate(&mut OsRng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_charset_has_seventy_unique_characters() {
        let mut chars = PASSWORD_CHARSET.to_vec();
        chars.sort_unstable();
        chars.dedup();
        assert_eq!(chars.len(), 70);
        assert_eq!(PASSWORD_CHARSET.len(), 70);
    }

    #[test]
    fn test_default_length() {
        let password = PasswordGenerator::default().generate(&mut OsRng);
        assert_eq!(password.chars().count(), 12);
    }

    #[test]
    fn test_generate_exact_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for length in [1, 2, 12, 32, 64, 257] {
            let password = PasswordGenerator::new(length).generate(&mut rng);
            assert_eq!(password.chars().count(), length);
        }
    }

    #[test]
    fn test_zero_length_is_empty() {
        assert!(generate_password(0).is_empty());
    }

    #[test]
    fn test_only_charset_characters() {
        let mut rng = StdRng::seed_from_u64(42);
        let generator = PasswordGenerator::new(64);
        for _ in 0..500 {
            let password = generator.generate(&mut rng);
            assert!(password.bytes().all(|b| PASSWORD_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_never_contains_json_escapes() {
        let password = generate_password(4096);
        assert!(!password.contains('"'));
        assert!(!password.contains('\\'));
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let generator = PasswordGenerator::default();
        let first = generator.generate(&mut StdRng::seed_from_u64(1234));
        let second = generator.generate(&mut StdRng::seed_from_u64(1234));
        assert_eq!(first, second);
    }

    #[test]
    fn test_os_rng_passwords_differ() {
        let secret = generate_password(32);
        let secret2 = generate_password(32);
        assert_ne!(secret, secret2);
    }

    #[test]
    fn test_character_frequencies_are_uniform() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let generator = PasswordGenerator::default();
        let mut counts = [0u64; 256];
        let samples = 100_000;

        for _ in 0..samples {
            for b in generator.generate(&mut rng).bytes() {
                counts[b as usize] += 1;
            }
        }

        let total = (samples * DEFAULT_PASSWORD_LENGTH) as f64;
        let expected = total / PASSWORD_CHARSET.len() as f64;
        let chi_square: f64 = PASSWORD_CHARSET
            .iter()
            .map(|&b| {
                let diff = counts[b as usize] as f64 - expected;
                diff * diff / expected
            })
            .sum();

        // 69 degrees of freedom, critical value at p = 0.001
        assert!(chi_square < 111.6, "chi-square too large: {}", chi_square);
        let observed: u64 = PASSWORD_CHARSET.iter().map(|&b| counts[b as usize]).sum();
        assert_eq!(observed as f64, total);
    }
}
