//! Derivation of independent random streams from a single run seed.

use sha2::{Digest, Sha256};

/// Stream used for the wave-independent border wall heights.
pub const RNG_STREAM_BORDER: &str = "border";
/// Stream used for interior wall heights of a wave layout.
pub const RNG_STREAM_WALL_HEIGHTS: &str = "wall-heights";
/// Stream used for spawn kind rolls, placement and stat rolls.
pub const RNG_STREAM_SPAWNS: &str = "spawns";
/// Stream used for cosmetic effect parameters.
pub const RNG_STREAM_EFFECTS: &str = "effects";

/// Seed of the maze layout for the provided wave.
#[must_use]
pub fn derive_wave_seed(run_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    finalize_seed(hasher)
}

/// Seed of a named stream branching off `base`.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wave_seeds_are_stable_and_distinct() {
        assert_eq!(derive_wave_seed(7, 3), derive_wave_seed(7, 3));
        assert_ne!(derive_wave_seed(7, 3), derive_wave_seed(7, 4));
        assert_ne!(derive_wave_seed(7, 3), derive_wave_seed(8, 3));
    }

    #[test]
    fn labels_branch_independent_streams() {
        assert_ne!(
            derive_labeled_seed(11, RNG_STREAM_BORDER),
            derive_labeled_seed(11, RNG_STREAM_SPAWNS)
        );
    }
}
