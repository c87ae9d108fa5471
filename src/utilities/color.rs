// src/utilities/color.rs
//
// Stable per-entity colours for movement traces.
// The same entity id always yields the same colour, across runs.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a, fixed so seeds do not depend on the std hasher.
fn fnv1a(text: &str) -> u64 {
    text.bytes()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME))
}

pub fn trace_color(entity_id: &str) -> Rgb {
    let mut rng = StdRng::seed_from_u64(fnv1a(entity_id));

    // channels stay in 50..=255
    Rgb {
        r: rng.gen_range(50..=255),
        g: rng.gen_range(50..=255),
        b: rng.gen_range(50..=255),
    }
}
