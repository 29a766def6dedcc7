//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call a platform RNG.
//! All randomness flows through SimRng streams derived from the single
//! master seed the engine was built with. Each consumer gets its own
//! stream index, so adding a consumer never shifts existing streams.

use rand::RngCore;
use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// A named, deterministic RNG stream.
pub struct SimRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Derive a stream from the master seed and a stable stream index.
    /// The index must never change once assigned.
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        let bits = self.inner.next_u64();
        let roll = (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64);
        roll < p
    }
}

/// Stable stream assignments. NEVER reorder or remove entries — only
/// append. Reordering changes every consumer's stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum RngStream {
    Combat = 0,
    Strategic = 1,
    // Add new consumers here — append only.
}

impl RngStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Combat => "combat",
            Self::Strategic => "strategic",
        }
    }
}

/// All RNG streams for one engine instance.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    pub fn stream(&self, stream: RngStream) -> SimRng {
        SimRng::new(self.master_seed, stream as u64).with_name(stream.name())
    }
}
