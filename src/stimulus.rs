use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Number of cells on the 3x3 board.
pub const GRID_CELLS: u8 = 9;

/// Fixed palette of sound cues, indexed by `Stimulus::sound`.
pub const SOUND_PALETTE: [char; 8] = ['a', 'b', 'c', 'd', 'e', 'f', 'g', 'h'];

/// Per-channel probability that a stimulus is forced to match its n-back.
pub const MATCH_PROBABILITY: f64 = 0.30;

/// One turn's stimulus pair. Appended to round history once per turn,
/// never mutated afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stimulus {
    pub position: u8,
    pub sound: u8,
}

impl Stimulus {
    pub fn sound_letter(&self) -> char {
        SOUND_PALETTE[self.sound as usize % SOUND_PALETTE.len()]
    }
}

/// Randomness the round engine draws from. Injectable so tests can pin
/// exact stimulus sequences and match rolls.
pub trait Draws {
    /// Uniform cell index in `0..GRID_CELLS`.
    fn position(&mut self) -> u8;
    /// Uniform palette index in `0..SOUND_PALETTE.len()`.
    fn sound(&mut self) -> u8;
    /// Bernoulli trial returning true with probability `p`.
    fn chance(&mut self, p: f64) -> bool;
}

/// Production draws backed by a seedable RNG. A fixed seed reproduces the
/// whole stimulus sequence of a round.
pub struct SeededDraws {
    inner: StdRng,
}

impl SeededDraws {
    pub fn new(seed: Option<u64>) -> Self {
        let inner = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { inner }
    }
}

impl Draws for SeededDraws {
    fn position(&mut self) -> u8 {
        self.inner.gen_range(0..GRID_CELLS)
    }

    fn sound(&mut self) -> u8 {
        self.inner.gen_range(0..SOUND_PALETTE.len() as u8)
    }

    fn chance(&mut self, p: f64) -> bool {
        self.inner.gen_bool(p)
    }
}

/// Scripted draws for tests. Positions and sounds cycle through their
/// sequences; match rolls are consumed front-to-back and answer false once
/// exhausted.
pub struct ScriptedDraws {
    positions: Vec<u8>,
    sounds: Vec<u8>,
    matches: VecDeque<bool>,
    pos_idx: usize,
    snd_idx: usize,
}

impl ScriptedDraws {
    pub fn new(positions: Vec<u8>, sounds: Vec<u8>, matches: Vec<bool>) -> Self {
        assert!(!positions.is_empty() && !sounds.is_empty());
        Self {
            positions,
            sounds,
            matches: matches.into(),
            pos_idx: 0,
            snd_idx: 0,
        }
    }

    /// Draws that are guaranteed to never produce an n-back match for the
    /// given level: both channels cycle through `n_level + 1` distinct
    /// values, so a stimulus can never equal the one `n_level` turns back.
    pub fn without_matches(n_level: usize) -> Self {
        let cycle: Vec<u8> = (0..=n_level as u8).collect();
        Self::new(cycle.clone(), cycle, vec![])
    }
}

impl Draws for ScriptedDraws {
    fn position(&mut self) -> u8 {
        let v = self.positions[self.pos_idx % self.positions.len()];
        self.pos_idx += 1;
        v
    }

    fn sound(&mut self) -> u8 {
        let v = self.sounds[self.snd_idx % self.sounds.len()];
        self.snd_idx += 1;
        v
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.matches.pop_front().unwrap_or(false)
    }
}
