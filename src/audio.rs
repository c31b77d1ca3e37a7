use crate::stimulus::Stimulus;
use std::io::Write;

/// Boundary for the audible cue played when a new stimulus appears. The
/// round engine never waits on playback; implementations must not block
/// the turn loop.
pub trait SoundPlayer {
    fn play(&mut self, stimulus: &Stimulus);
}

/// Rings the terminal bell. The sound identity itself is rendered as a
/// letter on the board, so the bell only marks the moment a cue fires.
/// Write failures are ignored; a mute terminal must not affect the round.
pub struct BellPlayer;

impl SoundPlayer for BellPlayer {
    fn play(&mut self, _stimulus: &Stimulus) {
        let mut out = std::io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Silent player for tests and headless runs.
pub struct NullPlayer;

impl SoundPlayer for NullPlayer {
    fn play(&mut self, _stimulus: &Stimulus) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_player_accepts_any_stimulus() {
        let mut player = NullPlayer;
        for sound in 0..8 {
            player.play(&Stimulus { position: 0, sound });
        }
    }
}
