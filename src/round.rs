use crate::stimulus::{Draws, Stimulus, MATCH_PROBABILITY};
use crate::store::{GameResult, ResultStore};
use chrono::Local;
use thiserror::Error;

/// Accuracy over scorable turns required to win a round.
pub const WIN_THRESHOLD: f64 = 0.80;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("invalid round configuration: n-level {n_level} must be >= 1 and total turns {total_turns} must exceed it")]
    InvalidConfiguration { n_level: usize, total_turns: usize },
}

/// Fixed parameters of one round. Validated on construction; the accuracy
/// denominator in `finish` relies on `total_turns > n_level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundConfig {
    pub n_level: usize,
    pub total_turns: usize,
}

impl RoundConfig {
    pub fn new(n_level: usize, total_turns: usize) -> Result<Self, RoundError> {
        if n_level < 1 || total_turns <= n_level {
            return Err(RoundError::InvalidConfiguration {
                n_level,
                total_turns,
            });
        }
        Ok(Self {
            n_level,
            total_turns,
        })
    }
}

/// Per-channel feedback for the most recently scored turn. A correctly
/// withheld non-match earns points but stays silent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Feedback {
    #[default]
    None,
    Correct,
    Incorrect,
}

impl Feedback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::None => "",
            Feedback::Correct => "Correct!",
            Feedback::Incorrect => "Incorrect",
        }
    }
}

/// Score one judgment channel for a single turn.
///
/// Returns (score delta, feedback, whether the judgment was correct).
/// Pure: re-running it over a recorded history and claim trace reproduces
/// the round's score exactly.
pub fn score_channel(is_match: bool, claimed: bool) -> (i32, Feedback, bool) {
    if is_match == claimed {
        let delta = if is_match { 10 } else { 5 };
        let feedback = if is_match {
            Feedback::Correct
        } else {
            Feedback::None
        };
        (delta, feedback, true)
    } else {
        (-5, Feedback::Incorrect, false)
    }
}

/// Immutable view of the observable round state, for rendering and for
/// structural-equality assertions in tests.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundSnapshot {
    pub n_level: usize,
    pub total_turns: usize,
    pub turn: usize,
    pub score: i32,
    pub correct_position: usize,
    pub correct_sound: usize,
    pub history: Vec<Stimulus>,
    pub position_claimed: bool,
    pub sound_claimed: bool,
    pub position_feedback: Feedback,
    pub sound_feedback: Feedback,
    pub running: bool,
    pub paused: bool,
    pub over: bool,
    pub outcome_title: String,
    pub outcome_text: String,
}

/// The dual n-back round engine.
///
/// State machine: idle -> running -> {paused <-> running} -> ended. Every
/// mutating call outside its precondition state is a no-op rather than an
/// error, so stray late UI events can never corrupt a round. The single
/// hard failure is an invalid `RoundConfig`, rejected before any state
/// exists.
pub struct Round {
    pub config: RoundConfig,
    pub history: Vec<Stimulus>,
    pub turn: usize,
    pub score: i32,
    pub correct_position: usize,
    pub correct_sound: usize,
    pub position_claimed: bool,
    pub sound_claimed: bool,
    pub position_feedback: Feedback,
    pub sound_feedback: Feedback,
    pub running: bool,
    pub paused: bool,
    pub over: bool,
    pub outcome_title: String,
    pub outcome_text: String,
    draws: Box<dyn Draws>,
    store: Option<ResultStore>,
}

impl Round {
    /// Build an idle round. `store` is the append-only result sink; pass
    /// `None` for headless runs where nothing should be persisted.
    pub fn new(config: RoundConfig, draws: Box<dyn Draws>, store: Option<ResultStore>) -> Self {
        Self {
            config,
            history: Vec::with_capacity(config.total_turns),
            turn: 0,
            score: 0,
            correct_position: 0,
            correct_sound: 0,
            position_claimed: false,
            sound_claimed: false,
            position_feedback: Feedback::None,
            sound_feedback: Feedback::None,
            running: false,
            paused: false,
            over: false,
            outcome_title: String::new(),
            outcome_text: String::new(),
            draws,
            store,
        }
    }

    /// Begin the round. No-op if one is already in flight (reentrancy
    /// guard, not an error).
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.history.clear();
        self.turn = 0;
        self.score = 0;
        self.correct_position = 0;
        self.correct_sound = 0;
        self.position_claimed = false;
        self.sound_claimed = false;
        self.position_feedback = Feedback::None;
        self.sound_feedback = Feedback::None;
        self.over = false;
        self.outcome_title.clear();
        self.outcome_text.clear();
        self.paused = false;
        self.running = true;
    }

    /// One pacing step: score the turn that just elapsed, generate the next
    /// stimulus (re-rolling each channel to match its n-back with fixed
    /// probability), and finish the round when the last turn is reached.
    pub fn advance_turn(&mut self) {
        if !self.running || self.paused || self.over {
            return;
        }

        self.evaluate_turn();

        let n = self.config.n_level;
        let mut position = self.draws.position();
        let mut sound = self.draws.sound();

        // Past the first n turns, intentional matches become possible.
        if self.turn >= n {
            let n_back = self.history[self.turn - n];
            if self.draws.chance(MATCH_PROBABILITY) {
                position = n_back.position;
            }
            if self.draws.chance(MATCH_PROBABILITY) {
                sound = n_back.sound;
            }
        }

        self.history.push(Stimulus { position, sound });
        self.turn += 1;
        self.position_claimed = false;
        self.sound_claimed = false;

        if self.turn >= self.config.total_turns {
            self.finish();
        }
    }

    /// Claim that the current position matches the one n turns back. At
    /// most once per turn; no-op when not running or paused.
    pub fn claim_position(&mut self) {
        if !self.running || self.paused || self.position_claimed {
            return;
        }
        self.position_claimed = true;
    }

    /// Claim that the current sound matches the one n turns back.
    pub fn claim_sound(&mut self) {
        if !self.running || self.paused || self.sound_claimed {
            return;
        }
        self.sound_claimed = true;
    }

    pub fn pause(&mut self) {
        if !self.running || self.paused {
            return;
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if !self.running || !self.paused {
            return;
        }
        self.paused = false;
    }

    /// Terminate the round before its natural end. Records a loss when at
    /// least one turn elapsed, or when the caller asserts the forfeit
    /// explicitly; a round abandoned before any stimulus leaves no trace.
    pub fn stop(&mut self, forfeited: bool) {
        if !self.running || self.over {
            return;
        }
        if self.turn > 0 || forfeited {
            self.save_result(false);
        }
        self.running = false;
        self.paused = false;
        self.over = true;
    }

    /// Accuracy over the scorable turns: correct judgments on both channels
    /// out of `2 * (total_turns - n_level)`.
    pub fn accuracy(&self) -> f64 {
        let scorable = self.config.total_turns.saturating_sub(self.config.n_level);
        let possible = (scorable * 2) as f64;
        if possible > 0.0 {
            (self.correct_position + self.correct_sound) as f64 / possible
        } else {
            0.0
        }
    }

    pub fn current_stimulus(&self) -> Option<&Stimulus> {
        self.history.last()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        RoundSnapshot {
            n_level: self.config.n_level,
            total_turns: self.config.total_turns,
            turn: self.turn,
            score: self.score,
            correct_position: self.correct_position,
            correct_sound: self.correct_sound,
            history: self.history.clone(),
            position_claimed: self.position_claimed,
            sound_claimed: self.sound_claimed,
            position_feedback: self.position_feedback,
            sound_feedback: self.sound_feedback,
            running: self.running,
            paused: self.paused,
            over: self.over,
            outcome_title: self.outcome_title.clone(),
            outcome_text: self.outcome_text.clone(),
        }
    }

    /// Score the turn that just elapsed against its n-back ground truth.
    /// Turns before n+1 have no ground truth and produce no feedback.
    fn evaluate_turn(&mut self) {
        let n = self.config.n_level;
        if self.turn < n + 1 {
            self.position_feedback = Feedback::None;
            self.sound_feedback = Feedback::None;
            return;
        }

        let last = self.history[self.turn - 1];
        let n_back = self.history[self.turn - 1 - n];

        let (pos_delta, pos_feedback, pos_correct) =
            score_channel(last.position == n_back.position, self.position_claimed);
        let (snd_delta, snd_feedback, snd_correct) =
            score_channel(last.sound == n_back.sound, self.sound_claimed);

        self.score += pos_delta + snd_delta;
        if pos_correct {
            self.correct_position += 1;
        }
        if snd_correct {
            self.correct_sound += 1;
        }
        self.position_feedback = pos_feedback;
        self.sound_feedback = snd_feedback;
    }

    /// Final scoring pass for the last turn, outcome computation, result
    /// hand-off. The last turn is scored here because no further stimulus
    /// follows to trigger its evaluation.
    fn finish(&mut self) {
        self.evaluate_turn();

        let accuracy = self.accuracy();
        let won = accuracy >= WIN_THRESHOLD;

        self.save_result(won);

        self.running = false;
        self.paused = false;
        self.over = true;
        self.outcome_title = if won { "You Win!" } else { "You Lose" }.to_string();
        self.outcome_text = if won {
            format!("Accuracy: {:.0}%", accuracy * 100.0)
        } else {
            format!("Accuracy: {:.0}%\nTry this level again.", accuracy * 100.0)
        };
    }

    /// Fire-and-forget persistence: a failed write never blocks or corrupts
    /// the round.
    fn save_result(&self, won: bool) {
        if let Some(store) = &self.store {
            let result = GameResult {
                timestamp: Local::now(),
                n_level: self.config.n_level,
                score: self.score,
                total_turns: self.config.total_turns,
                won,
            };
            let _ = store.insert(&result);
        }
    }
}
