use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nback::round::{Round, RoundConfig};
use nback::runtime::{FixedTicker, InputEvent, Runner, TestEventSource};
use nback::stimulus::ScriptedDraws;
use nback::store::ResultStore;
use tempfile::tempdir;

fn key(c: char) -> InputEvent {
    InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

/// Drive a round through the runner the way the binary does: ticks advance
/// the turn, key events claim matches. Every event goes through the same
/// channel, so input and pacing are serialized exactly as in production.
#[test]
fn scripted_round_through_the_event_loop() {
    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    // Turn 3 is forced to repeat turn 1 on both channels.
    let mut round = Round::new(
        RoundConfig::new(2, 4).unwrap(),
        Box::new(ScriptedDraws::new(
            vec![0, 1, 2],
            vec![0, 1, 2],
            vec![true, true],
        )),
        None,
    );
    round.start();

    // Three turns elapse, the player calls the match, the final turn ends
    // the round.
    for ev in [
        InputEvent::Tick,
        InputEvent::Tick,
        InputEvent::Tick,
        key('f'),
        key('j'),
        InputEvent::Tick,
    ] {
        tx.send(ev).unwrap();
    }

    while !round.over {
        match runner.step() {
            InputEvent::Tick => round.advance_turn(),
            InputEvent::Key(k) => match k.code {
                KeyCode::Char('f') => round.claim_position(),
                KeyCode::Char('j') => round.claim_sound(),
                _ => {}
            },
            InputEvent::Resize => {}
        }
    }
    drop(tx);

    // Claimed match on turn 3 (+20), correct withholds on turn 4 (+10).
    assert_eq!(round.turn, 4);
    assert_eq!(round.score, 30);
    assert_eq!(round.correct_position, 2);
    assert_eq!(round.correct_sound, 2);
    assert_eq!(round.accuracy(), 1.0);
    assert_eq!(round.outcome_title, "You Win!");
}

#[test]
fn event_loop_round_persists_its_result() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("results.db");

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut round = Round::new(
        RoundConfig::new(1, 3).unwrap(),
        Box::new(ScriptedDraws::without_matches(1)),
        Some(ResultStore::open(&db_path).unwrap()),
    );
    round.start();

    for _ in 0..3 {
        tx.send(InputEvent::Tick).unwrap();
    }
    while !round.over {
        if let InputEvent::Tick = runner.step() {
            round.advance_turn();
        }
    }
    drop(tx);

    // No matches, nothing claimed: every scorable turn is a correct
    // withhold on both channels.
    assert_eq!(round.score, 20);

    let stored = ResultStore::open(&db_path).unwrap().all_results().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].n_level, 1);
    assert_eq!(stored[0].total_turns, 3);
    assert_eq!(stored[0].score, 20);
    assert!(stored[0].won);
}
