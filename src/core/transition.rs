//! What plays next.

use rand::Rng;

use crate::app::PlayMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    NaturalEnd,
    TerminalError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Stop,
    /// Reload the current song from the start; history is untouched.
    Replay,
    Advance(usize),
}

/// Decides the follow-up to a finished or failed song.
///
/// `failed` lists queue indices that already failed since the last successful
/// start; an error never moves onto one of them.
pub fn decide<R: Rng + ?Sized>(
    mode: PlayMode,
    current: Option<usize>,
    len: usize,
    trigger: Trigger,
    failed: &[usize],
    rng: &mut R,
) -> Decision {
    let Some(cur) = current.filter(|&c| c < len) else {
        return Decision::Stop;
    };

    let target = match (mode, trigger) {
        (PlayMode::Single, Trigger::NaturalEnd) => return Decision::Replay,
        // A failing song in Single mode moves on like Loop.
        (PlayMode::Single | PlayMode::Loop, Trigger::TerminalError) => {
            match (1..len)
                .map(|k| (cur + k) % len)
                .find(|i| !failed.contains(i))
            {
                Some(i) => i,
                None => return Decision::Stop,
            }
        }
        (PlayMode::Single | PlayMode::Loop, Trigger::NaturalEnd) => (cur + 1) % len,
        (PlayMode::Shuffle, Trigger::TerminalError) => {
            let candidates: Vec<usize> = (0..len)
                .filter(|i| *i != cur && !failed.contains(i))
                .collect();
            if candidates.is_empty() {
                return Decision::Stop;
            }
            candidates[rng.gen_range(0..candidates.len())]
        }
        (PlayMode::Shuffle, Trigger::NaturalEnd) => rng.gen_range(0..len),
    };

    if target != cur {
        return Decision::Advance(target);
    }
    match mode {
        PlayMode::Shuffle if len == 1 => Decision::Stop,
        _ => Decision::Replay,
    }
}

/// Target index for a manual next/prev. `None` on an empty queue.
pub fn manual_target<R: Rng + ?Sized>(
    mode: PlayMode,
    current: Option<usize>,
    len: usize,
    direction: Direction,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if mode == PlayMode::Shuffle {
        return Some(rng.gen_range(0..len));
    }
    let target = match (current.filter(|&c| c < len), direction) {
        (None, Direction::Next) => 0,
        (None, Direction::Prev) => len - 1,
        (Some(c), Direction::Next) => (c + 1) % len,
        (Some(c), Direction::Prev) => (c + len - 1) % len,
    };
    Some(target)
}
