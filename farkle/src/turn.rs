//! The roll / keep / bank-or-continue loop for a single player's turn.

use crate::{
    agent::{Agent, Event, InputError, Rejection},
    dice::{DiceSet, Split},
    rng::RandomSource,
    MAX_DICE,
};
use std::fmt;

/// Where a turn currently stands.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnState {
    /// About to roll `ndice` dice, with `turn_score` points already set aside.
    Rolling { ndice: u8, turn_score: u32 },
    /// Waiting for the player to keep some of the `rolled` dice.
    AwaitingSelection { rolled: DiceSet, turn_score: u32 },
    /// The last roll had no scoring dice; the turn is worth nothing.
    Busted,
    /// The player banked the given score.
    TurnComplete(u32),
}

impl TurnState {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Busted | Self::TurnComplete(_))
    }
}

/// How a finished turn ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    Busted,
    Banked(u32),
}

impl TurnOutcome {
    /// The points this turn adds to the player's total.
    #[inline]
    pub fn score(self) -> u32 {
        match self {
            Self::Busted => 0,
            Self::Banked(score) => score,
        }
    }
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busted => f.write_str("busted"),
            Self::Banked(score) => write!(f, "banked {}", score),
        }
    }
}

/// A single player's turn, as a state machine.
///
/// ```text
/// Rolling(6) --bust--> Busted
///     |
///     v
/// AwaitingSelection --reject--> AwaitingSelection (unchanged)
///     |
///     +--roll again--> Rolling(remaining, or 6 after hot dice)
///     |
///     +--bank--> TurnComplete(turn_score)
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    state: TurnState,
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

impl Turn {
    pub fn new() -> Self {
        Self {
            state: TurnState::Rolling {
                ndice: MAX_DICE,
                turn_score: 0,
            },
        }
    }

    #[inline]
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The outcome of the turn, once it's over.
    pub fn outcome(&self) -> Option<TurnOutcome> {
        match self.state {
            TurnState::Busted => Some(TurnOutcome::Busted),
            TurnState::TurnComplete(score) => Some(TurnOutcome::Banked(score)),
            _ => None,
        }
    }

    /// Make one transition and return the new state. Rejected selections leave
    /// the state as it was. Terminal states don't move.
    pub fn step<R, A>(&mut self, rng: &mut R, agent: &mut A) -> Result<TurnState, InputError>
    where
        R: RandomSource + ?Sized,
        A: Agent + ?Sized,
    {
        self.state = match self.state {
            TurnState::Rolling { ndice, turn_score } => {
                let rolled = DiceSet::roll(ndice, rng);
                log::trace!("rolled {} dice: {}", ndice, rolled);
                agent.observe(&Event::Rolled(rolled))?;

                if rolled.is_bust() {
                    log::debug!("farkle, forfeiting turn score {}", turn_score);
                    agent.observe(&Event::Farkle)?;
                    TurnState::Busted
                } else {
                    TurnState::AwaitingSelection { rolled, turn_score }
                }
            }
            TurnState::AwaitingSelection { rolled, turn_score } => {
                self.select(rolled, turn_score, agent)?
            }
            state @ (TurnState::Busted | TurnState::TurnComplete(_)) => state,
        };

        Ok(self.state)
    }

    fn select<A>(&self, rolled: DiceSet, turn_score: u32, agent: &mut A) -> Result<TurnState, InputError>
    where
        A: Agent + ?Sized,
    {
        let choice = agent.choose_keep(rolled, turn_score)?;

        let rejection = match rolled.select(&choice) {
            Err(err) => Rejection::NoMatch(err),
            Ok(Split { kept, .. }) if kept.score() == 0 => Rejection::NonScoring(kept),
            Ok(Split { kept, remaining }) => {
                let score = kept.score();
                let turn_score = turn_score.saturating_add(score);
                agent.observe(&Event::Kept {
                    kept,
                    score,
                    turn_score,
                })?;

                return if agent.roll_again(remaining, turn_score)? {
                    // hot dice: set aside every die, so roll all six again
                    let ndice = if remaining.is_empty() {
                        MAX_DICE
                    } else {
                        remaining.len()
                    };
                    Ok(TurnState::Rolling { ndice, turn_score })
                } else {
                    Ok(TurnState::TurnComplete(turn_score))
                };
            }
        };

        log::debug!("rejected selection {:?} from {}: {}", choice, rolled, rejection);
        agent.rejected(&rejection)?;
        Ok(self.state)
    }

    /// Step until the turn is over.
    pub fn run<R, A>(&mut self, rng: &mut R, agent: &mut A) -> Result<TurnOutcome, InputError>
    where
        R: RandomSource + ?Sized,
        A: Agent + ?Sized,
    {
        loop {
            if let Some(outcome) = self.outcome() {
                log::info!("turn over: {}", outcome);
                return Ok(outcome);
            }
            self.step(rng, agent)?;
        }
    }
}
