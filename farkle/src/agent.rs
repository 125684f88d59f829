use crate::{
    dice::{DiceError, DiceSet},
    rng::RandomSource,
    turn::{Turn, TurnOutcome},
    MAX_DICE,
};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::{cmp, fmt, io};
use thiserror::Error;

/// The decision-making side of a turn could not produce an answer.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read or write the console: {0}")]
    Io(#[from] io::Error),
    #[error("input closed while waiting for an answer")]
    Closed,
}

/// Why a selection was turned down. The rolled dice are left as they were
/// and the agent is asked again.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// The selection names dice that weren't rolled.
    NoMatch(DiceError),
    /// The selection is valid but doesn't score anything.
    NonScoring(DiceSet),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoMatch(err) => write!(f, "no match: {}", err),
            Self::NonScoring(kept) => write!(f, "kept dice {} don't score", kept),
        }
    }
}

/// Things that happen over the course of a game, reported to every agent as
/// they happen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A new turn starts for `player` (1-based); `scores` are everyone's
    /// totals going into the turn.
    TurnStart { player: usize, scores: Vec<u32> },
    Rolled(DiceSet),
    /// The last roll had no scoring dice.
    Farkle,
    Kept {
        kept: DiceSet,
        score: u32,
        turn_score: u32,
    },
    TurnEnd { player: usize, outcome: TurnOutcome },
    GameOver { winner: usize, scores: Vec<u32> },
}

///////////
// Agent //
///////////

/// The player's side of a turn: picks dice to keep and decides when to bank.
pub trait Agent {
    /// Choose which of the `rolled` dice to set aside, as a sequence of face
    /// values. The choice is checked by the turn and may be rejected.
    fn choose_keep(&mut self, rolled: DiceSet, turn_score: u32) -> Result<Vec<u8>, InputError>;

    /// Decide whether to roll the `remaining` dice (or all six, if
    /// `remaining` is empty) instead of banking `turn_score`.
    fn roll_again(&mut self, remaining: DiceSet, turn_score: u32) -> Result<bool, InputError>;

    fn rejected(&mut self, _rejection: &Rejection) -> Result<(), InputError> {
        Ok(())
    }

    fn observe(&mut self, _event: &Event) -> Result<(), InputError> {
        Ok(())
    }
}

impl<A: Agent + ?Sized> Agent for &mut A {
    fn choose_keep(&mut self, rolled: DiceSet, turn_score: u32) -> Result<Vec<u8>, InputError> {
        (**self).choose_keep(rolled, turn_score)
    }

    fn roll_again(&mut self, remaining: DiceSet, turn_score: u32) -> Result<bool, InputError> {
        (**self).roll_again(remaining, turn_score)
    }

    fn rejected(&mut self, rejection: &Rejection) -> Result<(), InputError> {
        (**self).rejected(rejection)
    }

    fn observe(&mut self, event: &Event) -> Result<(), InputError> {
        (**self).observe(event)
    }
}

/// Keeps every scoring die and banks as soon as the turn is worth `bank_at`,
/// or when fewer than `min_dice` dice are left to roll. Hot dice are always
/// rolled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BankAtAgent {
    pub bank_at: u32,
    pub min_dice: u8,
}

impl Default for BankAtAgent {
    fn default() -> Self {
        Self {
            bank_at: 300,
            min_dice: 3,
        }
    }
}

impl Agent for BankAtAgent {
    fn choose_keep(&mut self, rolled: DiceSet, _turn_score: u32) -> Result<Vec<u8>, InputError> {
        Ok(rolled.scoring_dice().to_faces())
    }

    fn roll_again(&mut self, remaining: DiceSet, turn_score: u32) -> Result<bool, InputError> {
        if remaining.is_empty() {
            return Ok(true);
        }
        Ok(turn_score < self.bank_at && remaining.len() >= self.min_dice)
    }
}

////////////////
// Simulation //
////////////////

/// Summary of many independent turns played by one agent.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SimulationReport {
    pub trials: usize,
    pub busts: usize,
    pub bust_rate: f64,
    pub mean_score: f64,
    pub std_dev: f64,
    pub max_score: u32,
    /// Fraction of all rolls that started with six dice, including hot dice.
    pub full_rolls: f64,
    /// Turns that hit [`MAX_ROLLS_PER_TURN`] and were banked on the agent's
    /// behalf.
    pub capped: usize,
}

/// A simulated turn is banked after this many rolls, whatever the agent
/// wants. A degenerate source (e.g. an unseeded [`Lfsr`](crate::rng::Lfsr)
/// rolling nothing but 1's) would otherwise give hot dice forever.
pub const MAX_ROLLS_PER_TURN: usize = 1000;

/// Counts the rolls made during a turn, on behalf of the agent actually
/// playing.
struct RollCounter<A> {
    agent: A,
    rolls: usize,
    full_rolls: usize,
    turn_rolls: usize,
    capped: usize,
}

impl<A: Agent> Agent for RollCounter<A> {
    fn choose_keep(&mut self, rolled: DiceSet, turn_score: u32) -> Result<Vec<u8>, InputError> {
        self.agent.choose_keep(rolled, turn_score)
    }

    fn roll_again(&mut self, remaining: DiceSet, turn_score: u32) -> Result<bool, InputError> {
        if self.turn_rolls >= MAX_ROLLS_PER_TURN {
            log::warn!(
                "banking {} after {} rolls in one turn; is the dice source stuck?",
                turn_score,
                self.turn_rolls
            );
            self.capped += 1;
            return Ok(false);
        }
        self.agent.roll_again(remaining, turn_score)
    }

    fn rejected(&mut self, rejection: &Rejection) -> Result<(), InputError> {
        self.agent.rejected(rejection)
    }

    fn observe(&mut self, event: &Event) -> Result<(), InputError> {
        if let Event::Rolled(dice) = event {
            self.rolls += 1;
            self.turn_rolls += 1;
            if dice.len() == MAX_DICE {
                self.full_rolls += 1;
            }
        }
        self.agent.observe(event)
    }
}

/// Play `trials` independent turns with `agent`, drawing dice from `rng`.
pub fn simulate<A, R>(agent: A, rng: &mut R, trials: usize) -> Result<SimulationReport, InputError>
where
    A: Agent,
    R: RandomSource + ?Sized,
{
    let mut counter = RollCounter {
        agent,
        rolls: 0,
        full_rolls: 0,
        turn_rolls: 0,
        capped: 0,
    };

    let mut scores = Vec::with_capacity(trials);
    let mut busts = 0;
    let mut max_score = 0;

    for _ in 0..trials {
        counter.turn_rolls = 0;
        let outcome = Turn::new().run(&mut *rng, &mut counter)?;
        if outcome == TurnOutcome::Busted {
            busts += 1;
        }
        max_score = cmp::max(max_score, outcome.score());
        scores.push(f64::from(outcome.score()));
    }

    let report = SimulationReport {
        trials,
        busts,
        bust_rate: ratio(busts, trials),
        mean_score: scores.iter().mean(),
        std_dev: scores.iter().std_dev(),
        max_score,
        full_rolls: ratio(counter.full_rolls, counter.rolls),
        capped: counter.capped,
    };
    log::info!("simulated {} turns: {:?}", trials, report);

    Ok(report)
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        (num as f64) / (denom as f64)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rng::{FixedRolls, Lfsr};
    use approx::assert_relative_eq;
    use claim::{assert_ge, assert_lt, assert_ok, assert_ok_eq};
    use std::str::FromStr;

    fn dice(s: &str) -> DiceSet {
        DiceSet::from_str(s).unwrap()
    }

    #[test]
    fn test_bank_at_agent() {
        let mut agent = BankAtAgent {
            bank_at: 500,
            min_dice: 3,
        };

        assert_ok_eq!(agent.choose_keep(dice("115346"), 0), vec![1, 1, 5]);
        assert_ok_eq!(agent.choose_keep(dice("123456"), 0), vec![1, 2, 3, 4, 5, 6]);
        assert_ok_eq!(agent.choose_keep(dice("222226"), 0), vec![2, 2, 2]);

        // keep rolling while under the threshold with enough dice
        assert_ok_eq!(agent.roll_again(dice("346"), 250), true);
        assert_ok_eq!(agent.roll_again(dice("346"), 500), false);
        assert_ok_eq!(agent.roll_again(dice("34"), 250), false);

        // hot dice are always worth rolling
        assert_ok_eq!(agent.roll_again(DiceSet::new(), 5000), true);
    }

    #[test]
    fn test_simulate_scripted() {
        let agent = BankAtAgent {
            bank_at: 1,
            min_dice: 1,
        };
        // turn 1: keeps "1", banks 100
        // turn 2: farkle
        let mut rng = FixedRolls::new(&[1, 2, 3, 4, 6, 6, 2, 2, 3, 4, 6, 6]);
        let report = assert_ok!(simulate(agent, &mut rng, 2));
        assert!(rng.is_exhausted());

        assert_eq!(2, report.trials);
        assert_eq!(1, report.busts);
        assert_relative_eq!(0.5, report.bust_rate);
        assert_relative_eq!(50.0, report.mean_score);
        assert_eq!(100, report.max_score);
        assert_relative_eq!(1.0, report.full_rolls);
    }

    #[test]
    fn test_simulate_bust_rate() {
        // banks right away unless every die scored, so nearly every turn is a
        // single roll of six dice
        let agent = BankAtAgent {
            bank_at: 0,
            min_dice: 7,
        };
        let mut rng = Lfsr::new(0xd15c0);
        let report = assert_ok!(simulate(agent, &mut rng, 20_000));

        assert_eq!(20_000, report.trials);
        // Pr[bust | 6 dice] = 1440 / 46656 ~ 0.0309
        assert_lt!((report.bust_rate - 1440.0 / 46656.0).abs(), 0.01);
        assert_ge!(report.mean_score, 100.0);
    }

    #[test]
    fn test_simulate_stuck_source_banks() {
        // a zero state never moves, so every roll is 111111: hot dice forever
        let mut rng = Lfsr::new(0);
        let report = assert_ok!(simulate(BankAtAgent::default(), &mut rng, 2));

        assert_eq!(0, report.busts);
        assert_eq!(2, report.capped);
        let banked = 2000 * MAX_ROLLS_PER_TURN as u32;
        assert_eq!(banked, report.max_score);
        assert_relative_eq!(banked as f64, report.mean_score);
        assert_relative_eq!(1.0, report.full_rolls);
    }

    #[test]
    fn test_report_json() {
        let report = SimulationReport {
            trials: 4,
            busts: 1,
            bust_rate: 0.25,
            mean_score: 150.0,
            std_dev: 10.0,
            max_score: 300,
            full_rolls: 1.0,
            capped: 0,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["trials"], 4);
        assert_eq!(json["bust_rate"], 0.25);
        assert_eq!(json["max_score"], 300);
    }
}
