//! A line-oriented console front-end. Every player shares the same input and
//! output streams.

use crate::{
    agent::{Agent, Event, InputError, Rejection},
    dice::{parse_faces, DiceSet},
    game::{ConfigError, GameConfig},
    rng::parse_seed,
};
use itertools::Itertools;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Failure while setting up a game from the console.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// `1: 0  2: 350  `
fn scoreboard(scores: &[u32]) -> String {
    scores
        .iter()
        .enumerate()
        .map(|(idx, score)| format!("{}: {}  ", idx + 1, score))
        .join("")
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn print(&mut self, msg: &str) -> Result<(), InputError> {
        self.output.write_all(msg.as_bytes())?;
        Ok(())
    }

    /// Print `msg` and wait for the next non-blank line of input.
    fn prompt(&mut self, msg: &str) -> Result<String, InputError> {
        self.print(msg)?;
        self.output.flush()?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(InputError::Closed);
            }
            let answer = line.trim();
            if !answer.is_empty() {
                return Ok(answer.to_owned());
            }
        }
    }

    pub fn welcome(&mut self) -> Result<(), InputError> {
        self.print("Welcome to Farkle!\n")
    }

    /// Ask for the number of players. An unusable answer gets exactly one more
    /// chance.
    pub fn prompt_players(&mut self) -> Result<GameConfig, SetupError> {
        let answer = self.prompt("How many players? ")?;
        if let Ok(config) = parse_players(&answer) {
            return Ok(config);
        }

        log::debug!("bad player count: '{}'", answer);
        let answer = self.prompt("This game only supports 1 to 4 players. How many? ")?;
        Ok(parse_players(&answer)?)
    }

    /// Ask for a seed until we get one that parses.
    pub fn prompt_seed(&mut self) -> Result<u32, InputError> {
        loop {
            let answer = self.prompt("Enter a seed integer (decimal or hexadecimal): ")?;
            match parse_seed(&answer) {
                Ok(seed) => return Ok(seed),
                Err(err) => log::debug!("{}", err),
            }
        }
    }
}

/// Anything that isn't a number is as good as zero players.
fn parse_players(answer: &str) -> Result<GameConfig, ConfigError> {
    GameConfig::new(answer.parse().unwrap_or(0))
}

impl<R: BufRead, W: Write> Agent for Console<R, W> {
    fn choose_keep(&mut self, _rolled: DiceSet, _turn_score: u32) -> Result<Vec<u8>, InputError> {
        loop {
            let answer = self.prompt("Which to keep? ")?;
            match parse_faces(&answer) {
                Ok(faces) => return Ok(faces),
                Err(err) => {
                    log::debug!("unreadable selection '{}': {}", answer, err);
                    self.print("No match, try again.\n")?;
                }
            }
        }
    }

    fn roll_again(&mut self, remaining: DiceSet, _turn_score: u32) -> Result<bool, InputError> {
        let answer = if remaining.is_empty() {
            self.prompt("HOT DICE!  Roll 6 dice (y/n)? ")?
        } else {
            self.prompt(&format!(
                "{} dice left -- roll again (y/n)? ",
                remaining.len()
            ))?
        };
        Ok(answer.starts_with('y'))
    }

    fn rejected(&mut self, rejection: &Rejection) -> Result<(), InputError> {
        match rejection {
            Rejection::NoMatch(_) => self.print("No match, try again.\n"),
            Rejection::NonScoring(_) => self.print("Must keep scoring dice. Try again.\n"),
        }
    }

    fn observe(&mut self, event: &Event) -> Result<(), InputError> {
        let msg = match event {
            Event::TurnStart { player, scores } => format!(
                "\nSCORES -- {}\nPlayer {}'s turn\n",
                scoreboard(scores),
                player
            ),
            Event::Rolled(rolled) => format!("Rolling {} dice...{}\n", rolled.len(), rolled),
            Event::Farkle => "FARKLE -- your turn is over.\n".to_owned(),
            Event::Kept {
                kept,
                score,
                turn_score,
            } => format!(
                "Keeping {}, score = {}\nScore so far = {}\n",
                kept, score, turn_score
            ),
            Event::TurnEnd { outcome, .. } => format!("Turn score = {}\n", outcome.score()),
            Event::GameOver { winner, scores } => format!(
                "\nSCORES -- {}\nPlayer {} wins!\n",
                scoreboard(scores),
                winner
            ),
        };
        self.print(&msg)?;
        self.output.flush()?;
        Ok(())
    }
}
