use crate::{
    agent::{Agent, Event, InputError},
    rng::RandomSource,
    turn::{Turn, TurnOutcome},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_PLAYERS: usize = 1;
pub const MAX_PLAYERS: usize = 4;

/// The first player to reach this total wins.
pub const DEFAULT_TARGET_SCORE: u32 = 10_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("This game only supports 1 to 4 players (got {0})")]
    Players(usize),
    #[error("the target score must be positive")]
    Target,
}

/// Game settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub players: usize,
    #[serde(default = "default_target_score")]
    pub target_score: u32,
}

fn default_target_score() -> u32 {
    DEFAULT_TARGET_SCORE
}

impl GameConfig {
    pub fn new(players: usize) -> Result<Self, ConfigError> {
        Self {
            players,
            target_score: DEFAULT_TARGET_SCORE,
        }
        .validate()
    }

    pub fn with_target_score(self, target_score: u32) -> Result<Self, ConfigError> {
        Self {
            target_score,
            ..self
        }
        .validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players) {
            return Err(ConfigError::Players(self.players));
        }
        if self.target_score == 0 {
            return Err(ConfigError::Target);
        }
        Ok(self)
    }

    /// One player means exactly one turn, with no running total.
    #[inline]
    pub fn is_solo(&self) -> bool {
        self.players == 1
    }
}

/// How a game ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    SoloTurn(TurnOutcome),
    /// `player` (1-based) reached the target score first.
    Winner { player: usize, scores: Vec<u32> },
}

/// Players taking turns at one shared set of dice, each adding their turn
/// scores to a running total.
pub struct Game {
    config: GameConfig,
    scores: Vec<u32>,
    /// 0-based index of the player whose turn is next.
    current: usize,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            scores: vec![0; config.players],
            current: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn scores(&self) -> &[u32] {
        &self.scores
    }

    /// The (1-based) player whose turn is next.
    pub fn current_player(&self) -> usize {
        self.current + 1
    }

    /// Play the current player's turn, add it to their total, and pass the
    /// dice to the next player.
    pub fn play_turn<R, A>(&mut self, rng: &mut R, agent: &mut A) -> Result<TurnOutcome, InputError>
    where
        R: RandomSource + ?Sized,
        A: Agent + ?Sized,
    {
        let player = self.current_player();
        agent.observe(&Event::TurnStart {
            player,
            scores: self.scores.clone(),
        })?;

        let outcome = Turn::new().run(rng, agent)?;
        self.scores[self.current] = self.scores[self.current].saturating_add(outcome.score());
        log::info!(
            "player {} {}, total {}",
            player,
            outcome,
            self.scores[self.current]
        );

        agent.observe(&Event::TurnEnd { player, outcome })?;
        self.current = (self.current + 1) % self.config.players;

        Ok(outcome)
    }

    /// Play turns until someone reaches the target score, or just one turn for
    /// a solo game.
    pub fn run<R, A>(&mut self, rng: &mut R, agent: &mut A) -> Result<GameOutcome, InputError>
    where
        R: RandomSource + ?Sized,
        A: Agent + ?Sized,
    {
        loop {
            let player = self.current;
            let outcome = self.play_turn(rng, agent)?;

            if self.config.is_solo() {
                return Ok(GameOutcome::SoloTurn(outcome));
            }

            if self.scores[player] >= self.config.target_score {
                let winner = player + 1;
                log::info!("player {} wins with {}", winner, self.scores[player]);
                agent.observe(&Event::GameOver {
                    winner,
                    scores: self.scores.clone(),
                })?;
                return Ok(GameOutcome::Winner {
                    player: winner,
                    scores: self.scores.clone(),
                });
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{agent::BankAtAgent, rng::FixedRolls};
    use claim::{assert_matches, assert_ok, assert_ok_eq};

    #[test]
    fn test_config() {
        let config = assert_ok!(GameConfig::new(2));
        assert_eq!(DEFAULT_TARGET_SCORE, config.target_score);
        assert!(!config.is_solo());
        assert!(assert_ok!(GameConfig::new(1)).is_solo());
        assert_ok!(GameConfig::new(4));

        assert_eq!(Err(ConfigError::Players(0)), GameConfig::new(0));
        assert_eq!(Err(ConfigError::Players(5)), GameConfig::new(5));
        assert_eq!(Err(ConfigError::Target), config.with_target_score(0));
        assert_ok_eq!(
            config.with_target_score(500),
            GameConfig {
                players: 2,
                target_score: 500,
            }
        );

        let config: GameConfig = serde_json::from_str(r#"{"players":3}"#).unwrap();
        assert_eq!(DEFAULT_TARGET_SCORE, config.target_score);
        assert_eq!(
            Err(ConfigError::Players(7)),
            serde_json::from_str::<GameConfig>(r#"{"players":7}"#)
                .unwrap()
                .validate()
        );
    }

    #[test]
    fn test_solo_game_single_turn() {
        let mut rng = FixedRolls::new(&[1, 2, 3, 4, 6, 6]);
        let mut agent = BankAtAgent {
            bank_at: 0,
            min_dice: 1,
        };

        let mut game = Game::new(assert_ok!(GameConfig::new(1)));
        assert_ok_eq!(
            game.run(&mut rng, &mut agent),
            GameOutcome::SoloTurn(TurnOutcome::Banked(100))
        );
        assert!(rng.is_exhausted());
    }

    #[test]
    fn test_game_winner() {
        let config = assert_ok!(assert_ok!(GameConfig::new(2)).with_target_score(1000));
        let mut agent = BankAtAgent {
            bank_at: 0,
            min_dice: 1,
        };
        #[rustfmt::skip]
        let mut rng = FixedRolls::new(&[
            // player 1: 500
            5, 5, 5, 2, 3, 4,
            // player 2: farkle
            2, 2, 3, 3, 4, 6,
            // player 1: 500 more, wins
            5, 5, 5, 2, 3, 4,
        ]);

        let mut game = Game::new(config);
        assert_eq!(1, game.current_player());
        let outcome = assert_ok!(game.run(&mut rng, &mut agent));
        assert_eq!(
            GameOutcome::Winner {
                player: 1,
                scores: vec![1000, 0],
            },
            outcome
        );
        assert_eq!(&[1000, 0], game.scores());
        assert!(rng.is_exhausted());
    }

    #[test]
    fn test_game_total_saturates() {
        let mut agent = BankAtAgent {
            bank_at: 0,
            min_dice: 1,
        };
        let mut rng = FixedRolls::new(&[1, 2, 3, 4, 6, 6]);

        let mut game = Game::new(assert_ok!(GameConfig::new(2)));
        game.scores[0] = u32::MAX - 50;
        assert_ok_eq!(
            game.play_turn(&mut rng, &mut agent),
            TurnOutcome::Banked(100)
        );
        assert_eq!(&[u32::MAX, 0], game.scores());
    }

    #[test]
    fn test_game_rotates_players() {
        let config = assert_ok!(GameConfig::new(3));
        let mut agent = BankAtAgent {
            bank_at: 0,
            min_dice: 1,
        };
        let mut rng = FixedRolls::new(&[2, 2, 3, 3, 4, 6, 1, 2, 3, 4, 6, 6]);

        let mut game = Game::new(config);
        assert_ok_eq!(game.play_turn(&mut rng, &mut agent), TurnOutcome::Busted);
        assert_eq!(2, game.current_player());
        assert_matches!(
            game.play_turn(&mut rng, &mut agent),
            Ok(TurnOutcome::Banked(100))
        );
        assert_eq!(3, game.current_player());
        assert_eq!(&[0, 100, 0], game.scores());
        assert_eq!(3, game.config().players);
    }
}
