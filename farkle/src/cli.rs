use crate::{
    agent::{simulate, BankAtAgent, SimulationReport},
    console::Console,
    dice::{self, parse_faces, DiceSet},
    game::{Game, GameConfig, GameOutcome, DEFAULT_TARGET_SCORE},
    macros::Timer,
    rng::{parse_seed, RngKind},
    stats::FaceCheck,
    MAX_DICE,
};
use serde::Serialize;
use std::{
    fmt,
    io::{self, BufRead, Write},
    str::FromStr,
};
use tabular::{row, Table};

const DEFAULT_SEED: u32 = 1;

///////////////////////////
// String parser helpers //
///////////////////////////

fn parse_opt<T>(label: &'static str, opt_s: Option<&str>) -> Result<Option<T>, String>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    opt_s
        .map(T::from_str)
        .transpose()
        .map_err(|err| format!("invalid {label}: {err}"))
}

fn parse_opt_seed(opt_s: Option<&str>) -> Result<Option<u32>, String> {
    opt_s
        .map(parse_seed)
        .transpose()
        .map_err(|err| format!("invalid seed: {err}"))
}

/// A zero seed leaves the lfsr register at zero for good, so every die shows a
/// 1. That's fine (if silly) for a game, but a simulation or a fairness check
/// on it is meaningless.
fn check_seed(rng: RngKind, seed: u32) -> Result<(), String> {
    if seed == 0 && rng == RngKind::Lfsr {
        return Err(
            "a zero seed leaves the lfsr generator stuck on 1's; pick another seed or `--rng xoshiro`"
                .to_owned(),
        );
    }
    Ok(())
}

/// Parse a single roll of at most six dice, like `455556`.
fn parse_roll(s: &str) -> Result<DiceSet, String> {
    let faces = parse_faces(s).map_err(|err| format!("invalid dice: {err}"))?;
    if faces.len() > MAX_DICE as usize {
        return Err(format!(
            "invalid dice: a roll has at most {} dice, got {}",
            MAX_DICE,
            faces.len()
        ));
    }
    DiceSet::decode(&faces).map_err(|err| format!("invalid dice: {err}"))
}

//////////////////////
// CLI Args Wrapper //
//////////////////////

pub struct Args(pico_args::Arguments);

impl Args {
    pub fn new(inner: pico_args::Arguments) -> Self {
        Self(inner)
    }

    fn subcommand(&mut self) -> Result<Option<String>, String> {
        self.0.subcommand().map_err(|err| err.to_string())
    }

    fn opt_value(&mut self, keys: impl Into<pico_args::Keys>) -> Result<Option<String>, String> {
        self.0
            .opt_value_from_fn(keys, |s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn free_value(&mut self) -> Result<String, String> {
        self.0
            .free_from_fn(|s| Result::<_, pico_args::Error>::Ok(s.to_owned()))
            .map_err(|err| err.to_string())
    }

    fn flag(&mut self, keys: impl Into<pico_args::Keys>) -> bool {
        self.0.contains(keys)
    }

    fn expect_finished(self) -> Result<(), String> {
        let remaining = self.0.finish();
        if !remaining.is_empty() {
            Err(format!("unexpected arguments left: '{:?}'", remaining))
        } else {
            Ok(())
        }
    }

    fn maybe_help(&mut self, usage: &str) {
        if self.0.contains(["-h", "--help"]) {
            print!("{}", usage);
            std::process::exit(0);
        }
    }
}

/////////////
// Metrics //
/////////////

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Metrics(pub Vec<(String, String)>);

impl Metrics {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.push((label.into(), value.into()));
        self
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new("{:>}  {:<}");

        for (label, value) in &self.0 {
            table.add_row(row!(label, value));
        }

        table
    }
}

///////////////////
// Command trait //
///////////////////

pub trait Command: Sized {
    const USAGE: &'static str;

    type Output: fmt::Display;

    fn try_from_cli_args(args: Args) -> Result<Self, String>;
    fn run(self) -> Result<Self::Output, String>;
}

/////////////////
// PlayCommand //
/////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayCommand {
    players: Option<usize>,
    seed: Option<u32>,
    target_score: u32,
    rng: RngKind,
}

impl Default for PlayCommand {
    fn default() -> Self {
        Self {
            players: None,
            seed: None,
            target_score: DEFAULT_TARGET_SCORE,
            rng: RngKind::default(),
        }
    }
}

impl PlayCommand {
    pub fn try_from_str_args(
        players: Option<&str>,
        seed: Option<&str>,
        target_score: Option<&str>,
        rng: Option<&str>,
    ) -> Result<Self, String> {
        let cmd = Self {
            players: parse_opt("player count", players)?,
            seed: parse_opt_seed(seed)?,
            target_score: parse_opt("target score", target_score)?.unwrap_or(DEFAULT_TARGET_SCORE),
            rng: parse_opt("generator", rng)?.unwrap_or_default(),
        };

        if let Some(players) = cmd.players {
            GameConfig::new(players).map_err(|err| err.to_string())?;
        }
        if cmd.target_score == 0 {
            return Err("the target score must be positive".to_owned());
        }

        Ok(cmd)
    }

    /// Play a whole game over the given console streams. Flags that were
    /// given skip their prompts.
    pub fn run_with<R: BufRead, W: Write>(self, input: R, output: W) -> Result<GameOutcome, String> {
        let mut console = Console::new(input, output);
        console.welcome().map_err(|err| err.to_string())?;

        let config = match self.players {
            Some(players) => GameConfig::new(players).map_err(|err| err.to_string())?,
            None => console.prompt_players().map_err(|err| err.to_string())?,
        };
        let config = config
            .with_target_score(self.target_score)
            .map_err(|err| err.to_string())?;

        let seed = match self.seed {
            Some(seed) => seed,
            None => console.prompt_seed().map_err(|err| err.to_string())?,
        };
        if seed == 0 && self.rng == RngKind::Lfsr {
            log::warn!("a zero seed leaves the lfsr generator stuck at zero: every die will show 1");
        }
        log::info!("starting game: {:?}, rng: {}, seed: {:#x}", config, self.rng, seed);

        let mut rng = self.rng.build(seed);
        Game::new(config)
            .run(&mut rng, &mut console)
            .map_err(|err| err.to_string())
    }
}

impl Command for PlayCommand {
    const USAGE: &'static str = "\
farkle play - play Farkle at the console, 1 to 4 players taking turns

USAGE:
    farkle [play] [option ...]

EXAMPLES:
    farkle
    farkle play -p 2 -s 0xc0ffee

OPTIONS:
    · --players / -p n (default: ask)
      The number of players, 1 to 4. A single player plays exactly one turn.

    · --seed / -s seed (default: ask)
      Seed for the dice, in decimal or hexadecimal (e.g. `0x2a`).

    · --target / -t score (default: 10000)
      The score needed to win the game.

    · --rng lfsr|xoshiro (default: lfsr)
      The random number generator used to roll dice.
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let players = args.opt_value(["-p", "--players"])?;
        let seed = args.opt_value(["-s", "--seed"])?;
        let target_score = args.opt_value(["-t", "--target"])?;
        let rng = args.opt_value("--rng")?;
        args.expect_finished()?;

        Self::try_from_str_args(
            players.as_deref(),
            seed.as_deref(),
            target_score.as_deref(),
            rng.as_deref(),
        )
    }

    fn run(self) -> Result<Self::Output, String> {
        self.run_with(io::stdin().lock(), io::stdout().lock())?;
        // everything worth seeing was already printed along the way
        Ok(String::new())
    }
}

//////////////////
// ScoreCommand //
//////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreCommand {
    dice: DiceSet,
}

impl Command for ScoreCommand {
    const USAGE: &'static str = "\
farkle score - score a roll and break it down into scoring combinations

USAGE:
    farkle score <dice>

EXAMPLES:
    farkle score 455556
    farkle score [1,2,3,4,5,6]
";

    type Output = ScoreCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let dice = args.free_value()?;
        args.expect_finished()?;

        Ok(Self {
            dice: parse_roll(&dice)?,
        })
    }

    fn run(self) -> Result<Self::Output, String> {
        Ok(ScoreCommandOutput {
            dice: self.dice,
            combos: self
                .dice
                .combos()
                .into_iter()
                .map(|combo| (combo.to_string(), combo.points()))
                .collect(),
            score: self.dice.score(),
            is_bust: self.dice.is_bust(),
        })
    }
}

pub struct ScoreCommandOutput {
    dice: DiceSet,
    combos: Vec<(String, u32)>,
    score: u32,
    is_bust: bool,
}

impl fmt::Display for ScoreCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new("{:>}  {:<}");
        for (name, points) in &self.combos {
            table.add_row(row!(name, points));
        }

        let mut metrics = Metrics::new();
        metrics.push("dice", self.dice.to_string());
        metrics.push("score", self.score.to_string());
        metrics.push("farkle", self.is_bust.to_string());

        write!(f, "\n{}\n{}", table, metrics.to_table())
    }
}

/////////////////////
// BustOddsCommand //
/////////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BustOddsCommand;

impl Command for BustOddsCommand {
    const USAGE: &'static str = "\
farkle bust-odds - the exact chance of a farkle and the expected score for
    each number of dice rolled

USAGE:
    farkle bust-odds
";

    type Output = Table;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        args.expect_finished()?;
        Ok(Self)
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut table = Table::new("{:>}  {:<}  {:<}").with_row(row!(
            format!("{:>6}", "dice"),
            "Pr[farkle]",
            "E[score]"
        ));

        time!("bust odds", {
            for ndice in 1..=MAX_DICE {
                table.add_row(row!(
                    ndice,
                    dice::p_bust(ndice)
                        .map(|p| format!("{:.6}", p))
                        .unwrap_or_default(),
                    dice::expected_roll_score(ndice)
                        .map(|e| format!("{:.3}", e))
                        .unwrap_or_default(),
                ));
            }
        });

        Ok(table)
    }
}

/////////////////////
// SimulateCommand //
/////////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulateCommand {
    trials: usize,
    agent: BankAtAgent,
    seed: u32,
    rng: RngKind,
    json: bool,
}

impl SimulateCommand {
    pub fn try_from_str_args(
        trials: Option<&str>,
        bank_at: Option<&str>,
        min_dice: Option<&str>,
        seed: Option<&str>,
        rng: Option<&str>,
        json: bool,
    ) -> Result<Self, String> {
        let default_agent = BankAtAgent::default();
        let cmd = Self {
            trials: parse_opt("trials", trials)?.unwrap_or(10_000),
            agent: BankAtAgent {
                bank_at: parse_opt("bank-at score", bank_at)?.unwrap_or(default_agent.bank_at),
                min_dice: parse_opt("min dice", min_dice)?.unwrap_or(default_agent.min_dice),
            },
            seed: parse_opt_seed(seed)?.unwrap_or(DEFAULT_SEED),
            rng: parse_opt("generator", rng)?.unwrap_or_default(),
            json,
        };

        if cmd.trials == 0 {
            return Err("need at least one trial".to_owned());
        }
        check_seed(cmd.rng, cmd.seed)?;

        Ok(cmd)
    }
}

impl Command for SimulateCommand {
    const USAGE: &'static str = "\
farkle simulate - play many turns with a simple banking strategy and report
    how they went

USAGE:
    farkle simulate [option ...]

EXAMPLES:
    farkle simulate -n 100000 -b 500
    farkle simulate --rng xoshiro -s 0x2a --json

OPTIONS:
    · --trials / -n trials (default: 10000)
      The number of turns to play.

    · --bank-at / -b score (default: 300)
      Bank once the turn is worth at least this much.

    · --min-dice / -m n (default: 3)
      Bank instead of rolling fewer than this many dice. Hot dice are always
      rolled.

    · --seed / -s seed (default: 1)
      Seed for the dice, in decimal or hexadecimal. Zero only works with
      `--rng xoshiro`.

    · --rng lfsr|xoshiro (default: lfsr)
      The random number generator used to roll dice.

    · --json
      Print the report as JSON.
";

    type Output = SimulateCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let trials = args.opt_value(["-n", "--trials"])?;
        let bank_at = args.opt_value(["-b", "--bank-at"])?;
        let min_dice = args.opt_value(["-m", "--min-dice"])?;
        let seed = args.opt_value(["-s", "--seed"])?;
        let rng = args.opt_value("--rng")?;
        let json = args.flag("--json");
        args.expect_finished()?;

        Self::try_from_str_args(
            trials.as_deref(),
            bank_at.as_deref(),
            min_dice.as_deref(),
            seed.as_deref(),
            rng.as_deref(),
            json,
        )
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut rng = self.rng.build(self.seed);

        let timer = Timer::start(concat!(file!(), ":", line!()), "simulate");
        let report = simulate(self.agent, &mut rng, self.trials).map_err(|err| err.to_string())?;
        let duration = timer.elapsed();

        let mut metrics = Metrics::new();
        metrics.push("trials", report.trials.to_string());
        metrics.push("Pr[farkle]", format!("{:0.4}", report.bust_rate));
        metrics.push("E[turn score]", format!("{:0.2}", report.mean_score));
        metrics.push("std dev", format!("{:0.2}", report.std_dev));
        metrics.push("max turn score", report.max_score.to_string());
        metrics.push("six dice rolls", format!("{:0.4}", report.full_rolls));
        if report.capped > 0 {
            metrics.push("turns cut short", report.capped.to_string());
        }
        metrics.push("simulation duration", format!("{:.2?}", duration));

        Ok(SimulateCommandOutput {
            rng: self.rng,
            seed: self.seed,
            agent: self.agent,
            report,
            json: self.json,
            metrics,
        })
    }
}

#[derive(Serialize)]
pub struct SimulateCommandOutput {
    rng: RngKind,
    seed: u32,
    agent: BankAtAgent,
    report: SimulationReport,
    #[serde(skip)]
    json: bool,
    #[serde(skip)]
    metrics: Metrics,
}

impl fmt::Display for SimulateCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.json {
            let json = serde_json::to_string_pretty(self).map_err(|_| fmt::Error)?;
            writeln!(f, "{}", json)
        } else {
            write!(f, "\n{}", self.metrics.to_table())
        }
    }
}

//////////////////////
// CheckDiceCommand //
//////////////////////

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckDiceCommand {
    rolls: usize,
    seed: u32,
    rng: RngKind,
}

impl CheckDiceCommand {
    pub fn try_from_str_args(
        rolls: Option<&str>,
        seed: Option<&str>,
        rng: Option<&str>,
    ) -> Result<Self, String> {
        let cmd = Self {
            rolls: parse_opt("rolls", rolls)?.unwrap_or(60_000),
            seed: parse_opt_seed(seed)?.unwrap_or(DEFAULT_SEED),
            rng: parse_opt("generator", rng)?.unwrap_or_default(),
        };

        if cmd.rolls == 0 {
            return Err("need at least one roll".to_owned());
        }
        check_seed(cmd.rng, cmd.seed)?;

        Ok(cmd)
    }
}

impl Command for CheckDiceCommand {
    const USAGE: &'static str = "\
farkle check-dice - roll a single die many times and test whether the faces
    come up as often as a fair die's would (multinomial G-test)

USAGE:
    farkle check-dice [option ...]

EXAMPLES:
    farkle check-dice -n 1000000 -s 0xd15c0

OPTIONS:
    · --rolls / -n rolls (default: 60000)
      The number of dice to roll.

    · --seed / -s seed (default: 1)
      Seed for the dice, in decimal or hexadecimal. Zero only works with
      `--rng xoshiro`.

    · --rng lfsr|xoshiro (default: lfsr)
      The random number generator used to roll dice.
";

    type Output = CheckDiceCommandOutput;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        args.maybe_help(Self::USAGE);

        let rolls = args.opt_value(["-n", "--rolls"])?;
        let seed = args.opt_value(["-s", "--seed"])?;
        let rng = args.opt_value("--rng")?;
        args.expect_finished()?;

        Self::try_from_str_args(rolls.as_deref(), seed.as_deref(), rng.as_deref())
    }

    fn run(self) -> Result<Self::Output, String> {
        let mut rng = self.rng.build(self.seed);
        let check = time!("check dice", FaceCheck::sample(&mut rng, self.rolls));
        Ok(CheckDiceCommandOutput { check })
    }
}

pub struct CheckDiceCommandOutput {
    check: FaceCheck,
}

impl fmt::Display for CheckDiceCommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table =
            Table::new("{:>}  {:<}  {:<}").with_row(row!(format!("{:>6}", "face"), "count", "p_hat"));

        for face in 1..=6 {
            table.add_row(row!(
                face,
                self.check.counts[(face - 1) as usize],
                format!("{:.5}", self.check.p_hat(face)),
            ));
        }

        let mut metrics = Metrics::new();
        metrics.push("rolls", self.check.rolls.to_string());
        metrics.push("G", format!("{:.4}", self.check.g));
        metrics.push("p-value", format!("{:.4}", self.check.p_value));
        metrics.push(
            "verdict",
            if self.check.is_suspicious(0.01) {
                "unfair (p < 0.01)"
            } else {
                "looks fair"
            },
        );

        write!(f, "\n{}\n{}", table, metrics.to_table())
    }
}

/////////////////
// BaseCommand //
/////////////////

#[derive(Debug)]
pub enum BaseCommand {
    Play(PlayCommand),
    Score(ScoreCommand),
    BustOdds(BustOddsCommand),
    Simulate(SimulateCommand),
    CheckDice(CheckDiceCommand),
}

impl Command for BaseCommand {
    const USAGE: &'static str = "\
farkle - the dice game Farkle, for 1 to 4 players at one console

USAGE:
    farkle [subcommand] [option ...]

SUBCOMMANDS:
    · farkle play - play a game (the default when no subcommand is given)
    · farkle score - score a roll and break it down into scoring combinations
    · farkle bust-odds - the exact farkle chance for each number of dice
    · farkle simulate - play many turns with a simple strategy and report
    · farkle check-dice - test a die roller for fairness

ENVIRONMENT:
    · FARKLE_LOG=level (default: warn)
      Log verbosity (error, warn, info, debug, trace). Logs go to stderr.
";

    type Output = String;

    fn try_from_cli_args(mut args: Args) -> Result<Self, String> {
        let maybe_subcommand = args.subcommand()?;

        match maybe_subcommand.as_deref() {
            Some("play") => Ok(Self::Play(PlayCommand::try_from_cli_args(args)?)),
            Some("score") => Ok(Self::Score(ScoreCommand::try_from_cli_args(args)?)),
            Some("bust-odds") => Ok(Self::BustOdds(BustOddsCommand::try_from_cli_args(args)?)),
            Some("simulate") => Ok(Self::Simulate(SimulateCommand::try_from_cli_args(args)?)),
            Some("check-dice") => Ok(Self::CheckDice(CheckDiceCommand::try_from_cli_args(
                args,
            )?)),
            Some(command) => Err(format!("'{}' is not a recognized command", command)),
            None => {
                args.maybe_help(Self::USAGE);
                Ok(Self::Play(PlayCommand::try_from_cli_args(args)?))
            }
        }
    }

    fn run(self) -> Result<String, String> {
        match self {
            Self::Play(cmd) => cmd.run(),
            Self::Score(cmd) => cmd.run().map(|out| out.to_string()),
            Self::BustOdds(cmd) => cmd.run().map(|out| out.to_string()),
            Self::Simulate(cmd) => cmd.run().map(|out| out.to_string()),
            Self::CheckDice(cmd) => cmd.run().map(|out| out.to_string()),
        }
    }
}
