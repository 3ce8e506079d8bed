use clap::Parser;
use holdem_advisor::action::{Action, ActionSource};
use holdem_advisor::advisor::{favourability, utility, Advice};
use holdem_advisor::betting::{BettingError, Table, Turn};
use holdem_advisor::cards::parse_cards;
use holdem_advisor::equity::{EquityEstimator, EquityQuery, EquityResult, EstimatorConfig, DEFAULT_TRIALS};
use holdem_advisor::hand::{validate_holdem, Board, HoleCards, Street};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Texas Hold'em odds and betting assistant.
///
/// Enter your hole cards and each street's board cards as they are dealt
/// (e.g. `As Kd`), then every player's action when it is their turn
/// (`bet 20`, `raise 40`, `call`, `check`, `fold`).
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Player names in seat order, comma-separated
    #[arg(long, value_delimiter = ',', num_args = 2.., required = true)]
    players: Vec<String>,

    /// The player receiving advice; defaults to the first seat
    #[arg(long)]
    hero: Option<String>,

    /// Starting balance for every player
    #[arg(long, default_value_t = 1_000)]
    balance: u64,

    /// Monte Carlo trials per street
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Fix the random seed for reproducible estimates
    #[arg(long)]
    seed: Option<u64>,

    /// Stop each estimate after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env().filter_level(level).init();
}

/// Print `msg` and read one trimmed line; `None` on end of input.
fn prompt<R: BufRead>(input: &mut R, msg: &str) -> io::Result<Option<String>> {
    print!("{msg}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Reads actions from the terminal and shows the hero the latest advice.
struct TerminalActions<'r, R> {
    input: &'r mut R,
    hero: String,
    /// `None` once the hero has folded.
    equity: Option<EquityResult>,
    opponents: usize,
}

impl<R: BufRead> ActionSource for TerminalActions<'_, R> {
    fn next_action(&mut self, turn: &Turn<'_>) -> Option<Action> {
        let player = turn.player;
        if let (true, Some(equity)) = (player.name() == self.hero, &self.equity) {
            let advice =
                Advice::new(equity, turn.pot_total, turn.to_call, player.balance(), self.opponents);
            println!(
                "  advice: pot odds {:.3}, suggested bet {} ({:+.3} of balance), call {}",
                advice.pot_odds,
                advice.bet,
                advice.fraction,
                if advice.call_is_profitable() { "profitable" } else { "unprofitable" }
            );
        }
        loop {
            let msg = format!(
                "{} (balance {}, to call {}, pot {}): ",
                player.name(),
                player.balance(),
                turn.to_call,
                turn.pot_total
            );
            let line = match prompt(&mut *self.input, &msg) {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    log::error!("reading action: {e}");
                    return None;
                }
            };
            match line.parse::<Action>() {
                Ok(action) => return Some(action),
                Err(e) => println!("  {e}"),
            }
        }
    }

    fn rejected(&mut self, turn: &Turn<'_>, action: Action, error: &BettingError) {
        println!("  {} cannot {action}: {error}", turn.player.name());
    }
}

/// Keep asking until the cards parse and fit the hand so far.
fn read_cards<R, T, F>(input: &mut R, msg: &str, mut accept: F) -> io::Result<Option<T>>
where
    R: BufRead,
    F: FnMut(&str) -> Result<T, Box<dyn Error>>,
{
    loop {
        let Some(line) = prompt(input, msg)? else {
            return Ok(None);
        };
        match accept(&line) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => println!("  {e}"),
        }
    }
}

fn show_table(table: &Table, hero: &str) -> Result<(), BettingError> {
    println!("Balances:");
    for p in table.players() {
        let status = if p.is_folded() { " (folded)" } else { "" };
        println!("  {:<12} {:>8}{status}", p.name(), p.balance());
    }
    for (name, ratio) in table.stack_deviations(hero)? {
        if let Some(ratio) = ratio {
            println!("  {name} holds {ratio:.2}x your stack");
        }
    }
    let order: Vec<&str> = table.action_order().iter().map(|&s| table.players()[s].name()).collect();
    println!("Action order: {}", order.join(", "));
    Ok(())
}

/// The hero's equity against every other live player; `None` once the hero has folded.
fn hero_equity(
    table: &Table,
    estimator: &EquityEstimator,
    hero: &str,
    hole: &HoleCards,
    board: &Board,
    trials: usize,
) -> Result<Option<EquityResult>, Box<dyn Error>> {
    if table.player(hero)?.is_folded() {
        return Ok(None);
    }
    let opponents = table.live_players().count().saturating_sub(1).max(1);
    let query = EquityQuery::new(*hole, board.clone(), opponents)?.with_trials(trials);
    Ok(Some(estimator.estimate(&query)?))
}

/// Play one hand. Returns `false` when input ran out.
fn play_hand<R: BufRead>(
    input: &mut R,
    table: &mut Table,
    estimator: &EquityEstimator,
    hero: &str,
    trials: usize,
) -> Result<bool, Box<dyn Error>> {
    show_table(table, hero)?;
    let Some(hole) = read_cards(input, "Your hole cards: ", |s| Ok(s.parse::<HoleCards>()?))? else {
        return Ok(false);
    };
    let mut board = Board::empty();

    for street in Street::ALL {
        if street != Street::Preflop {
            let needed = street.board_len() - board.len();
            let msg = format!("{} card(s) ({needed}): ", street.label());
            let extended = read_cards(input, &msg, |s| {
                let cards = parse_cards(s)?;
                if cards.len() != needed {
                    return Err(format!("expected {needed} card(s), got {}", cards.len()).into());
                }
                let mut next = board.clone();
                next.extend(cards)?;
                validate_holdem(&hole, &next)?;
                Ok(next)
            })?;
            let Some(next) = extended else {
                return Ok(false);
            };
            board = next;
        }

        let opponents = table.live_players().count().saturating_sub(1);
        let equity = hero_equity(table, estimator, hero, &hole, &board, trials)?;
        let hero_player = table.player(hero)?;
        match &equity {
            Some(equity) => println!(
                "{}: win probability {:.4} (±{:.4}, {} trials), favourability {:.4}, utility {:.1}",
                street.label(),
                equity.win_probability,
                equity.standard_error(),
                equity.trials_run,
                favourability(equity.win_probability, opponents),
                utility(table.pot_total(), equity.win_probability, hero_player.contributed(), false),
            ),
            None => println!(
                "{}: folded, utility {:.1}",
                street.label(),
                utility(table.pot_total(), 0.0, hero_player.contributed(), true)
            ),
        }

        let mut source =
            TerminalActions { input: &mut *input, hero: hero.to_string(), equity, opponents };
        match table.run_round(&mut source) {
            Ok(()) => {}
            Err(BettingError::NoAction(_)) => return Ok(false),
            Err(e) => return Err(e.into()),
        }
        println!("Pot is now {}", table.pot_total());
        if table.live_players().count() < 2 {
            break;
        }
    }

    let (winner, pot) = loop {
        if table.live_players().count() < 2 {
            break table.resolve(None)?;
        }
        let Some(name) = prompt(input, "Winner: ")? else {
            return Ok(false);
        };
        match table.resolve(Some(&name)) {
            Ok(settled) => break settled,
            Err(e) => println!("  {e}"),
        }
    };
    println!("{winner} wins {pot}");
    table.rotate_dealer();
    Ok(true)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logger(args.verbose);

    let mut table = Table::new(args.balance);
    for name in &args.players {
        table.add_player(name.as_str())?;
    }
    let hero = args.hero.unwrap_or_else(|| args.players[0].clone());
    table.player(&hero)?;

    let mut config = EstimatorConfig::default();
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    if let Some(ms) = args.time_limit_ms {
        config = config.with_time_limit(Duration::from_millis(ms));
    }
    let estimator = EquityEstimator::new(config);
    log::info!("holdem-advisor {} with {} players", holdem_advisor::VERSION, args.players.len());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        if !play_hand(&mut input, &mut table, &estimator, &hero, args.trials)? {
            break;
        }
        match prompt(&mut input, "Another hand? [y/N] ")? {
            Some(answer) if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") => {}
            _ => break,
        }
    }
    show_table(&table, &hero)?;
    Ok(())
}
