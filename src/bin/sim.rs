use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use monopolytron_rs::cli::transcript;
use monopolytron_rs::cli::{PlayerInstance, StatisticsAccumulator, create_player, print_player_help};
use monopolytron_rs::board::tile_spec;
use monopolytron_rs::game::{Game, GameConfig};
use monopolytron_rs::types::Edition;
use tracing::{debug, info};

#[derive(Debug, Parser, Clone)]
#[command(name = "monopolytron-sim")]
#[command(about = "Property trading game simulator - pit player strategies against each other")]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 5)]
    num: u32,

    /// Comma-separated player codes (e.g., A,A,R,R)
    /// Use ':' to set player-specific params (e.g., S:buy)
    #[arg(long, default_value = "A,A,A,A")]
    players: String,

    /// Random seed of the first game; game i uses seed + i
    #[arg(long)]
    seed: Option<u64>,

    /// Board edition: US or UK
    #[arg(long)]
    edition: Option<String>,

    /// TOML file with rule and policy settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Show player codes and exit
    #[arg(long)]
    help_players: bool,

    /// Silence console output
    #[arg(long)]
    quiet: bool,

    /// Print the full event log of the first game
    #[arg(long)]
    transcript: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Number of worker threads for parallel execution
    #[arg(long, default_value_t = 1)]
    workers: usize,
}

fn init_logging(json: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("monopolytron_rs=warn"));
    if json {
        fmt().json().with_env_filter(env_filter).with_target(true).init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.json_logs);

    if args.help_players {
        print_player_help();
        return Ok(());
    }

    let players = parse_players(&args.players)?;
    let config = build_config(&args, players.len())?;
    info!(players = players.len(), games = args.num, seed = config.seed, "starting simulation");

    let stats = if args.workers > 1 {
        run_parallel_simulations(&args, &players, &config)?
    } else {
        run_sequential_simulations(&args, &players, &config)?
    };

    if !args.quiet {
        print_summary(&stats, &players, config.edition);
    }
    Ok(())
}

fn parse_players(codes: &str) -> Result<Vec<PlayerInstance>> {
    let mut players = Vec::new();
    for key in codes.split(',').filter(|key| !key.is_empty()) {
        let mut parts = key.split(':');
        let code = parts.next().unwrap_or_default();
        let params: Vec<&str> = parts.collect();
        match create_player(code, params) {
            Some(player) => players.push(player),
            None => bail!("unknown player code '{code}' (use --help-players to list them)"),
        }
    }
    if !(2..=8).contains(&players.len()) {
        bail!("must specify 2-8 players, got {}", players.len());
    }
    Ok(players)
}

fn build_config(args: &Args, num_players: usize) -> Result<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => GameConfig::default(),
    };
    config.num_players = num_players;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(edition) = &args.edition {
        config.edition = Edition::from_str(edition)
            .with_context(|| format!("invalid edition '{edition}', use US or UK"))?;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn play_one(players: &[PlayerInstance], base: &GameConfig, game_idx: u64) -> Result<Game> {
    let config = GameConfig {
        seed: base.seed + game_idx,
        ..base.clone()
    };
    let mut game = Game::new(config).context("creating game")?;
    game.play(players)
        .with_context(|| format!("game {} failed", game_idx + 1))?;
    Ok(game)
}

fn run_sequential_simulations(
    args: &Args,
    players: &[PlayerInstance],
    config: &GameConfig,
) -> Result<StatisticsAccumulator> {
    let mut stats = StatisticsAccumulator::new();
    for game_idx in 0..args.num {
        let start = Instant::now();
        let game = play_one(players, config, game_idx as u64)?;
        let duration = start.elapsed();
        stats.after(&game, duration);

        if args.transcript && game_idx == 0 {
            for line in transcript::render(&game.state.log, config.edition) {
                println!("{line}");
            }
        }
        if !args.quiet {
            let last_n = 10;
            if game_idx < last_n || game_idx >= args.num.saturating_sub(last_n) {
                let winner = game
                    .state
                    .winner()
                    .map(|p| format!("P{p}"))
                    .unwrap_or_else(|| "None".to_string());
                println!(
                    "Game {:>4}: Seed={}, Winner={:>4}, Rounds={:>4}, Duration={:?}",
                    game_idx + 1,
                    game.seed,
                    winner,
                    game.state.round,
                    duration
                );
            } else if (game_idx + 1) % 100 == 0 {
                print!(".");
                std::io::stdout().flush().context("flushing stdout")?;
            }
        }
    }
    Ok(stats)
}

fn run_parallel_simulations(
    args: &Args,
    players: &[PlayerInstance],
    config: &GameConfig,
) -> Result<StatisticsAccumulator> {
    let games_per_worker = args.num as usize / args.workers;
    let remainder = args.num as usize % args.workers;

    let mut handles = Vec::new();
    for worker_id in 0..args.workers {
        // Scripted players keep interior state, so every worker gets its own copy.
        let players = players.to_vec();
        let config = config.clone();
        let num_games = if worker_id < remainder {
            games_per_worker + 1
        } else {
            games_per_worker
        };
        let start_idx = worker_id * games_per_worker + worker_id.min(remainder);

        handles.push(thread::spawn(move || -> Result<StatisticsAccumulator> {
            let mut local_stats = StatisticsAccumulator::new();
            for game_idx in start_idx..start_idx + num_games {
                let start = Instant::now();
                let game = play_one(&players, &config, game_idx as u64)?;
                local_stats.after(&game, start.elapsed());
            }
            debug!(worker_id, games = num_games, "worker finished");
            Ok(local_stats)
        }));
    }

    let mut stats = StatisticsAccumulator::new();
    for handle in handles {
        let worker_stats = handle
            .join()
            .map_err(|_| anyhow::anyhow!("simulation worker panicked"))??;
        stats.stats.merge(worker_stats.stats);
    }
    Ok(stats)
}

fn print_summary(stats: &StatisticsAccumulator, players: &[PlayerInstance], edition: Edition) {
    let stats = &stats.stats;
    println!("\n{}", "=".repeat(80));
    println!("SIMULATION SUMMARY");
    println!("{}", "=".repeat(80));

    println!("\nPlayer Summary:");
    println!(
        "{:<15} {:<10} {:<12} {:<12}",
        "Player", "Wins", "Win Rate", "First Set"
    );
    println!("{}", "-".repeat(50));
    for (seat, player) in players.iter().enumerate() {
        let wins = stats.wins.get(&seat).copied().unwrap_or(0);
        let first_sets = stats.first_set_owner.get(&seat).copied().unwrap_or(0);
        println!(
            "{:<15} {:<10} {:<11.1}% {:<12}",
            format!("{} (P{})", player.name(), seat),
            wins,
            stats.win_rate(seat),
            first_sets
        );
    }

    println!("\nGame Summary:");
    println!("  Total Games: {}", stats.games);
    println!("  Unfinished: {}", stats.unfinished);
    println!("  Bankruptcies: {}", stats.bankruptcies);
    println!("  Avg Rounds: {:.2}", stats.get_avg_rounds());
    println!("  Avg Duration: {:.2?}", stats.get_avg_duration());
    let first_set_games: u32 = stats.first_set_owner.values().sum();
    if first_set_games > 0 {
        println!(
            "  First set owner won: {:.1}%",
            stats.first_set_wins as f64 / first_set_games as f64 * 100.0
        );
    }

    println!("\nTop Rent Tiles:");
    let currency = edition.currency();
    for (tile, rent) in stats.top_rent_tiles(5) {
        println!("  {:<28} {currency}{rent}", tile_spec(tile).name(edition));
    }
}
