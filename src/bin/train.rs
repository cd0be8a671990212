use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};

use ccg_learner::games::skirmish::{Archetype, Skirmish};
use ccg_learner::nn::MlpQNetwork;
use ccg_learner::training::{run_training, CheckpointStore, DqnAgent, OpponentMode, Trainer};
use ccg_learner::LearnerConfig;

/// Train a card game agent via self-play DQN.
#[derive(Parser)]
#[command(name = "train", about = "Train a card game DQN agent")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "learner.toml")]
    config: PathBuf,

    /// Override episodes per matchup
    #[arg(long)]
    episodes: Option<u64>,

    /// Comma-separated deck archetypes (aggro, midrange, control)
    #[arg(long, value_delimiter = ',')]
    decks: Option<Vec<String>>,

    /// Opponent: selfplay or random
    #[arg(long)]
    opponent: Option<String>,

    /// Override episodes per matchup per round
    #[arg(long)]
    batch: Option<u64>,

    /// Override checkpoint directory
    #[arg(long)]
    checkpoint_dir: Option<PathBuf>,

    /// Seed for every RNG stream
    #[arg(long)]
    seed: Option<u64>,

    /// Ignore existing checkpoints and start from scratch
    #[arg(long)]
    fresh: bool,

    /// Greedy evaluation games per matchup after training
    #[arg(long, default_value_t = 0)]
    evaluate: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_config = ConfigBuilder::new()
        .set_location_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    TermLogger::init(level, log_config, TerminalMode::Mixed, ColorChoice::Auto)
        .context("initializing logger")?;

    let mut config = LearnerConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli)?;
    config.validate().context("validating configuration")?;

    let store = CheckpointStore::new(&config.checkpoint.dir);
    let name = config.trainer.checkpoint_name.clone();

    let network = MlpQNetwork::new(&config.network);
    let mut agent = DqnAgent::new(network, config.agent.clone());
    if config.checkpoint.fresh {
        store
            .clear_progress(&name)
            .context("clearing saved progress")?;
        log::info!("starting fresh, ignoring checkpoints in {}", store.dir().display());
    } else if agent
        .load(&store, &name)
        .with_context(|| format!("loading checkpoint '{name}'"))?
    {
        log::info!(
            "resumed '{}': ε={:.3}, {} transitions",
            name,
            agent.epsilon(),
            agent.buffer().len()
        );
    }

    let simulator = Skirmish::new(config.trainer.seed);
    let mut trainer = Trainer::new(simulator, config.trainer.clone(), config.reward.clone());

    let progress = run_training(&config.run, &mut trainer, &mut agent, &store, |_| {})
        .context("training")?;
    log::info!(
        "trained {} episodes: {} ({:.1}% wins)",
        progress.next_episode,
        progress.tally,
        progress.tally.win_rate() * 100.0
    );

    if cli.evaluate > 0 {
        for learner in &config.run.decks {
            for opponent in &config.run.decks {
                trainer
                    .evaluate(&mut agent, &learner.deck(), &opponent.deck(), cli.evaluate)
                    .with_context(|| format!("evaluating {learner} vs {opponent}"))?;
            }
        }
    }

    Ok(())
}

fn apply_overrides(config: &mut LearnerConfig, cli: &Cli) -> Result<()> {
    if let Some(episodes) = cli.episodes {
        config.run.episodes_per_matchup = episodes;
    }
    if let Some(batch) = cli.batch {
        config.run.batch_size = batch;
    }
    if let Some(names) = &cli.decks {
        let mut decks = Vec::with_capacity(names.len());
        for name in names {
            match Archetype::from_name(name.trim()) {
                Some(archetype) => decks.push(archetype),
                None => bail!("unknown deck '{}' (expected aggro, midrange or control)", name),
            }
        }
        config.run.decks = decks;
    }
    if let Some(opponent) = &cli.opponent {
        config.trainer.opponent = match OpponentMode::from_name(opponent) {
            Some(mode) => mode,
            None => bail!("unknown opponent '{}' (expected selfplay or random)", opponent),
        };
    }
    if let Some(dir) = &cli.checkpoint_dir {
        config.checkpoint.dir = dir.clone();
    }
    if let Some(seed) = cli.seed {
        config.agent.seed = seed;
        config.network.seed = seed;
        config.trainer.seed = seed;
    }
    if cli.fresh {
        config.checkpoint.fresh = true;
    }
    Ok(())
}
