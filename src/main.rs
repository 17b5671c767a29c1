use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use snake_qlearn::{
    Agent, AsciiRenderer, Config, EpisodeRunner, GridWorld, QTable, format_reasons,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "snake-qlearn")]
#[command(version, about = "Tabular Q-learning snake with good food, bad food and walls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write an empty q-table to start training from scratch
    Init {
        #[arg(long)]
        qtable: PathBuf,
        /// Replace an existing table
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Train the agent, saving the table after every batch
    Train {
        #[arg(long)]
        qtable: PathBuf,
        /// JSON config file; missing fields use the defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// Print every frame to stdout
        #[arg(long, default_value_t = false)]
        render: bool,
        /// Override training.total_batches
        #[arg(long)]
        batches: Option<usize>,
        /// Override training.batch_size
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Play greedily with a trained table, without learning
    Play {
        #[arg(long)]
        qtable: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 10)]
        episodes: usize,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = false)]
        render: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Init { qtable, force } => init(&qtable, force),
        Commands::Train {
            qtable,
            config,
            seed,
            render,
            batches,
            batch_size,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(n) = batches {
                config.training.total_batches = n;
            }
            if let Some(n) = batch_size {
                config.training.batch_size = n;
            }
            config.validate().context("invalid configuration")?;
            train(&qtable, config, seed, render)
        }
        Commands::Play {
            qtable,
            config,
            episodes,
            seed,
            render,
        } => {
            let config = load_config(config.as_deref())?;
            play(&qtable, config, episodes, seed, render)
        }
    }
}

fn init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "{} already exists, pass --force to replace it",
            path.display()
        );
    }
    QTable::new()
        .save_path(path)
        .with_context(|| format!("failed to write empty q-table to {}", path.display()))?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn build_runner(
    qtable_path: &Path,
    config: Config,
    seed: Option<u64>,
    render: bool,
) -> Result<EpisodeRunner> {
    let qtable = QTable::load_path(qtable_path).with_context(|| {
        format!(
            "failed to load q-table from {} (run `snake-qlearn init` first)",
            qtable_path.display()
        )
    })?;

    let (world, agent) = match seed {
        Some(seed) => (
            GridWorld::with_seed(config.game.clone(), seed),
            Agent::with_seed(&config.game, config.agent, qtable, seed.wrapping_add(1)),
        ),
        None => (
            GridWorld::new(config.game.clone()),
            Agent::new(&config.game, config.agent, qtable),
        ),
    };
    let world = world.context("failed to set up the board")?;

    let mut runner = EpisodeRunner::new(world, agent, config.training)
        .context("invalid training configuration")?;
    if render {
        runner = runner.with_renderer(Box::new(AsciiRenderer::stdout()));
    }
    Ok(runner)
}

fn train(qtable_path: &Path, config: Config, seed: Option<u64>, render: bool) -> Result<()> {
    let window = config.training.average_window;
    let mut runner =
        build_runner(qtable_path, config, seed, render)?.with_save_path(qtable_path);

    runner.train().context("training failed")?;

    let stats = runner.stats();
    let final_average = stats.moving_average(window).last().copied();
    info!(
        episodes = stats.total_episodes(),
        high_score = stats.high_score(),
        states = runner.agent().qtable().len(),
        final_average = ?final_average,
        "training finished"
    );
    Ok(())
}

fn play(
    qtable_path: &Path,
    config: Config,
    episodes: usize,
    seed: Option<u64>,
    render: bool,
) -> Result<()> {
    let mut runner = build_runner(qtable_path, config, seed, render)?;
    let eval = runner.evaluate(episodes).context("evaluation failed")?;

    for (i, report) in eval.episodes.iter().enumerate() {
        println!(
            "episode {:>3}: score {:>3}  moves {:>5}  {}",
            i + 1,
            report.score,
            report.moves,
            report.reason
        );
    }
    println!("{}", eval.stats.format_summary());
    println!("{}", format_reasons(&eval.stats.reason_counts()));
    Ok(())
}
