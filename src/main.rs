//! NFL Score Prediction CLI
//!
//! Batch pipeline: fetch play-by-play history, train a score regressor, and
//! write blended predictions for the upcoming schedule.

use clap::{Parser, Subcommand};
use gridiron::{Config, Result};

#[derive(Parser)]
#[command(name = "gridiron")]
#[command(about = "NFL game score prediction from play-by-play data", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train the score regressor and report holdout MAE
    Train,
    /// Run the full pipeline and write game predictions as JSON
    Predict {
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Download the configured seasons into the cache
    Fetch {
        /// Use only cached files (no network requests)
        #[arg(long)]
        offline: bool,
    },
    /// Show cache status
    Status,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Run command
    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Fetch { offline } => commands::data_fetch(&config, offline),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train => commands::train(&config),
        Commands::Predict { offline } => commands::predict(&config, offline),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use gridiron::data::{DataProvider, NflverseProvider};
    use gridiron::model::MlpRegressor;
    use gridiron::predict::Pipeline;

    type MyBackend = burn::backend::NdArray<f32>;
    type MyAutodiffBackend = burn::backend::Autodiff<MyBackend>;

    fn make_provider(config: &Config, offline: bool) -> NflverseProvider {
        NflverseProvider::new()
            .with_cache(&config.data.cache_dir)
            .offline_only(offline)
    }

    fn make_estimator(config: &Config) -> MlpRegressor<MyAutodiffBackend> {
        MlpRegressor::<MyAutodiffBackend>::new(Default::default(), config.model.clone())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.cache_dir)?;
        println!("Created cache directory {}", config.data.cache_dir);

        println!("\nNext steps:");
        println!("  1. Edit {} to customize seasons and paths", config_path);
        println!("  2. Run 'gridiron data fetch' to download play-by-play data");
        println!("  3. Run 'gridiron predict' to write predictions");

        Ok(())
    }

    pub fn data_fetch(config: &Config, offline: bool) -> Result<()> {
        let provider = make_provider(config, offline);

        let mut seasons = config.seasons.history();
        for &season in &config.seasons.baseline {
            if !seasons.contains(&season) {
                seasons.push(season);
            }
        }

        println!("Fetching play-by-play for seasons {:?}...", seasons);
        let plays = provider.fetch_play_by_play(&seasons)?;
        println!("  {} plays", plays.len());

        let mut schedule_seasons = seasons.clone();
        schedule_seasons.push(config.seasons.target);
        println!("Fetching schedules...");
        let schedules = provider.fetch_schedules(&schedule_seasons)?;
        println!("  {} schedule rows", schedules.len());

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let provider = make_provider(config, true);
        let files = provider.cached_files();

        println!("Cache Status");
        println!("───────────────────────────────");
        println!("  Path:   {}", config.data.cache_dir);
        println!("  Files:  {}", files.len());
        for file in files {
            println!("    {}", file);
        }

        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let provider = make_provider(config, false);
        let mut estimator = make_estimator(config);
        let pipeline = Pipeline::new(config.clone());

        println!(
            "Training on seasons {}–{}...",
            config.seasons.history_start, config.seasons.history_end
        );
        let report = pipeline.train(&provider, &mut estimator)?;

        println!("\nTraining complete!");
        println!("  Train rows:    {}", report.train_rows);
        println!("  Holdout rows:  {}", report.holdout_rows);
        println!("  Holdout MAE:   {:.2} points", report.holdout_mae);

        Ok(())
    }

    pub fn predict(config: &Config, offline: bool) -> Result<()> {
        let provider = make_provider(config, offline);
        let mut estimator = make_estimator(config);
        let pipeline = Pipeline::new(config.clone());

        println!(
            "Predicting season {} from {}–{} history...",
            config.seasons.target, config.seasons.history_start, config.seasons.history_end
        );
        let games = pipeline.run(&provider, &mut estimator)?;
        pipeline.write_json(&games)?;

        println!("\n{} predictions saved to {}", games.len(), config.data.output_path);
        for game in games.iter().take(5) {
            println!(
                "  {}: {} {} - {} {}",
                game.game_id,
                game.home_team,
                game.home_pred_score,
                game.away_team,
                game.away_pred_score
            );
        }
        if games.len() > 5 {
            println!("  ...");
        }

        Ok(())
    }
}
