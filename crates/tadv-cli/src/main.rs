//! CLI frontend for the tadv story engine.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use tadv_engine::EngineConfig;

#[derive(Parser)]
#[command(
    name = "tadv",
    about = "Play and check text adventure stories",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Directory flags shared by commands that touch the engine.
#[derive(Args)]
struct Dirs {
    /// Directory containing .tadv stories
    #[arg(long, default_value = "stories")]
    stories: PathBuf,

    /// Directory containing .tchar character templates (default: beside stories)
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Directory for save files (default: beside stories)
    #[arg(long)]
    saves: Option<PathBuf>,
}

impl Dirs {
    fn config(&self) -> EngineConfig {
        let mut config = EngineConfig::new(&self.stories);
        if let Some(dir) = &self.templates {
            config = config.with_templates_dir(dir);
        }
        if let Some(dir) = &self.saves {
            config = config.with_saves_dir(dir);
        }
        config
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a story interactively
    Play {
        /// Story id in the stories directory, or a path to a .tadv file
        story: String,

        /// Player name
        #[arg(short, long)]
        player: Option<String>,

        /// Scene to start in instead of the story's start scene
        #[arg(long)]
        scene: Option<String>,

        /// Save to resume from
        #[arg(short, long)]
        load: Option<String>,

        #[command(flatten)]
        dirs: Dirs,
    },

    /// List the stories in the stories directory
    List {
        #[command(flatten)]
        dirs: Dirs,
    },

    /// Parse a story with its imports and report problems
    Check {
        /// Story file to check
        file: PathBuf,
    },

    /// List saved games
    Saves {
        #[command(flatten)]
        dirs: Dirs,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            story,
            player,
            scene,
            load,
            dirs,
        } => commands::play::run(
            dirs.config(),
            &story,
            player.as_deref(),
            scene.as_deref(),
            load.as_deref(),
        ),
        Commands::List { dirs } => commands::list::run(dirs.config()),
        Commands::Check { file } => commands::check::run(&file),
        Commands::Saves { dirs } => commands::saves::run(dirs.config()),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
