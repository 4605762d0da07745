mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    check::CommandArgs, config::ConfigSubcommand, hacks::HacksSubcommand,
    synonym::SynonymSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "slashdash",
    about = "Map loose slash-command verbs and confirm risky or ambiguous commands",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .slashdash/ or .git/)
    #[arg(long, global = true, env = "SLASHDASH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .slashdash/config.yaml with the default commands and synonyms
    Init,

    /// Map a verb onto a canonical command
    Map {
        /// The verb as typed, e.g. inspect
        verb: String,

        /// Noun the command should act on; mismatching commands are penalised
        #[arg(long)]
        noun: Option<String>,
    },

    /// Decide whether a command needs confirmation and show the options
    Check {
        #[command(flatten)]
        args: CommandArgs,

        /// Reply to apply to the confirmation (option number, /command, or cancel)
        #[arg(long)]
        reply: Option<String>,

        /// Prompt text to enhance with the hacks the confirmation mode calls for
        #[arg(long)]
        prompt: Option<String>,
    },

    /// List every trigger a command fires, with severities
    Triggers {
        #[command(flatten)]
        args: CommandArgs,
    },

    /// Manage verb synonyms
    Synonym {
        #[command(subcommand)]
        subcommand: SynonymSubcommand,
    },

    /// List, toggle, and inject prompt hacks
    Hacks {
        #[command(subcommand)]
        subcommand: HacksSubcommand,
    },

    /// Show or validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Interactive loop: map, confirm, reply, and walk the command history
    Session,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Session => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Map { verb, noun } => cmd::map::run(&root, &verb, noun.as_deref(), cli.json),
        Commands::Check {
            args,
            reply,
            prompt,
        } => cmd::check::run(&root, &args, reply.as_deref(), prompt.as_deref(), cli.json),
        Commands::Triggers { args } => cmd::triggers::run(&root, &args, cli.json),
        Commands::Synonym { subcommand } => cmd::synonym::run(&root, subcommand, cli.json),
        Commands::Hacks { subcommand } => cmd::hacks::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
        Commands::Session => cmd::session::run(&root),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
