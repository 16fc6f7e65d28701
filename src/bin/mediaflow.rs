//! Mediaflow CLI: inspect and process media files.
//!
//! Usage:
//!   mediaflow info <file> [--mime type]
//!   mediaflow make <file> --out <path> [--preset name | --step op[=args]...] [--overwrite]
//!   mediaflow which <command>
//!   mediaflow filters [category]

use clap::{Parser, Subcommand};
use mediaflow::adapter::resolve_executable;
use mediaflow::{Environment, Instruction, Item, MediaConfig, MediaError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "mediaflow",
    version,
    about = "Adapter-driven media processing"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a file is classified and which adapters it gets
    Info {
        /// File to inspect
        file: PathBuf,
        /// Use this MIME type instead of detecting one
        #[arg(long)]
        mime: Option<String>,
    },
    /// Run a preset or a list of steps and store the result
    Make {
        /// Input file
        file: PathBuf,
        /// Destination; the extension follows the resulting MIME type
        #[arg(long, short)]
        out: PathBuf,
        /// Named preset configured for the file's category
        #[arg(long, conflicts_with = "step")]
        preset: Option<String>,
        /// Step as `operation` or `operation=arg,arg`; repeatable
        #[arg(long)]
        step: Vec<String>,
        /// Replace an existing destination
        #[arg(long)]
        overwrite: bool,
        /// Use this MIME type instead of detecting one
        #[arg(long)]
        mime: Option<String>,
    },
    /// Resolve an external command the way adapters do
    Which {
        /// Command name
        command: String,
    },
    /// List configured presets
    Filters {
        /// Only this category
        category: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// User configuration file (~/.config/mediaflow/config.yaml)
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mediaflow").join("config.yaml"))
}

fn load_config(path: Option<PathBuf>) -> Result<MediaConfig, MediaError> {
    match path {
        Some(path) => MediaConfig::load(&path),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(path) => MediaConfig::load(&path),
            None => Ok(MediaConfig::default()),
        },
    }
}

fn cmd_info(env: &Arc<Environment>, file: &Path, mime: Option<&str>) -> i32 {
    let item = match Item::open(env, file.to_path_buf(), mime) {
        Ok(item) => item,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    println!("file:       {}", file.display());
    println!("mime type:  {}", item.mime_type());
    println!("category:   {}", item.category());
    println!("short code: {}", item.short_code());
    let attached = item.registry().attached();
    if attached.is_empty() {
        println!("adapters:   (none)");
    } else {
        println!("adapters:   {}", attached.join(", "));
    }
    for (who, message) in item.registry().errors() {
        eprintln!("Warning: {}: {}", who, message);
    }
    0
}

fn cmd_make(
    env: &Arc<Environment>,
    file: &Path,
    out: &Path,
    preset: Option<&str>,
    steps: &[String],
    overwrite: bool,
    mime: Option<&str>,
) -> i32 {
    let instructions: Vec<Instruction> = match steps.iter().map(|s| Instruction::parse(s)).collect() {
        Ok(instructions) => instructions,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let result = match preset {
        Some(preset) => mediaflow::make_preset(env, file.to_path_buf(), mime, preset),
        None => mediaflow::make(env, file.to_path_buf(), mime, &instructions),
    };
    let mut item = match result {
        Ok(item) => item,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    match item.store(out, overwrite) {
        Ok(path) => {
            println!("Stored {} as {}", item.mime_type(), path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_which(env: &Arc<Environment>, command: &str) -> i32 {
    match resolve_executable(command, env.search_paths()) {
        Some(path) => {
            println!("{}", path.display());
            0
        }
        None => {
            eprintln!("Error: command '{}' not found", command);
            1
        }
    }
}

fn cmd_filters(env: &Arc<Environment>, category: Option<&str>) -> i32 {
    let known = env.categories().categories();
    if let Some(category) = category {
        if !known.contains(&category) {
            eprintln!("Error: unknown category '{}'", category);
            return 1;
        }
    }

    let filters = &env.config().filters;
    for name in known {
        if category.is_some_and(|c| c != name) {
            continue;
        }
        let Some(presets) = filters.get(name) else {
            if category.is_some() {
                println!("{}: no presets", name);
            }
            continue;
        };
        println!("{}:", name);
        for (preset, instructions) in presets {
            let steps: Vec<String> = instructions.iter().map(|i| i.to_string()).collect();
            println!("  {:<4} {}", preset, steps.join(" -> "));
        }
    }
    0
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let env = Environment::new(config);

    let code = match cli.command {
        Commands::Info { file, mime } => cmd_info(&env, &file, mime.as_deref()),
        Commands::Make {
            file,
            out,
            preset,
            step,
            overwrite,
            mime,
        } => cmd_make(
            &env,
            &file,
            &out,
            preset.as_deref(),
            &step,
            overwrite,
            mime.as_deref(),
        ),
        Commands::Which { command } => cmd_which(&env, &command),
        Commands::Filters { category } => cmd_filters(&env, category.as_deref()),
    };
    std::process::exit(code);
}
