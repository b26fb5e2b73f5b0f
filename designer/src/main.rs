//! Agent network designer CLI.
//!
//! Validates JSON network definitions, renders them to HOCON and registers
//! the rendered files in the project manifest. Definitions can also be built
//! up one edit at a time with the editor subcommands.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use designer::create::{CreateOutcome, RenderOutcome, create_network, render_checked};
use designer::exit_codes;
use designer::io::config::{DesignerConfig, load_config};
use designer::io::definition::{load_definition, load_definition_or_empty, write_definition};
use designer::io::init::{InitOptions, config_path, init_designer};
use designer::io::registry::{FsRegistry, load_from_registry};
use designer::logging;
use designer::network::Network;
use designer::validate::validate_file;

#[derive(Parser)]
#[command(
    name = "designer",
    version,
    about = "Validate, render and register hierarchical agent networks"
)]
struct Cli {
    /// Project root holding `designer.toml` and the output directory.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Config file path (defaults to `<root>/designer.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write `designer.toml`, the output directory and an empty manifest.
    Init {
        /// Overwrite existing config and reset the manifest.
        #[arg(short, long)]
        force: bool,
    },
    /// Report defects and warnings for a definition.
    Validate { definition: PathBuf },
    /// Render a definition to stdout without touching the registry.
    Render {
        definition: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Render a definition, write it to the output directory and register it.
    Create {
        definition: PathBuf,
        #[arg(long)]
        name: String,
    },
    /// Read a registered network back into a definition file.
    Import {
        /// Network name the document was created under.
        name: String,
        definition: PathBuf,
    },
    /// Replace a definition with one empty agent per name.
    New {
        definition: PathBuf,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Add an empty agent (or reset an existing one).
    AddAgent { definition: PathBuf, name: String },
    /// Set an agent's instructions.
    SetInstructions {
        definition: PathBuf,
        name: String,
        instructions: String,
    },
    /// Set an agent's down-chains, in order. No children makes it a leaf.
    SetDownChains {
        definition: PathBuf,
        name: String,
        down_chains: Vec<String>,
    },
}

/// Error paired with the exit code it maps to.
struct Failure {
    code: i32,
    error: anyhow::Error,
}

trait ExitCode<T> {
    fn or_exit(self, code: i32) -> Result<T, Failure>;
}

impl<T> ExitCode<T> for anyhow::Result<T> {
    fn or_exit(self, code: i32) -> Result<T, Failure> {
        self.map_err(|error| Failure { code, error })
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(failure) => {
            eprintln!("{:#}", failure.error);
            failure.code
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32, Failure> {
    let cfg_path = cli.config.clone().unwrap_or_else(|| config_path(&cli.root));
    match cli.command {
        Command::Init { force } => cmd_init(&cli.root, &cfg_path, force),
        Command::Validate { definition } => {
            let config = load_config(&cfg_path).or_exit(exit_codes::INVALID)?;
            cmd_validate(&definition, &config)
        }
        Command::Render { definition, name } => {
            let config = load_config(&cfg_path).or_exit(exit_codes::INVALID)?;
            cmd_render(&definition, &name, &config)
        }
        Command::Create { definition, name } => {
            let config = load_config(&cfg_path).or_exit(exit_codes::INVALID)?;
            cmd_create(&cli.root, &definition, &name, &config)
        }
        Command::Import { name, definition } => {
            let config = load_config(&cfg_path).or_exit(exit_codes::INVALID)?;
            let registry = FsRegistry::from_config(&cli.root, &config);
            let network = load_from_registry(&registry, &name).or_exit(exit_codes::INVALID)?;
            save(&definition, &network)
        }
        Command::New { definition, names } => {
            let network = Network::with_agents(names.as_slice()).or_exit(exit_codes::INVALID)?;
            save(&definition, &network)
        }
        Command::AddAgent { definition, name } => {
            let mut network = load_definition_or_empty(&definition).or_exit(exit_codes::INVALID)?;
            network.add_agent(&name).or_exit(exit_codes::INVALID)?;
            save(&definition, &network)
        }
        Command::SetInstructions {
            definition,
            name,
            instructions,
        } => edit(&definition, |network| {
            network.set_instructions(&name, &instructions)
        }),
        Command::SetDownChains {
            definition,
            name,
            down_chains,
        } => edit(&definition, |network| {
            network.set_down_chains(&name, down_chains.as_slice())
        }),
    }
}

fn cmd_init(root: &Path, cfg_path: &Path, force: bool) -> Result<i32, Failure> {
    // A custom --config that already exists seeds the new layout.
    let config = if cfg_path.exists() && cfg_path != config_path(root) {
        load_config(cfg_path).or_exit(exit_codes::INVALID)?
    } else {
        DesignerConfig::default()
    };
    let paths = init_designer(root, &config, &InitOptions { force }).or_exit(exit_codes::INVALID)?;
    println!("{}", paths.manifest_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(definition: &Path, config: &DesignerConfig) -> Result<i32, Failure> {
    let outcome =
        validate_file(definition, &config.validation_options()).or_exit(exit_codes::INVALID)?;
    for warning in &outcome.warnings {
        println!("Warning: {warning}");
    }
    if !outcome.is_valid() {
        print_defects(&outcome.defects);
        return Ok(exit_codes::INVALID);
    }
    println!("valid: {}", definition.display());
    Ok(exit_codes::OK)
}

fn cmd_render(definition: &Path, name: &str, config: &DesignerConfig) -> Result<i32, Failure> {
    let network = load_definition(definition).or_exit(exit_codes::INVALID)?;
    match render_checked(&network, name, config).or_exit(exit_codes::INVALID)? {
        RenderOutcome::Rejected { defects } => {
            print_defects(&defects);
            Ok(exit_codes::INVALID)
        }
        RenderOutcome::Rendered { document } => {
            print!("{document}");
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_create(
    root: &Path,
    definition: &Path,
    name: &str,
    config: &DesignerConfig,
) -> Result<i32, Failure> {
    let network = load_definition(definition).or_exit(exit_codes::INVALID)?;
    let registry = FsRegistry::from_config(root, config);
    match create_network(&registry, &network, name, config).or_exit(exit_codes::STORAGE)? {
        CreateOutcome::Rejected { defects } => {
            print_defects(&defects);
            Ok(exit_codes::INVALID)
        }
        CreateOutcome::Created { publish, .. } => {
            println!("{}", publish.document_path.display());
            Ok(exit_codes::OK)
        }
    }
}

/// Load `definition`, apply one edit and write it back.
fn edit(
    definition: &Path,
    apply: impl FnOnce(&mut Network) -> anyhow::Result<()>,
) -> Result<i32, Failure> {
    let mut network = load_definition(definition).or_exit(exit_codes::INVALID)?;
    apply(&mut network).or_exit(exit_codes::INVALID)?;
    save(definition, &network)
}

fn save(definition: &Path, network: &Network) -> Result<i32, Failure> {
    write_definition(definition, network)
        .with_context(|| format!("save definition {}", definition.display()))
        .or_exit(exit_codes::STORAGE)?;
    Ok(exit_codes::OK)
}

fn print_defects(defects: &[String]) {
    for defect in defects {
        println!("Error: {defect}");
    }
}
