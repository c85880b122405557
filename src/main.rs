use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use verity::{
    Bindings, JsonMessageValidator, Message, ValidationError, ValidatorConfig,
    XmlMessageValidator,
};

#[derive(Parser)]
#[command(
    name = "verity",
    version,
    about = "Validate a received message against a control message"
)]
struct Cli {
    /// Raise the log level (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an XML payload
    Xml(Inputs),
    /// Validate a JSON payload
    Json(Inputs),
}

#[derive(Args)]
struct Inputs {
    /// File holding the received payload
    #[arg(long)]
    received: PathBuf,

    /// File holding the control payload
    #[arg(long)]
    control: Option<PathBuf>,

    /// JSON configuration file (ignore expressions, namespaces, assertions, variables)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn read_message(path: &Path) -> Result<Message, ValidationError> {
    fs::read_to_string(path).map(Message::new).map_err(|e| {
        ValidationError::Configuration(format!("Failed to read '{}': {}", path.display(), e))
    })
}

fn run(command: &Commands) -> Result<(), ValidationError> {
    let (Commands::Xml(inputs) | Commands::Json(inputs)) = command;

    let config = match &inputs.config {
        Some(path) => ValidatorConfig::from_file(path)?,
        None => ValidatorConfig::default(),
    };
    let bindings = Bindings::new().with_variables(config.variables.clone());
    let received = read_message(&inputs.received)?;
    let control = inputs.control.as_deref().map(read_message).transpose()?;

    match command {
        Commands::Xml(_) => XmlMessageValidator::new(&bindings).validate(
            &received,
            control.as_ref(),
            &config.xml,
        ),
        Commands::Json(_) => JsonMessageValidator::new(&bindings).validate(
            &received,
            control.as_ref(),
            &config.json,
        ),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli.command) {
        Ok(()) => {
            println!("Validation successful");
            ExitCode::SUCCESS
        }
        Err(e) if e.is_mismatch() => {
            eprintln!("Validation failed: {}", e);
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(2)
        }
    }
}
