use std::env;
use std::io;
use std::path;

use anyhow::bail;
use anyhow::Result;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendBox;
use crate::domain::models::FileHandle;
use crate::domain::services::actions::help_text;
use crate::domain::services::Orchestrator;
use crate::infrastructure::backends::BackendManager;

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
    std::process::exit(0);
}

/// Directory the debug log is written to when `RUST_LOG` mentions uploadit.
pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = env::var("UPLOADIT_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("uploadit");
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(&config_file_path).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

async fn ask_questions(
    orchestrator: &mut Orchestrator,
    backend: &BackendBox,
    files: &[String],
    questions: &[String],
) -> Result<()> {
    orchestrator.refresh_files(backend).await?;

    if !files.is_empty() {
        let handles = files
            .iter()
            .map(|e| return FileHandle::from_path(e))
            .collect::<Result<Vec<FileHandle>>>()?;
        orchestrator.select_files(handles);

        let outcome = orchestrator.submit_upload(backend).await?;
        if outcome.needs_refresh {
            orchestrator.refresh_files(backend).await?;
        }

        let names = orchestrator
            .uploads()
            .uploaded_files()
            .iter()
            .map(|e| return e.name.to_string())
            .collect::<Vec<String>>()
            .join(", ");
        eprintln!("{} {names}", Paint::green("Uploaded:").bold());
    }

    for question in questions {
        if let Some(turn) = orchestrator.ask(backend, question).await? {
            println!("{} {}", Paint::cyan("Q:").bold(), turn.question);
            println!("{} {}\n", Paint::green("A:").bold(), turn.answer);
        }
    }

    return Ok(());
}

/// Runs one session without the terminal UI: upload, ask every question in order,
/// then clear the session unless asked to keep it.
async fn run_ask(ask_matches: &ArgMatches) -> Result<()> {
    let files = ask_matches
        .get_many::<String>("file")
        .map(|e| return e.cloned().collect::<Vec<String>>())
        .unwrap_or_default();
    let questions = ask_matches
        .get_many::<String>("question")
        .map(|e| return e.cloned().collect::<Vec<String>>())
        .unwrap_or_default();
    let keep_session = ask_matches.get_flag("keep-session");

    let backend = BackendManager::get()?;
    backend.health_check().await?;

    let mut orchestrator = Orchestrator::default();
    let session_id = orchestrator.initialize(&backend).await?;
    tracing::debug!(session_id = %session_id, "Non-interactive session started");

    let res = ask_questions(&mut orchestrator, &backend, &files, &questions).await;

    if keep_session {
        eprintln!("{} {session_id}", Paint::yellow("Session kept:").bold());
    } else if let Err(err) = orchestrator.clear_session(&backend).await {
        eprintln!(
            "{}",
            Paint::yellow(format!("Session {session_id} could not be cleared: {err}"))
        );
    }

    return res;
}

fn subcommand_ask() -> Command {
    return Command::new("ask")
        .about("Uploads documents into a fresh session and asks questions about them without starting the chat UI.")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .help("Document to upload before asking. Can be repeated.")
                .action(ArgAction::Append)
                .num_args(1),
        )
        .arg(
            Arg::new("question")
                .help("Questions to ask, in order.")
                .action(ArgAction::Append)
                .num_args(1..)
                .required(true),
        )
        .arg(
            Arg::new("keep-session")
                .long("keep-session")
                .help("Leave the session and its documents on the backend when done.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for UploadiT")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running UploadiT with environment variable RUST_LOG=uploadit")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_timeout(key: ConfigKey, env: &'static str, description: &str) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(env)
        .num_args(1)
        .help(format!(
            "{description} [default: {}]",
            Config::default(key)
        ))
        .global(true);
}

pub fn build() -> Command {
    let commands_text = help_text()
        .split('\n')
        .map(|line| {
            if line.starts_with('-') {
                return format!("  {line}");
            }
            if line.starts_with("COMMANDS:") || line.starts_with("HOTKEYS:") {
                return Paint::new(format!("CHAT {line}"))
                    .underline()
                    .bold()
                    .to_string();
            }
            return line.to_string();
        })
        .collect::<Vec<String>>()
        .join("\n");

    let about = format!(
        "{}\n\nVersion: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
    );

    return Command::new("uploadit")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .after_help(commands_text)
        .arg_required_else_help(false)
        .subcommand(Command::new("chat").about("Start a new chat session in the terminal UI."))
        .subcommand(subcommand_ask())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::BackendURL.to_string())
                .short('u')
                .long(ConfigKey::BackendURL.to_string())
                .env("UPLOADIT_BACKEND_URL")
                .num_args(1)
                .help(format!("Base URL of the document question-answering API. [default: {}]", Config::default(ConfigKey::BackendURL)))
                .global(true),
        )
        .arg(arg_timeout(
            ConfigKey::BackendHealthCheckTimeout,
            "UPLOADIT_BACKEND_HEALTH_CHECK_TIMEOUT",
            "Time to wait in milliseconds before timing out when checking the backend is up.",
        ))
        .arg(arg_timeout(
            ConfigKey::RequestTimeout,
            "UPLOADIT_REQUEST_TIMEOUT",
            "Time to wait in milliseconds for session, upload, file listing and clear requests.",
        ))
        .arg(arg_timeout(
            ConfigKey::AskTimeout,
            "UPLOADIT_ASK_TIMEOUT",
            "Time to wait in milliseconds for an answer to a question.",
        ))
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env("UPLOADIT_CONFIG_FILE")
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true),
        )
        .arg(
            Arg::new(ConfigKey::Username.to_string())
                .long(ConfigKey::Username.to_string())
                .env("UPLOADIT_USERNAME")
                .num_args(1)
                .help("Your user name displayed above your questions. [default: $USER]")
                .global(true),
        );
}

/// Returns true when the chat UI should start.
pub async fn parse() -> Result<bool> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    println!("{}", log_dir().join("debug.log").to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    println!("{}", ConfigKey::VARIANTS.join("\n"));
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(false);
        }
        Some(("chat", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
        }
        Some(("ask", subcmd_matches)) => {
            Config::load(vec![&matches, subcmd_matches]).await?;
            run_ask(subcmd_matches).await?;
            return Ok(false);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(false);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(false);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(false);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(false);
            }
        },
        _ => {
            Config::load(vec![&matches]).await?;
        }
    }

    return Ok(true);
}
