//! Main CLI application

use crate::config::{load_project_auto, load_project_file, validate_config, Config, Project};
use crate::error::{ConfigError, RassetsError};
use crate::runner::{execute, pipeline_definitions, resolve, BuildMode, Context, TaskName};
use crate::ui::{Reporter, Verbosity};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const BIN_NAME: &str = "rassets";
const COMPLETIONS: &str = "completions";

/// CLI application
pub struct App {
    /// The clap command
    command: Command,
    /// Loaded project
    project: Project,
}

impl App {
    /// Create a new app by searching for a config file
    pub fn new() -> Result<Self, RassetsError> {
        Self::from_project(load_project_auto()?)
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self, RassetsError> {
        Self::from_project(load_project_file(&path)?)
    }

    fn from_project(project: Project) -> Result<Self, RassetsError> {
        // Command templates may reference variables the .env file provides
        load_env_file(&project.root)?;
        validate_config(&project.config)?;
        let command = build_command(&project.config);
        Ok(App { command, project })
    }

    /// Run the application with command line arguments
    pub fn run<I, T>(mut self, args: I) -> Result<(), RassetsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = match self.command.clone().try_get_matches_from(args) {
            Ok(matches) => matches,
            Err(e) => return handle_parse_error(e),
        };

        let reporter = Reporter::new(get_verbosity(&matches));
        init_logging(&reporter);

        if let Some((COMPLETIONS, sub)) = matches.subcommand() {
            let shell = sub
                .get_one::<Shell>("shell")
                .copied()
                .ok_or_else(|| ConfigError::Invalid("missing shell".to_string()))?;
            clap_complete::generate(shell, &mut self.command, BIN_NAME, &mut io::stdout());
            return Ok(());
        }

        let Project { config, root, config_path } = self.project;
        match &config_path {
            Some(path) => tracing::debug!(config = %path.display(), "loaded config"),
            None => tracing::debug!(root = %root.display(), "no config file, using defaults"),
        }

        let target = match matches.subcommand() {
            Some((name, _)) => name.to_string(),
            None => config.default.clone(),
        };

        let mut ctx = Context::new(root, config)
            .with_mode(BuildMode::from_flag(matches.get_flag("prod")))
            .with_reporter(reporter);
        if let Some(port) = matches.get_one::<u16>("port") {
            ctx = ctx.with_port(*port);
        }

        let plan = resolve(&target, &ctx.config)?;
        tracing::debug!(target = %target, mode = ctx.mode.as_str(), "running");
        execute(&plan, &ctx)?;

        Ok(())
    }
}

/// Build the clap command from configuration
fn build_command(config: &Config) -> Command {
    let mut cmd = Command::new(BIN_NAME)
        .version(env!("CARGO_PKG_VERSION"))
        .about(config.usage.clone().unwrap_or_else(|| {
            "A YAML-configured front-end asset pipeline".to_string()
        }))
        .after_help(format!(
            "Runs '{}' when no task is given.",
            config.default
        ))
        .arg(
            Arg::new("prod")
                .long("prod")
                .help("Build for production: minify, optimize, no source maps")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to rassets.yml config file")
                .global(true),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Live-reload server port")
                .value_parser(value_parser!(u16))
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        );

    // Add subcommands for each built-in task
    for task in TaskName::ALL {
        cmd = cmd.subcommand(Command::new(task.as_str()).about(task.about()));
    }

    // And for each pipeline
    for (name, steps) in pipeline_definitions(config) {
        let names: Vec<&str> = steps.iter().flat_map(|s| s.names()).collect();
        cmd = cmd.subcommand(
            Command::new(name).about(format!("Pipeline: {}", names.join(", "))),
        );
    }

    cmd.subcommand(
        Command::new(COMPLETIONS)
            .about("Print a shell completion script")
            .arg(
                Arg::new("shell")
                    .value_name("SHELL")
                    .required(true)
                    .value_parser(value_parser!(Shell)),
            ),
    )
}

/// Help and version go to stdout; anything else becomes an error
fn handle_parse_error(e: clap::Error) -> Result<(), RassetsError> {
    match e.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            e.print()?;
            Ok(())
        }
        ErrorKind::InvalidSubcommand => {
            let name = match e.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => name.clone(),
                _ => String::new(),
            };
            Err(ConfigError::TaskNotFound(name).into())
        }
        _ => {
            let rendered = e.render().to_string();
            let message = rendered
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ")
                .to_string();
            Err(ConfigError::Invalid(message).into())
        }
    }
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Install the tracing subscriber; `RASSETS_LOG` overrides the verbosity default
fn init_logging(reporter: &Reporter) {
    let filter = EnvFilter::try_from_env("RASSETS_LOG")
        .unwrap_or_else(|_| EnvFilter::new(reporter.default_log_filter()));

    // A subscriber may already be installed when embedded or under test
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Load `.env` from the project root when present
fn load_env_file(root: &std::path::Path) -> Result<(), RassetsError> {
    let path = root.join(".env");
    if !path.is_file() {
        return Ok(());
    }
    dotenvy::from_path(&path).map_err(|e| ConfigError::ReadFile {
        path: path.clone(),
        error: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "loaded environment file");
    Ok(())
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), RassetsError> {
    run_from(std::env::args().collect())
}

/// Run the CLI application with explicit arguments
pub fn run_from(args: Vec<String>) -> Result<(), RassetsError> {
    let app = match extract_file_arg(&args) {
        Some(path) => App::with_config_file(path)?,
        None => App::new()?,
    };

    app.run(args)
}

/// Extract --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for (i, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix("--file=") {
            return Some(PathBuf::from(value));
        }
        if (arg == "--file" || arg == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}
