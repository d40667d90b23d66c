//! projmirror CLI
//!
//! Command-line interface for aligning a target project with its source tree.

use anyhow::{Context, Result};
use clap::builder::ValueParser;
use clap::{
    Arg, ArgAction, ArgGroup, ArgMatches, Args, Command, CommandFactory, FromArgMatches, Parser,
};
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use projmirror::profile::{self, PROFILES, TemplateDescriptor};
use projmirror::{Aligner, Config, IgnoreScope, SyncContext};

#[derive(Parser)]
#[command(name = "projmirror")]
#[command(
    author,
    version,
    about = "Mirror a .NET Core source tree into a linked project for another target profile"
)]
struct Cli {
    /// Source project folder (relative to the current directory)
    source: PathBuf,

    #[command(flatten)]
    profile: ProfileArgs,

    /// Path to configuration file (default: <SOURCE>/projmirror.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Apply ignored folder names to the source root only, or at any depth
    #[arg(long, value_enum)]
    ignore_scope: Option<IgnoreScope>,

    /// Show what would be done without making changes
    #[arg(long)]
    dry_run: bool,

    /// Show detailed output
    #[arg(short, long)]
    verbose: bool,
}

const PROFILE_GROUP: &str = "target_profile";
const PROFILE_KEY_ARG: &str = "profile";

/// Target profile selection: one `--<switch>` per entry of [`PROFILES`],
/// or `--profile <KEY>`. At most one may be given.
#[derive(Debug, Default)]
struct ProfileArgs {
    key: Option<String>,
}

impl ProfileArgs {
    fn selected(&self) -> Result<&'static TemplateDescriptor> {
        match self.key.as_deref() {
            Some(key) => Ok(profile::resolve(key)?),
            None => Ok(profile::default_profile()),
        }
    }
}

impl FromArgMatches for ProfileArgs {
    fn from_arg_matches(matches: &ArgMatches) -> Result<Self, clap::Error> {
        let key = PROFILES
            .iter()
            .find(|p| matches.get_flag(p.switch))
            .map(|p| p.key.to_string())
            .or_else(|| matches.get_one::<String>(PROFILE_KEY_ARG).cloned());

        Ok(Self { key })
    }

    fn update_from_arg_matches(&mut self, matches: &ArgMatches) -> Result<(), clap::Error> {
        *self = Self::from_arg_matches(matches)?;
        Ok(())
    }
}

impl Args for ProfileArgs {
    fn augment_args(cmd: Command) -> Command {
        let mut cmd = cmd;
        let mut group = ArgGroup::new(PROFILE_GROUP).multiple(false);

        for (index, p) in PROFILES.iter().enumerate() {
            let default = if index == 0 { " [default]" } else { "" };
            cmd = cmd.arg(
                Arg::new(p.switch)
                    .long(p.switch)
                    .action(ArgAction::SetTrue)
                    .help(format!("Create a {} project{default}", p.description)),
            );
            group = group.arg(p.switch);
        }

        let keys: Vec<&str> = PROFILES.iter().map(|p| p.key).collect();
        cmd.arg(
            Arg::new(PROFILE_KEY_ARG)
                .long(PROFILE_KEY_ARG)
                .value_name("KEY")
                .action(ArgAction::Set)
                .value_parser(ValueParser::string())
                .help(format!(
                    "Select the target profile by key, ignoring case ({})",
                    keys.join(", ")
                )),
        )
        .group(group.arg(PROFILE_KEY_ARG))
    }

    fn augment_args_for_update(cmd: Command) -> Command {
        Self::augment_args(cmd)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n{} {:#}", "✘ Error:".red().bold(), e);
            eprintln!("\n{}", Cli::command().render_usage());
            eprintln!("For more information, try '--help'.");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let working_dir = env::current_dir().context("Failed to determine the current directory")?;
    let profile = cli.profile.selected()?;

    print_header();

    let context = SyncContext::new(&working_dir, &cli.source, profile)?;
    println!(
        "Source project found: {}",
        context.source.marker.display().to_string().cyan()
    );
    println!(
        "Target project: {} ({})\n",
        context.target_name.cyan(),
        profile.description
    );

    let (config, config_path) = Config::resolve(&context.source_dir, cli.config.as_deref())?;
    if cli.verbose
        && let Some(path) = &config_path
    {
        println!("Using config: {}\n", path.display().to_string().dimmed());
    }

    let mut options = config.mirror_options();
    if let Some(scope) = cli.ignore_scope {
        options.ignore_scope = scope;
    }
    options.dry_run = cli.dry_run;
    options.verbose = cli.verbose;

    if options.dry_run {
        println!("{}", "Running in dry-run mode\n".cyan());
    }

    let aligner = Aligner::new(context, options);

    println!("{}", "➤ Preparing target project".cyan().bold());
    let scaffold = aligner.scaffold()?;
    if scaffold.created.is_empty() {
        println!("  {} Target project already in place", "✔".green());
    }

    println!("\n{}", "➤ Mirroring source tree".cyan().bold());
    let mirror = aligner.mirror()?;
    println!(
        "  Links: {}, Directories created: {}, Ignored directories: {}",
        mirror.links.len().to_string().green(),
        mirror.dirs_created.to_string().yellow(),
        mirror.dirs_ignored.to_string().dimmed()
    );
    if cli.verbose {
        for link in &mirror.links {
            println!("    {} {}", link.alias, format!("<- {}", link.include).dimmed());
        }
    }

    println!("\n{}", "➤ Patching target project".cyan().bold());
    match aligner.patch(&mirror.links)? {
        Some(patch) => {
            let verb = if cli.dry_run { "Would write" } else { "Wrote" };
            println!(
                "  {} {} {} items to {} (replaced {})",
                "✔".green(),
                verb,
                patch.written.to_string().green(),
                aligner.manifest_path().display(),
                patch.removed.to_string().dimmed()
            );
        }
        None => println!(
            "  {} Would patch {} once it is created",
            "→".cyan(),
            aligner.manifest_path().display()
        ),
    }

    println!(
        "\n{}",
        "✨ Successfully aligned the target project!".green().bold()
    );

    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_header() {
    println!(
        "{}",
        r#"
╔═══════════════════════════════════════════════════════════════════╗
║                          projmirror                               ║
║          Linked project generation for .NET source trees          ║
╚═══════════════════════════════════════════════════════════════════╝
"#
        .cyan()
        .bold()
    );
}
