// src/main.rs
use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use planvis::{
    config::{Config, ScenarioConfig},
    controllers::{LogSurface, Player, Scheduler},
    errors::SettingsError,
    models::PlanModel,
    services::{write_template, CompiledScenario, PlanCompiler},
    views::DisplayOptions,
};

/// Compile a plan into map animations and play them back.
#[derive(Parser, Debug)]
#[command(name = "planvis", version)]
struct Cli {
    /// Settings file (default: config.toml next to the executable, then in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    inputs: InputArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug, Default)]
struct InputArgs {
    /// PDDL domain file
    #[arg(long, global = true)]
    domain: Option<PathBuf>,

    /// PDDL problem file
    #[arg(long, global = true)]
    problem: Option<PathBuf>,

    /// Plan file, one `<index>: (<ACTION> <args>...)` step per line
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    /// Scenario configuration (.yml, .yaml or .json)
    #[arg(long, global = true)]
    scenario: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play the compiled animations tick by tick (default)
    Play(PlayArgs),

    /// Print the compiled animation instances as JSON
    Compile {
        /// Write to this file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Write a scenario skeleton for the domain
    Template {
        /// Output directory (default: [paths] template_directory)
        #[arg(long, short = 'd')]
        dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Default)]
struct PlayArgs {
    /// Jump to this tick before playing
    #[arg(long)]
    seek: Option<u32>,

    /// Speed multiplier, values below 1 are treated as 1
    #[arg(long)]
    speed: Option<u32>,

    /// Do not sleep between ticks
    #[arg(long)]
    no_wait: bool,

    #[arg(long)]
    show_name: bool,

    #[arg(long)]
    show_position: bool,

    /// Entity the surface should follow
    #[arg(long)]
    focus: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_settings(cli.config.as_deref())?;

    match cli.command.unwrap_or(Command::Play(PlayArgs::default())) {
        Command::Play(args) => play(&config, &cli.inputs, args),
        Command::Compile { output } => compile_to_json(&config, &cli.inputs, output.as_deref()),
        Command::Template { dir } => template(&config, &cli.inputs, dir),
    }
}

/************************* Settings and inputs ********************/

fn load_settings(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to read settings from {}", path.display())),
        None => match Config::load() {
            Ok(config) => Ok(config),
            Err(SettingsError::NotFound) => {
                warn!("no config.toml found, using defaults");
                Ok(Config::default())
            }
            Err(err) => Err(err).context("failed to read config.toml"),
        },
    }
}

/// Command line path if given, otherwise the configured one.
fn input_path(given: &Option<PathBuf>, configured: &str, resolved: PathBuf, what: &str) -> anyhow::Result<PathBuf> {
    if let Some(path) = given {
        return Ok(path.clone());
    }
    if configured.is_empty() {
        bail!("no {what} given: pass --{what} or set it under [paths] in config.toml");
    }
    Ok(resolved)
}

fn load_model(config: &Config, inputs: &InputArgs, with_plan: bool) -> anyhow::Result<PlanModel> {
    let domain = input_path(&inputs.domain, &config.paths.domain_file, config.resolve_domain_path(), "domain")?;
    let problem = input_path(&inputs.problem, &config.paths.problem_file, config.resolve_problem_path(), "problem")?;
    let plan = if with_plan {
        Some(input_path(&inputs.plan, &config.paths.plan_file, config.resolve_plan_path(), "plan")?)
    } else {
        None
    };

    PlanModel::from_files(domain, problem, plan).context("failed to read the planning inputs")
}

fn compile(config: &Config, inputs: &InputArgs) -> anyhow::Result<CompiledScenario> {
    let model = load_model(config, inputs, true)?;
    let scenario_path = input_path(
        &inputs.scenario,
        &config.paths.scenario_file,
        config.resolve_scenario_path(),
        "scenario",
    )?;
    let scenario = ScenarioConfig::from_path(&scenario_path)
        .with_context(|| format!("invalid scenario {}", scenario_path.display()))?;

    let compiled = PlanCompiler::new(&model, &scenario)
        .with_default_sprite(&config.template.default_sprite)
        .compile()
        .context("failed to compile the plan")?;
    Ok(compiled)
}

/************************* Commands ********************/

fn play(config: &Config, inputs: &InputArgs, args: PlayArgs) -> anyhow::Result<()> {
    let compiled = compile(config, inputs)?;

    let mut display = DisplayOptions::from(config.display);
    display.show_name |= args.show_name;
    display.show_position |= args.show_position;

    let mut scheduler = Scheduler::new(compiled)
        .with_base_interval(config.playback.base_interval())
        .with_display_options(display);
    scheduler.set_speed(args.speed.unwrap_or(config.playback.speed));
    scheduler.set_focus(args.focus.as_deref());

    if let Some(target) = args.seek {
        scheduler.seek(target);
    }

    let mut player = Player::new(scheduler, LogSurface);
    if args.no_wait {
        player = player.without_wait();
    }

    if !config.playback.autostart {
        info!("autostart is off, showing the current state only");
        player.present();
        return Ok(());
    }

    let played = player.run();
    info!(played, "done");
    Ok(())
}

fn compile_to_json(config: &Config, inputs: &InputArgs, output: Option<&Path>) -> anyhow::Result<()> {
    let compiled = compile(config, inputs)?;
    let json = serde_json::to_string_pretty(&compiled.animations)?;

    match output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), animations = compiled.animations.len(), "wrote compiled animations");
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn template(config: &Config, inputs: &InputArgs, dir: Option<PathBuf>) -> anyhow::Result<()> {
    let model = load_model(config, inputs, false)?;
    let dir = dir.unwrap_or_else(|| config.resolve_template_dir());
    let path = write_template(&model, &config.template, &dir)?;
    println!("{}", path.display());
    Ok(())
}
