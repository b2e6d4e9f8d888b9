//! xcode-arch
//!
//! Switches the selected Xcode between running natively and under Rosetta.

use anyhow::Result;
use clap::{ArgGroup, CommandFactory, Parser};
use xcode_arch_cli::output::{self, Status};
use xcode_arch_core::config::Config;
use xcode_arch_core::error::exit_codes;
use xcode_arch_core::process::SystemRunner;
use xcode_arch_switcher::{
    ArchError, Architecture, BookmarkResolver, LaunchServicesStore, PostExecution, RosettaSupport,
    Switcher,
};
use xcode_arch_telemetry::{level_for_verbosity, TelemetryConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xcode-arch")]
#[command(about = "A utility to switch architecture of Xcode.")]
#[command(long_about = "A utility to switch architecture of Xcode.\n\n\
    To check/uncheck 'Open Using Rosetta' is bothering.\n\
    This tool can switch `checked/unchecked` easily.")]
#[command(version)]
#[command(group(
    ArgGroup::new("action")
        .args(["print_current_arch", "switch", "check_rosetta", "uncheck_rosetta"])
))]
#[command(group(
    ArgGroup::new("switching")
        .args(["switch", "check_rosetta", "uncheck_rosetta"])
))]
#[command(group(ArgGroup::new("printing").args(["print_current_arch"])))]
struct Cli {
    /// print current architecture of Xcode
    #[arg(short, long)]
    print_current_arch: bool,

    /// set the architecture for Xcode
    #[arg(short, long, value_enum, value_name = "architecture")]
    switch: Option<Architecture>,

    /// set `x86_64` for Xcode
    #[arg(short, long)]
    check_rosetta: bool,

    /// set `arm64` for Xcode
    #[arg(short, long)]
    uncheck_rosetta: bool,

    /// terminate running Xcode after switching
    #[arg(short, long, requires = "switching")]
    kill: bool,

    /// launch Xcode after switching
    #[arg(short, long, requires = "switching")]
    launch: bool,

    /// Print the current architecture as JSON
    #[arg(long, requires = "printing")]
    json: bool,

    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

enum Action {
    PrintCurrent,
    Switch(Architecture),
}

impl Cli {
    fn action(&self) -> Option<Action> {
        if self.print_current_arch {
            Some(Action::PrintCurrent)
        } else if let Some(arch) = self.switch {
            Some(Action::Switch(arch))
        } else if self.check_rosetta {
            Some(Action::Switch(Architecture::X86_64))
        } else if self.uncheck_rosetta {
            Some(Action::Switch(Architecture::Arm64))
        } else {
            None
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if cli.no_color {
        output::set_color(Some(false));
    }

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            Status::error(&err.to_string());
            exit_code_for(&err)
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32> {
    let config = Config::load(cli.config.as_deref())?;

    let level = level_for_verbosity(&config.schema.general.log_level, cli.verbose);
    xcode_arch_telemetry::init_with_config(TelemetryConfig::with_level(level))?;
    if let Some(path) = &config.path {
        tracing::debug!(path = %path.display(), "Using configuration file");
    }

    let Some(action) = cli.action() else {
        Cli::command().print_help()?;
        return Ok(exit_codes::SUCCESS);
    };

    let store = LaunchServicesStore::from_config(&config.schema.launch_services)?;
    let switcher = Switcher::with_config(SystemRunner, store, BookmarkResolver::new(), &config.schema.xcode)?;

    match action {
        Action::PrintCurrent => run_print_current(&switcher, cli.json),
        Action::Switch(architecture) => run_switch(
            &switcher,
            architecture,
            PostExecution {
                kill: cli.kill,
                launch: cli.launch,
            },
        ),
    }
}

fn run_print_current(switcher: &Switcher<SystemRunner, LaunchServicesStore>, json: bool) -> Result<i32> {
    let current = switcher.current()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&current)?);
    } else {
        Status::success(&current.to_string());
    }

    Ok(exit_codes::SUCCESS)
}

fn run_switch(
    switcher: &Switcher<SystemRunner, LaunchServicesStore>,
    architecture: Architecture,
    post: PostExecution,
) -> Result<i32> {
    let outcome = switcher.switch(architecture, post)?;

    if let Some(warning) = outcome.rosetta.as_ref().and_then(RosettaSupport::warning) {
        Status::warning(&warning);
    }
    Status::success(&outcome.to_string());
    if post.kill && !outcome.killed {
        Status::info("Xcode was not running");
    }

    Ok(exit_codes::SUCCESS)
}

/// Exit code for an error surfaced from `run`
fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<ArchError>() {
        err.exit_code()
    } else if let Some(err) = err.downcast_ref::<xcode_arch_core::Error>() {
        err.code.exit_code()
    } else {
        exit_codes::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_action_from_flags() {
        let cli = Cli::parse_from(["xcode-arch", "-c"]);
        assert!(matches!(cli.action(), Some(Action::Switch(Architecture::X86_64))));

        let cli = Cli::parse_from(["xcode-arch", "--uncheck-rosetta", "--kill"]);
        assert!(matches!(cli.action(), Some(Action::Switch(Architecture::Arm64))));
        assert!(cli.kill);

        let cli = Cli::parse_from(["xcode-arch", "-s", "x86_64", "-l"]);
        assert!(matches!(cli.action(), Some(Action::Switch(Architecture::X86_64))));
        assert!(cli.launch);

        let cli = Cli::parse_from(["xcode-arch", "-p", "--json"]);
        assert!(matches!(cli.action(), Some(Action::PrintCurrent)));

        let cli = Cli::parse_from(["xcode-arch", "-vv"]);
        assert!(cli.action().is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_conflicting_actions() {
        assert!(Cli::try_parse_from(["xcode-arch", "-p", "-c"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "-c", "-u"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "-k"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "-p", "-l"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "-c", "--json"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "--json"]).is_err());
        assert!(Cli::try_parse_from(["xcode-arch", "-s", "i386"]).is_err());
    }

    #[test]
    fn test_exit_code_for() {
        let err = anyhow::Error::from(ArchError::RunningInX86_64);
        assert_eq!(exit_code_for(&err), exit_codes::PLATFORM_ERROR);

        let err = anyhow::Error::from(xcode_arch_core::Error::config_not_found("/tmp/missing.toml"));
        assert_eq!(exit_code_for(&err), exit_codes::CONFIG_ERROR);

        assert_eq!(exit_code_for(&anyhow::anyhow!("other")), exit_codes::FAILURE);
    }
}
