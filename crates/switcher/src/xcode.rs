//! Xcode utilities
//!
//! Locates the selected Xcode and starts or stops it. Every external command
//! goes through the injected [`CommandRunner`].

use crate::architecture::Architecture;
use crate::error::{ArchError, Result};
use crate::version::Version;
use std::path::{Path, PathBuf};
use std::time::Duration;
use xcode_arch_core::config::XcodeConfig;
use xcode_arch_core::process::CommandRunner;

pub const XCODE_SELECT: &str = "/usr/bin/xcode-select";
pub const XCODEBUILD: &str = "/usr/bin/xcodebuild";
pub const KILLALL: &str = "/usr/bin/killall";
pub const OPEN: &str = "/usr/bin/open";
pub const UNAME: &str = "/usr/bin/uname";

const DEVELOPER_DIR_SUFFIX: &str = "/Contents/Developer";

/// Controls the Xcode selected with `xcode-select`
#[derive(Debug, Clone)]
pub struct Xcode<R> {
    runner: R,
    process_name: String,
    kill_grace: Duration,
}

impl<R: CommandRunner> Xcode<R> {
    pub fn with_config(runner: R, config: &XcodeConfig) -> Self {
        Self {
            runner,
            process_name: config.process_name.clone(),
            kill_grace: Duration::from_millis(config.kill_grace_ms),
        }
    }

    /// Path of the selected Xcode application, e.g. `/Applications/Xcode.app`
    pub fn current_path(&self) -> Result<PathBuf> {
        let result = self.runner.run_checked(XCODE_SELECT, &["-p"])?;
        let developer_dir = result.stdout_trimmed();

        // Command line tools alone have no application to switch
        developer_dir
            .strip_suffix(DEVELOPER_DIR_SUFFIX)
            .filter(|app| !app.is_empty())
            .map(PathBuf::from)
            .ok_or(ArchError::UnknownXcodePath)
    }

    /// Version of the selected Xcode, from the first line of `xcodebuild -version`
    pub fn current_version(&self) -> Result<Version> {
        let result = self.runner.run_checked(XCODEBUILD, &["-version"])?;
        let version = result
            .stdout_trimmed()
            .lines()
            .next()
            .and_then(|line| line.split_whitespace().last())
            .ok_or(ArchError::UnknownXcodePath)?;

        Ok(Version::parse(version)?)
    }

    /// Architecture of the machine, as seen by this process
    pub fn host_architecture(&self) -> Result<Architecture> {
        let result = self.runner.run_checked(UNAME, &["-m"])?;
        result.stdout_trimmed().trim().parse()
    }

    /// Terminate running instances. Returns `false` when none were running.
    pub fn kill(&self) -> Result<bool> {
        let result = self.runner.run(KILLALL, &[self.process_name.as_str()])?;
        if !result.success {
            tracing::debug!(
                process = %self.process_name,
                stderr = %result.stderr.trim(),
                "Nothing to terminate"
            );
            return Ok(false);
        }

        // Give the process time to exit before anything relaunches it
        if !self.kill_grace.is_zero() {
            std::thread::sleep(self.kill_grace);
        }
        Ok(true)
    }

    /// Launch the application at `path`
    pub fn launch(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        self.runner.run_checked(OPEN, &[path.as_ref()])?;
        Ok(())
    }

    /// Launch the selected Xcode
    pub fn launch_current(&self) -> Result<()> {
        let path = self.current_path()?;
        self.launch(&path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use xcode_arch_core::process::{command_line, CommandResult};

    /// Replays registered outputs and records every command it receives
    #[derive(Default)]
    pub(crate) struct MockRunner {
        outputs: HashMap<String, CommandResult>,
        received: RefCell<Vec<String>>,
    }

    impl MockRunner {
        pub(crate) fn register(mut self, command: &str, output: &str) -> Self {
            self.outputs.insert(command.to_string(), CommandResult::ok(output));
            self
        }

        pub(crate) fn register_failure(mut self, command: &str, exit_code: i32, stderr: &str) -> Self {
            self.outputs
                .insert(command.to_string(), CommandResult::failed(exit_code, stderr));
            self
        }

        pub(crate) fn received(&self) -> Vec<String> {
            self.received.borrow().clone()
        }
    }

    impl CommandRunner for MockRunner {
        fn run(&self, program: &str, args: &[&str]) -> xcode_arch_core::Result<CommandResult> {
            let command = command_line(program, args);
            self.received.borrow_mut().push(command.clone());
            self.outputs
                .get(&command)
                .cloned()
                .ok_or_else(|| xcode_arch_core::Error::command_not_found(program))
        }
    }

    fn xcode(runner: &MockRunner) -> Xcode<&MockRunner> {
        let config = XcodeConfig {
            kill_grace_ms: 0,
            ..XcodeConfig::default()
        };
        Xcode::with_config(runner, &config)
    }

    #[test]
    fn test_current_path() {
        let runner = MockRunner::default()
            .register("/usr/bin/xcode-select -p", "/Applications/Xcode.app/Contents/Developer\n");

        let path = xcode(&runner).current_path().unwrap();
        assert_eq!(path, PathBuf::from("/Applications/Xcode.app"));
        assert_eq!(runner.received(), vec!["/usr/bin/xcode-select -p"]);
    }

    #[test]
    fn test_current_path_without_xcode() {
        let runner = MockRunner::default()
            .register("/usr/bin/xcode-select -p", "/Library/Developer/CommandLineTools\n");
        assert!(matches!(xcode(&runner).current_path(), Err(ArchError::UnknownXcodePath)));

        let runner = MockRunner::default().register("/usr/bin/xcode-select -p", "/Contents/Developer");
        assert!(matches!(xcode(&runner).current_path(), Err(ArchError::UnknownXcodePath)));
    }

    #[test]
    fn test_current_path_command_failure() {
        let runner = MockRunner::default().register_failure("/usr/bin/xcode-select -p", 2, "error");
        let err = xcode(&runner).current_path().unwrap_err();
        assert!(matches!(err, ArchError::ExecutionFailed(_)));
    }

    #[test]
    fn test_current_version() {
        let runner = MockRunner::default()
            .register("/usr/bin/xcodebuild -version", "Xcode 14.2\nBuild version 14C18\n");
        assert_eq!(xcode(&runner).current_version().unwrap(), Version::new(14, 2, 0));

        let runner = MockRunner::default().register("/usr/bin/xcodebuild -version", "");
        assert!(matches!(xcode(&runner).current_version(), Err(ArchError::UnknownXcodePath)));

        let runner = MockRunner::default().register("/usr/bin/xcodebuild -version", "Xcode 15 beta\n");
        assert!(matches!(xcode(&runner).current_version(), Err(ArchError::Parse(_))));
    }

    #[test]
    fn test_host_architecture() {
        let runner = MockRunner::default().register("/usr/bin/uname -m", "arm64\n");
        assert_eq!(xcode(&runner).host_architecture().unwrap(), Architecture::Arm64);

        let runner = MockRunner::default().register("/usr/bin/uname -m", "i386\n");
        assert!(matches!(
            xcode(&runner).host_architecture(),
            Err(ArchError::InvalidArchitecture(label)) if label == "i386"
        ));
    }

    #[test]
    fn test_launch_xcode() {
        let runner = MockRunner::default()
            .register("/usr/bin/xcode-select -p", "/Applications/Xcode.app/Contents/Developer")
            .register("/usr/bin/open /Applications/Xcode.app", "");

        xcode(&runner).launch_current().unwrap();
        assert_eq!(
            runner.received(),
            vec!["/usr/bin/xcode-select -p", "/usr/bin/open /Applications/Xcode.app"]
        );
    }

    #[test]
    fn test_launch_xcode_with_path() {
        let runner = MockRunner::default().register("/usr/bin/open /Applications/Xcode.app", "");

        xcode(&runner).launch(Path::new("/Applications/Xcode.app")).unwrap();
        assert_eq!(runner.received(), vec!["/usr/bin/open /Applications/Xcode.app"]);
    }

    #[test]
    fn test_kill_xcode() {
        let runner = MockRunner::default().register("/usr/bin/killall Xcode", "");

        assert!(xcode(&runner).kill().unwrap());
        assert_eq!(runner.received(), vec!["/usr/bin/killall Xcode"]);
    }

    #[test]
    fn test_kill_when_not_running() {
        let runner = MockRunner::default()
            .register_failure("/usr/bin/killall Xcode", 1, "No matching processes belonging to you were found\n");
        assert!(!xcode(&runner).kill().unwrap());
    }
}
