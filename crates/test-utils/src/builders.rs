#![allow(dead_code)]

use std::path::PathBuf;

use voyeur::config::{ConfigFile, ConfigSection, RawConfigFile, RawExecutable};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_interval(mut self, secs: u64) -> Self {
        self.config.config.interval = secs;
        self
    }

    pub fn with_config(mut self, section: ConfigSection) -> Self {
        self.config.config = section;
        self
    }

    pub fn with_target(mut self, path: &str) -> Self {
        self.config.watch.targets.push(PathBuf::from(path));
        self
    }

    pub fn with_executable(mut self, exe: RawExecutable) -> Self {
        self.config.executable.push(exe);
        self
    }

    /// The unvalidated config, for exercising validation failures.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RawExecutable`.
pub struct ExecutableBuilder {
    exe: RawExecutable,
}

impl ExecutableBuilder {
    /// A compiled binary built by `build_cmd` into `binary_path`.
    pub fn binary(build_cmd: &[&str], binary_path: &str) -> Self {
        Self {
            exe: RawExecutable {
                build_cmd: Some(build_cmd.iter().map(|s| s.to_string()).collect()),
                binary_path: Some(PathBuf::from(binary_path)),
                ..RawExecutable::default()
            },
        }
    }

    /// A script run in place by `run_cmd`.
    pub fn script(run_cmd: &[&str], script_path: &str) -> Self {
        Self {
            exe: RawExecutable {
                run_cmd: Some(run_cmd.iter().map(|s| s.to_string()).collect()),
                script_path: Some(PathBuf::from(script_path)),
                ..RawExecutable::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.exe.name = Some(name.to_string());
        self
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.exe.args = Some(args.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn build(self) -> RawExecutable {
        self.exe
    }
}
