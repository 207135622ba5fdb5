// src/config/validate.rs

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use crate::config::model::{ConfigFile, ExecutableSpec, RawConfigFile, RawExecutable};
use crate::errors::{Result, VoyeurError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::VoyeurError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_global_config(&raw)?;
        ensure_has_targets(&raw)?;
        let executables = validate_executables(&raw.executable)?;
        Ok(ConfigFile::new_unchecked(
            raw.config,
            raw.watch.targets,
            executables,
        ))
    }
}

fn config_error(msg: impl Into<String>) -> VoyeurError {
    VoyeurError::ConfigError(msg.into())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.interval == 0 {
        return Err(config_error("[config].interval must be >= 1 (got 0)"));
    }
    if cfg.config.delete_attempts == 0 {
        return Err(config_error("[config].delete_attempts must be >= 1 (got 0)"));
    }
    Ok(())
}

fn ensure_has_targets(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.targets.is_empty() {
        return Err(config_error(
            "config must list at least one path in [watch].targets",
        ));
    }
    Ok(())
}

fn validate_executables(raw: &[RawExecutable]) -> Result<Vec<ExecutableSpec>> {
    if raw.is_empty() {
        return Err(config_error(
            "config must contain at least one [[executable]] section",
        ));
    }

    let mut explicit = HashSet::new();
    let mut taken = HashSet::new();
    let mut specs = Vec::with_capacity(raw.len());

    for (index, entry) in raw.iter().enumerate() {
        let spec = executable_from_raw(index, entry, &taken)?;
        if entry.name.is_some() && !explicit.insert(spec.name().to_string()) {
            return Err(config_error(format!(
                "executable #{} has duplicate name '{}'",
                index + 1,
                spec.name()
            )));
        }
        taken.insert(spec.name().to_string());
        specs.push(spec);
    }

    Ok(specs)
}

/// Match one descriptor against the two allowed shapes.
///
/// A complete shape wins over stray fields of the other one; a descriptor
/// completing both shapes, or neither, is rejected.
fn executable_from_raw(
    index: usize,
    raw: &RawExecutable,
    taken: &HashSet<String>,
) -> Result<ExecutableSpec> {
    let position = index + 1;
    let binary = raw.build_cmd.as_ref().zip(raw.binary_path.as_ref());
    let script = raw.run_cmd.as_ref().zip(raw.script_path.as_ref());

    match (binary, script) {
        (Some(_), Some(_)) => Err(config_error(format!(
            "executable #{position} mixes binary fields (build_cmd, binary_path) \
             with script fields (run_cmd, script_path)"
        ))),
        (Some((build_cmd, binary_path)), None) => {
            if raw.run_cmd.is_some() || raw.script_path.is_some() {
                warn!(executable = position, "ignoring stray script fields on a binary");
            }
            ensure_command(position, "build_cmd", build_cmd)?;
            Ok(ExecutableSpec::CompiledBinary {
                name: resolve_name(position, raw.name.as_deref(), binary_path, taken)?,
                build_cmd: build_cmd.clone(),
                binary_path: binary_path.clone(),
                args: raw.args.clone().unwrap_or_default(),
            })
        }
        (None, Some((run_cmd, script_path))) => {
            if raw.args.is_some() {
                return Err(config_error(format!(
                    "executable #{position}: args is only valid for binaries; \
                     put script arguments in run_cmd"
                )));
            }
            if raw.build_cmd.is_some() || raw.binary_path.is_some() {
                warn!(executable = position, "ignoring stray binary fields on a script");
            }
            ensure_command(position, "run_cmd", run_cmd)?;
            Ok(ExecutableSpec::Script {
                name: resolve_name(position, raw.name.as_deref(), script_path, taken)?,
                run_cmd: run_cmd.clone(),
                script_path: script_path.clone(),
            })
        }
        (None, None) => {
            let has_binary_fields = raw.build_cmd.is_some() || raw.binary_path.is_some();
            let has_script_fields = raw.run_cmd.is_some() || raw.script_path.is_some();
            let msg = match (has_binary_fields, has_script_fields) {
                (true, false) => format!(
                    "executable #{position} needs both build_cmd and binary_path"
                ),
                (false, true) => format!(
                    "executable #{position} needs both run_cmd and script_path"
                ),
                _ => format!(
                    "executable #{position} needs either build_cmd + binary_path \
                     or run_cmd + script_path"
                ),
            };
            Err(config_error(msg))
        }
    }
}

fn ensure_command(position: usize, field: &str, argv: &[String]) -> Result<()> {
    match argv.first() {
        Some(program) if !program.trim().is_empty() => Ok(()),
        _ => Err(config_error(format!(
            "executable #{position}: {field} must be a non-empty argument list"
        ))),
    }
}

/// Explicit `name`, or the artifact/script file name. A derived name that
/// is already taken falls back to the configured path.
fn resolve_name(
    position: usize,
    explicit: Option<&str>,
    path: &Path,
    taken: &HashSet<String>,
) -> Result<String> {
    if let Some(name) = explicit {
        if name.trim().is_empty() {
            return Err(config_error(format!(
                "executable #{position}: name must not be empty"
            )));
        }
        return Ok(name.to_string());
    }

    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            config_error(format!(
                "executable #{position}: cannot derive a name from {:?}",
                path
            ))
        })?;
    if !taken.contains(&base) {
        return Ok(base);
    }

    let full = path.display().to_string();
    if !taken.contains(&full) {
        return Ok(full);
    }
    Ok(format!("{full}#{position}"))
}
