//! Build environment configuration.
//!
//! Everything the container recipe used to take from ambient shell state
//! (base image, package list, noninteractive installs, toolchain channel,
//! target triple) is an explicit field of [`BuildEnv`].
//!
//! Layering, lowest to highest precedence:
//! 1. Built-in defaults
//! 2. JSON config file (`--config`, `<source>/fuzzpack.json`, or
//!    `<config_dir>/fuzzpack/config.json`)
//! 3. `FUZZPACK_*` environment variables (a `.env` file is loaded first)

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::manifest::{ManifestPatch, PatchStrategy};

/// File name looked up in the source tree.
pub const CONFIG_FILE_NAME: &str = "fuzzpack.json";

pub const DEFAULT_IMAGE: &str = "rustlang/rust:nightly";
pub const DEFAULT_TRIPLE: &str = "x86_64-unknown-linux-gnu";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {var}: {reason}")]
    Env { var: String, reason: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Cargo profile the fuzz driver builds with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Release,
    Debug,
}

impl Profile {
    /// Directory name under `target/<triple>/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Profile::Release => "release",
            Profile::Debug => "debug",
        }
    }

    /// cargo-fuzz flag selecting this profile.
    pub fn driver_flag(self) -> &'static str {
        match self {
            Profile::Release => "-O",
            Profile::Debug => "--dev",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "release" => Ok(Profile::Release),
            "debug" | "dev" => Ok(Profile::Debug),
            other => Err(format!("unknown profile '{}'", other)),
        }
    }
}

/// A program plus fixed leading arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// System package installer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerSpec {
    pub program: String,
    /// Run once before installing. Empty to skip.
    pub update_args: Vec<String>,
    pub install_args: Vec<String>,
    /// Passed to the installer process only.
    pub env: BTreeMap<String, String>,
}

impl Default for InstallerSpec {
    fn default() -> Self {
        Self {
            program: "apt-get".to_string(),
            update_args: vec!["update".to_string()],
            install_args: vec!["install".to_string(), "-y".to_string()],
            env: BTreeMap::from([(
                "DEBIAN_FRONTEND".to_string(),
                "noninteractive".to_string(),
            )]),
        }
    }
}

/// A build tool installed with the tool installer (`cargo install`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// The whole build environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildEnv {
    /// Image the builder stage starts from.
    pub base_image: String,
    /// Image the runtime stage starts from.
    pub runtime_image: String,
    /// rustup channel passed to the driver as `+<toolchain>`.
    pub toolchain: String,
    pub packages: Vec<String>,
    pub installer: InstallerSpec,
    pub tool_installer: CommandSpec,
    pub tools: Vec<ToolSpec>,
    pub target_triple: String,
    pub profile: Profile,
    /// Fuzz crate directory, relative to the source root.
    pub fuzz_dir: PathBuf,
    /// Manifest to patch, relative to the source root.
    pub manifest: PathBuf,
    /// `None` disables the patch stage.
    pub manifest_patch: Option<ManifestPatch>,
    pub patch_strategy: PatchStrategy,
    /// Fuzz driver. Arguments may use `{toolchain}`, `{triple}`,
    /// `{profile}` and `{profile_flag}`.
    pub driver: CommandSpec,
    /// Fuzz targets exported into the runtime image root.
    pub targets: Vec<String>,
    /// Relative paths resolve against the source root.
    pub work_dir: PathBuf,
    pub keep_builder: bool,
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            base_image: DEFAULT_IMAGE.to_string(),
            runtime_image: DEFAULT_IMAGE.to_string(),
            toolchain: "nightly".to_string(),
            packages: vec!["cmake".to_string(), "clang".to_string()],
            installer: InstallerSpec::default(),
            tool_installer: CommandSpec::new("cargo", ["install"]),
            tools: vec![ToolSpec {
                name: "cargo-fuzz".to_string(),
                version: None,
            }],
            target_triple: DEFAULT_TRIPLE.to_string(),
            profile: Profile::Release,
            fuzz_dir: PathBuf::from("fuzz"),
            manifest: PathBuf::from("Cargo.toml"),
            manifest_patch: Some(ManifestPatch::default()),
            patch_strategy: PatchStrategy::Structured,
            driver: CommandSpec::new(
                "cargo",
                [
                    "+{toolchain}",
                    "fuzz",
                    "build",
                    "{profile_flag}",
                    "--target",
                    "{triple}",
                ],
            ),
            // "filename" is the upstream target name as published; confirm
            // against the harness before relying on it.
            targets: vec!["filename".to_string(), "parser".to_string()],
            work_dir: PathBuf::from(".fuzzpack"),
            keep_builder: false,
        }
    }
}

impl BuildEnv {
    /// Load configuration for a source tree.
    pub fn load(source_dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut env = match Self::locate_file(source_dir, explicit) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        env.apply_overrides(|key| std::env::var(key).ok())?;
        env.validate()?;
        Ok(env)
    }

    fn locate_file(source_dir: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        let local = source_dir.join(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("fuzzpack").join("config.json"))
            .filter(|p| p.is_file())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `FUZZPACK_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |var: &str, reason: String| ConfigError::Env {
            var: var.to_string(),
            reason,
        };

        if let Some(v) = lookup("FUZZPACK_BASE_IMAGE") {
            self.base_image = v;
        }
        if let Some(v) = lookup("FUZZPACK_RUNTIME_IMAGE") {
            self.runtime_image = v;
        }
        if let Some(v) = lookup("FUZZPACK_TOOLCHAIN") {
            self.toolchain = v;
        }
        if let Some(v) = lookup("FUZZPACK_TARGET_TRIPLE") {
            self.target_triple = v;
        }
        if let Some(v) = lookup("FUZZPACK_PROFILE") {
            self.profile = v.parse().map_err(|e| invalid("FUZZPACK_PROFILE", e))?;
        }
        if let Some(v) = lookup("FUZZPACK_PATCH_STRATEGY") {
            self.patch_strategy = v
                .parse()
                .map_err(|e| invalid("FUZZPACK_PATCH_STRATEGY", e))?;
        }
        if let Some(v) = lookup("FUZZPACK_TARGETS") {
            self.targets = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = lookup("FUZZPACK_WORK_DIR") {
            self.work_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("FUZZPACK_KEEP_BUILDER") {
            self.keep_builder = match v.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                other => {
                    return Err(invalid(
                        "FUZZPACK_KEEP_BUILDER",
                        format!("expected a boolean, got '{}'", other),
                    ))
                }
            };
        }
        Ok(())
    }

    /// Reject configurations that cannot produce a runtime image.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::Invalid("no fuzz targets configured".into()));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.is_empty()
                || target == "."
                || target == ".."
                || target.contains('/')
                || target.contains('\\')
            {
                return Err(ConfigError::Invalid(format!(
                    "fuzz target '{}' is not a plain file name",
                    target
                )));
            }
            if !seen.insert(target.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "fuzz target '{}' listed twice",
                    target
                )));
            }
        }
        if self.target_triple.trim().is_empty() {
            return Err(ConfigError::Invalid("target triple is empty".into()));
        }
        if self.driver.program.trim().is_empty() {
            return Err(ConfigError::Invalid("fuzz driver program is empty".into()));
        }
        if self.fuzz_dir.is_absolute() || self.manifest.is_absolute() {
            return Err(ConfigError::Invalid(
                "fuzz_dir and manifest must be relative to the source root".into(),
            ));
        }
        Ok(())
    }

    /// Driver arguments with placeholders expanded.
    pub fn driver_args(&self) -> Vec<String> {
        self.driver
            .args
            .iter()
            .map(|arg| {
                arg.replace("{toolchain}", &self.toolchain)
                    .replace("{triple}", &self.target_triple)
                    .replace("{profile_flag}", self.profile.driver_flag())
                    .replace("{profile}", self.profile.dir_name())
            })
            .collect()
    }

    /// Where the driver leaves executables, relative to the source root.
    pub fn artifact_subdir(&self) -> PathBuf {
        self.fuzz_dir
            .join("target")
            .join(&self.target_triple)
            .join(self.profile.dir_name())
    }

    /// Resolve the work directory against `source_dir`.
    pub fn work_dir_for(&self, source_dir: &Path) -> PathBuf {
        if self.work_dir.is_absolute() {
            self.work_dir.clone()
        } else {
            source_dir.join(&self.work_dir)
        }
    }

    /// Print configuration as JSON.
    pub fn print(&self) {
        match serde_json::to_string_pretty(self) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("[WARN] Cannot render configuration: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_upstream_recipe() {
        let env = BuildEnv::default();
        assert_eq!(env.base_image, "rustlang/rust:nightly");
        assert_eq!(env.targets, vec!["filename", "parser"]);
        assert_eq!(
            env.artifact_subdir(),
            PathBuf::from("fuzz/target/x86_64-unknown-linux-gnu/release")
        );
        assert_eq!(
            env.installer.env.get("DEBIAN_FRONTEND").map(String::as_str),
            Some("noninteractive")
        );
        env.validate().unwrap();
    }

    #[test]
    fn test_driver_args_expand() {
        let env = BuildEnv::default();
        assert_eq!(
            env.driver_args(),
            vec![
                "+nightly",
                "fuzz",
                "build",
                "-O",
                "--target",
                "x86_64-unknown-linux-gnu"
            ]
        );

        let env = BuildEnv {
            profile: Profile::Debug,
            ..BuildEnv::default()
        };
        assert!(env.driver_args().contains(&"--dev".to_string()));
        assert!(env.artifact_subdir().ends_with("debug"));
    }

    #[test]
    fn test_env_overrides() {
        let mut env = BuildEnv::default();
        env.apply_overrides(lookup(&[
            ("FUZZPACK_TARGETS", "parser, selectors ,"),
            ("FUZZPACK_PROFILE", "debug"),
            ("FUZZPACK_TARGET_TRIPLE", "aarch64-unknown-linux-gnu"),
            ("FUZZPACK_PATCH_STRATEGY", "line-filter"),
            ("FUZZPACK_KEEP_BUILDER", "yes"),
        ]))
        .unwrap();

        assert_eq!(env.targets, vec!["parser", "selectors"]);
        assert_eq!(env.profile, Profile::Debug);
        assert_eq!(env.target_triple, "aarch64-unknown-linux-gnu");
        assert_eq!(env.patch_strategy, PatchStrategy::LineFilter);
        assert!(env.keep_builder);
    }

    #[test]
    fn test_env_override_rejects_bad_profile() {
        let mut env = BuildEnv::default();
        let err = env
            .apply_overrides(lookup(&[("FUZZPACK_PROFILE", "fast")]))
            .unwrap_err();
        assert!(err.to_string().contains("FUZZPACK_PROFILE"));
    }

    #[test]
    fn test_validate_rejects_bad_targets() {
        for targets in [
            vec![],
            vec!["parser".to_string(), "parser".to_string()],
            vec!["../parser".to_string()],
            vec![String::new()],
        ] {
            let env = BuildEnv {
                targets,
                ..BuildEnv::default()
            };
            assert!(env.validate().is_err());
        }
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let env: BuildEnv =
            serde_json::from_str(r#"{ "targets": ["parser"], "profile": "debug" }"#).unwrap();
        assert_eq!(env.targets, vec!["parser"]);
        assert_eq!(env.profile, Profile::Debug);
        assert_eq!(env.toolchain, "nightly");
        assert_eq!(env.manifest_patch, Some(ManifestPatch::default()));
    }

    #[test]
    fn test_unknown_json_field_rejected() {
        assert!(serde_json::from_str::<BuildEnv>(r#"{ "target": "x" }"#).is_err());
    }

    #[test]
    fn test_work_dir_resolution() {
        let env = BuildEnv::default();
        assert_eq!(
            env.work_dir_for(Path::new("/src")),
            PathBuf::from("/src/.fuzzpack")
        );
        let env = BuildEnv {
            work_dir: PathBuf::from("/var/tmp/fp"),
            ..BuildEnv::default()
        };
        assert_eq!(env.work_dir_for(Path::new("/src")), PathBuf::from("/var/tmp/fp"));
    }
}
