//! Toolchain provisioning.
//!
//! Installs system packages, then each build tool. The inputs are hashed
//! into a stamp file so an unchanged configuration is not reinstalled.

use anyhow::{Context, Result};

use crate::cache;
use crate::config::{BuildEnv, ToolSpec};
use crate::process::Cmd;

use super::StageContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Installed,
    /// Stamp matched the current inputs.
    UpToDate,
}

/// Hash of everything that decides what gets installed.
pub fn inputs_hash(env: &BuildEnv) -> Result<String> {
    let parts = [
        serde_json::to_vec(&env.installer)?,
        serde_json::to_vec(&env.packages)?,
        serde_json::to_vec(&env.tool_installer)?,
        serde_json::to_vec(&env.tools)?,
    ];
    Ok(cache::hash_parts(parts))
}

pub fn run(ctx: &StageContext) -> Result<ProvisionOutcome> {
    let env = ctx.env;
    let stamp = ctx.layout.provision_stamp();
    let hash = inputs_hash(env).context("Failed to hash provisioning inputs")?;

    if !cache::is_stale(&hash, &stamp) {
        tracing::info!("toolchain already provisioned, skipping");
        return Ok(ProvisionOutcome::UpToDate);
    }

    install_packages(env)?;
    for tool in &env.tools {
        install_tool(env, tool)?;
    }

    cache::write_cached_hash(&stamp, &hash)?;
    Ok(ProvisionOutcome::Installed)
}

fn install_packages(env: &BuildEnv) -> Result<()> {
    if env.packages.is_empty() {
        return Ok(());
    }
    let installer = &env.installer;

    if !installer.update_args.is_empty() {
        tracing::info!(installer = %installer.program, "refreshing package index");
        Cmd::new(&installer.program)
            .args(&installer.update_args)
            .envs(&installer.env)
            .error_msg("package index update failed")
            .run_interactive()?;
    }

    tracing::info!(packages = %env.packages.join(" "), "installing packages");
    Cmd::new(&installer.program)
        .args(&installer.install_args)
        .args(&env.packages)
        .envs(&installer.env)
        .error_msg("package installation failed")
        .run_interactive()?;
    Ok(())
}

/// Installer arguments for one tool.
pub fn tool_args(env: &BuildEnv, tool: &ToolSpec) -> Vec<String> {
    let mut args = env.tool_installer.args.clone();
    args.push(tool.name.clone());
    if let Some(version) = &tool.version {
        args.push("--version".to_string());
        args.push(version.clone());
    }
    args
}

fn install_tool(env: &BuildEnv, tool: &ToolSpec) -> Result<()> {
    tracing::info!(tool = %tool.name, version = ?tool.version, "installing tool");
    Cmd::new(&env.tool_installer.program)
        .args(tool_args(env, tool))
        .error_msg(format!("installing {} failed", tool.name))
        .run_interactive()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_args_with_version() {
        let env = BuildEnv::default();
        let tool = ToolSpec {
            name: "cargo-fuzz".to_string(),
            version: Some("0.11.0".to_string()),
        };
        assert_eq!(
            tool_args(&env, &tool),
            vec!["install", "cargo-fuzz", "--version", "0.11.0"]
        );
    }

    #[test]
    fn test_inputs_hash_tracks_packages() {
        let a = BuildEnv::default();
        let b = BuildEnv {
            packages: vec!["clang".to_string()],
            ..BuildEnv::default()
        };
        let c = BuildEnv {
            targets: vec!["parser".to_string()],
            ..BuildEnv::default()
        };
        assert_ne!(inputs_hash(&a).unwrap(), inputs_hash(&b).unwrap());
        // Targets do not affect provisioning.
        assert_eq!(inputs_hash(&a).unwrap(), inputs_hash(&c).unwrap());
    }
}
