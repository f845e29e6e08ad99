//! Host tool availability checks.

use crate::config::BuildEnv;
use crate::process::{self, Cmd};

use super::types::{CheckResult, CheckStatus};

pub fn check_host_tools(env: &BuildEnv, skip_provision: bool) -> Vec<CheckResult> {
    let mut results = Vec::new();

    if skip_provision {
        results.push(CheckResult::skip(
            &env.installer.program,
            "provisioning skipped",
        ));
    } else {
        if !env.packages.is_empty() {
            results.push(check_tool(
                &env.installer.program,
                "Required to install system packages",
                true,
            ));
        }
        if !env.tools.is_empty() {
            results.push(check_tool(
                &env.tool_installer.program,
                "Required to install build tools",
                true,
            ));
        }
    }

    results.push(check_tool(
        &env.driver.program,
        "Required to build fuzz targets",
        true,
    ));

    // Only matters when the driver selects a channel with +<toolchain>.
    if env.driver_args().iter().any(|a| a.starts_with('+')) {
        let rustup = check_tool(
            "rustup",
            &format!("Needed for the '+{}' toolchain override", env.toolchain),
            false,
        );
        let found = rustup.status == CheckStatus::Pass;
        results.push(rustup);
        if found {
            results.push(check_toolchain(&env.toolchain));
        }
    }

    for tool in &env.tools {
        match process::which(&tool.name) {
            Some(path) => results.push(CheckResult::pass_with(
                &tool.name,
                &path.display().to_string(),
            )),
            None if skip_provision => results.push(CheckResult::fail(
                &tool.name,
                "Not found and provisioning is skipped",
            )),
            None => results.push(CheckResult::warn(
                &tool.name,
                "Not found - will be installed during provisioning",
            )),
        }
    }

    results
}

fn check_tool(tool: &str, purpose: &str, required: bool) -> CheckResult {
    match process::which(tool) {
        Some(path) => CheckResult::pass_with(tool, &path.display().to_string()),
        None => {
            let msg = format!("Not found in PATH. {}", purpose);
            if required {
                CheckResult::fail(tool, &msg)
            } else {
                CheckResult::warn(tool, &msg)
            }
        }
    }
}

/// Check a rustup toolchain is installed.
fn check_toolchain(toolchain: &str) -> CheckResult {
    let name = format!("toolchain {}", toolchain);
    let result = match Cmd::new("rustup").args(["toolchain", "list"]).allow_fail().run() {
        Ok(result) if result.success() => result,
        _ => return CheckResult::warn(&name, "Could not list rustup toolchains"),
    };

    if toolchain_listed(&result.stdout, toolchain) {
        CheckResult::pass(&name)
    } else {
        CheckResult::warn(
            &name,
            &format!("Not installed - run 'rustup toolchain install {}'", toolchain),
        )
    }
}

/// `rustup toolchain list` prints e.g. `nightly-x86_64-unknown-linux-gnu (default)`.
fn toolchain_listed(output: &str, toolchain: &str) -> bool {
    output.lines().any(|line| {
        let name = line.split_whitespace().next().unwrap_or("");
        name == toolchain || name.starts_with(&format!("{}-", toolchain))
    })
}
