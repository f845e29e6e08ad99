//! Source tree checks: manifest, patch target, fuzz crate.

use std::fs;
use std::path::Path;

use crate::config::BuildEnv;
use crate::manifest;

use super::types::CheckResult;
use super::validators::{declared_fuzz_targets, validate_manifest};

pub fn check_sources(source_dir: &Path, env: &BuildEnv) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let manifest_path = source_dir.join(&env.manifest);
    let manifest_name = env.manifest.display().to_string();
    if !manifest_path.is_file() {
        results.push(CheckResult::fail(&manifest_name, "Not found"));
    } else {
        match validate_manifest(&manifest_path) {
            Ok(()) => results.push(CheckResult::pass(&manifest_name)),
            Err(e) => results.push(CheckResult::fail(&manifest_name, &e)),
        }
        results.push(check_patch(&manifest_path, env));
    }

    let fuzz_dir = source_dir.join(&env.fuzz_dir);
    let fuzz_name = format!("{}/", env.fuzz_dir.display());
    let fuzz_manifest = fuzz_dir.join("Cargo.toml");
    if !fuzz_dir.is_dir() {
        results.push(CheckResult::fail(&fuzz_name, "Fuzz crate directory not found"));
        return results;
    }
    if !fuzz_manifest.is_file() {
        results.push(CheckResult::fail(&fuzz_name, "No Cargo.toml in fuzz crate"));
        return results;
    }

    match declared_fuzz_targets(&fuzz_manifest) {
        Ok(declared) => {
            results.push(CheckResult::pass_with(
                &fuzz_name,
                &format!("{} fuzz target(s) declared", declared.len()),
            ));
            for target in &env.targets {
                let name = format!("target {}", target);
                if declared.iter().any(|d| d == target) {
                    results.push(CheckResult::pass(&name));
                } else {
                    results.push(CheckResult::warn(
                        &name,
                        "Not declared as [[bin]] in the fuzz crate - export will fail if the driver does not produce it",
                    ));
                }
            }
        }
        Err(e) => results.push(CheckResult::fail(&fuzz_name, &e)),
    }

    results
}

fn check_patch(manifest_path: &Path, env: &BuildEnv) -> CheckResult {
    const NAME: &str = "manifest patch";

    let Some(patch) = &env.manifest_patch else {
        return CheckResult::skip(NAME, "No patch configured");
    };
    let text = match fs::read_to_string(manifest_path) {
        Ok(text) => text,
        Err(e) => return CheckResult::fail(NAME, &format!("Cannot read manifest: {}", e)),
    };
    match manifest::contains_declaration(&text, patch) {
        Ok(true) => CheckResult::pass_with(NAME, "Declaration present, will be removed"),
        Ok(false) => CheckResult::pass_with(NAME, "Declaration absent, patch is a no-op"),
        Err(e) => CheckResult::fail(NAME, &e.to_string()),
    }
}
