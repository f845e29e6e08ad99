//! Render the pipeline as a two-stage Containerfile.

use std::fmt::Write;
use std::path::Path;

use crate::config::BuildEnv;
use crate::stages::provision::tool_args;

/// Source location inside the builder image.
pub const BUILDER_SRC: &str = "/src";

fn shell_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./+=:,@{}".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

fn command_line<I, S>(program: &str, args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = shell_quote(program);
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(arg.as_ref()));
    }
    line
}

fn in_builder(rel: &Path) -> String {
    format!("{}/{}", BUILDER_SRC, rel.display())
}

/// Escape `s` so it matches literally inside a POSIX extended regex.
fn ere_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '^' => out.push_str("\\^"),
            '.' | '[' | ']' | '(' | ')' | '*' | '+' | '?' | '{' | '}' | '|' | '$' | '\\' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
    }
    out
}

/// Shell command that drops the declaration lines from the manifest,
/// ignoring surrounding whitespace like the line filter does.
///
/// grep exits 1 when every line was dropped, which is still a success.
/// A missing manifest (exit 2) fails the step.
pub fn patch_command(env: &BuildEnv) -> Option<String> {
    let patch = env.manifest_patch.as_ref()?;
    let pattern = format!(
        "^[[:space:]]*{}[[:space:]]*$",
        ere_literal(&patch.declaration())
    );
    Some(format!(
        "{{ grep -vE {pat} {m} || [ $? -eq 1 ]; }} > {m}.new && mv {m}.new {m}",
        pat = shell_quote(&pattern),
        m = shell_quote(&env.manifest.display().to_string())
    ))
}

pub fn render(env: &BuildEnv) -> String {
    let mut out = String::new();
    let installer = &env.installer;
    let env_prefix: String = installer
        .env
        .iter()
        .map(|(k, v)| format!("{}={} ", k, shell_quote(v)))
        .collect();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "# Generated by fuzzpack. Do not edit.");
    let _ = writeln!(out, "FROM {} AS builder", env.base_image);
    let _ = writeln!(out);

    if !env.packages.is_empty() {
        let mut run = String::new();
        if !installer.update_args.is_empty() {
            run.push_str(&env_prefix);
            run.push_str(&command_line(&installer.program, &installer.update_args));
            run.push_str(" && ");
        }
        run.push_str(&env_prefix);
        run.push_str(&command_line(
            &installer.program,
            installer.install_args.iter().chain(&env.packages),
        ));
        let _ = writeln!(out, "RUN {}", run);
    }
    for tool in &env.tools {
        let _ = writeln!(
            out,
            "RUN {}",
            command_line(&env.tool_installer.program, tool_args(env, tool))
        );
    }

    let _ = writeln!(out, "ADD . {}", BUILDER_SRC);
    let _ = writeln!(out, "WORKDIR {}", BUILDER_SRC);

    if let Some(command) = patch_command(env) {
        let _ = writeln!(out, "RUN {}", command);
    }

    let _ = writeln!(out, "WORKDIR {}", in_builder(&env.fuzz_dir));
    let _ = writeln!(
        out,
        "RUN {}",
        command_line(&env.driver.program, env.driver_args())
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "FROM {}", env.runtime_image);
    let artifacts = env.artifact_subdir();
    for target in &env.targets {
        let _ = writeln!(
            out,
            "COPY --from=builder {}/{} /",
            in_builder(&artifacts),
            target
        );
    }

    out
}
