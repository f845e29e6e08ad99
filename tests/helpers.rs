//! Shared test utilities for fuzzpack tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use fuzzpack::config::{BuildEnv, CommandSpec};

pub const DECLARATION: &str = r#"serde = ["smallvec/serde", "cssparser/serde"]"#;

/// Driver script producing both default executables plus build noise.
pub const GOOD_DRIVER: &str = "if grep -q 'cssparser/serde' ../Cargo.toml; then exit 7; fi
out=target/{triple}/{profile}
mkdir -p \"$out/deps\"
printf 'filename-fuzzer' > \"$out/filename\"
printf 'parser-fuzzer' > \"$out/parser\"
printf 'noise' > \"$out/parser.d\"
printf 'noise' > \"$out/deps/libcssparser.rlib\"";

/// Test environment with a temporary source tree of a fuzzable project.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Project source tree
    pub source: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("parcel-css");
        fs::create_dir_all(&source).expect("Failed to create source dir");

        Self {
            _temp_dir: temp_dir,
            source,
        }
    }

    /// Source tree with a 50-line manifest carrying the declaration and a
    /// fuzz crate declaring `filename` and `parser`.
    pub fn with_project() -> Self {
        let env = Self::new();
        fs::write(env.source.join("Cargo.toml"), manifest_with_declaration(50))
            .expect("Failed to write manifest");
        create_fuzz_crate(&env.source, &["filename", "parser"]);
        env
    }

    pub fn manifest(&self) -> PathBuf {
        self.source.join("Cargo.toml")
    }

    /// A build environment that never touches the host toolchain.
    pub fn build_env(&self, driver_script: &str) -> BuildEnv {
        BuildEnv {
            driver: CommandSpec::new("sh", ["-c", driver_script]),
            ..BuildEnv::default()
        }
    }
}

/// A manifest of exactly `lines` lines with the declaration inside
/// `[features]`.
pub fn manifest_with_declaration(lines: usize) -> String {
    let mut out = vec![
        "[package]".to_string(),
        "name = \"parcel_css\"".to_string(),
        "version = \"1.0.0-alpha.10\"".to_string(),
        "edition = \"2018\"".to_string(),
        String::new(),
        "[features]".to_string(),
        "default = [\"grid\"]".to_string(),
        "grid = []".to_string(),
        DECLARATION.to_string(),
        "jsonschema = []".to_string(),
        String::new(),
        "[dependencies]".to_string(),
    ];
    let mut i = 0;
    while out.len() < lines {
        out.push(format!("dep{} = \"0.{}\"", i, i));
        i += 1;
    }
    out.join("\n") + "\n"
}

/// The same manifest without the declaration.
pub fn manifest_without_declaration(lines: usize) -> String {
    manifest_with_declaration(lines + 1).replace(&format!("{}\n", DECLARATION), "")
}

pub fn create_fuzz_crate(source: &Path, targets: &[&str]) {
    let fuzz = source.join("fuzz");
    fs::create_dir_all(fuzz.join("fuzz_targets")).expect("Failed to create fuzz crate");

    let mut manifest = String::from(
        "[package]\nname = \"parcel_css-fuzz\"\nversion = \"0.0.0\"\n\n[package.metadata]\ncargo-fuzz = true\n",
    );
    for target in targets {
        manifest.push_str(&format!(
            "\n[[bin]]\nname = \"{0}\"\npath = \"fuzz_targets/{0}.rs\"\n",
            target
        ));
        fs::write(
            fuzz.join("fuzz_targets").join(format!("{}.rs", target)),
            "#![no_main]\n",
        )
        .expect("Failed to write fuzz target");
    }
    fs::write(fuzz.join("Cargo.toml"), manifest).expect("Failed to write fuzz manifest");
}

/// Sorted names of the entries directly under `dir`.
pub fn dir_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to read dir")
        .map(|e| e.expect("bad entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Assert that a file contains expected content.
pub fn assert_file_contains(path: &Path, expected: &str) {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read file {}: {}", path.display(), e));
    assert!(
        content.contains(expected),
        "File {} does not contain expected content.\nExpected to find: {}\nActual content: {}",
        path.display(),
        expected,
        content
    );
}
