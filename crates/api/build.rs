//! Build script for alertpusher
//!
//! Embeds revision, branch and build time for `--version`. Values come from
//! the environment when set (CI), otherwise from git and the system clock.

use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    emit("ALERTPUSHER_REVISION", &["git", "rev-parse", "--short", "HEAD"]);
    emit("ALERTPUSHER_BRANCH", &["git", "rev-parse", "--abbrev-ref", "HEAD"]);
    emit("ALERTPUSHER_BUILD", &["date", "-u", "+%Y-%m-%dT%H:%M:%SZ"]);
}

fn emit(key: &str, command: &[&str]) {
    println!("cargo:rerun-if-env-changed={key}");

    let value = std::env::var(key)
        .ok()
        .or_else(|| run(command))
        .unwrap_or_default();
    println!("cargo:rustc-env={key}={value}");
}

fn run(command: &[&str]) -> Option<String> {
    let (program, args) = command.split_first()?;
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?;
    Some(value.trim().to_string())
}
