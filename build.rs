// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=PHOTOBOOTH_VERSION");

    // Packagers may pin the version string explicitly
    let version = std::env::var("PHOTOBOOTH_VERSION").unwrap_or_else(|_| {
        let pkg = std::env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
        match short_commit() {
            Some(hash) => format!("{}-{}", pkg, hash),
            None => pkg,
        }
    });

    println!("cargo::rustc-env=PHOTOBOOTH_BUILD_VERSION={}", version);
}

fn short_commit() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        None
    }
}
