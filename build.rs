//! Версия `courier-demo --version`: коммит и дата сборки.

use std::{env, process::Command};

use chrono::{DateTime, Utc};

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed=COURIER_GIT_COMMIT");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    println!("cargo:rustc-env=COURIER_GIT_COMMIT={}", git_commit());
    println!("cargo:rustc-env=COURIER_BUILD_DATE={}", build_date());
}

/// Явно заданный `COURIER_GIT_COMMIT` (сборка из архива без `.git`),
/// иначе короткий хэш `HEAD`.
fn git_commit() -> String {
    if let Ok(commit) = env::var("COURIER_GIT_COMMIT") {
        if !commit.trim().is_empty() {
            return commit.trim().to_string();
        }
    }

    Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .and_then(|out| String::from_utf8(out.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .filter(|hash| !hash.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Дата сборки; `SOURCE_DATE_EPOCH` даёт воспроизводимый результат.
fn build_date() -> String {
    let date = env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|secs| secs.trim().parse::<i64>().ok())
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now);
    date.format("%Y-%m-%d").to_string()
}
