// Copyright (C) 2024-2025 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation and Infrastructure Orchestration
//!
//! ### Backend Testing Commands
//!
//! - `cargo test` runs all standard tests against `SQLite` (no infrastructure)
//! - `cargo xtask test-mariadb` runs backend validation tests against `MariaDB`
//! - `cargo xtask test-postgres` runs backend validation tests against `PostgreSQL`
//!
//! The backend commands start a Docker container, wait for it to accept
//! connections, run the ignored tests in `backend_validation_tests` with
//! `DATABASE_URL` and `CMSDB_TEST_BACKEND` set, and always remove the
//! container afterwards.
//!
//! External databases are opt-in only. No test silently skips because a
//! service is missing; the ignored tests fail fast without their environment.

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::thread::sleep;
use std::time::Duration;
use std::{fmt::Debug, io, process::Output, vec};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{eyre::Context, Result};
use duct::cmd;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Lint formatting, typos, clippy, and docs
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Check for typos in the project
    #[command(visible_alias = "lt")]
    LintTypos,

    /// Fix clippy warnings in the project
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Fix typos in the project
    #[command(visible_alias = "typos")]
    FixTypos,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run doc tests
    #[command(visible_alias = "td")]
    TestDocs,

    /// Run lib tests
    #[command(visible_alias = "tl")]
    TestLibs,

    /// Run `MariaDB` backend validation tests
    #[command(visible_alias = "tm")]
    TestMariadb,

    /// Run `PostgreSQL` backend validation tests
    #[command(visible_alias = "tp")]
    TestPostgres,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::LintTypos => lint_typos(),
            Self::FixClippy => fix_clippy(),
            Self::FixFormatting => fix_format(),
            Self::FixTypos => fix_typos(),
            Self::Test => test(),
            Self::TestDocs => test_docs(),
            Self::TestLibs => test_libs(),
            Self::TestMariadb => test_backend(&MARIADB),
            Self::TestPostgres => test_backend(&POSTGRES),
        }
    }
}

/// Run CI checks (lint, build, test)
fn ci() -> Result<()> {
    lint()?;
    build()?;
    test()?;
    test_backend(&MARIADB)?;
    test_backend(&POSTGRES)?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Lint formatting, typos, clippy, and docs
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()?;
    lint_typos()?;
    Ok(())
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Fix clippy warnings in the project
fn fix_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--fix",
        "--allow-dirty",
        "--allow-staged",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without errors using docs.rs-equivalent flags
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Check for typos in the project using [typos-cli](https://github.com/crate-ci/typos/)
fn lint_typos() -> Result<()> {
    cmd!("typos").run_with_trace()?;
    Ok(())
}

/// Fix typos in the project
fn fix_typos() -> Result<()> {
    cmd!("typos", "-w").run_with_trace()?;
    Ok(())
}

/// Run tests for libs, backends, and docs
fn test() -> Result<()> {
    test_libs()?;
    test_docs()?; // run last because it's slow
    Ok(())
}

/// Run doc tests for the workspace's default packages
fn test_docs() -> Result<()> {
    run_cargo(vec!["test", "--doc", "--all-features"])
}

/// Run lib tests for the workspace's default packages
fn test_libs() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Run a cargo subcommand with the nightly toolchain
fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

/// A disposable database container used for backend validation.
struct TestDatabase {
    /// Value of `CMSDB_TEST_BACKEND` the tests expect.
    backend: &'static str,
    container_name: &'static str,
    image: &'static str,
    /// Environment passed to `docker run`.
    env: &'static [&'static str],
    /// Host port mapped to `container_port`.
    host_port: u16,
    container_port: u16,
    /// Command run inside the container that succeeds once it is ready.
    ready_check: &'static [&'static str],
    url_scheme: &'static str,
    user: &'static str,
    password: &'static str,
    database: &'static str,
}

impl TestDatabase {
    fn database_url(&self) -> String {
        format!(
            "{}://{}:{}@127.0.0.1:{}/{}",
            self.url_scheme, self.user, self.password, self.host_port, self.database
        )
    }

    fn remove_container(&self) {
        let _ = cmd!("docker", "stop", self.container_name).run();
        let _ = cmd!("docker", "rm", self.container_name).run();
    }

    fn start_container(&self) -> Result<()> {
        let mut args: Vec<String> = vec![
            String::from("run"),
            String::from("--name"),
            self.container_name.to_string(),
        ];
        for var in self.env {
            args.push(String::from("-e"));
            args.push((*var).to_string());
        }
        args.push(String::from("-p"));
        args.push(format!("{}:{}", self.host_port, self.container_port));
        args.push(String::from("-d"));
        args.push(self.image.to_string());

        cmd("docker", args)
            .run_with_trace()
            .wrap_err_with(|| format!("Failed to start {} container", self.backend))?;
        Ok(())
    }

    fn wait_until_ready(&self) -> Result<()> {
        let max_attempts = 30;
        for attempt in 1..=max_attempts {
            sleep(Duration::from_secs(1));
            tracing::debug!("Connection attempt {}/{}", attempt, max_attempts);

            let mut args: Vec<&str> = vec!["exec", self.container_name];
            args.extend_from_slice(self.ready_check);
            if cmd("docker", args).stdout_null().stderr_null().run().is_ok() {
                tracing::info!("{} is ready", self.backend);
                return Ok(());
            }
        }
        Err(color_eyre::eyre::eyre!(
            "{} did not become ready within timeout",
            self.backend
        ))
    }
}

const MARIADB: TestDatabase = TestDatabase {
    backend: "mariadb",
    container_name: "cmsdb-test-mariadb",
    image: "mariadb:11",
    env: &[
        "MARIADB_DATABASE=cmsdb_test",
        "MARIADB_USER=cmsdb",
        "MARIADB_PASSWORD=test_password",
        "MARIADB_ROOT_PASSWORD=root_password",
    ],
    host_port: 3307,
    container_port: 3306,
    ready_check: &[
        "mariadb",
        "-u",
        "cmsdb",
        "-ptest_password",
        "cmsdb_test",
        "-e",
        "SELECT 1",
    ],
    url_scheme: "mysql",
    user: "cmsdb",
    password: "test_password",
    database: "cmsdb_test",
};

const POSTGRES: TestDatabase = TestDatabase {
    backend: "postgres",
    container_name: "cmsdb-test-postgres",
    image: "postgres:17",
    env: &[
        "POSTGRES_DB=cmsdb_test",
        "POSTGRES_USER=cmsdb",
        "POSTGRES_PASSWORD=test_password",
    ],
    host_port: 5433,
    container_port: 5432,
    ready_check: &[
        "psql",
        "-U",
        "cmsdb",
        "-d",
        "cmsdb_test",
        "-c",
        "SELECT 1",
    ],
    url_scheme: "postgres",
    user: "cmsdb",
    password: "test_password",
    database: "cmsdb_test",
};

/// Run backend validation tests against a disposable container
///
/// 1. Validates Docker is available
/// 2. Starts the container, replacing any leftover from an earlier run
/// 3. Waits up to 30 seconds for it to accept connections
/// 4. Runs the ignored `backend_validation_tests` of `cmsdb-persistence` with
///    `DATABASE_URL` and `CMSDB_TEST_BACKEND` set
/// 5. Stops and removes the container (always, even on failure)
///
/// Port 3307 (`MariaDB`) or 5433 (`PostgreSQL`) must be free, and the
/// client libraries for the backend must be available for compilation.
fn test_backend(db: &TestDatabase) -> Result<()> {
    tracing::info!("Starting {} backend validation", db.backend);

    cmd!("docker", "--version")
        .run_with_trace()
        .wrap_err("Docker is not available. Please install Docker.")?;

    tracing::info!("Cleaning up any existing test container");
    db.remove_container();

    db.start_container()?;

    let test_result = db.wait_until_ready().and_then(|()| {
        tracing::info!("Running {} backend validation tests", db.backend);
        // Filter to the backend module so only its ignored tests run.
        cmd!(
            "cargo",
            "test",
            "--package",
            "cmsdb-persistence",
            "backend_validation_tests",
            "--",
            "--ignored",
            "--test-threads=1"
        )
        .env("DATABASE_URL", db.database_url())
        .env("CMSDB_TEST_BACKEND", db.backend)
        .run_with_trace()
        .wrap_err_with(|| format!("{} backend validation tests failed", db.backend))
        .map(|_| ())
    });

    tracing::info!("Stopping {} container", db.backend);
    db.remove_container();

    test_result?;
    tracing::info!("{} backend validation completed successfully", db.backend);
    Ok(())
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
