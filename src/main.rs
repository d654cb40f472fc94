mod auth;
mod cli;
mod dispatch;
mod error;
mod input;
mod jwks;
mod jwt;

use std::process::ExitCode;

use anyhow::Context;
use auth::AuthConfig;
use clap::Parser;
use cli::JwtDebugArgs;
use dispatch::Dispatcher;
use jwks::HttpKeySetFetcher;
use jwt::JoseVerifier;
use tracing_subscriber::EnvFilter;

/// Filter directive for diagnostics on stderr, e.g. `JWTDEBUG_LOG=debug`.
const LOG_ENV: &str = "JWTDEBUG_LOG";

fn main() -> ExitCode {
    init_tracing();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> anyhow::Result<()> {
    let args = JwtDebugArgs::parse_from(cli::normalize_args(std::env::args()));

    if args.show_version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mode = AuthConfig::new(args.jwk_url, args.hs256)
        .with_env_secret()
        .select_mode()?;
    tracing::debug!(?mode, "selected verification mode");

    let token = input::resolve(input::detect_stdin(), &input::join_args(&args.token))
        .context("can't get input data")?;

    let claims = Dispatcher::new(HttpKeySetFetcher, JoseVerifier).dispatch(mode, &token)?;
    tracing::debug!(sub = ?claims.try_get_claim("sub"), "token verified");

    println!("{}", claims.to_pretty_json()?);

    Ok(())
}
