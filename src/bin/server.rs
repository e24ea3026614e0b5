use anyhow::{Error, Result};
use futures::executor::block_on;
use log::{error, info, LevelFilter};
use std::env;
use std::net::SocketAddrV4;
use std::path::Path;
use std::str::FromStr;
use wordle_duel::{serve, ConsolePlayer, SessionConfig, Side, WordBank};

fn main() {
    env_logger::builder()
        .filter_module("wordle_duel", LevelFilter::Info)
        .init();
    if let Err(e) = block_on(run_server()) {
        error!("server ended in error: {}", e);
    }
}

async fn run_server() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        Err(Error::msg(
            "usage: ./server {ipv4 address} [read timeout secs] [word list], example: ./server 127.0.0.1:8080 60",
        ))?
    }
    let address = SocketAddrV4::from_str(&args[1])
        .map_err(|_| Error::msg(format!("bad ip address {}", args[1])))?;
    let mut config = SessionConfig::default();
    if let Some(timeout) = args.get(2) {
        config.read_timeout = timeout
            .parse()
            .map_err(|_| Error::msg(format!("bad read timeout {}", timeout)))?;
    }
    let words = match args.get(3) {
        Some(path) => WordBank::from_file(Path::new(path))?,
        None => WordBank::builtin(),
    };
    info!("word lengths available: {:?}", words.lengths());
    let scores = serve(address, ConsolePlayer::new(Side::Authority), words, config).await?;
    info!(
        "final score {}:{} after {} rounds",
        scores.authority_score(),
        scores.peer_score(),
        scores.rounds_played()
    );
    Ok(())
}
