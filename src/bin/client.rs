use anyhow::{Error, Result};
use futures::executor::block_on;
use log::{error, info, LevelFilter};
use std::env;
use std::path::Path;
use wordle_duel::{connect, ConsolePlayer, SessionConfig, Side, WordBank};

fn main() {
    env_logger::builder()
        .filter_module("wordle_duel", LevelFilter::Info)
        .init();
    if let Err(e) = block_on(run_client()) {
        error!("client stopped on error {}", e);
    }
}

async fn run_client() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        Err(Error::msg(
            "usage: ./client {server address:port} [read timeout secs] [word list], example: ./client 127.0.0.1:8080",
        ))?
    }
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
    let scores = connect(args[1].as_str(), ConsolePlayer::new(Side::Peer), words, config).await?;
    info!(
        "final score {}:{} after {} rounds",
        scores.authority_score(),
        scores.peer_score(),
        scores.rounds_played()
    );
    Ok(())
}
