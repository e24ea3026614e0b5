mod api;
mod coordinator;
mod messages;
mod transport;

pub use api::{LocalPlayer, Notice, Role, SessionConfig, SessionError, SessionState, Side};
pub use coordinator::Session;
pub use messages::Message;

use crate::game::{ScoreBoard, WordSupplier};
use anyhow::Result;
use async_std::net::{TcpListener, TcpStream, ToSocketAddrs};
use log::info;

/// Wait for one peer on `address` and play as the authority.
pub async fn serve<A, P, W>(
    address: A,
    player: P,
    supplier: W,
    config: SessionConfig,
) -> Result<ScoreBoard>
where
    A: ToSocketAddrs,
    P: LocalPlayer,
    W: WordSupplier,
{
    let listener = TcpListener::bind(address).await?;
    info!("waiting for a peer on {}", listener.local_addr()?);
    let (stream, peer) = listener.accept().await?;
    info!("peer {} connected", peer);
    let session = Session::new(stream, Side::Authority, player, supplier, config);
    Ok(session.run().await?)
}

/// Connect to an authority at `address` and play as the peer.
pub async fn connect<A, P, W>(
    address: A,
    player: P,
    supplier: W,
    config: SessionConfig,
) -> Result<ScoreBoard>
where
    A: ToSocketAddrs,
    P: LocalPlayer,
    W: WordSupplier,
{
    let stream = TcpStream::connect(address).await?;
    info!("connected to {}", stream.peer_addr()?);
    let session = Session::new(stream, Side::Peer, player, supplier, config);
    Ok(session.run().await?)
}
