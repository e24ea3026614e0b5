pub mod console;
pub mod game;
pub(crate) mod network;
pub mod session;

pub use console::ConsolePlayer;
pub use game::*;
pub use network::{Conn, ConnectionError, Received};
pub use session::{
    connect, serve, LocalPlayer, Notice, Role, Session, SessionConfig, SessionError, Side,
};
