use async_std::io::BufReader;
use async_std::net::TcpStream;
use futures::AsyncReadExt;

/// `None` if the stream ended before `n` bytes arrived.
pub async fn read_n_bytes(reader: &mut BufReader<TcpStream>, n: u32) -> Option<Vec<u8>> {
    let mut payload = vec![0u8; n as usize];
    if reader.read_exact(&mut payload).await.is_err() {
        None
    } else {
        Some(payload)
    }
}

pub async fn read_be_u32(reader: &mut BufReader<TcpStream>) -> Option<u32> {
    let mut bytes = [0u8; 4];
    if reader.read_exact(&mut bytes).await.is_err() {
        None
    } else {
        Some(u32::from_be_bytes(bytes))
    }
}

pub async fn read_one_byte(reader: &mut BufReader<TcpStream>) -> Option<u8> {
    let mut frame_type = [0u8; 1];
    if reader.read_exact(&mut frame_type).await.is_err() {
        None
    } else {
        Some(frame_type[0])
    }
}
