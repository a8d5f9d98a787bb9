//! Round-trip demo: serve a few length-prefixed packets over a local TCP
//! socket and pull them back out through a `PacketBuffer`.
//!
//! Run with: `cargo run --example roundtrip`

use std::error::Error;
use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use sqlwire_client::{BufferConfig, PacketBuffer};

fn main() -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;

    let server = thread::spawn(move || -> std::io::Result<()> {
        let (mut conn, _) = listener.accept()?;
        for msg in [&b"hello"[..], b"from", b"sqlwire"] {
            conn.write_all(&[msg.len() as u8])?;
            conn.write_all(msg)?;
            conn.flush()?;
        }
        Ok(())
    });

    let stream = TcpStream::connect(addr)?;
    let config = BufferConfig {
        read_timeout: Some(Duration::from_secs(2)),
        ..Default::default()
    };
    let mut buf = PacketBuffer::with_config(stream, config);

    for _ in 0..3 {
        // The caller owns the framing: one length byte, then the body.
        let len = buf.consume(1)?[0] as usize;
        let body = buf.consume(len)?;
        println!("packet: {}", String::from_utf8_lossy(body));

        // Packet boundary: the next fill goes to the other slot.
        buf.flip();
    }

    server.join().expect("server thread panicked")?;
    Ok(())
}
