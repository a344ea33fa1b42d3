use std::{env, error::Error, net::SocketAddr};

use mesquitte_client::{
    client::{ClientConfig, SocketConnection},
    protocols::v5::{Connection, EngineConfig},
    transport::tcp::TcpTransport,
};

fn main() -> Result<(), Box<dyn Error>> {
    env::set_var("RUST_LOG", "publish=trace,mesquitte_client=trace");
    env_logger::init();

    let addr: SocketAddr = env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:1883".to_owned())
        .parse()?;

    let transport = TcpTransport::connect(addr)?;
    let peer = transport.peer_endpoint()?;
    log::info!("connected to {addr}, peer address record {} bytes", peer.size());

    let config = ClientConfig::new("cid1", 60)?;
    let connect = config.connect_packet();
    let mut conn = Connection::new(
        SocketConnection::new(transport, config),
        EngineConfig::default(),
    );
    conn.connect(connect);
    conn.run();

    log::info!("session finished: {}", conn.status());
    Ok(())
}
