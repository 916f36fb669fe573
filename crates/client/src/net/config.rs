use std::time::Duration;

use drifter::net::DEFAULT_PORT;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Name sent with the connect request, truncated to the wire limit.
    pub display_name: String,
    /// Input messages per second.
    pub send_rate: u32,
    /// How long the handshake may wait for the server's ack.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            display_name: "Pilot".into(),
            send_rate: 60,
            connect_timeout: Duration::from_secs(5),
        }
    }
}
