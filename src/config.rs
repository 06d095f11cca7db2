//! Configuration utilities (bind address, signing key).

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use once_cell::sync::OnceCell;
use rand::RngCore;

static HMAC_KEY: OnceCell<[u8; 32]> = OnceCell::new();

/// Socket address to bind the server to.
///
/// Reads the `PORT` env var or defaults to 8080, binds to 0.0.0.0.
pub fn server_addr() -> SocketAddr {
    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(8080);
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port))
}

/// Token-signing key: `KINGSCUP_HMAC_KEY` as hex, or a fresh random key per
/// process (tokens then die with the process, which is fine for a party).
pub fn hmac_key() -> &'static [u8; 32] {
    HMAC_KEY.get_or_init(|| {
        env::var("KINGSCUP_HMAC_KEY")
            .ok()
            .and_then(|hex| hex::decode(hex).ok())
            .and_then(|v| v.try_into().ok())
            .unwrap_or_else(|| {
                let mut kb = [0u8; 32];
                rand::thread_rng().fill_bytes(&mut kb);
                kb
            })
    })
}
