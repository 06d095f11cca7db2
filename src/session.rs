//! Session identity: who is acting, and the signed join token carrying it.
//!
//! Roles remain trusted client input beyond the signature; the engine checks
//! referee powers against the room document, not the token.

use anyhow::Context;
use base64::Engine;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player,
    Referee,
    Observer,
}

/// The local player's resolved identity for one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub role: Role,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    room: String,
    name: String,
    role: Role,
    iat: i64,
}

// token format: base64url(json).base64url(hmac_sha256(json))
pub fn issue_token(room: &str, who: &Identity) -> anyhow::Result<String> {
    let claims = Claims {
        room: room.to_string(),
        name: who.name.clone(),
        role: who.role,
        iat: OffsetDateTime::now_utc().unix_timestamp(),
    };
    let payload = serde_json::to_vec(&claims)?;
    let part1 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&payload);
    let sig = hmac_sha256(&payload);
    let part2 = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(sig);
    Ok(format!("{}.{}", part1, part2))
}

pub fn verify_token(token: &str) -> anyhow::Result<(String, Identity)> {
    let mut parts = token.split('.');
    let p1 = parts.next().context("missing payload")?;
    let p2 = parts.next().context("missing sig")?;
    if parts.next().is_some() {
        anyhow::bail!("too many parts")
    }
    let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p1)?;
    let sig = base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(p2)?;
    if sig != hmac_sha256(&payload) {
        anyhow::bail!("bad signature")
    }
    let c: Claims = serde_json::from_slice(&payload)?;
    Ok((
        c.room,
        Identity {
            name: c.name,
            role: c.role,
        },
    ))
}

fn hmac_sha256(data: &[u8]) -> [u8; 32] {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;
    type HmacSha256 = Hmac<Sha256>;
    let mut mac =
        HmacSha256::new_from_slice(config::hmac_key()).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().into()
}
