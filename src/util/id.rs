//! ID utilities (short room codes).

use ulid::Ulid;

/// Generate a short room code from the random tail of a ULID.
///
/// The leading 10 chars of a ULID are the timestamp, so the trailing chars
/// carry the randomness. Six chars are plenty for rooms that live hours.
pub fn new_room_code() -> String {
    let ulid = Ulid::new().to_string();
    ulid.chars().rev().take(6).collect()
}
