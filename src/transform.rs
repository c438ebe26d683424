//! The message transform applied to every inbound payload.
//!
//! Payloads are UTF-8 text by convention. The reply is the text
//! uppercased and then reversed character by character (not byte by
//! byte, so multi-byte characters survive the reversal).

use std::str::Utf8Error;

/// Transform an inbound payload into its reply.
///
/// Returns a decode error when the payload is not valid UTF-8; the
/// caller decides what that means for the connection.
pub fn transform(input: &[u8]) -> Result<Vec<u8>, Utf8Error> {
    let text = std::str::from_utf8(input)?;
    let reply: String = text.to_uppercase().chars().rev().collect();
    Ok(reply.into_bytes())
}
