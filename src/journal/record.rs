//! On-disk record framing
//!
//! Each event is one `google.protobuf.Timestamp`, prefixed with its varint
//! encoded length. There is no file header and no record count; a reader
//! keeps decoding until the bytes run out.

use bytes::{Buf, BufMut};
use prost::Message;
use prost_types::Timestamp;

use super::error::Result;
use crate::counter::Event;
use crate::counter::proto::{from_timestamp, to_timestamp};

/// Append one framed record to `buf`
pub fn encode(at: &Event, buf: &mut impl BufMut) -> Result<()> {
    to_timestamp(at).encode_length_delimited(buf)?;
    Ok(())
}

/// Encoded size of one framed record
pub fn encoded_len(at: &Event) -> usize {
    let body = to_timestamp(at).encoded_len();
    prost::length_delimiter_len(body) + body
}

/// Take one framed record off the front of `buf`
pub fn decode(buf: &mut impl Buf) -> Result<Event> {
    let ts = Timestamp::decode_length_delimited(buf)?;
    Ok(from_timestamp(&ts)?)
}
