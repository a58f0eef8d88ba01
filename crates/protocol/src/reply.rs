//! Serializing [`Reply`] values to RESP wire bytes.

use std::io::Write;

use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Bulk(Option<Vec<u8>>),
    Integer(i64),
    Array(Vec<Reply>),
}

/// Writes `reply` to `writer` in RESP wire format. Does not flush.
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<(), ProtocolError> {
    match reply {
        Reply::Simple(s) => write!(writer, "+{s}\r\n").map_err(ProtocolError::Io),
        Reply::Error(s) => write!(writer, "-{s}\r\n").map_err(ProtocolError::Io),
        Reply::Integer(n) => write!(writer, ":{n}\r\n").map_err(ProtocolError::Io),
        Reply::Bulk(None) => write!(writer, "$-1\r\n").map_err(ProtocolError::Io),
        Reply::Bulk(Some(bytes)) => {
            write!(writer, "${}\r\n", bytes.len()).map_err(ProtocolError::Io)?;
            writer.write_all(bytes).map_err(ProtocolError::Io)?;
            writer.write_all(b"\r\n").map_err(ProtocolError::Io)
        }
        Reply::Array(items) => {
            write!(writer, "*{}\r\n", items.len()).map_err(ProtocolError::Io)?;
            for item in items {
                write_reply(writer, item)?;
            }
            Ok(())
        }
    }
}
