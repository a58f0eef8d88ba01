//! Parsing client commands out of a RESP byte stream.
//!
//! Both the multi-bulk array form clients actually send
//! (`*<argc>\r\n$<len>\r\n<bytes>\r\n...`) and the plain inline form
//! (a single space-separated line, handy for `nc`/manual testing) are
//! accepted, matching the original server's tolerance for both.

use std::io::{BufRead, Read};

use crate::error::ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<Vec<u8>>,
}

/// Reads one command off `reader`. Returns `Ok(None)` on a clean EOF with
/// no partial command pending.
pub fn parse_command<R: BufRead>(reader: &mut R) -> Result<Option<Command>, ProtocolError> {
    let mut line = Vec::new();
    if read_line(reader, &mut line)? == 0 {
        return Ok(None);
    }

    if line.first() == Some(&b'*') {
        parse_multibulk(reader, &line).map(Some)
    } else {
        parse_inline(&line).map(Some)
    }
}

fn parse_multibulk<R: BufRead>(reader: &mut R, header: &[u8]) -> Result<Command, ProtocolError> {
    let argc = parse_int(&header[1..])?;
    if argc <= 0 {
        return Ok(Command { name: String::new(), args: Vec::new() });
    }

    let mut parts = Vec::with_capacity(argc as usize);
    for _ in 0..argc {
        let mut len_line = Vec::new();
        if read_line(reader, &mut len_line)? == 0 {
            return Err(ProtocolError::UnexpectedEof);
        }
        if len_line.first() != Some(&b'$') {
            return Err(ProtocolError::Malformed("expected bulk string header".to_string()));
        }
        let len = parse_int(&len_line[1..])?;
        if len < 0 {
            return Err(ProtocolError::Malformed("negative bulk length".to_string()));
        }

        let mut payload = vec![0u8; len as usize + 2]; // bytes + trailing CRLF
        reader.read_exact(&mut payload)?;
        payload.truncate(len as usize);
        parts.push(payload);
    }

    if parts.is_empty() {
        return Err(ProtocolError::Malformed("empty command".to_string()));
    }
    let name = String::from_utf8_lossy(&parts[0]).to_lowercase();
    Ok(Command {
        name,
        args: parts.into_iter().skip(1).collect(),
    })
}

fn parse_inline(line: &[u8]) -> Result<Command, ProtocolError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| ProtocolError::Malformed("invalid utf-8 in inline command".to_string()))?;
    let mut words = text.split_whitespace();
    let name = match words.next() {
        Some(w) => w.to_lowercase(),
        None => return Ok(Command { name: String::new(), args: Vec::new() }),
    };
    Ok(Command {
        name,
        args: words.map(|w| w.as_bytes().to_vec()).collect(),
    })
}

/// Reads a line terminated by `\n` (optionally preceded by `\r`) into
/// `buf`, stripping the terminator. Returns the number of bytes the
/// underlying reader yielded (0 signals a clean EOF).
fn read_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> Result<usize, ProtocolError> {
    let n = reader.read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(0);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(n)
}

fn parse_int(bytes: &[u8]) -> Result<i64, ProtocolError> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| {
            ProtocolError::Malformed(format!("invalid integer: {:?}", String::from_utf8_lossy(bytes)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    fn parse(input: &[u8]) -> Command {
        let mut reader = BufReader::new(input);
        parse_command(&mut reader).unwrap().unwrap()
    }

    #[test]
    fn multibulk_set_command() {
        let cmd = parse(b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
        assert_eq!(cmd.name, "set");
        assert_eq!(cmd.args, vec![b"foo".to_vec(), b"bar".to_vec()]);
    }

    #[test]
    fn multibulk_is_case_insensitive_on_name_only() {
        let cmd = parse(b"*2\r\n$3\r\nGET\r\n$3\r\nFoo\r\n");
        assert_eq!(cmd.name, "get");
        assert_eq!(cmd.args, vec![b"Foo".to_vec()]);
    }

    #[test]
    fn inline_ping() {
        let cmd = parse(b"PING\r\n");
        assert_eq!(cmd.name, "ping");
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn inline_with_args_and_bare_lf() {
        let cmd = parse(b"select 2\n");
        assert_eq!(cmd.name, "select");
        assert_eq!(cmd.args, vec![b"2".to_vec()]);
    }

    #[test]
    fn binary_safe_bulk_payload() {
        let cmd = parse(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$4\r\n\x00\x01\r\n\r\n");
        assert_eq!(cmd.args[1], vec![0u8, 1, b'\r', b'\n']);
    }

    #[test]
    fn empty_input_yields_none() {
        let mut reader = BufReader::new(&b""[..]);
        assert!(parse_command(&mut reader).unwrap().is_none());
    }

    #[test]
    fn truncated_multibulk_is_an_error() {
        let mut reader = BufReader::new(&b"*2\r\n$3\r\nGET\r\n"[..]);
        assert!(parse_command(&mut reader).is_err());
    }

    #[test]
    fn del_with_multiple_keys() {
        let cmd = parse(b"*3\r\n$3\r\nDEL\r\n$1\r\na\r\n$1\r\nb\r\n");
        assert_eq!(cmd.name, "del");
        assert_eq!(cmd.args, vec![b"a".to_vec(), b"b".to_vec()]);
    }
}
