//! Line-based reading and writing on blocking byte streams.
//!
//! Shared by the transports that talk to an instrument over a plain byte stream, where the end of
//! a response is only known by its terminator.

use std::{
    io::{self, ErrorKind, Read, Write},
    time::{Duration, Instant},
};

use log::warn;

use crate::InstrumentError;

/// Write `data` to the stream and flush it, so the command leaves immediately.
pub(crate) fn write_all<S: Write + ?Sized>(
    stream: &mut S,
    data: &str,
) -> Result<usize, InstrumentError> {
    stream.write_all(data.as_bytes())?;
    stream.flush()?;
    Ok(data.len())
}

/// Read from the stream byte by byte until the response ends with `terminator`.
///
/// The terminator is stripped from the returned response. If the terminator is empty, a single
/// read is performed and whatever arrived is returned. The response is decoded once it is
/// complete, invalid UTF-8 is replaced with a warning.
///
/// # Arguments
/// * `stream` - The stream to read from.
/// * `terminator` - Marks the end of the response.
/// * `timeout` - Time after which the read is given up.
/// * `query` - The query the response belongs to, only used for the error.
pub(crate) fn read_until_terminator<S: Read + ?Sized>(
    stream: &mut S,
    terminator: &str,
    timeout: Duration,
    query: &str,
) -> Result<String, InstrumentError> {
    if terminator.is_empty() {
        let mut buf = [0u8; 1024];
        let n = stream.read(&mut buf)?;
        return Ok(decode(buf[..n].to_vec()));
    }

    let terminator = terminator.as_bytes();
    let mut response: Vec<u8> = Vec::new();
    let mut single_buf = [0u8];
    let tic = Instant::now();

    while tic.elapsed() < timeout {
        stream
            .read_exact(&mut single_buf)
            .map_err(|err| timeout_error(err, query, timeout))?;
        response.push(single_buf[0]);
        if response.ends_with(terminator) {
            response.truncate(response.len() - terminator.len());
            return Ok(decode(response));
        }
    }

    Err(InstrumentError::TimeoutQuery {
        query: query.to_string(),
        timeout,
    })
}

/// Map a socket read that ran into its timeout to [`InstrumentError::TimeoutQuery`].
pub(crate) fn timeout_error(err: io::Error, query: &str, timeout: Duration) -> InstrumentError {
    match err.kind() {
        ErrorKind::WouldBlock | ErrorKind::TimedOut => InstrumentError::TimeoutQuery {
            query: query.to_string(),
            timeout,
        },
        _ => err.into(),
    }
}

fn decode(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|err| {
        warn!("Received invalid UTF-8 data: {:?}", err.as_bytes());
        String::from_utf8_lossy(err.as_bytes()).into_owned()
    })
}
