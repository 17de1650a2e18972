/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Bounded line reading for the command connection.

use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Outcome of reading one line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Line {
    /// A line without its `\n` terminator.
    Complete(String),
    /// The line exceeded the limit. It has been consumed up to and including
    /// its terminator, so the next read starts at the following line.
    TooLong,
    /// The peer closed the stream.
    Eof,
}

/// Reads one `\n`-terminated line, buffering at most `max` bytes of it.
///
/// Bytes past the limit are discarded as they arrive, so a peer that never
/// sends a line break cannot grow the buffer. A final line without a
/// terminator is returned as complete.
///
/// # Errors
///
/// Returns the underlying I/O error, or [`io::ErrorKind::InvalidData`] if
/// the line is not valid UTF-8.
pub(crate) async fn read_line<R>(reader: &mut R, max: usize) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let mut overflow = false;
    let mut seen_any = false;

    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            seen_any = true;
            match available.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    if !overflow {
                        line.extend_from_slice(&available[..end]);
                    }
                    (end + 1, true)
                }
                None => {
                    if !overflow {
                        line.extend_from_slice(available);
                    }
                    (available.len(), false)
                }
            }
        };
        reader.consume(used);

        if line.len() > max {
            overflow = true;
            line = Vec::new();
        }
        if done {
            break;
        }
    }

    if overflow {
        return Ok(Line::TooLong);
    }
    if !seen_any {
        return Ok(Line::Eof);
    }
    String::from_utf8(line)
        .map(Line::Complete)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
