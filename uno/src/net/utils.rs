use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{ProtocolError, Result};

/// Longest client line accepted, newline excluded. A card choice or
/// `NO_CARD` never comes close.
pub const MAX_LINE_SIZE: usize = 256;

/// Read one newline-terminated line, stripped of its line ending.
///
/// Returns `Ok(None)` on a clean EOF. An oversized line is consumed up to its
/// newline so the stream stays aligned, then reported as
/// [`ProtocolError::LineTooLong`].
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    let mut buf = Vec::new();
    let limit = (MAX_LINE_SIZE + 2) as u64;
    let n = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if n == 0 {
        return Ok(None);
    }

    if buf.last() != Some(&b'\n') {
        if n as u64 == limit {
            discard_line(reader).await?;
            return Err(ProtocolError::LineTooLong { max: MAX_LINE_SIZE });
        }
        // EOF without a trailing newline still delivers what was sent.
    }

    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    if buf.len() > MAX_LINE_SIZE {
        return Err(ProtocolError::LineTooLong { max: MAX_LINE_SIZE });
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

async fn discard_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> io::Result<()> {
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(());
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
}

/// Write `text` in one call and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, text: &str) -> io::Result<()> {
    writer.write_all(text.as_bytes()).await?;
    writer.flush().await
}

/// Write a single-line message, appending the newline.
pub async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> io::Result<()> {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    write_message(writer, &buf).await
}
