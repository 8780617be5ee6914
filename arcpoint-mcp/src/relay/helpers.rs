//! Line framing shared by the stdin reader and the event stream listener.
//!
//! Both directions are newline-delimited and both peers are untrusted, so
//! every read is capped at [`MAX_LINE_BYTES`](arcpoint_mcp_core::transport::MAX_LINE_BYTES).

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::FramingError;

/// Upper bound on discarding the tail of an oversized line.
const SKIP_TIMEOUT: Duration = Duration::from_secs(30);

/// Append the next line from `reader` to `buf`, at most `max_bytes` of it.
///
/// The returned count includes the `\n` terminator when present; the last
/// line of a stream may lack one. `Ok(0)` means EOF.
///
/// A line longer than `max_bytes` is never buffered whole. Its remainder is
/// consumed up to the next newline so the caller resumes on a fresh line:
/// the stdin reader logs and skips it, the event stream listener treats it as
/// a stream failure and reconnects. `buf` contents are unspecified after
/// [`FramingError::MessageTooLarge`].
pub(crate) async fn bounded_read_line<R>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, FramingError>
where
    R: AsyncBufRead + Unpin,
{
    let mut read = 0usize;
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(read);
        }

        let newline = chunk.iter().position(|&b| b == b'\n');
        let take = newline.map_or(chunk.len(), |pos| pos + 1);

        if read + take > max_bytes {
            reader.consume(take);
            if newline.is_none() {
                skip_rest_of_line(reader).await;
            }
            return Err(FramingError::MessageTooLarge { max_bytes });
        }

        buf.extend_from_slice(&chunk[..take]);
        reader.consume(take);
        read += take;

        if newline.is_some() {
            return Ok(read);
        }
    }
}

/// Consume bytes through the next newline, EOF, or [`SKIP_TIMEOUT`].
async fn skip_rest_of_line<R>(reader: &mut R)
where
    R: AsyncBufRead + Unpin,
{
    let skip = async {
        loop {
            let chunk = match reader.fill_buf().await {
                Ok([]) => return,
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!(error = %e, "read failed while skipping oversized line");
                    return;
                }
            };
            match chunk.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    reader.consume(pos + 1);
                    return;
                }
                None => {
                    let len = chunk.len();
                    reader.consume(len);
                }
            }
        }
    };
    if tokio::time::timeout(SKIP_TIMEOUT, skip).await.is_err() {
        tracing::warn!(
            timeout_secs = SKIP_TIMEOUT.as_secs(),
            "gave up skipping oversized line"
        );
    }
}

/// Strip trailing `\n` / `\r` bytes.
pub(crate) fn trim_line_end(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    &line[..end]
}
