//! Request/response framing shared by every transport.
//!
//! Only the first response line is read. Everything after it (headers, body,
//! a trailing close) is ignored.

use super::ProbeError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Longest status line accepted before the response is treated as malformed.
pub const MAX_STATUS_LINE: u64 = 8 * 1024;

/// Writes `request` and reads back the response status code.
///
/// # Errors
///
/// - [`ProbeError::Io`] if writing or reading fails.
/// - [`ProbeError::EmptyResponse`] if the peer closes without sending anything.
/// - [`ProbeError::MalformedStatusLine`] if the first line does not parse.
pub async fn exchange<S>(stream: &mut S, request: &[u8]) -> Result<u16, ProbeError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(request).await?;
    stream.flush().await?;

    let mut reader = BufReader::new((&mut *stream).take(MAX_STATUS_LINE));
    let mut line = Vec::with_capacity(64);
    let read = reader.read_until(b'\n', &mut line).await?;
    if read == 0 {
        return Err(ProbeError::EmptyResponse);
    }

    parse_status_line(&line)
}

/// Extracts the status code from a `protocol code reason` line.
///
/// Bytes are decoded one-to-one into chars (ISO-8859-1), so arbitrary binary
/// garbage still yields a printable error rather than a decoding failure.
///
/// # Errors
///
/// Returns [`ProbeError::MalformedStatusLine`] if the line has fewer than two
/// fields or the second field is not a three-digit status code.
pub fn parse_status_line(line: &[u8]) -> Result<u16, ProbeError> {
    let text: String = line.iter().map(|&b| char::from(b)).collect();
    let mut parts = text.split_whitespace();

    let status = match (parts.next(), parts.next()) {
        (Some(_protocol), Some(code)) if code.len() == 3 => code.parse::<u16>().ok(),
        _ => None,
    };

    status.ok_or_else(|| ProbeError::MalformedStatusLine {
        line: text.trim().to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[test]
    fn parses_well_formed_lines() {
        assert_eq!(parse_status_line(b"HTTP/1.1 200 OK\r\n").unwrap(), 200);
        assert_eq!(parse_status_line(b"HTTP/1.1 404 Not Found\r\n").unwrap(), 404);
        assert_eq!(parse_status_line(b"HTTP/1.0 301\n").unwrap(), 301);
    }

    #[test]
    fn rejects_malformed_lines() {
        for line in [
            &b"\r\n"[..],
            b"HTTP/1.1\r\n",
            b"HTTP/1.1 OK 200\r\n",
            b"HTTP/1.1 2000 OK\r\n",
            b"\xff\xfe\xfd",
        ] {
            assert!(
                matches!(
                    parse_status_line(line),
                    Err(ProbeError::MalformedStatusLine { .. })
                ),
                "{line:?}"
            );
        }
    }

    #[tokio::test]
    async fn exchange_sends_request_and_reads_status() {
        let (mut client, mut server) = duplex(1024);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0_u8; 256];
            let n = server.read(&mut buf).await.unwrap();
            server
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n")
                .await
                .unwrap();
            String::from_utf8(buf[..n].to_vec()).unwrap()
        });

        let status = exchange(&mut client, b"HEAD /x HTTP/1.1\r\n\r\n")
            .await
            .unwrap();
        assert_eq!(status, 200);
        assert_eq!(server_task.await.unwrap(), "HEAD /x HTTP/1.1\r\n\r\n");
    }

    #[tokio::test]
    async fn exchange_reports_empty_response() {
        let (mut client, server) = duplex(1024);
        drop(server);

        // The write fails first when the peer is already gone; both are
        // probe errors.
        let err = exchange(&mut client, b"HEAD / HTTP/1.1\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Io(_) | ProbeError::EmptyResponse));
    }

    #[tokio::test]
    async fn exchange_reports_close_without_data() {
        let (mut client, mut server) = duplex(1024);

        let server_task = tokio::spawn(async move {
            let mut buf = vec![0_u8; 256];
            let _ = server.read(&mut buf).await.unwrap();
            server.shutdown().await.unwrap();
            // Keep the read half alive until the client has finished.
            server
        });

        let err = exchange(&mut client, b"HEAD / HTTP/1.1\r\n\r\n")
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::EmptyResponse));
        drop(server_task.await.unwrap());
    }
}
