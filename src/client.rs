//! Interactive client: one connection, one message per input line.
//!
//! Reads lines from an input source, sends each non-empty line, waits
//! for the transformed reply, and writes it to the output. An empty
//! line or end-of-input ends the session with a graceful close. The
//! session loop is generic over input and output so tests can script
//! it; [`run`] wires it to stdin and stdout.

use crate::connection::{Connection, Endpoint};
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

/// Connect to `endpoint` and run an interactive session over stdin and
/// stdout.
///
/// Connection faults end the session; there is no automatic retry.
pub async fn run(endpoint: &Endpoint, read_cap: usize) -> io::Result<()> {
    let conn = Connection::open(endpoint).await?;
    info!(peer = %conn.peer(), "connected");
    let input = BufReader::new(tokio::io::stdin());
    run_session(conn, input, tokio::io::stdout(), read_cap).await
}

/// Drive one request/response exchange per input line until an empty
/// line, end-of-input, or an I/O fault.
pub async fn run_session<S, R, W>(
    mut conn: Connection<S>,
    input: R,
    mut output: W,
    read_cap: usize,
) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await? {
            Some(line) if !line.is_empty() => line,
            _ => break,
        };

        conn.enqueue(line.as_bytes())?;
        conn.drain().await?;
        debug!(bytes = line.len(), "sent");

        match conn.read(read_cap).await? {
            Some(reply) => {
                debug!(bytes = reply.len(), "received");
                output.write_all(&reply).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            None => {
                info!("server closed the connection");
                break;
            }
        }
    }

    info!("closing connection");
    conn.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::ProcessingDelay;
    use crate::handler::ConnectionHandler;
    use std::io::Cursor;

    async fn session_output(script: &'static [u8]) -> Vec<u8> {
        let (server_end, client_end) = tokio::io::duplex(1024);

        let server_conn = Connection::from_stream(server_end, "client".to_string());
        let server = tokio::spawn(ConnectionHandler::new(server_conn, 1024, ProcessingDelay::None).run());

        let conn = Connection::from_stream(client_end, "server".to_string());
        let mut output = Cursor::new(Vec::new());
        run_session(conn, script, &mut output, 1024).await.unwrap();

        server.await.unwrap().unwrap();
        output.into_inner()
    }

    #[tokio::test]
    async fn test_session_sends_lines_and_displays_replies() {
        let output = session_output(b"hello\nworld\n\n").await;
        assert_eq!(output, b"OLLEH\nDLROW\n");
    }

    #[tokio::test]
    async fn test_empty_first_line_terminates_without_sending() {
        let output = session_output(b"\nnever sent\n").await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_end_of_input_terminates_the_session() {
        let output = session_output(b"ping\n").await;
        assert_eq!(output, b"GNIP\n");
    }
}
