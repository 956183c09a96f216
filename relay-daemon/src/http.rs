//! Minimal HTTP/1.1 status endpoint.
//!
//! One route: `GET /status` renders the aggregated plain-text report, 200
//! when every job is healthy and fresh, 503 otherwise. Anything else is 404.
//! Connections are short-lived (`Connection: close`); there is no keep-alive
//! and no body parsing.

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use relay_status::{render_report, StatusBoard, STALENESS_THRESHOLD};

use crate::error::DaemonError;

/// Upper bound on request head lines read before giving up on a client.
const MAX_HEADER_LINES: usize = 64;

/// Accept loop. Accept errors are logged and the loop continues; a
/// misbehaving client must never take the health endpoint down with it.
pub(crate) async fn serve(
    listener: TcpListener,
    board: StatusBoard,
    cancel: CancellationToken,
) -> Result<(), DaemonError> {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => {
                let (stream, _) = match accepted {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        tracing::warn!(error = %err, "status listener accept failed");
                        continue;
                    }
                };
                let board = board.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_client(stream, board).await {
                        tracing::debug!(error = %err, "status client error");
                    }
                });
            }
        }
    }
    Ok(())
}

async fn handle_client(stream: TcpStream, board: StatusBoard) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let Some(request_line) = lines.next_line().await? else {
        return Ok(());
    };

    // Drain the header block so the peer sees an orderly close, not a reset.
    let mut drained = 0;
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            break;
        }
        drained += 1;
        if drained >= MAX_HEADER_LINES {
            break;
        }
    }

    let response = match parse_request_line(&request_line) {
        Some(("GET", "/status")) => {
            let views = board.snapshot_all().await;
            let report = render_report(&views, STALENESS_THRESHOLD, Utc::now());
            let status = if report.healthy { 200 } else { 503 };
            http_response(status, &report.body)
        }
        Some(_) => http_response(404, "not found\n"),
        None => http_response(400, "bad request\n"),
    };

    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

fn parse_request_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    Some((method, target))
}

fn http_response(status: u16, body: &str) -> String {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    };
    format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
