//! Command bridge.
//!
//! Chat integrations feed commands over newline-delimited JSON:
//!
//! ```text
//! -> {"id":1,"room":"#ops","sender":"alice","text":"grafana list"}
//! <- {"id":1,"lines":["0 Grafana instances found"]}
//! ```
//!
//! Lines that are not valid requests get `{"id":0,"error":"..."}`.

use relay_commands::{CommandContext, CommandRouter};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::ServerResult;

/// One command typed in chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRequest {
    /// Correlation ID echoed in the response.
    pub id: u64,
    /// Room the command was typed in.
    pub room: String,
    /// Who typed it.
    pub sender: String,
    /// The command line.
    pub text: String,
}

/// Answer to a [`BridgeRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    /// Lines to post back to the room.
    Reply {
        /// Request ID.
        id: u64,
        /// Reply lines.
        lines: Vec<String>,
    },
    /// The request line could not be understood.
    Error {
        /// Always 0, the request ID is unknown.
        id: u64,
        /// Parse error.
        error: String,
    },
}

/// Handles one request line.
pub async fn handle_line(router: &CommandRouter, line: &str) -> BridgeResponse {
    let request: BridgeRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "invalid bridge request");
            return BridgeResponse::Error {
                id: 0,
                error: e.to_string(),
            };
        }
    };

    debug!(id = request.id, room = %request.room, "handling bridge request");
    let ctx = CommandContext::new(request.room, request.sender);
    let reply = router.dispatch(&ctx, &request.text).await;
    BridgeResponse::Reply {
        id: request.id,
        lines: reply.lines,
    }
}

/// Runs the bridge until `reader` reaches EOF.
///
/// Returns the number of requests answered.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub async fn run<R, W>(router: &CommandRouter, reader: R, mut writer: W) -> ServerResult<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(router, &line).await;
        let mut json = serde_json::to_string(&response).unwrap_or_else(|_| {
            r#"{"id":0,"error":"failed to serialize response"}"#.to_string()
        });
        json.push('\n');
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
        answered += 1;
    }

    info!(answered, "command bridge reached end of input");
    Ok(answered)
}

/// Runs the bridge over the process's stdin and stdout.
///
/// # Errors
///
/// Returns an error if reading stdin or writing stdout fails.
pub async fn run_stdio(router: &CommandRouter) -> ServerResult<usize> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run(router, stdin, tokio::io::stdout()).await
}
