use crate::engine::DashboardEngine;
use crate::errors::AppResult;
use crate::tools;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolRequest {
    #[serde(default)]
    id: Option<Value>,
    tool: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Option<Value>, error: String) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Serves JSON-lines tool calls until the input closes. Each request line
/// gets exactly one response line; blank lines are ignored.
pub async fn serve<R, W>(engine: &DashboardEngine, input: R, mut output: W) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ToolRequest>(line) {
            Ok(request) => match tools::dispatch(engine, &request.tool, request.arguments).await {
                Ok(result) => ToolResponse::success(request.id, result),
                Err(error) => {
                    tracing::warn!(tool = %request.tool, error = %error, "tool call failed");
                    ToolResponse::failure(request.id, crate::to_client_error(error))
                }
            },
            Err(error) => ToolResponse::failure(None, format!("INVALID_INPUT: malformed request: {}", error)),
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        output.write_all(&encoded).await?;
        output.flush().await?;
    }
    Ok(())
}
