use crate::actions::{list_actions_result, Dispatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tracing::{info, warn};

pub const MAX_REQUEST_LINE_BYTES: usize = 1_000_000;

/// One inbound frame from the conversation layer: a named action plus its
/// argument mapping, correlated by an opaque id.
#[derive(Debug, Deserialize)]
struct ActionRequest {
    id: Value,
    action: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize)]
struct ActionResponse {
    id: Value,
    ok: bool,
    reply: String,
}

async fn write_frame<W, T>(out: &mut W, v: &T) -> eyre::Result<()>
where
    W: tokio::io::AsyncWrite + Unpin + Send,
    T: Serialize + Sync,
{
    use tokio::io::AsyncWriteExt as _;

    out.write_all(format!("{}\n", serde_json::to_string(v)?).as_bytes())
        .await?;
    out.flush().await?;
    Ok(())
}

/// Line-delimited JSON loop over stdio. Malformed input is logged and
/// skipped; action failures come back as ordinary response frames. The loop
/// itself only errors on broken stdio.
pub async fn run(dispatcher: &Dispatcher) -> eyre::Result<()> {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    info!("action server listening on stdio");

    while let Some(line) = stdin.next_line().await? {
        if line.len() > MAX_REQUEST_LINE_BYTES {
            warn!(bytes = line.len(), "oversized request line, closing");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        let req: ActionRequest = match serde_json::from_str(&line) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "invalid request frame");
                continue;
            }
        };

        if req.action == "list_actions" {
            let mut frame = list_actions_result();
            if let Some(obj) = frame.as_object_mut() {
                obj.insert("id".to_owned(), req.id);
                obj.insert("ok".to_owned(), Value::Bool(true));
            }
            write_frame(&mut stdout, &frame).await?;
            continue;
        }

        let reply = dispatcher.dispatch(&req.action, req.args).await;
        write_frame(
            &mut stdout,
            &ActionResponse {
                id: req.id,
                ok: reply.is_success(),
                reply: reply.render(),
            },
        )
        .await?;
    }

    Ok(())
}
