//! The read-print loop over any async line source and sink.

use crate::agent::Session;
use ragline_core::error::AgentError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info, warn};

const TOOL_LOOP_APOLOGY: &str =
    "I'm sorry, I couldn't finish that answer: too many tool calls in a row. Please try rephrasing.";

/// Drive `session` from `input` until end-of-input.
///
/// Every line read, including an empty one, is one agent round. Round
/// failures are printed and the loop carries on; only I/O errors end it.
pub async fn run_repl<R, W>(
    session: &mut Session,
    banner: &str,
    mut input: R,
    mut output: W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output.write_all(format!("\n{banner}\n").as_bytes()).await?;

    let mut rounds = 0;
    let mut line = Vec::new();
    loop {
        output.write_all(b"\nUSER: ").await?;
        output.flush().await?;

        line.clear();
        if input.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        // Invalid UTF-8 is replaced, not fatal.
        let decoded = String::from_utf8_lossy(&line);
        let text = decoded.trim_end_matches(['\r', '\n']);

        let reply = match session.run_turn(text).await {
            Ok(report) => report.answer,
            Err(AgentError::ToolLoopExceeded { hops }) => {
                warn!(hops, "Round abandoned");
                TOOL_LOOP_APOLOGY.to_string()
            }
            Err(AgentError::Provider(e)) => {
                error!(error = %e, "Model request failed");
                format!("I'm sorry, the model request failed: {e}")
            }
        };
        rounds += 1;

        output
            .write_all(format!("\nASSISTANT: {reply}\n").as_bytes())
            .await?;
        output.flush().await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    info!(rounds, "Input closed, session ended");
    Ok(rounds)
}
