//! Line-oriented terminal front end
//!
//! Reads one utterance per line and writes `bot> {response}`. The optional
//! typing delay is applied here, before the selector is asked, so the engine
//! itself never sleeps.

use crate::selector::ResponseSelector;
use crate::Result;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

pub const WELCOME: &str = "🤖 Parley: Hello! I'm your assistant. I can remember our \
conversations and fetch live information. Type 'help' for options.";

/// Run a conversation until EOF or an exit phrase
pub async fn run_repl<R, W>(
    selector: &mut ResponseSelector,
    reader: R,
    mut writer: W,
    typing_delay: Option<Duration>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("{}\n", WELCOME).as_bytes()).await?;
    writer.flush().await?;

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let utterance = line.trim();
        if utterance.is_empty() {
            continue;
        }

        if let Some(delay) = typing_delay {
            tokio::time::sleep(delay).await;
        }

        let response = selector.handle_turn(utterance).await;
        writer
            .write_all(format!("bot> {}\n", response).as_bytes())
            .await?;
        writer.flush().await?;

        if selector.shutdown_requested() {
            debug!("Exit phrase received, ending session");
            break;
        }
    }
    Ok(())
}
