//! Line-oriented chat loop.

use crate::agent::{Agent, ToolInvoker};
use crate::error::Result;
use crate::model::ChatModel;
use async_trait::async_trait;
use owo_colors::OwoColorize as _;
use tokio::io::{AsyncBufRead, AsyncBufReadExt as _, AsyncWrite, AsyncWriteExt as _};

/// Inputs that end the session, compared case-insensitively after trimming.
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "bye"];

#[must_use]
pub fn is_exit_keyword(line: &str) -> bool {
    let line = line.trim();
    EXIT_KEYWORDS.iter().any(|k| line.eq_ignore_ascii_case(k))
}

/// Something that answers one user line at a time.
#[async_trait]
pub trait Conversation: Send {
    async fn respond(&mut self, input: &str) -> Result<String>;
}

#[async_trait]
impl<M, I> Conversation for Agent<M, I>
where
    M: ChatModel,
    I: ToolInvoker,
{
    async fn respond(&mut self, input: &str) -> Result<String> {
        self.send(input).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplStyle {
    pub color: bool,
}

impl ReplStyle {
    fn user(self) -> String {
        if self.color {
            "You:".green().bold().to_string()
        } else {
            "You:".to_string()
        }
    }

    fn agent(self) -> String {
        if self.color {
            "Agent:".cyan().bold().to_string()
        } else {
            "Agent:".to_string()
        }
    }
}

/// Read lines from `input` until an exit keyword or end of input, answering each through
/// `conversation`. Blank lines re-prompt. Returns the number of answered turns.
///
/// The first error from `conversation` ends the loop and is returned.
pub async fn run_interactive<R, W, C>(
    input: R,
    output: &mut W,
    conversation: &mut C,
    style: ReplStyle,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Conversation + ?Sized,
{
    let mut lines = input.lines();
    let mut turns = 0;
    loop {
        output
            .write_all(format!("\n{} ", style.user()).as_bytes())
            .await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if is_exit_keyword(line) {
            break;
        }

        let answer = conversation.respond(line).await?;
        output
            .write_all(format!("\n{} {answer}\n", style.agent()).as_bytes())
            .await?;
        turns += 1;
    }
    output.write_all(b"\nGoodbye!\n").await?;
    output.flush().await?;
    Ok(turns)
}
