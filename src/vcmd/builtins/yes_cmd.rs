use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::vcmd::{ChunkSource, CommandContext, StdinInput, CommandOutcome, VirtualCommand};

pub struct YesCommand;

#[async_trait]
impl VirtualCommand for YesCommand {
    fn name(&self) -> &'static str {
        "yes"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let text = if ctx.args.is_empty() { "y".to_string() } else { ctx.args.join(" ") };
        CommandOutcome::Streaming(Box::new(YesSource { line: format!("{text}\n").into_bytes() }))
    }
}

/// Never terminates on its own — checks `cancel` before producing each
/// chunk so a pipeline like `yes | head -n3` stops promptly once the
/// downstream consumer is gone and the runner cancels this source.
struct YesSource {
    line: Vec<u8>,
}

#[async_trait]
impl ChunkSource for YesSource {
    async fn next_chunk(&mut self, cancel: &CancellationToken) -> Option<Vec<u8>> {
        if cancel.is_cancelled() {
            return None;
        }
        Some(self.line.clone())
    }
}
