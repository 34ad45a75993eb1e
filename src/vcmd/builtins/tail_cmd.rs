use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, VirtualCommand};

use super::head_cmd::run_head_tail;

pub struct TailCommand;

#[async_trait]
impl VirtualCommand for TailCommand {
    fn name(&self) -> &'static str {
        "tail"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        run_head_tail(ctx, "tail", false, |lines, n| {
            let start = lines.len().saturating_sub(n);
            lines[start..].iter().map(|s| s.to_string()).collect()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn tail_default_is_last_ten_lines() {
        let content: String = (1..=15).map(|i| format!("line{i}\n")).collect();
        let ctx = CommandContext {
            args: vec![],
            stdin: StdinInput::Bytes(content.into_bytes()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match TailCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                let text = String::from_utf8(r.stdout).unwrap();
                assert!(text.starts_with("line6\n"));
                assert!(text.ends_with("line15\n"));
            }
            _ => panic!(),
        }
    }
}
