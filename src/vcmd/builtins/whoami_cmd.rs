use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct WhoamiCommand;

#[async_trait]
impl VirtualCommand for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let name = ctx
            .env
            .get("USER")
            .or_else(|| ctx.env.get("LOGNAME"))
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let mut out = name;
        out.push('\n');
        CommandOutcome::Buffered(CommandResult::success(out.into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn reads_user_from_env() {
        let mut env = HashMap::new();
        env.insert("USER".to_string(), "alice".to_string());
        let ctx = CommandContext { args: vec![], stdin: StdinInput::Bytes(Vec::new()), cwd: "/".into(), env };
        match WhoamiCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"alice\n"),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn falls_back_when_no_user_env() {
        let ctx = CommandContext { args: vec![], stdin: StdinInput::Bytes(Vec::new()), cwd: "/".into(), env: HashMap::new() };
        match WhoamiCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"unknown\n"),
            _ => panic!(),
        }
    }
}
