use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct CdCommand;

#[async_trait]
impl VirtualCommand for CdCommand {
    fn name(&self) -> &'static str {
        "cd"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let target = match ctx.args.first() {
            Some(a) => a.clone(),
            None => ctx.env.get("HOME").cloned().unwrap_or_else(|| "/".to_string()),
        };
        let path = ctx.cwd.join(&target);
        let resolved = match tokio::fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(_) => {
                let msg = format!("cd: {target}: No such file or directory\n");
                return CommandOutcome::Buffered(CommandResult::error(msg, 1));
            }
        };
        match tokio::fs::metadata(&resolved).await {
            Ok(meta) if meta.is_dir() => CommandOutcome::Buffered(CommandResult {
                cwd_override: Some(resolved),
                ..CommandResult::ok_empty()
            }),
            Ok(_) => CommandOutcome::Buffered(CommandResult::error(
                format!("cd: {target}: Not a directory\n"),
                1,
            )),
            Err(_) => CommandOutcome::Buffered(CommandResult::error(
                format!("cd: {target}: No such file or directory\n"),
                1,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn cd_into_existing_dir_sets_cwd_override() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext {
            args: vec![dir.path().to_string_lossy().to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: std::env::current_dir().unwrap(),
            env: HashMap::new(),
        };
        match CdCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(r.exit_code, 0);
                assert!(r.cwd_override.is_some());
            }
            _ => panic!("expected buffered result"),
        }
    }

    #[tokio::test]
    async fn cd_into_missing_dir_errors() {
        let ctx = CommandContext {
            args: vec!["/does/not/exist/at/all".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: std::env::current_dir().unwrap(),
            env: HashMap::new(),
        };
        match CdCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 1),
            _ => panic!("expected buffered result"),
        }
    }
}
