use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct TouchCommand;

#[async_trait]
impl VirtualCommand for TouchCommand {
    fn name(&self) -> &'static str {
        "touch"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let files: Vec<&str> = ctx.args.iter().map(String::as_str).filter(|a| !a.starts_with('-')).collect();
        if files.is_empty() {
            return CommandOutcome::Buffered(CommandResult::error("touch: missing file operand\n", 1));
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for file in files {
            let path = ctx.cwd.join(file);
            if let Err(e) = tokio::fs::OpenOptions::new().create(true).append(true).open(&path).await {
                stderr.push_str(&format!(
                    "touch: cannot touch '{file}': {e}\n"
                ));
                exit_code = 1;
            }
        }
        CommandOutcome::Buffered(CommandResult {
            stderr: stderr.into_bytes(),
            exit_code,
            ..CommandResult::ok_empty()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext {
            args: vec!["new.txt".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match TouchCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 0),
            _ => panic!(),
        }
        assert!(dir.path().join("new.txt").exists());
    }
}
