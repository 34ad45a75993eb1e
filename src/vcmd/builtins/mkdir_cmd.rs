use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct MkdirCommand;

#[async_trait]
impl VirtualCommand for MkdirCommand {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut parents = false;
        let mut dirs: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-p" | "--parents" => parents = true,
                _ if !arg.starts_with('-') => dirs.push(arg),
                _ => {}
            }
        }
        if dirs.is_empty() {
            return CommandOutcome::Buffered(CommandResult::error(
                "mkdir: missing operand\n",
                1,
            ));
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for dir in dirs {
            let path = ctx.cwd.join(dir);
            let result = if parents {
                tokio::fs::create_dir_all(&path).await
            } else {
                tokio::fs::create_dir(&path).await
            };
            if let Err(e) = result {
                stderr.push_str(&format!("mkdir: cannot create directory '{dir}': {e}\n"));
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
