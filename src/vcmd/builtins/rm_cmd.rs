use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct RmCommand;

#[async_trait]
impl VirtualCommand for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut recursive = false;
        let mut force = false;
        let mut targets: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "-R" | "--recursive" => recursive = true,
                "-f" | "--force" => force = true,
                "-rf" | "-fr" => {
                    recursive = true;
                    force = true;
                }
                _ if !arg.starts_with('-') => targets.push(arg),
                _ => {}
            }
        }
        if targets.is_empty() {
            if force {
                return CommandOutcome::Buffered(CommandResult::ok_empty());
            }
            return CommandOutcome::Buffered(CommandResult::error("rm: missing operand\n", 1));
        }

        let mut stderr = String::new();
        let mut exit_code = 0;
        for target in targets {
            let path = ctx.cwd.join(target);
            let meta = tokio::fs::metadata(&path).await;
            let result = match meta {
                Ok(m) if m.is_dir() && recursive => tokio::fs::remove_dir_all(&path).await,
                Ok(m) if m.is_dir() => Err(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "is a directory",
                )),
                Ok(_) => tokio::fs::remove_file(&path).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                if force {
                    continue;
                }
                stderr.push_str(&format!("rm: cannot remove '{target}': {e}\n"));
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
    async fn removes_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.txt");
        tokio::fs::write(&file, "hi").await.unwrap();
        let ctx = CommandContext {
            args: vec!["x.txt".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match RmCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 0),
            _ => panic!(),
        }
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn force_suppresses_missing_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext {
            args: vec!["-f".to_string(), "nope.txt".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match RmCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 0),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn directory_without_recursive_errors() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("d");
        tokio::fs::create_dir(&sub).await.unwrap();
        let ctx = CommandContext {
            args: vec!["d".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match RmCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 1),
            _ => panic!(),
        }
    }
}
