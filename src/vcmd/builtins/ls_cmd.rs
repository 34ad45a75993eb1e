use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct LsCommand;

#[async_trait]
impl VirtualCommand for LsCommand {
    fn name(&self) -> &'static str {
        "ls"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut show_hidden = false;
        let mut targets: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-a" | "--all" => show_hidden = true,
                "-l" => {} // long format not distinguished from the default here
                _ if !arg.starts_with('-') => targets.push(arg),
                _ => {}
            }
        }
        if targets.is_empty() {
            targets.push(".");
        }

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let multiple = targets.len() > 1;

        for (i, target) in targets.iter().enumerate() {
            let path = ctx.cwd.join(target);
            let mut entries = match tokio::fs::read_dir(&path).await {
                Ok(rd) => rd,
                Err(_) => {
                    stderr.push_str(&format!(
                        "ls: cannot access '{target}': No such file or directory\n"
                    ));
                    exit_code = 1;
                    continue;
                }
            };
            let mut names = Vec::new();
            while let Ok(Some(entry)) = entries.next_entry().await {
                let name = entry.file_name().to_string_lossy().to_string();
                if !show_hidden && name.starts_with('.') {
                    continue;
                }
                names.push(name);
            }
            names.sort();
            if multiple {
                stdout.push_str(&format!("{target}:\n"));
            }
            for name in names {
                stdout.push_str(&name);
                stdout.push('\n');
            }
            if multiple && i + 1 < targets.len() {
                stdout.push('\n');
            }
        }

        CommandOutcome::Buffered(CommandResult {
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
            exit_code,
            cwd_override: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn lists_sorted_visible_entries() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("b.txt"), "").await.unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "").await.unwrap();
        tokio::fs::write(dir.path().join(".hidden"), "").await.unwrap();
        let ctx = CommandContext {
            args: vec![],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match LsCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "a.txt\nb.txt\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn missing_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext {
            args: vec!["nope".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match LsCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.exit_code, 1),
            _ => panic!(),
        }
    }
}
