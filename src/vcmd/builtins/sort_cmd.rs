use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct SortCommand;

#[async_trait]
impl VirtualCommand for SortCommand {
    fn name(&self) -> &'static str {
        "sort"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut reverse = false;
        let mut unique = false;
        let mut numeric = false;
        let mut files: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-r" | "--reverse" => reverse = true,
                "-u" | "--unique" => unique = true,
                "-n" | "--numeric-sort" => numeric = true,
                _ if !arg.starts_with('-') => files.push(arg),
                _ => {}
            }
        }

        let mut input = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        if files.is_empty() {
            input = String::from_utf8_lossy(&ctx.stdin.collect().await).into_owned();
        } else {
            for file in &files {
                let path = ctx.cwd.join(file);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => input.push_str(&String::from_utf8_lossy(&bytes)),
                    Err(_) => {
                        stderr.push_str(&format!("sort: cannot read: {file}: No such file or directory\n"));
                        exit_code = 1;
                    }
                }
            }
        }

        let mut lines: Vec<&str> = input.lines().collect();
        if numeric {
            lines.sort_by(|a, b| {
                let na: f64 = a.trim().parse().unwrap_or(0.0);
                let nb: f64 = b.trim().parse().unwrap_or(0.0);
                na.partial_cmp(&nb).unwrap_or(std::cmp::Ordering::Equal)
            });
        } else {
            lines.sort();
        }
        if reverse {
            lines.reverse();
        }
        if unique {
            lines.dedup();
        }

        let mut stdout = lines.join("\n");
        if !lines.is_empty() {
            stdout.push('\n');
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

    fn ctx(stdin: &str, args: Vec<&str>) -> CommandContext {
        CommandContext {
            args: args.into_iter().map(String::from).collect(),
            stdin: StdinInput::Bytes(stdin.as_bytes().to_vec()),
            cwd: "/".into(),
            env: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn sorts_lexicographically() {
        match SortCommand.execute(ctx("banana\napple\ncherry\n", vec![])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "apple\nbanana\ncherry\n");
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn reverse_and_unique_compose() {
        match SortCommand.execute(ctx("b\na\nb\na\n", vec!["-r", "-u"])).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(String::from_utf8(r.stdout).unwrap(), "b\na\n");
            }
            _ => panic!(),
        }
    }
}
