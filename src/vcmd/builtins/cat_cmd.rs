use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct CatCommand;

#[async_trait]
impl VirtualCommand for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    async fn execute(&self, mut ctx: CommandContext) -> CommandOutcome {
        let mut show_line_numbers = false;
        let mut files: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-n" | "--number" => show_line_numbers = true,
                _ if !arg.starts_with('-') || arg == "-" => files.push(arg),
                _ => {}
            }
        }
        if files.is_empty() {
            files.push("-");
        }

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = 0;
        let mut line_number = 1usize;
        let mut stdin = Some(std::mem::replace(&mut ctx.stdin, StdinInput::empty()));

        for file in files {
            let content = if file == "-" {
                match stdin.take() {
                    Some(s) => s.collect().await,
                    None => Vec::new(),
                }
            } else {
                let path = ctx.cwd.join(file);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => bytes,
                    Err(_) => {
                        stderr.extend_from_slice(
                            format!("cat: {file}: No such file or directory\n").as_bytes(),
                        );
                        exit_code = 1;
                        continue;
                    }
                }
            };
            if show_line_numbers {
                let text = String::from_utf8_lossy(&content);
                let (numbered, next) = add_line_numbers(&text, line_number);
                stdout.extend_from_slice(numbered.as_bytes());
                line_number = next;
            } else {
                stdout.extend_from_slice(&content);
            }
        }

        CommandOutcome::Buffered(CommandResult { stdout, stderr, exit_code, cwd_override: None })
    }
}

fn add_line_numbers(content: &str, start_line: usize) -> (String, usize) {
    let lines: Vec<&str> = content.split('\n').collect();
    let trailing_nl = content.ends_with('\n');
    let body = if trailing_nl { &lines[..lines.len() - 1] } else { &lines[..] };
    let numbered: Vec<String> = body
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:>6}\t{}", start_line + i, line))
        .collect();
    let joined = if trailing_nl { format!("{}\n", numbered.join("\n")) } else { numbered.join("\n") };
    (joined, start_line + body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn cat_reads_stdin_when_no_files() {
        let ctx = CommandContext {
            args: vec![],
            stdin: StdinInput::Bytes(b"hi\n".to_vec()),
            cwd: "/".into(),
            env: HashMap::new(),
        };
        match CatCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => assert_eq!(r.stdout, b"hi\n"),
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn cat_missing_file_reports_error_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = CommandContext {
            args: vec!["missing.txt".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match CatCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                assert_eq!(r.exit_code, 1);
                assert!(String::from_utf8_lossy(&r.stderr).contains("No such file"));
            }
            _ => panic!(),
        }
    }

    #[tokio::test]
    async fn cat_numbers_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        tokio::fs::write(&file, "one\ntwo\n").await.unwrap();
        let ctx = CommandContext {
            args: vec!["-n".to_string(), "a.txt".to_string()],
            stdin: StdinInput::Bytes(Vec::new()),
            cwd: dir.path().to_path_buf(),
            env: HashMap::new(),
        };
        match CatCommand.execute(ctx).await {
            CommandOutcome::Buffered(r) => {
                let text = String::from_utf8(r.stdout).unwrap();
                assert_eq!(text, "     1\tone\n     2\ttwo\n");
            }
            _ => panic!(),
        }
    }
}
