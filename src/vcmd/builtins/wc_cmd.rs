use async_trait::async_trait;
use crate::vcmd::{CommandContext, StdinInput, CommandOutcome, CommandResult, VirtualCommand};

pub struct WcCommand;

#[async_trait]
impl VirtualCommand for WcCommand {
    fn name(&self) -> &'static str {
        "wc"
    }

    async fn execute(&self, ctx: CommandContext) -> CommandOutcome {
        let mut lines_only = false;
        let mut words_only = false;
        let mut bytes_only = false;
        let mut files: Vec<&str> = Vec::new();
        for arg in &ctx.args {
            match arg.as_str() {
                "-l" => lines_only = true,
                "-w" => words_only = true,
                "-c" => bytes_only = true,
                _ if !arg.starts_with('-') => files.push(arg),
                _ => {}
            }
        }
        let any_flag = lines_only || words_only || bytes_only;

        let mut stdout = String::new();
        let mut stderr = String::new();
        let mut exit_code = 0;
        let mut total = (0usize, 0usize, 0usize);

        let sources: Vec<(String, Option<Vec<u8>>)> = if files.is_empty() {
            vec![(String::new(), Some(ctx.stdin.collect().await))]
        } else {
            files.iter().map(|f| (f.to_string(), None)).collect()
        };

        for (name, inline) in sources {
            let bytes = if let Some(b) = inline {
                b
            } else {
                let path = ctx.cwd.join(&name);
                match tokio::fs::read(&path).await {
                    Ok(b) => b,
                    Err(_) => {
                        stderr.push_str(&format!("wc: {name}: No such file or directory\n"));
                        exit_code = 1;
                        continue;
                    }
                }
            };
            let text = String::from_utf8_lossy(&bytes);
            let line_count = text.lines().count();
            let word_count = text.split_whitespace().count();
            let byte_count = bytes.len();
            total.0 += line_count;
            total.1 += word_count;
            total.2 += byte_count;
            stdout.push_str(&format_counts(line_count, word_count, byte_count, &name, lines_only, words_only, bytes_only, any_flag));
        }

        if files.len() > 1 {
            stdout.push_str(&format_counts(total.0, total.1, total.2, "total", lines_only, words_only, bytes_only, any_flag));
        }

        CommandOutcome::Buffered(CommandResult {
            stdout: stdout.into_bytes(),
            stderr: stderr.into_bytes(),
            exit_code,
            cwd_override: None,
        })
    }
}

#[allow(clippy::too_many_arguments)]
fn format_counts(
    lines: usize,
    words: usize,
    bytes: usize,
    name: &str,
    lines_only: bool,
    words_only: bool,
    bytes_only: bool,
    any_flag: bool,
) -> String {
    let mut parts = Vec::new();
    if !any_flag || lines_only {
        parts.push(format!("{lines:>7}"));
    }
    if !any_flag || words_only {
        parts.push(format!("{words:>7}"));
    }
    if !any_flag || bytes_only {
        parts.push(format!("{bytes:>7}"));
    }
    let mut line = parts.join(" ");
    if !name.is_empty() {
        line.push_str(&format!(" {name}"));
    }
    line.push('\n');
    line
}
