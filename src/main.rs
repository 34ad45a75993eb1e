use clap::Parser;
use std::io::Read;

use shellstream::{create, RunOptions};

#[derive(Parser)]
#[command(name = "shellstream-run")]
#[command(about = "Run a shell command template through shellstream")]
#[command(version)]
struct Cli {
    /// Execute the script from the command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Exit immediately if a command exits with non-zero status
    #[arg(short = 'e', long = "errexit")]
    errexit: bool,

    /// Working directory the script runs in
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Output the result as JSON ({stdout, stderr, exitCode})
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute
    #[arg()]
    script_file: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error: Cannot read script file: {file}: {e}");
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("Error: No script provided. Use -c 'script', provide a script file, or pipe via stdin.");
            std::process::exit(1);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    if script.trim().is_empty() {
        if cli.json {
            println!("{}", serde_json::json!({"stdout": "", "stderr": "", "exitCode": 0}));
        }
        std::process::exit(0);
    }

    // Mirroring is off here: this binary prints the captured result once,
    // explicitly, so it can also render it as JSON on request.
    let mut shell = create(RunOptions::default().quiet());
    if let Some(cwd) = cli.cwd {
        shell.cd(cwd);
    }
    if cli.errexit {
        shell.settings().set(shellstream::settings::SetOption::Errexit);
    }

    let result = match shell.sh(&script).await {
        Ok(runner) => runner.run(None).await,
        Err(e) => {
            eprintln!("shellstream: {e}");
            std::process::exit(1);
        }
    };

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.text(),
                "stderr": result.stderr.as_deref().map(|b| String::from_utf8_lossy(b).into_owned()).unwrap_or_default(),
                "exitCode": result.code,
            })
        );
    } else {
        if let Some(stdout) = &result.stdout {
            if !stdout.is_empty() {
                use std::io::Write;
                let _ = std::io::stdout().write_all(stdout);
            }
        }
        if let Some(stderr) = &result.stderr {
            if !stderr.is_empty() {
                use std::io::Write;
                let _ = std::io::stderr().write_all(stderr);
            }
        }
    }

    std::process::exit(result.code);
}
