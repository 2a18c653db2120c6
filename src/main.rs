use clap::Parser;
use tracing_subscriber::EnvFilter;

use pakmon::event::ProcessEvent;
use pakmon::monitor::{PresentationState, ProcessMonitor, RunPhase};
use pakmon::runner::ToolRunner;

/// Default maximum log lines per run (0 for unlimited)
const DEFAULT_MAX_LOG_LINES: usize = 0;

#[derive(Parser, Debug)]
#[command(
    name = "pakmon",
    version,
    about = "Run an external packaging tool and monitor its output",
    long_about = None
)]
struct Args {
    /// Packaging tool to run
    #[arg(required = true)]
    tool: String,

    /// Arguments passed through to the tool
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    tool_args: Vec<String>,

    /// Maximum log lines to keep (0 for unlimited)
    #[arg(short = 'b', long, default_value_t = DEFAULT_MAX_LOG_LINES)]
    max_log_lines: usize,
}

/// Prints the parts of the state that changed with the last event
struct StatePrinter {
    last_status: String,
}

impl StatePrinter {
    fn new() -> Self {
        Self {
            last_status: String::new(),
        }
    }

    /// Print the status line if it changed, then the lines the event
    /// appended (they sit at the buffer tail).
    fn print(&mut self, state: &PresentationState, appended: usize) {
        if state.status_text() != self.last_status {
            self.last_status = state.status_text().to_string();
            match state.action_label() {
                Some(action) => println!("==> {} [{}]", self.last_status, action),
                None => println!("==> {}", self.last_status),
            }
        }
        let len = state.log().len();
        for line in state.log().get_range(len.saturating_sub(appended), appended) {
            println!("{}", line.text());
        }
    }
}

/// Lines an event will append to the log
fn appended_lines(event: &ProcessEvent) -> usize {
    match event {
        ProcessEvent::Output(..) => 1,
        // Error logs the message plus the remediation hint
        ProcessEvent::Error(_) => 2,
        _ => 0,
    }
}

/// Run the tool to completion, feeding its events through the monitor
async fn run(args: Args) -> anyhow::Result<i32> {
    let mut monitor = ProcessMonitor::with_log_cap(args.max_log_lines);
    let mut printer = StatePrinter::new();

    let mut handle = match ToolRunner::spawn(&args.tool, &args.tool_args).await {
        Ok(handle) => handle,
        Err(e) => {
            let event = ProcessEvent::Error(e.to_string());
            let appended = appended_lines(&event);
            let state = monitor.on_event(event);
            printer.print(state, appended);
            return Ok(1);
        }
    };

    let mut exit_code = 0;
    loop {
        tokio::select! {
            event = handle.next_event() => match event {
                Some(event) => {
                    if let ProcessEvent::Finished(code) = &event {
                        exit_code = *code;
                    }
                    let appended = appended_lines(&event);
                    let state = monitor.on_event(event);
                    printer.print(state, appended);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                let request = monitor.on_close();
                handle.terminate(request)?;
                // Conventional exit code for SIGINT
                exit_code = 130;
                break;
            }
        }
    }

    if monitor.phase() == RunPhase::Failed && exit_code == 0 {
        exit_code = 1;
    }
    Ok(exit_code)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let exit_code = run(args).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
