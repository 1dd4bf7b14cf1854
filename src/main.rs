use std::io::IsTerminal;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tcpsnap::cli::CliArgs;
use tcpsnap::collector::Collector;
use tcpsnap::filter::{line_count, TextFilter};
use tcpsnap::output;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let args = CliArgs::parse();
    let collector = Collector::new(args.collector_config());

    if let Err(e) = run(&args, &collector).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(args: &CliArgs, collector: &Collector) -> tcpsnap::Result<()> {
    if args.wants_raw_text() {
        let text = collector.capture_text().await?;
        let filter = TextFilter::from_cli(args);
        let text = if filter.is_empty() { text } else { filter.apply(&text) };

        if args.count {
            println!("{}", line_count(&text));
        } else if !text.is_empty() {
            println!("{}", text);
        }
        return Ok(());
    }

    let snapshot = collector
        .snapshot_until(async {
            // Ctrl-C keeps whatever rows were already parsed.
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;
    output::print_snapshot(&snapshot);
    Ok(())
}
