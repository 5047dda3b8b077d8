use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use spanlens_inspect::cli::{Cli, Command};
use spanlens_inspect::commands::{analyze_trace, export_trace, load_trace, show_trace, ShowOptions};
use spanlens_inspect::watch::{watch_trace, WatchOutcome};
use spanlens_inspect::{Config, TraceClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spanlens_inspect=info,spanlens_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?.with_api_base(cli.api_base.as_deref());
    let client = TraceClient::new(&config)?;
    tracing::debug!(api_base = %client.base_url(), "trace service");

    match cli.command {
        Command::Show {
            trace_id,
            file,
            expand_all,
            select,
            sort_by_start,
        } => {
            let trace = load_trace(&client, &trace_id, file.as_deref()).await?;
            let options = ShowOptions {
                expand_all,
                select,
                sort_by_start,
                max_bottlenecks: config.max_bottlenecks,
            };
            println!("{}", show_trace(&trace, &options));
        }
        Command::Analyze {
            trace_id,
            file,
            server,
        } => {
            let text = analyze_trace(
                &client,
                &trace_id,
                file.as_deref(),
                server,
                config.max_bottlenecks,
            )
            .await?;
            println!("{text}");
        }
        Command::Export {
            trace_id,
            format,
            out,
        } => {
            let path = export_trace(&client, &trace_id, format, out).await?;
            println!("{}", path.display());
        }
        Command::Watch { trace_id } => {
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            };
            let outcome = watch_trace(&client, &trace_id, &config, shutdown, |frame| {
                println!("{frame}\n");
            })
            .await;
            match outcome {
                WatchOutcome::Finished(status) => {
                    tracing::info!(trace_id = %trace_id, status = status.as_str(), "trace finished");
                }
                WatchOutcome::Interrupted => {}
                WatchOutcome::Failed(err) => {
                    return Err(err).with_context(|| format!("watching trace {trace_id}"));
                }
                WatchOutcome::Rejected(err) => {
                    return Err(err).with_context(|| format!("watching trace {trace_id}"));
                }
            }
        }
    }

    Ok(())
}
