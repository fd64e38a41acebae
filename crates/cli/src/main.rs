use clap::{CommandFactory, Parser, Subcommand};
use cli::handlers::{BenchOp, handle_bench, handle_demo, handle_info};

#[derive(Parser)]
#[command(version = vkvec::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the selected Vulkan device, its queues and limits
    Info,
    /// Run a short end-to-end array session
    Demo,
    /// Time a single array operation
    Bench {
        /// Operation to measure
        #[arg(long, value_enum, default_value_t = BenchOp::Add)]
        op: BenchOp,
        /// Rows (and cols for matrix operations)
        #[arg(long, default_value_t = 1024)]
        size: u32,
        /// Number of timed runs
        #[arg(long, default_value_t = 20)]
        runs: u64,
    },
}

/// Used when `RUST_LOG` is unset; failures and library warnings stay visible.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER)).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Info) => handle_info(),
        Some(Commands::Demo) => handle_demo(),
        Some(Commands::Bench {
            op,
            size,
            runs,
        }) => handle_bench(op, size, runs),
        None => {
            let mut cmd = Cli::command();
            cmd.print_help().unwrap();
            Ok(())
        },
    };
    if let Err(err) = result {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, Log, Metadata};

    use super::*;

    fn enabled(
        logger: &env_logger::Logger,
        level: Level,
    ) -> bool {
        logger.enabled(&Metadata::builder().level(level).build())
    }

    #[test]
    fn default_filter_reports_failures() {
        let logger =
            env_logger::Builder::from_env(env_logger::Env::new().filter_or("VKVEC_CLI_UNSET_FILTER", DEFAULT_LOG_FILTER))
                .build();
        assert!(enabled(&logger, Level::Error));
        assert!(enabled(&logger, Level::Warn));
        assert!(!enabled(&logger, Level::Info));
    }
}
