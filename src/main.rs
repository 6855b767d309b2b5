use clap::{Parser, Subcommand};
use trapper_sender::client::{self, RunArgs, SendArgs};
use trapper_sender::util::init_logging;

#[derive(Parser, Debug)]
#[command(name = "trapper-sender")]
#[command(about = "Push metrics to a Zabbix server over the trapper protocol")]
struct Opts {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    cmd: Mode,
}

/// CLI modes
#[derive(Subcommand, Debug)]
enum Mode {
    /// Send a metric to a Zabbix server
    Send {
        #[command(flatten)]
        args: SendArgs,
    },

    /// Run a command and send metrics (start time before running, elapsed time and exit code after)
    Run {
        #[command(flatten)]
        args: RunArgs,
    },

    /// Show version and exit
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    // Initialize logging
    init_logging(opts.debug);

    match opts.cmd {
        Mode::Send { args } => client::run_send(args).await?,
        Mode::Run { args } => {
            let code = client::run_wrapped(args).await.process_exit_code();
            if code != 0 {
                std::process::exit(code);
            }
        }
        Mode::Version => println!("{}", env!("CARGO_PKG_VERSION")),
    }
    Ok(())
}
