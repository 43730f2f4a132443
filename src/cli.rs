use clap::{Parser, Subcommand};
use hitcount::config::HumanDuration;
use hitcount::snapshot::SnapshotFormat;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hitcount")]
#[command(about = "Sliding-window hit counter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Summarize a journal or snapshot file
    #[command(subcommand)]
    Inspect(InspectCommand),
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to, overriding `server.bind_addr`
    #[arg(long)]
    pub address: Option<SocketAddr>,

    /// Configuration file, overriding `HITCOUNT_CONFIG`
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum InspectCommand {
    /// Replay a journal file
    Journal {
        path: PathBuf,

        /// Window used for the in-window count
        #[arg(long, default_value = "30s")]
        window: HumanDuration,
    },
    /// Decode a snapshot file
    Snapshot {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = FormatArg::Json)]
        format: FormatArg,

        /// Window used for the in-window count
        #[arg(long, default_value = "30s")]
        window: HumanDuration,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum FormatArg {
    Json,
    Protobuf,
}

impl From<FormatArg> for SnapshotFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Json => SnapshotFormat::Json,
            FormatArg::Protobuf => SnapshotFormat::Protobuf,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file, overriding `HITCOUNT_CONFIG`
    #[arg(long)]
    pub config: Option<PathBuf>,
}
