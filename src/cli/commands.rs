use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::collectors::radio::ChannelFamily;
use crate::models::ProbeKind;

/// Main CLI structure for the polaris drive-test collector
/// Uses clap's derive macros for automatic CLI generation
#[derive(Parser)]
#[command(version)] // Automatically uses version from Cargo.toml
#[command(about = "Polaris drive-test collector - geotagged cellular and network performance measurements")]
#[command(long_about = "Polaris collects drive-test samples: on every tick it takes a location fix, reads the \
registered cell of the modem and runs the selected network probes, then stores the merged sample locally. \
Stored samples can be browsed, exported as JSON Lines or uploaded to a collector server.")]
pub struct Cli {
    /// Settings file; defaults to polaris.toml in the working directory when present
    #[arg(short, long, global = true, help = "Path to a TOML settings file")]
    pub config: Option<PathBuf>,

    /// Overrides storage.data_dir
    #[arg(long, global = true, help = "Directory holding the database and device id")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Runs a drive test until Ctrl-C (or the optional duration) and prints each sample
    #[command(about = "Collect drive-test samples")]
    #[command(long_about = "Starts a drive test. The first sample is taken immediately, then one per interval. \
Press Ctrl-C to stop; the sample in progress is finished and stored before exiting.\n\n\
Examples:\n  \
polaris collect                               # Probes and interval from settings\n  \
polaris collect --interval 10                 # One sample every 10 seconds\n  \
polaris collect --probes ping,dns,web         # Run only these probes\n  \
polaris collect --duration 600                # Stop after ten minutes")]
    Collect {
        /// Seconds between samples (1-3600)
        #[arg(short, long, help = "Sampling interval in seconds")]
        interval: Option<u64>,

        /// Probes to run on each tick
        #[arg(
            short,
            long,
            value_delimiter = ',',
            help = "Comma separated probes: upload, ping, dns, web, sms"
        )]
        probes: Option<Vec<ProbeKind>>,

        /// Stops by itself after this many seconds
        #[arg(short, long, help = "Stop after N seconds")]
        duration: Option<u64>,
    },

    /// Writes every stored sample to a JSON Lines file
    #[command(about = "Export samples as JSON Lines")]
    Export {
        /// Output directory; the file name carries the export time
        #[arg(short, long, help = "Directory to write the export file into")]
        output: Option<PathBuf>,
    },

    /// Sends every stored sample to the collector server
    #[command(about = "Upload samples to the collector server")]
    Upload {
        #[arg(short, long, help = "Collector base URL (overrides server.base_url)")]
        server: Option<String>,
    },

    /// Registers this device with the collector server
    #[command(about = "Register an account for this device")]
    Signup {
        #[arg(short, long, help = "Account name")]
        username: String,

        #[arg(short, long, help = "Account password")]
        password: String,

        #[arg(short, long, help = "Collector base URL (overrides server.base_url)")]
        server: Option<String>,
    },

    /// Lists stored samples, newest first
    #[command(about = "Show stored samples")]
    #[command(long_about = "Lists stored samples newest first.\n\n\
Examples:\n  \
polaris history                               # Last 20 samples\n  \
polaris history --hours 2                     # Samples from the last two hours\n  \
polaris history --technology LTE              # LTE samples only\n  \
polaris history --operator Vodafone -l 50     # 50 samples of one operator")]
    History {
        #[arg(short, long, default_value = "20", help = "Maximum samples to show")]
        limit: usize,

        #[arg(long, help = "Only samples from the last N hours")]
        hours: Option<u32>,

        #[arg(short, long, help = "Only samples of this technology (GSM, WCDMA, LTE, NR)")]
        technology: Option<String>,

        #[arg(short, long, help = "Only samples of this operator")]
        operator: Option<String>,
    },

    /// Summarises the stored samples
    #[command(about = "Show sample statistics")]
    Stats,

    /// Deletes samples older than the retention period
    #[command(about = "Delete old samples")]
    Cleanup {
        #[arg(short, long, help = "Keep samples from the last N days (overrides retention.days)")]
        days: Option<u32>,
    },

    /// Deletes every stored sample
    #[command(about = "Delete all samples")]
    Wipe {
        #[arg(long, help = "Confirm deleting all samples")]
        yes: bool,
    },

    /// Resolves a channel number to its band and downlink frequency
    #[command(about = "Look up band and frequency of a channel number")]
    #[command(long_about = "Resolves a channel number to its band and downlink frequency.\n\n\
Examples:\n  \
polaris band lte 1850                         # Band 3 (1800 MHz)\n  \
polaris band nr 632628                        # n78\n  \
polaris band gsm 62")]
    Band {
        #[arg(value_enum, help = "Channel numbering family")]
        family: BandFamily,

        #[arg(help = "ARFCN / UARFCN / EARFCN / NR-ARFCN")]
        channel: i32,
    },
}

/// Channel numbering family as typed on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BandFamily {
    Gsm,
    #[value(alias = "wcdma")]
    Umts,
    Lte,
    #[value(alias = "5g")]
    Nr,
}

impl From<BandFamily> for ChannelFamily {
    fn from(family: BandFamily) -> Self {
        match family {
            BandFamily::Gsm => ChannelFamily::Gsm,
            BandFamily::Umts => ChannelFamily::Umts,
            BandFamily::Lte => ChannelFamily::Lte,
            BandFamily::Nr => ChannelFamily::Nr,
        }
    }
}
