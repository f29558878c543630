//! `harvestd` host driver: replays action and measurement records through the
//! node core to show ranking decisions, uplink frames and acknowledgements.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use harvest_core::{decode_ack, Node, NodeConfig};
use harvest_spec::{ActionState, ActionType, DataFlags, Measurement, SystemClock, TimeUtc};
use serde::Deserialize;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Harvestd command line.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase output verbosity.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Node configuration.
    #[arg(
        long,
        env = "HARVEST_CONFIG",
        value_name = "FILE",
        help = "Path to a JSON-encoded NodeConfig; defaults apply when absent"
    )]
    config: Option<PathBuf>,
    /// Subcommand.
    #[command(subcommand)]
    command: Commands,
}

/// Commands for harvestd.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Load actions and print the ranked action types, best first.
    Rank {
        /// JSON file containing a list of action records.
        #[arg(short, long)]
        actions: PathBuf,
    },
    /// Store measurements and print one uplink frame per line.
    Encode {
        /// JSON file containing a list of item records.
        #[arg(short, long)]
        items: PathBuf,
        /// Frame buffer size; the configured size when omitted.
        #[arg(short, long)]
        buffer: Option<usize>,
        /// Treat the whole pass as acknowledged once encoded.
        #[arg(long)]
        ack: bool,
    },
    /// Parse an acknowledgement and print the frame index it carries.
    DecodeAck {
        /// Acknowledgement text.
        #[arg(short, long)]
        message: String,
        /// Expected device id; the configured id when omitted.
        #[arg(short, long)]
        device_id: Option<String>,
    },
}

/// One action as replayed into the registry.
#[derive(Debug, Deserialize)]
struct ActionRecord {
    #[serde(rename = "type")]
    action_type: ActionType,
    #[serde(default = "requested")]
    state: ActionState,
    #[serde(default)]
    energy_nwh: u64,
    #[serde(default)]
    time_completed_utc: Option<TimeUtc>,
    #[serde(default)]
    flags: DataFlags,
    #[serde(default)]
    measurement: Option<Measurement>,
}

fn requested() -> ActionState {
    ActionState::Requested
}

/// One free-standing measurement.
#[derive(Debug, Deserialize)]
struct ItemRecord {
    measurement: Measurement,
    #[serde(default)]
    flags: DataFlags,
    #[serde(default)]
    time_utc: Option<TimeUtc>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Rank { actions } => rank(config, &actions)?,
        Commands::Encode { items, buffer, ack } => encode(config, &items, buffer, ack)?,
        Commands::DecodeAck { message, device_id } => {
            let expected = device_id.unwrap_or(config.device_id);
            let index = decode_ack(message.as_bytes(), &expected)
                .with_context(|| format!("decoding acknowledgement for `{expected}`"))?;
            println!("{index}");
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<NodeConfig> {
    match path {
        Some(path) => Ok(NodeConfig::from_json_file(path)?),
        None => Ok(NodeConfig::default()),
    }
}

fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<Vec<T>> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

fn rank(config: NodeConfig, path: &Path) -> anyhow::Result<()> {
    let records: Vec<ActionRecord> = read_records(path)?;
    let node = Node::new(config, Arc::new(SystemClock))?;
    let registry = node.registry();
    for record in records {
        let Some(id) = registry.add(record.action_type) else {
            warn!(action_type = %record.action_type, "action not added");
            continue;
        };
        if let Some(measurement) = &record.measurement {
            if registry.record(id, record.flags, measurement)?.is_none() {
                warn!(%id, "no room for measurement");
            }
        }
        match record.state {
            ActionState::Requested => {}
            ActionState::InProgress => registry.set_in_progress(id)?,
            ActionState::Completed => registry.complete(id)?,
            ActionState::TriedAndFailed => registry.tried_and_failed(id)?,
            ActionState::Aborted => registry.abort(id)?,
            ActionState::Null => registry.remove(id)?,
        }
        if let Some(time) = record.time_completed_utc {
            registry.set_time_completed(id, time)?;
        }
        registry.add_energy_cost(id, record.energy_nwh)?;
    }
    registry.log_actions();

    let mut next = registry.rank_types();
    registry.log_ranked_types();
    while !next.is_null() {
        println!("{next}");
        next = registry.rank_next_type();
    }
    Ok(())
}

fn encode(
    config: NodeConfig,
    path: &Path,
    buffer: Option<usize>,
    ack: bool,
) -> anyhow::Result<()> {
    let records: Vec<ItemRecord> = read_records(path)?;
    let node = Node::new(config, Arc::new(SystemClock))?;
    let store = node.store();
    for record in &records {
        let stored = match record.time_utc {
            Some(time) => store.allocate_at(None, record.flags, &record.measurement, time)?,
            None => store.allocate(None, record.flags, &record.measurement)?,
        };
        if stored.is_none() {
            warn!(kind = %record.measurement.kind(), "no room for item");
        }
    }
    info!(
        device_id = %node.config().device_id,
        items = store.count(),
        bytes = store.used_bytes(),
        "items stored"
    );

    let mut buf = match buffer {
        Some(size) => vec![0; size],
        None => node.encode_buffer(),
    };
    node.prepare();
    loop {
        let out = node.encode(&mut buf)?;
        if out.header_too_large() {
            bail!("frame header does not fit in {} bytes", buf.len());
        }
        if out.no_item_fit() {
            bail!("next item does not fit in a {} byte frame", buf.len());
        }
        if out.size() == 0 {
            break;
        }
        debug!(bytes = out.size(), flags = out.flags().bits(), "frame ready");
        println!("{}", std::str::from_utf8(&buf[..out.size()])?);
    }

    if ack {
        let freed = node.ack_data();
        info!(freed, "pass acknowledged");
    }
    info!(
        remaining = store.count(),
        awaiting_ack = node.in_flight(),
        "encode pass finished"
    );
    Ok(())
}
