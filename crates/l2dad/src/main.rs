//! L2DA steering tool entry point.
//!
//! Loads a YAML aggregate description, builds the steering context and
//! answers queries against it without touching real interfaces.

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use bond_l2da::{
    Aggregate, EthernetFrame, L2daConfig, L2daContext, L2daStatsSnapshot, LinkId, LinkRegistry,
    NoopNotifier, OptionFlags, RxVerdict, Transmitter, TxTarget,
};
use clap::{Parser, Subcommand};
use l2da_types::MacAddress;
use log::{error, info};
use serde::Serialize;

/// L2DA bonding steering tool
#[derive(Parser, Debug)]
#[command(name = "l2dad")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Aggregate description (YAML)
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show options, default link and the steering table
    Show {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show which link a frame to MAC would leave on
    Resolve { mac: MacAddress },

    /// Run RX admission and forwarding for a frame arriving on INGRESS
    Admit {
        src: MacAddress,
        dst: MacAddress,
        ingress: String,

        /// Ethertype of the frame, hex (0x888e is EAPOL)
        #[arg(short = 't', long, default_value = "0x0800", value_parser = parse_ethertype)]
        ethertype: u16,
    },
}

fn parse_ethertype(s: &str) -> Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid ethertype '{}': {}", s, e))
}

#[derive(Debug, Serialize)]
struct MappingRow {
    mac: MacAddress,
    link: String,
}

#[derive(Debug, Serialize)]
struct ShowReport {
    bond: String,
    options: OptionFlags,
    default_link: Option<String>,
    mappings: Vec<MappingRow>,
    stats: L2daStatsSnapshot,
}

fn show_report(ctx: &L2daContext, links: &LinkRegistry) -> ShowReport {
    let mut mappings: Vec<_> = ctx
        .mappings()
        .into_iter()
        .map(|e| MappingRow {
            mac: e.da,
            link: links.display_name(Some(e.link)).to_string(),
        })
        .collect();
    mappings.sort_by_key(|row| row.mac);

    ShowReport {
        bond: ctx.name().to_string(),
        options: ctx.opts().into(),
        default_link: ctx.default_link_name(links),
        mappings,
        stats: ctx.stats(),
    }
}

fn print_report(report: &ShowReport, links: &LinkRegistry) {
    println!("bond:         {}", report.bond);
    println!(
        "options:      forward_rx={} dedup_rx={} dup_mc_tx={}",
        report.options.forward_rx, report.options.dedup_rx, report.options.dup_mc_tx
    );
    println!(
        "default link: {}",
        report.default_link.as_deref().unwrap_or("none")
    );
    println!("links:");
    for link in links.iter() {
        println!("  {:<15} {}", link.name, link.state);
    }
    println!("mappings ({}):", report.mappings.len());
    for row in &report.mappings {
        println!("  {}  {}", row.mac, row.link);
    }
}

/// Transmitter that only records what would have been sent.
#[derive(Default)]
struct DryRun {
    sent: RefCell<Vec<LinkId>>,
}

impl Transmitter<EthernetFrame> for DryRun {
    fn queue_xmit(&self, link: LinkId, _frame: EthernetFrame) {
        self.sent.borrow_mut().push(link);
    }

    fn xmit_all(&self, _frame: EthernetFrame) {}
}

fn describe_tx(target: TxTarget, links: &LinkRegistry) -> String {
    match target {
        TxTarget::Mapped(l) => format!("{} (mapped)", links.display_name(Some(l))),
        TxTarget::Default(l) => format!("{} (default)", links.display_name(Some(l))),
        TxTarget::AllLinks => "all links (multicast duplication)".to_string(),
        TxTarget::Drop => "dropped (no transmit-capable link)".to_string(),
    }
}

fn describe_rx(verdict: RxVerdict, forwarded: &[LinkId], links: &LinkRegistry) -> String {
    let names: Vec<_> = forwarded
        .iter()
        .map(|&l| links.display_name(Some(l)))
        .collect();
    match verdict {
        RxVerdict::Reject => "rejected by dedup".to_string(),
        RxVerdict::Consumed(l) => format!("forwarded to {} only", links.display_name(Some(l))),
        RxVerdict::Deliver { forwarded: 0 } => "delivered locally".to_string(),
        RxVerdict::Deliver { .. } => {
            format!("delivered locally, forwarded to {}", names.join(", "))
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = L2daConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let (ctx, links) = config
        .build(Arc::new(NoopNotifier))
        .context("failed to apply configuration")?;
    info!("Loaded {} from {}", ctx.name(), args.config.display());

    match args.command {
        Command::Show { json } => {
            let report = show_report(&ctx, &links);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, &links);
            }
        }
        Command::Resolve { mac } => {
            println!("{} -> {}", mac, describe_tx(ctx.resolve_tx(&links, mac), &links));
        }
        Command::Admit {
            src,
            dst,
            ingress,
            ethertype,
        } => {
            let Some(ingress_id) = links.link_by_name(&ingress) else {
                bail!("link '{}' is not a member of {}", ingress, ctx.name());
            };
            let frame = EthernetFrame::build(dst, src, ethertype, &[]);
            let wire = DryRun::default();
            let verdict = ctx.handle_rx_frame(&links, &wire, ingress_id, &frame);
            println!(
                "{} -> {} on {}: {}",
                src,
                dst,
                ingress,
                describe_rx(verdict, &wire.sent.borrow(), &links)
            );
        }
    }

    ctx.deinitialize();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("l2dad: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
