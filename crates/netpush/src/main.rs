//! netpush
//!
//! Pushes NETCONF configuration templates to a fleet of switches resolved
//! from a network controller, one locked transaction per device.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::Result;
use eyre::eyre;
use kameo::actor::Spawn;
use tokio::sync::broadcast;
use tracing::{info, warn};

use netpush_api::{DeviceDescriptor, FleetEvent, InterfaceSelection};
use netpush_core::{FleetActor, FleetActorArgs, InterfaceResolver, RunFleet};
use netpush_inventory::load_seed_hostnames;
use netpush_templates::TemplateKind;

mod config;
mod error;
mod factory;
mod logging;
mod report;

use config::Config;
use factory::ControllerInterfaces;

/// NETCONF fleet configuration push
#[derive(Parser, Debug)]
#[command(name = "netpush", version, about)]
struct Cli {
    /// Config file (default: $NETPUSH_CONFIG, ./netpush.toml, /etc/netpush/netpush.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the seed list and push the workflow to every device
    Run {
        /// Template to apply (baseline, port-security)
        #[arg(short, long)]
        workflow: Option<TemplateKind>,
        /// Seed CSV with a Hostname column
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Devices processed at the same time
        #[arg(long)]
        concurrency: Option<usize>,
        /// Directory for the result CSV
        #[arg(long)]
        report_dir: Option<PathBuf>,
    },
    /// Resolve the seed list against the controller and print the devices
    Resolve {
        /// Seed CSV with a Hostname column
        #[arg(long)]
        seed: Option<PathBuf>,
        /// Also list the interfaces the port template would target
        #[arg(long)]
        interfaces: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the rendered document without contacting any device
    Render {
        /// Template to render (baseline, port-security)
        #[arg(short, long)]
        workflow: Option<TemplateKind>,
        /// Hostname used for the device descriptor
        #[arg(long, default_value = "local")]
        hostname: String,
        /// Interface name; repeat for several
        #[arg(short, long = "interface")]
        interfaces: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (mut config, loaded_from) = Config::load_default(cli.config.as_deref())?;

    logging::init(&config.logging, cli.verbose)?;
    match &loaded_from {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => warn!("no config file found, using defaults"),
    }

    match cli.command {
        Commands::Run {
            workflow,
            seed,
            concurrency,
            report_dir,
        } => {
            if let Some(workflow) = workflow {
                config.run.workflow = workflow;
            }
            if let Some(seed) = seed {
                config.run.seed = seed;
            }
            if let Some(concurrency) = concurrency {
                config.run.concurrency = concurrency;
            }
            if let Some(report_dir) = report_dir {
                config.run.report_dir = report_dir;
            }
            run(config).await
        }
        Commands::Resolve {
            seed,
            interfaces,
            json,
        } => {
            if let Some(seed) = seed {
                config.run.seed = seed;
            }
            resolve(&config, interfaces, json).await
        }
        Commands::Render {
            workflow,
            hostname,
            interfaces,
        } => {
            render(&config, workflow.unwrap_or(config.run.workflow), &hostname, interfaces);
            Ok(())
        }
    }
}

/// Full pipeline: seed, resolve, fleet run, report
async fn run(config: Config) -> Result<()> {
    let workflow = config.run.workflow;
    let fleet_config = config.run.fleet();
    fleet_config.validate().map_err(error::SetupError::from)?;

    let hostnames = load_seed_hostnames(&config.run.seed)?;
    info!(count = hostnames.len(), seed = %config.run.seed.display(), "loaded seed hostnames");

    let sessions = factory::session_manager(&config)?;
    let payload = factory::payload_builder(workflow, &config);
    let (client, ctx) = factory::controller(&config).await?;

    let devices = client.resolve_devices(&ctx, &hostnames).await?;
    ensure_devices(&devices, hostnames.len())?;

    let interfaces = payload.requires_interfaces().then(|| {
        Arc::new(ControllerInterfaces::new(
            client.clone(),
            ctx.clone(),
            config.interfaces.clone(),
        )) as Arc<dyn InterfaceResolver>
    });

    // Created before any device is touched so a bad report dir stops the run
    let mut report_file = report::ReportWriter::create(&config.run.report_dir, Local::now())?;

    let (event_tx, event_rx) = broadcast::channel(1024);
    let progress = tokio::spawn(print_progress(event_rx, devices.len()));

    info!(workflow = %workflow, devices = devices.len(), "starting configuration push");
    let fleet = FleetActor::spawn(FleetActorArgs {
        sessions,
        payload,
        interfaces,
        config: fleet_config,
        event_tx,
    });
    let report = fleet
        .ask(RunFleet { devices })
        .await
        .map_err(|e| eyre!("fleet run failed: {e}"))?;
    fleet.stop_gracefully().await.ok();
    // The sender lives in the stopped actor; the progress task ends with it
    progress.await.ok();

    for outcome in &report.outcomes {
        report_file.record(outcome)?;
    }
    let path = report_file.finish();

    println!(
        "{} devices: {} succeeded, {} failed. Report: {}",
        report.total(),
        report.succeeded(),
        report.failed(),
        path.display()
    );
    Ok(())
}

fn ensure_devices(devices: &[DeviceDescriptor], seeded: usize) -> Result<(), error::SetupError> {
    if devices.is_empty() {
        return Err(error::SetupError::NoDevices { seeded });
    }
    Ok(())
}

async fn print_progress(mut events: broadcast::Receiver<FleetEvent>, total: usize) {
    let mut done = 0;
    loop {
        match events.recv().await {
            Ok(FleetEvent::DeviceCompleted { host, status, .. }) => {
                done += 1;
                println!("[{done}/{total}] {host}: {}", status.label());
            }
            Ok(FleetEvent::FleetCompleted { .. }) | Err(broadcast::error::RecvError::Closed) => {
                break;
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "progress output fell behind");
            }
        }
    }
}

/// Resolve devices and print them
async fn resolve(config: &Config, with_interfaces: bool, json: bool) -> Result<()> {
    let hostnames = load_seed_hostnames(&config.run.seed)?;
    let (client, ctx) = factory::controller(config).await?;
    let devices = client.resolve_devices(&ctx, &hostnames).await?;

    let mut rows: Vec<(DeviceDescriptor, Option<InterfaceSelection>)> = Vec::new();
    for device in devices {
        let selection = if with_interfaces {
            Some(
                client
                    .select_device_interfaces(&ctx, &device, &config.interfaces)
                    .await,
            )
        } else {
            None
        };
        rows.push((device, selection));
    }

    if json {
        let value: Vec<_> = rows
            .iter()
            .map(|(device, selection)| {
                serde_json::json!({
                    "device": device,
                    "interfaces": selection.as_ref().map(|s| &s.interfaces),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("{:<24} {:<16} {:<16} ID", "HOSTNAME", "ADDRESS", "PLATFORM");
    for (device, selection) in &rows {
        println!(
            "{:<24} {:<16} {:<16} {}",
            device.hostname, device.management_address, device.platform, device.id
        );
        if let Some(selection) = selection {
            for name in selection.iter() {
                println!("    {name}");
            }
        }
    }
    println!("{} of {} hostnames resolved", rows.len(), hostnames.len());
    Ok(())
}

/// Render a document for inspection
fn render(config: &Config, workflow: TemplateKind, hostname: &str, interfaces: Vec<String>) {
    let payload = factory::payload_builder(workflow, config);
    let device = DeviceDescriptor::new("local", hostname, "", "");
    let selection = InterfaceSelection::new(device.id.clone(), interfaces);

    if payload.requires_interfaces() && selection.is_empty() {
        warn!(workflow = %workflow, "no interfaces given, document has no interface stanzas");
    }

    print!("{}", payload.build(&device, &selection));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_device_list_is_a_setup_error() {
        let err = ensure_devices(&[], 3).unwrap_err();
        assert!(matches!(err, error::SetupError::NoDevices { seeded: 3 }));
        assert_eq!(err.to_string(), "none of the 3 seed hostnames resolved to a device");

        let devices = [DeviceDescriptor::new("1", "SW1", "10.0.0.1", "C9300-48P")];
        assert!(ensure_devices(&devices, 3).is_ok());
    }
}
