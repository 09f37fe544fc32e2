use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use ipam::config::{self, CliOverrides, ServiceConfig};
use ipam::http;
use ipam::service::IpamService;
use ipam::store::JsonFileStore;

/// Minimal IPv4 address management service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the service configuration YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path of the JSON registry document (overrides the config file)
    #[arg(short, long, global = true)]
    data_file: Option<PathBuf>,

    /// Socket address to listen on (overrides the config file)
    #[arg(short, long, global = true)]
    bind: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Create an empty subnet
    CreateSubnet { subnet: String },
    /// Add an inclusive IPv4 range to a subnet's free pool
    AddRange {
        subnet: String,
        start_ip: String,
        end_ip: String,
    },
    /// Hand out the next free address of a subnet to a name
    NextIp { subnet: String, name: String },
    /// Return the address held by a name to the pool
    Release { subnet: String, name: String },
    /// List all subnets
    Subnets,
    /// Show the allocations and free pool of a subnet
    Show { subnet: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).wrap_err("Failed to render output")?);
    Ok(())
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Parse command-line arguments
    let args = Args::parse();

    let mut service_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => ServiceConfig::default(),
    };
    let overrides = CliOverrides {
        bind: args.bind.clone(),
        data_file: args.data_file.clone(),
    };
    config::apply_overrides(&mut service_config, &overrides)?;

    // Initialize logging with default filter level of "info"
    let default_filter = service_config.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    if let Some(path) = &args.config {
        info!("Configuration file: {:?}", path);
    }
    info!("Registry file: {:?}", service_config.storage.path);

    let service = IpamService::new(JsonFileStore::new(&service_config.storage.path));

    match args.command {
        Command::Serve => {
            let addr = service_config.bind_addr()?;
            let runtime = tokio::runtime::Runtime::new().wrap_err("Failed to start async runtime")?;
            runtime.block_on(http::serve(Arc::new(service), addr))?;
        }
        Command::CreateSubnet { subnet } => {
            service.create_subnet(&subnet)?;
            println!("Subnet {} created", subnet);
        }
        Command::AddRange { subnet, start_ip, end_ip } => {
            let added = service.add_range(&subnet, &start_ip, &end_ip)?;
            println!("Added IP range {} - {} to subnet {} ({} new)", start_ip, end_ip, subnet, added);
        }
        Command::NextIp { subnet, name } => {
            print_json(&service.next_address(&subnet, &name)?)?;
        }
        Command::Release { subnet, name } => {
            let ip = service.release(&subnet, &name)?;
            println!("Released IP {} and returned it to the pool", ip);
        }
        Command::Subnets => {
            print_json(&service.list_subnets()?)?;
        }
        Command::Show { subnet } => {
            print_json(&service.subnet_details(&subnet)?)?;
        }
    }

    Ok(())
}
