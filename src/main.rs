//! ladspa-host - browse LADSPA plugins and edit the saved effect chain.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use ladspa_host::config::JsonSettingsFile;
use ladspa_host::{HostConfig, PluginHost};

#[derive(Parser)]
#[command(name = "ladspa-host")]
#[command(about = "LADSPA plugin host", long_about = None)]
struct Cli {
    /// Settings file (default: <config dir>/ladspa-host/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print list, ports and enabled output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every plugin found on the search path
    List,

    /// Show the control ports of one plugin
    Ports {
        /// Module file name, e.g. amp.so
        module: String,
        label: String,
    },

    /// Show the enabled chain
    Enabled,

    /// Append a plugin to the chain
    Enable { module: String, label: String },

    /// Remove the chain entry at POSITION (0-based)
    Disable { position: usize },

    /// Set a control value of the chain entry at POSITION
    Set {
        position: usize,
        control: usize,
        value: f32,
    },

    /// Show or change the user module path (colon-separated)
    ModulePath { path: Option<String> },
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let path = match cli.config {
        Some(path) => path,
        None => JsonSettingsFile::default_path().context("no config directory on this system")?,
    };
    let settings = JsonSettingsFile::load(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;

    let host = PluginHost::new(HostConfig::from_env(), Box::new(settings));
    host.init();

    let result = run(&host, cli.command, cli.json);
    host.cleanup().context("saving settings")?;
    result
}

fn run(host: &PluginHost, command: Commands, json: bool) -> anyhow::Result<()> {
    match command {
        Commands::List if json => {
            let entries: Vec<_> = host
                .plugins()
                .iter()
                .map(|plugin| {
                    serde_json::json!({
                        "module": plugin.module_path,
                        "label": plugin.label,
                        "name": plugin.name,
                        "maker": plugin.maker,
                        "unique_id": plugin.unique_id,
                        "audio_inputs": plugin.audio_inputs.len(),
                        "audio_outputs": plugin.audio_outputs.len(),
                        "controls": plugin.control_ports,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }

        Commands::List => {
            for (i, plugin) in host.plugins().iter().enumerate() {
                println!(
                    "{:3}  {}:{}  {}  ({} in, {} out, {} controls)",
                    i,
                    plugin.module_path,
                    plugin.label,
                    plugin.name,
                    plugin.audio_inputs.len(),
                    plugin.audio_outputs.len(),
                    plugin.control_ports.len()
                );
            }
        }

        Commands::Ports { module, label } => {
            let Some(plugin) = host.find_plugin(&module, &label) else {
                bail!("no plugin {}:{}", module, label);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&plugin.control_ports)?);
                return Ok(());
            }
            println!("{} by {}", plugin.name, plugin.maker.as_deref().unwrap_or("unknown"));
            for (c, port) in plugin.control_ports.iter().enumerate() {
                let kind = match (port.is_output, port.is_toggle) {
                    (true, _) => "output",
                    (false, true) => "toggle",
                    (false, false) => "input",
                };
                println!(
                    "{:3}  {:<24} {:<6}  [{}, {}]  default {}",
                    c, port.name, kind, port.min, port.max, port.default
                );
            }
        }

        Commands::Enabled if json => {
            println!("{}", serde_json::to_string_pretty(&host.list_enabled())?);
        }

        Commands::Enabled => {
            for (i, inst) in host.list_enabled().iter().enumerate() {
                let values: Vec<String> = inst.values.iter().map(f32::to_string).collect();
                println!(
                    "{:3}  {}:{}  {}  [{}]",
                    i,
                    inst.module_path,
                    inst.label,
                    inst.name,
                    values.join(", ")
                );
            }
        }

        Commands::Enable { module, label } => {
            let Some(plugin) = host.find_plugin(&module, &label) else {
                bail!("no plugin {}:{}", module, label);
            };
            host.enable(&plugin);
            println!("enabled {}", plugin.name);
        }

        Commands::Disable { position } => {
            let inst = enabled_at(host, position)?;
            host.disable(inst);
        }

        Commands::Set {
            position,
            control,
            value,
        } => {
            let inst = enabled_at(host, position)?;
            host.set_value(inst, control, value)?;
        }

        Commands::ModulePath { path: None } => println!("{}", host.module_path()),

        Commands::ModulePath { path: Some(path) } => {
            host.set_module_path(&path);
            println!("{} plugins found", host.plugins().len());
        }
    }

    Ok(())
}

fn enabled_at(host: &PluginHost, position: usize) -> anyhow::Result<ladspa_host::InstanceId> {
    host.list_enabled()
        .get(position)
        .map(|inst| inst.id)
        .with_context(|| format!("no enabled plugin at position {}", position))
}
