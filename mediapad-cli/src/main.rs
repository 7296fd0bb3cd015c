mod replay;
mod table;
mod trace;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};

use mediapad_core::config::{Config, DEFAULT};
use mediapad_core::LogicalKey;

#[derive(Parser)]
#[command(name = "mediapad-cli")]
#[command(about = "Host tools for the media pad firmware")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a trace of raw switch samples and print the reports sent
    Simulate {
        /// Trace file, one sample per tick (`-` reads stdin)
        trace: String,
        /// Override the debounce threshold in ticks
        #[arg(long)]
        debounce: Option<u16>,
        /// Override the long-press threshold in ticks
        #[arg(long)]
        long_press: Option<u16>,
        /// Only print reports that differ from the previous one
        #[arg(long)]
        changes_only: bool,
    },
    /// Print the compiled-in switch table and timing
    Config,
    /// Name the key behind a packed key code (e.g. 0x10E9)
    Key {
        code: String,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate {
            trace,
            debounce,
            long_press,
            changes_only,
        } => {
            let contents = if trace == "-" {
                let mut buf = String::new();
                io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading trace from stdin")?;
                buf
            } else {
                fs::read_to_string(&trace).with_context(|| format!("reading {}", trace))?
            };
            let samples = trace::parse_trace(&contents).context("parsing trace")?;

            let config = Config {
                debounce_ticks: debounce.unwrap_or(DEFAULT.debounce_ticks),
                long_press_ticks: long_press.unwrap_or(DEFAULT.long_press_ticks),
                ..DEFAULT
            };
            let replay = replay::replay(config, &samples, changes_only)?;
            for line in &replay.lines {
                println!("{}", line);
            }
            println!(
                "{} ticks ({} ms), {} commits",
                replay.ticks,
                replay.ticks as u64 * config.tick_period_us() as u64 / 1000,
                replay.commits
            );
        }
        Command::Config => {
            print!("{}", table::render_config(&DEFAULT));
        }
        Command::Key { code } => {
            let raw = trace::parse_number(&code).with_context(|| format!("bad key code {:?}", code))?;
            let Some(key) = LogicalKey::decode(raw) else {
                bail!("{:#06X} is not a known key code", raw);
            };
            let report = match key {
                LogicalKey::Key(_) => "keyboard report",
                LogicalKey::Media(_) => "consumer report",
            };
            println!("{:#06X}  {}  ({})", raw, key.display_name(), report);
        }
    }

    Ok(())
}
