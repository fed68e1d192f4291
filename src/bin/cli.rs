//! patlite CLI
//!
//! Command-line interface for driving a signal tower.

use clap::{Parser, Subcommand};
use patlite::protocol::{
    Blink, BuzzerPattern, BuzzerState, Command, DetailRunControlData, GroupNo, LedColor,
    LedState, MuteState, PhnFlags, Response, RunControlData, StopInput,
};
use patlite::{Config, PatliteControl};
use tracing_subscriber::{fmt, EnvFilter};

/// patlite CLI
#[derive(Parser, Debug)]
#[command(name = "patlite-cli")]
#[command(about = "Control a networked signal tower over PNS/PHN")]
#[command(version)]
struct Args {
    /// Device IPv4 address
    #[arg(short = 'H', long, default_value = "192.168.10.1")]
    host: String,

    /// Device TCP port
    #[arg(short, long, default_value = "10000")]
    port: u32,

    /// Socket read/write timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run smart mode for a group (1-31)
    SmartMode {
        group: u8,
    },

    /// Mute the buzzer while smart mode runs (on|off)
    Mute {
        state: MuteState,
    },

    /// Send STOP input or trigger input (stop|trigger)
    StopInput {
        input: StopInput,
    },

    /// Set five LED stage patterns (off|on|blinking|no-change) and the
    /// buzzer (stop|pattern1|pattern2|tone|no-change)
    Run {
        led1: LedState,
        led2: LedState,
        led3: LedState,
        led4: LedState,
        led5: LedState,
        buzzer: BuzzerState,
    },

    /// Set five LED stage colors (off|red|yellow|lemon|green|sky-blue|blue|
    /// purple|peach|white), blinking (on|off) and buzzer pattern
    /// (stop|pattern1..pattern11)
    DetailRun {
        color1: LedColor,
        color2: LedColor,
        color3: LedColor,
        color4: LedColor,
        color5: LedColor,
        blink: Blink,
        pattern: BuzzerPattern,
    },

    /// Turn off every LED stage and stop the buzzer
    Clear,

    /// Restart the device
    Reboot {
        password: String,
    },

    /// Show input, mode and LED/buzzer state
    Status,

    /// Show status with MAC address and stage colors
    DetailStatus,

    /// PHN write (e.g. led1-lighting buzzer-pattern1)
    Write {
        flags: Vec<PhnFlags>,
    },

    /// PHN read
    Read,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args) {
        Ok(true) => {}
        Ok(false) => {
            tracing::error!("Command rejected by device");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Returns false when the device answered with a negative acknowledgment
fn run(args: Args) -> patlite::Result<bool> {
    let config = Config::builder()
        .address(args.host.trim())
        .port(args.port)
        .read_timeout_ms(args.timeout_ms)
        .write_timeout_ms(args.timeout_ms)
        .build()?;

    let command = build_command(args.command)?;

    tracing::info!("Sending {} to {}", command.id().name(), config.socket_addr());

    let mut control = PatliteControl::from_config(config);
    let response = control.session(|ctl| ctl.send_command(&command))?;

    println!("{}", response);

    // A read reply is the state byte itself; it rarely equals the 'R' echo.
    let accepted = match &response {
        Response::PhnRead(_) => true,
        other => !other.is_negative_ack(),
    };
    Ok(accepted)
}

fn build_command(command: Commands) -> patlite::Result<Command> {
    let command = match command {
        Commands::SmartMode { group } => Command::smart_mode(GroupNo::new(group)?),
        Commands::Mute { state } => Command::mute(state),
        Commands::StopInput { input } => Command::stop_pulse_input(input),
        Commands::Run {
            led1,
            led2,
            led3,
            led4,
            led5,
            buzzer,
        } => Command::run_control(RunControlData::new([led1, led2, led3, led4, led5], buzzer)),
        Commands::DetailRun {
            color1,
            color2,
            color3,
            color4,
            color5,
            blink,
            pattern,
        } => Command::detail_run_control(DetailRunControlData::new(
            [color1, color2, color3, color4, color5],
            blink,
            pattern,
        )),
        Commands::Clear => Command::clear(),
        Commands::Reboot { password } => Command::reboot(&password)?,
        Commands::Status => Command::get_status(),
        Commands::DetailStatus => Command::get_detail_status(),
        Commands::Write { flags } => {
            Command::write(flags.into_iter().fold(PhnFlags::EMPTY, |acc, f| acc | f))
        }
        Commands::Read => Command::read(),
    };
    Ok(command)
}
