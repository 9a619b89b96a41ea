mod app;
mod core;
mod effect;
mod ipc;
#[cfg(target_os = "macos")]
mod macos;
mod platform;
mod replay;
mod storage;

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use argh::FromArgs;
use ipc::IpcClient;
use renda_ipc::{ClickButton, Command, PositionInfo, Response, StateInfo};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renda - replay mouse clicks at recorded screen positions
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    Add(AddCmd),
    Remove(RemoveCmd),
    Clear(ClearCmd),
    Capture(CaptureCmd),
    SetDelay(SetDelayCmd),
    SetButton(SetButtonCmd),
    SetRepeat(SetRepeatCmd),
    BindCapture(BindCaptureCmd),
    BindToggle(BindToggleCmd),
    Toggle(ToggleCmd),
    Stop(StopCmd),
    List(ListCmd),
    Status(StatusCmd),
    Save(SaveCmd),
    Load(LoadCmd),
    SetAutoload(SetAutoloadCmd),
    ClearAutoload(ClearAutoloadCmd),
    ListConfigs(ListConfigsCmd),
    Quit(QuitCmd),
}

/// Start the renda daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Append an empty position
#[derive(FromArgs)]
#[argh(subcommand, name = "add")]
struct AddCmd {}

/// Remove a position
#[derive(FromArgs)]
#[argh(subcommand, name = "remove")]
struct RemoveCmd {
    /// position number (from 1)
    #[argh(positional)]
    position: usize,
}

/// Remove all positions
#[derive(FromArgs)]
#[argh(subcommand, name = "clear")]
struct ClearCmd {}

/// Record the current pointer location
#[derive(FromArgs)]
#[argh(subcommand, name = "capture")]
struct CaptureCmd {}

/// Set the delay after a position's click
#[derive(FromArgs)]
#[argh(subcommand, name = "set-delay")]
struct SetDelayCmd {
    /// position number (from 1)
    #[argh(positional)]
    position: usize,
    /// delay in milliseconds
    #[argh(positional)]
    delay: String,
}

/// Set the mouse button clicked at a position
#[derive(FromArgs)]
#[argh(subcommand, name = "set-button")]
struct SetButtonCmd {
    /// position number (from 1)
    #[argh(positional)]
    position: usize,
    /// button: left, right, middle
    #[argh(positional)]
    button: String,
}

/// Set how many passes a replay makes (0 repeats until stopped)
#[derive(FromArgs)]
#[argh(subcommand, name = "set-repeat")]
struct SetRepeatCmd {
    /// number of passes
    #[argh(positional)]
    count: String,
}

/// Bind the capture hotkey
#[derive(FromArgs)]
#[argh(subcommand, name = "bind-capture")]
struct BindCaptureCmd {
    /// hotkey (e.g., f5, ctrl-shift-c)
    #[argh(positional)]
    key: String,
}

/// Bind the replay toggle hotkey
#[derive(FromArgs)]
#[argh(subcommand, name = "bind-toggle")]
struct BindToggleCmd {
    /// hotkey (e.g., f6, cmd-alt-r)
    #[argh(positional)]
    key: String,
}

/// Start replay, or stop it if it is running
#[derive(FromArgs)]
#[argh(subcommand, name = "toggle")]
struct ToggleCmd {}

/// Stop a running replay
#[derive(FromArgs)]
#[argh(subcommand, name = "stop")]
struct StopCmd {}

/// List positions
#[derive(FromArgs)]
#[argh(subcommand, name = "list")]
struct ListCmd {}

/// Show daemon state
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// Save positions, hotkeys and repeat count
#[derive(FromArgs)]
#[argh(subcommand, name = "save")]
struct SaveCmd {
    /// file path, or a name inside the config directory
    #[argh(positional)]
    path: String,
}

/// Load a saved macro, replacing the current one
#[derive(FromArgs)]
#[argh(subcommand, name = "load")]
struct LoadCmd {
    /// file path, or a name inside the config directory
    #[argh(positional)]
    path: String,
}

/// Load a macro automatically when the daemon starts
#[derive(FromArgs)]
#[argh(subcommand, name = "set-autoload")]
struct SetAutoloadCmd {
    /// file path, or a name inside the config directory
    #[argh(positional)]
    path: String,
}

/// Stop loading a macro at startup
#[derive(FromArgs)]
#[argh(subcommand, name = "clear-autoload")]
struct ClearAutoloadCmd {}

/// List saved macros in the config directory
#[derive(FromArgs)]
#[argh(subcommand, name = "list-configs")]
struct ListConfigsCmd {}

/// Quit the renda daemon
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["renda", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(_)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            tracing::info!("renda {} starting", VERSION);
            app::App::run()
        }
        Some(SubCommand::Version(_)) => {
            println!("renda {}", VERSION);
            Ok(())
        }
        Some(subcmd) => run_cli(subcmd),
    }
}

fn run_cli(subcmd: SubCommand) -> Result<()> {
    let cmd = to_command(subcmd)?;
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    if let Response::Error { message } = &response {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
    for line in format_response(&response) {
        println!("{}", line);
    }
    Ok(())
}

fn to_command(subcmd: SubCommand) -> Result<Command> {
    Ok(match subcmd {
        SubCommand::Start(_) | SubCommand::Version(_) => {
            bail!("start and version are not daemon commands")
        }
        SubCommand::Add(_) => Command::AddPosition,
        SubCommand::Remove(cmd) => Command::RemovePosition {
            index: wire_index(cmd.position)?,
        },
        SubCommand::Clear(_) => Command::ClearPositions,
        SubCommand::Capture(_) => Command::CapturePosition,
        SubCommand::SetDelay(cmd) => Command::SetDelay {
            index: wire_index(cmd.position)?,
            delay: cmd.delay,
        },
        SubCommand::SetButton(cmd) => Command::SetButton {
            index: wire_index(cmd.position)?,
            button: cmd.button.parse::<ClickButton>().map_err(|e| anyhow!(e))?,
        },
        SubCommand::SetRepeat(cmd) => Command::SetRepeat { count: cmd.count },
        SubCommand::BindCapture(cmd) => Command::BindCapture { key: cmd.key },
        SubCommand::BindToggle(cmd) => Command::BindToggle { key: cmd.key },
        SubCommand::Toggle(_) => Command::ToggleReplay,
        SubCommand::Stop(_) => Command::StopReplay,
        SubCommand::List(_) => Command::ListPositions,
        SubCommand::Status(_) => Command::GetState,
        SubCommand::Save(cmd) => Command::Save {
            path: daemon_path(&cmd.path)?,
        },
        SubCommand::Load(cmd) => Command::Load {
            path: daemon_path(&cmd.path)?,
        },
        SubCommand::SetAutoload(cmd) => Command::SetAutoload {
            path: daemon_path(&cmd.path)?,
        },
        SubCommand::ClearAutoload(_) => Command::ClearAutoload,
        SubCommand::ListConfigs(_) => Command::ListConfigs,
        SubCommand::Quit(_) => Command::Quit,
    })
}

/// Positions are numbered from 1 on the command line.
fn wire_index(position: usize) -> Result<usize> {
    position
        .checked_sub(1)
        .context("Positions are numbered from 1")
}

/// Bare names are resolved by the daemon inside its config directory. Other
/// paths are relative to where the CLI runs, so make them absolute here.
fn daemon_path(path: &str) -> Result<String> {
    if path.trim().is_empty() {
        bail!("Path must not be empty");
    }
    if storage::is_bare_name(path) || Path::new(path).is_absolute() {
        return Ok(path.to_string());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(path).display().to_string())
}

fn format_response(response: &Response) -> Vec<String> {
    match response {
        Response::Ok | Response::Error { .. } => vec![],
        Response::Positions { positions } => {
            if positions.is_empty() {
                vec!["No positions".to_string()]
            } else {
                positions.iter().map(format_position).collect()
            }
        }
        Response::Captured { index, x, y } => {
            vec![format!("Captured position {} at ({}, {})", index + 1, x, y)]
        }
        Response::Replay { running } => vec![if *running {
            "Replay started".to_string()
        } else {
            "Replay stopped".to_string()
        }],
        Response::Configs { configs } => configs.clone(),
        Response::State { state } => format_state(state),
    }
}

fn format_position(p: &PositionInfo) -> String {
    let point = match (p.x, p.y) {
        (Some(x), Some(y)) => format!("({}, {})", x, y),
        _ => "(unset)".to_string(),
    };
    format!(
        "{}: {} delay={}ms button={}",
        p.index + 1,
        point,
        p.delay,
        p.button
    )
}

fn format_state(state: &StateInfo) -> Vec<String> {
    let mut lines = vec![
        format!(
            "Replay: {}",
            if state.running { "running" } else { "idle" }
        ),
        format!("Positions: {}", state.position_count),
        format!(
            "Repeat: {}{}",
            state.repeat,
            if state.repeat.trim() == "0" {
                " (until stopped)"
            } else {
                ""
            }
        ),
        format!("Capture hotkey: {}", state.capture_key),
        format!("Toggle hotkey: {}", state.toggle_key),
        format!(
            "Autoload: {}",
            state.autoload_path.as_deref().unwrap_or("none")
        ),
    ];
    if let Some(path) = &state.macro_path {
        lines.push(format!("Macro file: {}", path));
    }
    if let Some(error) = &state.last_error {
        lines.push(format!("Last error: {}", error));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_index() {
        assert_eq!(wire_index(1).unwrap(), 0);
        assert_eq!(wire_index(3).unwrap(), 2);
        assert!(wire_index(0).is_err());
    }

    #[test]
    fn test_daemon_path() {
        assert_eq!(daemon_path("work").unwrap(), "work");
        assert_eq!(daemon_path("/tmp/a.json").unwrap(), "/tmp/a.json");

        let resolved = daemon_path("sub/a.json").unwrap();
        assert!(Path::new(&resolved).is_absolute());
        assert!(resolved.ends_with("sub/a.json"));

        assert!(daemon_path("  ").is_err());
    }

    #[test]
    fn test_to_command() {
        let cmd = to_command(SubCommand::SetButton(SetButtonCmd {
            position: 2,
            button: "right".to_string(),
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::SetButton {
                index: 1,
                button: ClickButton::Right
            }
        );

        assert!(to_command(SubCommand::SetButton(SetButtonCmd {
            position: 1,
            button: "thumb".to_string(),
        }))
        .is_err());

        let cmd = to_command(SubCommand::SetDelay(SetDelayCmd {
            position: 1,
            delay: "abc".to_string(),
        }))
        .unwrap();
        assert_eq!(
            cmd,
            Command::SetDelay {
                index: 0,
                delay: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_format_position() {
        let set = PositionInfo {
            index: 0,
            x: Some(10),
            y: Some(-5),
            delay: "50".to_string(),
            button: ClickButton::Left,
        };
        assert_eq!(format_position(&set), "1: (10, -5) delay=50ms button=left");

        let unset = PositionInfo {
            index: 1,
            x: None,
            y: None,
            delay: "100".to_string(),
            button: ClickButton::Middle,
        };
        assert_eq!(
            format_position(&unset),
            "2: (unset) delay=100ms button=middle"
        );
    }

    #[test]
    fn test_format_state() {
        let state = StateInfo {
            running: false,
            position_count: 2,
            repeat: "0".to_string(),
            capture_key: "f5".to_string(),
            toggle_key: "f6".to_string(),
            autoload_path: None,
            macro_path: None,
            last_error: Some("bad".to_string()),
        };
        let lines = format_state(&state);
        assert_eq!(lines[0], "Replay: idle");
        assert_eq!(lines[2], "Repeat: 0 (until stopped)");
        assert_eq!(lines.last().unwrap(), "Last error: bad");
    }
}
