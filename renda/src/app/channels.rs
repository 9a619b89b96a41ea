use std::sync::mpsc as std_mpsc;

use tokio::sync::mpsc;

use crate::core::HotkeyAction;
use crate::ipc::IpcServer;
use renda_ipc::{Command, Response};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

pub struct TokioChannels {
    pub cmd_tx: std_mpsc::Sender<IpcCommandWithResponse>,
    pub server_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub server_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub struct MainChannels {
    pub ipc_cmd_rx: std_mpsc::Receiver<IpcCommandWithResponse>,
    pub hotkey_tx: std_mpsc::Sender<HotkeyAction>,
    pub hotkey_rx: std_mpsc::Receiver<HotkeyAction>,
}

pub fn create_channels() -> (TokioChannels, MainChannels) {
    // Channel: IPC commands (tokio -> main thread)
    let (ipc_cmd_tx, ipc_cmd_rx) = std_mpsc::channel::<IpcCommandWithResponse>();

    // Channel for IPC server (tokio internal)
    let (server_tx, server_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    // Channel: hotkey tap -> main thread
    let (hotkey_tx, hotkey_rx) = std_mpsc::channel::<HotkeyAction>();

    let tokio_channels = TokioChannels {
        cmd_tx: ipc_cmd_tx,
        server_tx,
        server_rx,
    };

    let main_channels = MainChannels {
        ipc_cmd_rx,
        hotkey_tx,
        hotkey_rx,
    };

    (tokio_channels, main_channels)
}

pub async fn run_async(channels: TokioChannels) {
    let TokioChannels {
        cmd_tx,
        server_tx,
        mut server_rx,
    } = channels;

    tracing::info!("Tokio runtime started");

    let ipc_server = IpcServer::new(server_tx);
    tokio::spawn(async move {
        if let Err(e) = ipc_server.run().await {
            tracing::error!("IPC server error: {}", e);
        }
    });

    while let Some((cmd, resp_tx)) = server_rx.recv().await {
        // Forward IPC commands to main thread
        if cmd_tx.send((cmd, resp_tx)).is_err() {
            tracing::error!("Failed to forward IPC command to main thread");
            break;
        }
    }

    tracing::info!("Tokio runtime exiting");
}
