//! The composition root: owns the catalog state and routes frontend messages to commands.

pub mod commands;
pub mod events;
pub mod filtering;
pub mod helpers;
pub mod proxy;
pub mod state;
pub mod view_model;

use std::sync::{Arc, Mutex};

use events::{IpcMessage, UserEvent};
use proxy::EventProxy;
use serde::de::DeserializeOwned;
use state::AppState;

/// Decodes a command payload, reporting a malformed one to the UI.
fn payload<T: DeserializeOwned, P: EventProxy>(msg: &IpcMessage, proxy: &P) -> Option<T> {
    match serde_json::from_value(msg.payload.clone()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(
                "Failed to deserialize payload for {}: {:?}",
                msg.command,
                msg.payload
            );
            proxy.send_event(UserEvent::ShowError(format!(
                "Invalid payload for {}: {e}",
                msg.command
            )));
            None
        }
    }
}

/// Parses a raw JSON message from the frontend and runs the matching command.
pub fn handle_ipc_message<P: EventProxy>(message: String, proxy: P, state: Arc<Mutex<AppState>>) {
    let msg: IpcMessage = match serde_json::from_str(&message) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!("Failed to parse IPC message: {}. Raw: {}", e, message);
            return;
        }
    };

    tracing::debug!(command = %msg.command, "Handling IPC message");

    match msg.command.as_str() {
        "setSearch" => {
            if let Some(query) = payload::<String, _>(&msg, &proxy) {
                commands::set_search(&proxy, &state, &query);
            }
        }
        "selectFolder" => {
            if let Some(id) = payload::<Option<String>, _>(&msg, &proxy) {
                commands::select_folder(&proxy, &state, id.as_deref());
            }
        }
        "selectSupplier" => {
            if let Some(name) = payload::<Option<String>, _>(&msg, &proxy) {
                commands::select_supplier(&proxy, &state, name.as_deref());
            }
        }
        "clearFilter" => commands::clear_filter(&proxy, &state),
        "upsertFolder" => {
            if let Some(folder) = payload(&msg, &proxy) {
                commands::upsert_folder(&proxy, &state, folder);
            }
        }
        "upsertItem" => {
            if let Some(item) = payload(&msg, &proxy) {
                commands::upsert_item(&proxy, &state, item);
            }
        }
        "removeItem" => {
            if let Some(id) = payload::<String, _>(&msg, &proxy) {
                commands::remove_item(&proxy, &state, &id);
            }
        }
        other => tracing::warn!("Unknown IPC command: {}", other),
    }
}
