use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use roost_core::{Notifier, Subscription};
use roost_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a fresh socket gets to send Identify before it is closed.
const IDENTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle a single WebSocket connection. Session issuance lives outside
/// this service, so Identify carries a bare user id and the gateway
/// takes it at face value.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, notifier: Notifier) {
    let (mut sender, mut receiver) = socket.split();

    let Some(user_id) = wait_for_identify(&mut receiver).await else {
        warn!("WebSocket client failed to identify, closing");
        return;
    };

    info!("{} connected to gateway", user_id);

    let ready = GatewayEvent::Ready { user_id };
    if sender
        .send(Message::Text(serde_json::to_string(&ready).unwrap().into()))
        .await
        .is_err()
    {
        return;
    }

    // The connection owns its event channel: the dispatcher holds one
    // sender for user-addressed pushes, and every conversation
    // subscription's callback holds another.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<GatewayEvent>();
    let conn_id = dispatcher
        .register_user_channel(user_id, events_tx.clone())
        .await;

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward queued events to the client, with heartbeat.
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = events_rx.recv() => {
                    let event = match result {
                        Some(event) => event,
                        None => break,
                    };
                    let text = serde_json::to_string(&event).unwrap();
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!(
                                "Heartbeat timeout (missed {} pongs), dropping connection",
                                missed_heartbeats
                            );
                            break;
                        }
                    }
                    if sender.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read commands from the client and maintain its subscription set.
    let mut recv_task = tokio::spawn(async move {
        let mut subscriptions: HashMap<Uuid, Subscription> = HashMap::new();

        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(&notifier, user_id, cmd, &events_tx, &mut subscriptions)
                            .await;
                    }
                    Err(e) => {
                        warn!(
                            "{} bad command: {} -- raw: {}",
                            user_id,
                            e,
                            &text[..text.len().min(200)]
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        // Dropping the map unsubscribes everything this connection held.
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.unregister_user_channel(user_id, conn_id).await;
    info!("{} disconnected from gateway", user_id);
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
) -> Option<Uuid> {
    let deadline = tokio::time::timeout(IDENTIFY_TIMEOUT, async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(GatewayCommand::Identify { user_id }) =
                    serde_json::from_str::<GatewayCommand>(&text)
                {
                    if !user_id.is_nil() {
                        return Some(user_id);
                    }
                }
            }
        }
        None
    });

    deadline.await.ok().flatten()
}

/// Applies one client command against the connection's subscription
/// state. Subscribe is a full replacement: entries missing from the new
/// set are unsubscribed (their handles drop), entries already held are
/// kept untouched, new ones are registered with the notifier.
async fn handle_command(
    notifier: &Notifier,
    user_id: Uuid,
    cmd: GatewayCommand,
    events_tx: &mpsc::UnboundedSender<GatewayEvent>,
    subscriptions: &mut HashMap<Uuid, Subscription>,
) {
    match cmd {
        GatewayCommand::Identify { .. } => {} // Already handled

        GatewayCommand::Subscribe { conversation_ids } => {
            info!(
                "{} subscribing to {} conversations",
                user_id,
                conversation_ids.len()
            );
            let wanted: HashSet<Uuid> = conversation_ids.into_iter().collect();
            subscriptions.retain(|conversation_id, _| wanted.contains(conversation_id));

            for conversation_id in wanted {
                if subscriptions.contains_key(&conversation_id) {
                    continue;
                }
                let tx = events_tx.clone();
                let subscription = notifier
                    .subscribe(conversation_id, move |message| {
                        let _ = tx.send(GatewayEvent::MessageNew { message });
                    })
                    .await;
                subscriptions.insert(conversation_id, subscription);
            }
        }
    }
}
