use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use kaiwa_types::events::{FeedCommand, FeedEvent};

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single feed WebSocket connection. The client opens with an
/// Identify command carrying its JWT, gets a Ready event back, and from then
/// on manages per-sender subscriptions with Subscribe/Unsubscribe.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher, jwt_secret: String) {
    let (mut sender, mut receiver) = socket.split();

    // Step 1: Wait for Identify command with JWT
    let (user_id, username) = match wait_for_identify(&mut receiver, &jwt_secret).await {
        Some(id) => id,
        None => {
            warn!("Feed client failed to identify, closing");
            return;
        }
    };

    info!("{} ({}) connected to feed", username, user_id);

    // Step 2: Send Ready event
    let ready = FeedEvent::Ready {
        participant_id: user_id,
        username: username.clone(),
    };
    if sender
        .send(Message::Text(serde_json::to_string(&ready).unwrap().into()))
        .await
        .is_err()
    {
        return;
    }

    run_connection_loop(sender, receiver, dispatcher, user_id, username).await;
}

async fn run_connection_loop(
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    dispatcher: Dispatcher,
    user_id: Uuid,
    username: String,
) {
    // One outbound channel per connection; every Subscribe attaches it to the
    // dispatcher under a new filter, so all subscribed traffic shares the socket.
    let (out_tx, mut out_rx) = tokio::sync::mpsc::unbounded_channel::<FeedEvent>();

    // sender filter -> subscriber id, shared so cleanup can detach whatever
    // is still live when the connection dies.
    let subscriptions: Arc<std::sync::Mutex<HashMap<Uuid, Uuid>>> =
        Arc::new(std::sync::Mutex::new(HashMap::new()));

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward subscribed events -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                result = out_rx.recv() => {
                    let event = match result {
                        Some(event) => event,
                        None => break,
                    };

                    // A filter names a sender, not an audience. Only this
                    // principal's own traffic may leave through this socket.
                    if let FeedEvent::MessageCreated { sender_id, recipient_id, .. } = &event {
                        if *recipient_id != user_id && *sender_id != user_id {
                            continue;
                        }
                    }

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
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
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

    // Read commands from client
    let username_recv = username.clone();
    let recv_subscriptions = subscriptions.clone();
    let dispatcher_clone = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<FeedCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(
                            &dispatcher_clone,
                            user_id,
                            &username_recv,
                            &out_tx,
                            cmd,
                            &recv_subscriptions,
                        );
                    }
                    Err(e) => {
                        let preview: String = text.chars().take(200).collect();
                        warn!(
                            "{} ({}) bad command: {} -- raw: {}",
                            username_recv, user_id, e, preview
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
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Detach whatever subscriptions the client left behind.
    let leftover: Vec<Uuid> = {
        let mut subs = subscriptions.lock().expect("subscription lock poisoned");
        subs.drain().map(|(_, id)| id).collect()
    };
    for id in leftover {
        dispatcher.detach(id);
    }

    info!("{} ({}) disconnected from feed", username, user_id);
}

async fn wait_for_identify(
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    jwt_secret: &str,
) -> Option<(Uuid, String)> {
    use jsonwebtoken::{DecodingKey, Validation, decode};
    use kaiwa_types::api::Claims;

    let timeout = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Text(text) = msg {
                if let Ok(FeedCommand::Identify { token }) =
                    serde_json::from_str::<FeedCommand>(&text)
                {
                    let token_data = decode::<Claims>(
                        &token,
                        &DecodingKey::from_secret(jwt_secret.as_bytes()),
                        &Validation::default(),
                    )
                    .ok()?;

                    return Some((token_data.claims.sub, token_data.claims.username));
                }
            }
        }
        None
    });

    timeout.await.ok().flatten()
}

fn handle_command(
    dispatcher: &Dispatcher,
    user_id: Uuid,
    username: &str,
    out_tx: &tokio::sync::mpsc::UnboundedSender<FeedEvent>,
    cmd: FeedCommand,
    subscriptions: &Arc<std::sync::Mutex<HashMap<Uuid, Uuid>>>,
) {
    match cmd {
        FeedCommand::Identify { .. } => {} // Already handled

        FeedCommand::Subscribe { sender_id } => {
            let mut subs = subscriptions.lock().expect("subscription lock poisoned");
            if subs.contains_key(&sender_id) {
                debug!(
                    "{} ({}) already subscribed to sender {}",
                    username, user_id, sender_id
                );
                return;
            }
            let id = dispatcher.attach(sender_id, out_tx.clone());
            subs.insert(sender_id, id);
            info!(
                "{} ({}) subscribed to feed from {}",
                username, user_id, sender_id
            );
        }

        FeedCommand::Unsubscribe { sender_id } => {
            let removed = {
                let mut subs = subscriptions.lock().expect("subscription lock poisoned");
                subs.remove(&sender_id)
            };
            match removed {
                Some(id) => {
                    dispatcher.detach(id);
                    info!(
                        "{} ({}) unsubscribed from feed from {}",
                        username, user_id, sender_id
                    );
                }
                None => debug!(
                    "{} ({}) unsubscribe without subscription for {}",
                    username, user_id, sender_id
                ),
            }
        }
    }
}
