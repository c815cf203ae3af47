// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process WebSocket peer standing in for the bridge process or the relay.
//!
//! [`serve`] accepts exactly one client on an ephemeral loopback port and
//! hands the socket to a script written in frames.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use url::Url;

pub type PeerSocket = WebSocketStream<TcpStream>;

/// Listen on `127.0.0.1:0` and run `script` against the first client.
pub async fn serve<F, Fut>(script: F) -> (Url, JoinHandle<()>)
where
    F: FnOnce(PeerSocket) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let addr = listener.local_addr().expect("local address");
    let task = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("client connects");
        let ws = tokio_tungstenite::accept_async(stream)
            .await
            .expect("websocket handshake");
        script(ws).await;
    });
    let url = Url::parse(&format!("ws://{addr}/ws")).expect("loopback url");
    (url, task)
}

pub async fn send(ws: &mut PeerSocket, frame: Value) {
    ws.send(Message::Text(frame.to_string().into()))
        .await
        .expect("peer send");
}

/// Next text frame from the client, parsed as JSON.
pub async fn recv_json(ws: &mut PeerSocket) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).expect("client sends json")
            }
            Some(Ok(Message::Close(_))) | None => panic!("client closed before sending"),
            Some(Ok(_)) => continue,
            Some(Err(e)) => panic!("peer read failed: {e}"),
        }
    }
}

/// Keep the socket open until the client goes away.
pub async fn hold(mut ws: PeerSocket) {
    while let Some(Ok(message)) = ws.next().await {
        if matches!(message, Message::Close(_)) {
            break;
        }
    }
}
