//! Shared fixtures for end-to-end tests: a real server on an ephemeral port
//! backed by the in-memory unit directory.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Message},
    MaybeTlsStream, WebSocketStream,
};
use unitshell_api::{ApiServer, AppState};
use unitshell_domain::{App, UnitDirectory};
use unitshell_permissions::{AuthorizationGate, Context, Identity, Permission, StaticIdentityProvider};
use unitshell_units::{InMemoryAppRegistry, MemoryUnitDirectory};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub const APP_TOKEN: &str = "app-scoped";
pub const TEAM_TOKEN: &str = "team-scoped";
pub const ROOT_TOKEN: &str = "root";
pub const READ_TOKEN: &str = "read-only";

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    pub addr: SocketAddr,
    pub directory: MemoryUnitDirectory,
}

pub fn identities() -> StaticIdentityProvider {
    StaticIdentityProvider::new()
        .with_token(
            APP_TOKEN,
            Identity::new(
                "alice",
                vec![Permission::new("app.run.shell", Context::App("someapp".to_string()))],
            ),
        )
        .with_token(
            TEAM_TOKEN,
            Identity::new(
                "bob",
                vec![Permission::new("app.run", Context::Team("admins".to_string()))],
            ),
        )
        .with_token(
            ROOT_TOKEN,
            Identity::new("root", vec![Permission::new("*", Context::Global)]),
        )
        .with_token(
            READ_TOKEN,
            Identity::new("carol", vec![Permission::new("app.read", Context::Global)]),
        )
}

/// Apps: `someapp` (3 units, team admins), `otherapp` (1 unit), `emptyapp`
pub fn fixture() -> (InMemoryAppRegistry, MemoryUnitDirectory) {
    let registry = InMemoryAppRegistry::new();
    let directory = MemoryUnitDirectory::new();

    let someapp = App::new("someapp", "admins");
    let otherapp = App::new("otherapp", "others");
    directory.add_units(&someapp, 3, "web");
    directory.add_units(&otherapp, 1, "worker");

    registry.register(someapp);
    registry.register(otherapp);
    registry.register(App::new("emptyapp", "admins"));
    (registry, directory)
}

pub async fn start_with(directory: Arc<dyn UnitDirectory>, registry: InMemoryAppRegistry, timeout: Duration) -> SocketAddr {
    let gate = AuthorizationGate::new(Arc::new(identities()), Arc::new(registry));
    let state = AppState::new(gate, directory, timeout);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(ApiServer::new(state).serve(listener));
    addr
}

pub async fn start_server() -> TestServer {
    let (registry, directory) = fixture();
    let addr = start_with(Arc::new(directory.clone()), registry, Duration::from_secs(5)).await;
    TestServer { addr, directory }
}

pub async fn connect(addr: SocketAddr, path_and_query: &str, authorization: Option<&str>) -> Client {
    let mut request = format!("ws://{addr}{path_and_query}")
        .into_client_request()
        .unwrap();
    if let Some(value) = authorization {
        request
            .headers_mut()
            .insert("authorization", HeaderValue::from_str(value).unwrap());
    }
    let (client, _response) = connect_async(request).await.unwrap();
    client
}

pub async fn next_frame(client: &mut Client) -> Option<Message> {
    match tokio::time::timeout(FRAME_TIMEOUT, client.next()).await {
        Ok(Some(Ok(message))) => Some(message),
        Ok(Some(Err(_))) | Ok(None) => None,
        Err(_) => panic!("no frame within {FRAME_TIMEOUT:?}"),
    }
}

/// Read the in-band error line and assert the socket closes after it
pub async fn expect_error(client: &mut Client) -> String {
    let text = match next_frame(client).await {
        Some(Message::Text(text)) => text.as_str().to_string(),
        other => panic!("expected an error message, got {other:?}"),
    };
    match next_frame(client).await {
        Some(Message::Close(_)) | None => {}
        other => panic!("expected close after error, got {other:?}"),
    }
    text
}

/// Read the next binary frame as UTF-8
pub async fn expect_output(client: &mut Client) -> String {
    match next_frame(client).await {
        Some(Message::Binary(data)) => String::from_utf8_lossy(&data).into_owned(),
        other => panic!("expected shell output, got {other:?}"),
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
