//! Integration-Tests fuer das Relay-Verhalten auf Draht-Ebene
//!
//! Nutzt rohes tokio-tungstenite statt der Endpunkt-Bibliothek, um exakte
//! JSON-Frames zu senden.

mod common;

use common::{ereignis, still, TestServer, WARTEZEIT};
use duett_client::{link_anfordern, Einladung};
use duett_protocol::ServerEvent;
use duett_server::config::ServerConfig;
use duett_signaling::RollenPolitik;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn verbinden(server: &TestServer) -> Ws {
    connect_async(server.ws_url()).await.unwrap().0
}

async fn senden(ws: &mut Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn empfangen(ws: &mut Ws) -> Value {
    loop {
        let nachricht = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Kein Frame innerhalb der Wartezeit")
            .expect("Verbindung geschlossen")
            .unwrap();
        if let Message::Text(text) = nachricht {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn klartext_wird_unveraendert_weitergeleitet() {
    let server = TestServer::starten().await;

    let mut a = verbinden(&server).await;
    senden(
        &mut a,
        json!({"event": "caller-join", "data": {"roomId": "raum-1", "seed": "c2VlZA"}}),
    )
    .await;
    assert_eq!(empfangen(&mut a).await, json!({"event": "caller-ready"}));

    let mut b = verbinden(&server).await;
    senden(
        &mut b,
        json!({"event": "callee-join", "data": {"roomId": "raum-1"}}),
    )
    .await;
    assert_eq!(empfangen(&mut b).await, json!({"event": "callee-ready"}));
    assert_eq!(empfangen(&mut a).await, json!({"event": "callee-joined"}));

    // Das Relay prueft den Inhalt nicht
    let inhalt = json!({"beliebig": ["struktur", 42, null]});
    senden(
        &mut b,
        json!({"event": "text-message", "data": {"roomId": "raum-1", "message": inhalt}}),
    )
    .await;
    let frame = empfangen(&mut a).await;
    assert_eq!(frame["event"], "text-message");
    assert_eq!(frame["data"]["message"], inhalt);
    assert!(frame["data"]["from"].is_string());

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn ungueltige_frames_werden_ignoriert() {
    let server = TestServer::starten().await;
    let mut ws = verbinden(&server).await;

    ws.send(Message::Text("kein json".into())).await.unwrap();
    senden(&mut ws, json!({"event": "unbekannt", "data": {}})).await;
    senden(&mut ws, json!({"event": "offer", "data": {"offer": {}}})).await;
    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();

    // Verbindung lebt weiter und antwortet normal
    senden(
        &mut ws,
        json!({"event": "caller-join", "data": {"roomId": "r", "seed": "c2VlZA"}}),
    )
    .await;
    assert_eq!(empfangen(&mut ws).await, json!({"event": "caller-ready"}));

    let metriken = reqwest::get(format!("{}/metrics", server.http_url()))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metriken.contains("duett_messages_dropped_total{reason=\"invalid_frame\"}"));

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn exklusiv_lehnt_zweiten_anrufer_ab() {
    let mut config = ServerConfig::default();
    config.raeume.rollen_politik = RollenPolitik::Exklusiv;
    let server = TestServer::mit_config(config).await;
    let einladung = Einladung::from(link_anfordern(&server.http_url()).await.unwrap());

    let mut erster = server.client().await;
    erster.caller_join(&einladung).await.unwrap();
    assert_eq!(ereignis(&mut erster).await, ServerEvent::CallerReady);

    let mut zweiter = server.client().await;
    zweiter.caller_join(&einladung).await.unwrap();
    assert_eq!(
        ereignis(&mut zweiter).await,
        ServerEvent::error("role-taken")
    );
    still(&mut erster, Duration::from_millis(200)).await;

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn letzter_gewinnt_ersetzt_anrufer() {
    let server = TestServer::starten().await;
    let einladung = Einladung::from(link_anfordern(&server.http_url()).await.unwrap());

    let mut alt = server.client().await;
    alt.caller_join(&einladung).await.unwrap();
    assert_eq!(ereignis(&mut alt).await, ServerEvent::CallerReady);

    let mut neu = server.client().await;
    neu.caller_join(&einladung).await.unwrap();
    assert_eq!(ereignis(&mut neu).await, ServerEvent::CallerReady);

    let mut angerufener = server.client().await;
    angerufener.callee_join(&einladung).await.unwrap();
    assert_eq!(ereignis(&mut angerufener).await, ServerEvent::CalleeReady);
    assert_eq!(ereignis(&mut neu).await, ServerEvent::CalleeJoined);
    still(&mut alt, Duration::from_millis(200)).await;

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn abgelaufener_raum_wird_gemeldet() {
    let mut config = ServerConfig::default();
    config.raeume.ttl_sek = 1;
    config.raeume.sweep_intervall_sek = 1;
    let server = TestServer::mit_config(config).await;
    let einladung = Einladung::from(link_anfordern(&server.http_url()).await.unwrap());

    let mut anrufer = server.client().await;
    anrufer.caller_join(&einladung).await.unwrap();
    assert_eq!(ereignis(&mut anrufer).await, ServerEvent::CallerReady);

    assert_eq!(
        ereignis(&mut anrufer).await,
        ServerEvent::error("room-expired")
    );

    let mut angerufener = server.client().await;
    angerufener.callee_join(&einladung).await.unwrap();
    assert_eq!(
        ereignis(&mut angerufener).await,
        ServerEvent::error("room-not-found")
    );

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn timeout_null_trennt_nicht() {
    let mut config = ServerConfig::default();
    config.verbindung.verbindungs_timeout_sek = 0;
    let server = TestServer::mit_config(config).await;

    let mut ws = verbinden(&server).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    senden(
        &mut ws,
        json!({"event": "caller-join", "data": {"roomId": "r", "seed": "c2VlZA"}}),
    )
    .await;
    assert_eq!(empfangen(&mut ws).await, json!({"event": "caller-ready"}));

    server.beenden().await.unwrap();
}

#[tokio::test]
async fn inaktive_verbindung_wird_mit_close_frame_getrennt() {
    let mut config = ServerConfig::default();
    config.verbindung.verbindungs_timeout_sek = 1;
    let server = TestServer::mit_config(config).await;

    let mut ws = verbinden(&server).await;
    let abschied = loop {
        let nachricht = tokio::time::timeout(WARTEZEIT, ws.next())
            .await
            .expect("Kein Close-Frame innerhalb der Wartezeit")
            .expect("Verbindung ohne Close-Frame beendet")
            .unwrap();
        if let Message::Close(frame) = nachricht {
            break frame.expect("Close-Frame ohne Code");
        }
    };
    assert_eq!(abschied.code, CloseCode::Away);
    assert_eq!(abschied.reason, "Zeitueberschreitung");

    server.beenden().await.unwrap();
}
