/*
 *  listener.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  UDP broadcast listener for bearing and GPS telemetry
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use log::{debug, info, trace, warn};
use serde::Deserialize;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::constants::{MAX_JSON_LEN, MIRRORED_SOURCE};
use crate::events::{BearingEvent, BearingSource, DisplayEvent, EventSenders, HeadingEvent, HeadingStatus};

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("bad JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BearingMessage {
    pub confidence: f64,
    pub bearing: f64,
    pub power: f64,
    pub raw_doa: Vec<f64>,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GpsMessage {
    pub speed: f64,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub heading_status: Option<String>,
}

/// Broadcast telemetry. Payload summaries, modem stats and the rest are
/// accepted and ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    #[serde(rename = "BEARING")]
    Bearing(BearingMessage),
    #[serde(rename = "GPS")]
    Gps(GpsMessage),
    #[serde(other)]
    Other,
}

impl From<BearingMessage> for BearingEvent {
    fn from(m: BearingMessage) -> Self {
        let source = match m.source.as_deref() {
            Some(MIRRORED_SOURCE) => BearingSource::Mirrored,
            _ => BearingSource::Generic,
        };
        BearingEvent {
            confidence: m.confidence,
            bearing: m.bearing,
            power: m.power,
            samples: m.raw_doa,
            source,
        }
    }
}

impl From<GpsMessage> for HeadingEvent {
    fn from(m: GpsMessage) -> Self {
        HeadingEvent {
            speed: m.speed,
            heading: m.heading,
            heading_status: m.heading_status.as_deref().map(HeadingStatus::from_status),
        }
    }
}

impl Message {
    pub fn into_event(self) -> Option<DisplayEvent> {
        match self {
            Message::Bearing(m) => Some(DisplayEvent::Bearing(m.into())),
            Message::Gps(m) => Some(DisplayEvent::Heading(m.into())),
            Message::Other => None,
        }
    }
}

pub fn parse_datagram(data: &[u8]) -> Result<Message, MessageError> {
    let text = std::str::from_utf8(data)?;
    Ok(serde_json::from_str(text)?)
}

/// Bind the broadcast port on all interfaces. The port is shared with any
/// other telemetry listener on the host that also sets the reuse options.
pub async fn bind(port: u16) -> io::Result<UdpSocket> {
    let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    sock.set_reuse_address(true)?;
    #[cfg(unix)]
    sock.set_reuse_port(true)?;
    sock.set_broadcast(true)?;
    sock.set_nonblocking(true)?;
    sock.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;

    let socket = UdpSocket::from_std(sock.into())?;
    info!("Listening for telemetry on UDP {}", socket.local_addr()?);
    Ok(socket)
}

/// Decode one datagram and queue the resulting event. Bad packets are
/// logged and dropped.
pub fn handle_datagram(data: &[u8], senders: &EventSenders) -> bool {
    match parse_datagram(data) {
        Ok(msg) => match msg.into_event() {
            Some(event) => senders.dispatch(event),
            None => {
                trace!("Ignoring packet type");
                false
            }
        },
        Err(e) => {
            warn!("Could not parse packet: {}", e);
            false
        }
    }
}

/// Receive until `shutdown` flips to true or its sender goes away
pub fn spawn_listener(
    socket: UdpSocket,
    senders: EventSenders,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut buf = vec![0u8; MAX_JSON_LEN];
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                recv = socket.recv_from(&mut buf) => {
                    match recv {
                        Ok((len, peer)) => {
                            debug!("{} bytes from {}", len, peer);
                            handle_datagram(&buf[..len], &senders);
                        }
                        Err(e) => warn!("UDP receive failed: {}", e),
                    }
                }
            }
        }
        info!("Closing UDP listener");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channels;
    use std::time::Duration;

    #[test]
    fn test_parse_bearing() {
        let msg = parse_datagram(
            br#"{"type":"BEARING","confidence":45,"bearing":120.5,"power":-25.0,"raw_doa":[0.1,0.9],"source":"kerberos-sdr"}"#,
        )
        .unwrap();
        let Some(DisplayEvent::Bearing(ev)) = msg.into_event() else {
            panic!("expected a bearing");
        };
        assert_eq!(ev.confidence, 45.0);
        assert_eq!(ev.samples, vec![0.1, 0.9]);
        assert_eq!(ev.source, BearingSource::Mirrored);
    }

    #[test]
    fn test_parse_bearing_without_source() {
        let msg = parse_datagram(
            br#"{"type":"BEARING","confidence":45,"bearing":10,"power":3,"raw_doa":[]}"#,
        )
        .unwrap();
        match msg {
            Message::Bearing(m) => {
                let ev: BearingEvent = m.into();
                assert_eq!(ev.source, BearingSource::Generic);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_gps() {
        let msg = parse_datagram(
            br#"{"type":"GPS","speed":42.0,"heading":0.0,"heading_status":"Heading Ongoing","latitude":-34.9}"#,
        )
        .unwrap();
        let Some(DisplayEvent::Heading(ev)) = msg.into_event() else {
            panic!("expected a heading");
        };
        assert_eq!(ev.heading, Some(0.0));
        assert!(!ev.heading_valid());

        let msg = parse_datagram(br#"{"type":"GPS","speed":5}"#).unwrap();
        let Some(DisplayEvent::Heading(ev)) = msg.into_event() else {
            panic!("expected a heading");
        };
        assert_eq!(ev.heading, None);
        assert!(ev.heading_valid());
    }

    #[test]
    fn test_other_types_ignored() {
        let msg = parse_datagram(br#"{"type":"MODEM_STATS","snr":12}"#).unwrap();
        assert_eq!(msg, Message::Other);
        assert!(msg.into_event().is_none());
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(matches!(parse_datagram(b"{not json"), Err(MessageError::Json(_))));
        assert!(matches!(parse_datagram(&[0xff, 0xfe]), Err(MessageError::Utf8(_))));
        // bearing without its samples
        assert!(parse_datagram(br#"{"type":"BEARING","confidence":1,"bearing":2,"power":3}"#).is_err());
        assert!(parse_datagram(br#"{"speed":1}"#).is_err());
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        let (tx, mut rx) = event_channels(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = spawn_listener(socket, tx, shutdown_rx);

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.send_to(b"garbage", addr).await.unwrap();
        client
            .send_to(br#"{"type":"GPS","speed":12.5,"heading":270.0}"#, addr)
            .await
            .unwrap();

        let ev = tokio::time::timeout(Duration::from_secs(2), rx.headings.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ev.speed, 12.5);
        assert_eq!(ev.heading, Some(270.0));

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_port_shared_with_another_listener() {
        let first = bind(0).await.unwrap();
        let port = first.local_addr().unwrap().port();
        let second = bind(port).await.unwrap();
        assert_eq!(second.local_addr().unwrap().port(), port);
        assert!(second.broadcast().unwrap());
    }
}
