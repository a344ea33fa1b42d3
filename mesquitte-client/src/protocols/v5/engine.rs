use std::{collections::VecDeque, fmt, time::Duration};

use foldhash::{HashMap, HashMapExt};
use mqtt_codec_kit::{
    common::qos::QoSWithPacketIdentifier,
    v5::{
        control::{ConnectReasonCode, PubackReasonCode, PubrecReasonCode},
        packet::{
            PingreqPacket, PubackPacket, PubcompPacket, PubrecPacket, PubrelPacket, VariablePacket,
        },
    },
};

use crate::{debug, trace, warn, Error, Result};

use super::{
    common::packet_name,
    config::EngineConfig,
    outgoing::OutgoingPacket,
    packet_id::PacketIdPool,
    timer::{TimerKind, TimerOp},
};

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Closed => write!(f, "closed"),
        }
    }
}

/// Outgoing QoS flow waiting for its next acknowledgement.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum PublishFlow {
    AwaitPuback,
    AwaitPubrec,
    AwaitPubcomp,
}

pub(crate) enum Event {
    Send(OutgoingPacket, Option<u16>),
    Release(u16),
    Timer(TimerOp, TimerKind, Option<Duration>),
}

/// Client side protocol state handed to every [`super::Handler`] callback.
///
/// Packets passed to [`Engine::send`] are queued and reach the handler's `on_send`
/// once the running callback has returned.
pub struct Engine {
    config: EngineConfig,
    status: ConnectionStatus,
    keep_alive: u16,
    packet_ids: PacketIdPool,
    inflight: HashMap<u16, PublishFlow>,
    events: VecDeque<Event>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            packet_ids: PacketIdPool::new(config.max_packet_id),
            config,
            status: ConnectionStatus::Disconnected,
            keep_alive: 0,
            inflight: HashMap::new(),
            events: VecDeque::new(),
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn acquire_unique_packet_id(&mut self) -> Option<u16> {
        let packet_id = self.packet_ids.acquire_unique();
        trace!("acquire packet id: {packet_id:?}");
        packet_id
    }

    /// Hands an identifier back to the pool and drops its flow.
    pub fn release_packet_id(&mut self, packet_id: u16) {
        self.inflight.remove(&packet_id);
        if self.packet_ids.release(packet_id) {
            trace!("release packet id: {packet_id}");
            self.events.push_back(Event::Release(packet_id));
        }
    }

    pub fn is_packet_id_in_use(&self, packet_id: u16) -> bool {
        self.packet_ids.is_in_use(packet_id)
    }

    pub fn inflight(&self, packet_id: u16) -> Option<PublishFlow> {
        self.inflight.get(&packet_id).copied()
    }

    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    pub fn send<P: Into<VariablePacket>>(&mut self, packet: P) -> Result<()> {
        if self.status == ConnectionStatus::Closed {
            return Err(Error::Closed);
        }

        let packet = packet.into();
        let mut release_packet_id_if_send_error = None;
        match &packet {
            VariablePacket::ConnectPacket(connect) => {
                if self.status != ConnectionStatus::Disconnected {
                    return Err(Error::UnexpectedPacket("CONNECT"));
                }
                self.status = ConnectionStatus::Connecting;
                self.keep_alive = connect.keep_alive();
            }
            VariablePacket::PublishPacket(publish) => match publish.qos() {
                QoSWithPacketIdentifier::Level0 => {}
                QoSWithPacketIdentifier::Level1(pid) => {
                    self.start_flow(pid, PublishFlow::AwaitPuback);
                    release_packet_id_if_send_error = Some(pid);
                }
                QoSWithPacketIdentifier::Level2(pid) => {
                    self.start_flow(pid, PublishFlow::AwaitPubrec);
                    release_packet_id_if_send_error = Some(pid);
                }
            },
            VariablePacket::PingreqPacket(_) => {
                if let Some(timeout) = self.config.pingresp_timeout {
                    self.push_timer(TimerOp::Set, TimerKind::PingrespRecv, Some(timeout));
                }
            }
            _ => {}
        }

        debug!("queue {} packet", packet_name(&packet));
        let is_connect = matches!(packet, VariablePacket::ConnectPacket(_));
        self.events.push_back(Event::Send(
            OutgoingPacket::new(packet),
            release_packet_id_if_send_error,
        ));

        if self.keep_alive > 0 {
            let op = if is_connect {
                TimerOp::Set
            } else {
                TimerOp::Reset
            };
            self.push_timer(op, TimerKind::PingreqSend, Some(self.keep_alive_interval()));
        }
        Ok(())
    }

    /// The connection is gone: cancel timers, drop queued sends and in-flight flows.
    pub fn notify_closed(&mut self) {
        if self.status == ConnectionStatus::Closed {
            return;
        }
        debug!("connection closed, {} flows in flight", self.inflight.len());
        self.status = ConnectionStatus::Closed;
        self.events.retain(|event| !matches!(event, Event::Send(..)));

        let mut packet_ids: Vec<u16> = self.inflight.keys().copied().collect();
        packet_ids.sort_unstable();
        for packet_id in packet_ids {
            self.release_packet_id(packet_id);
        }

        if self.keep_alive > 0 {
            self.push_timer(TimerOp::Cancel, TimerKind::PingreqSend, None);
        }
        if self.config.pingresp_timeout.is_some() {
            self.push_timer(TimerOp::Cancel, TimerKind::PingrespRecv, None);
        }
    }

    pub(crate) fn take_event(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub(crate) fn send_pingreq(&mut self) -> Result<()> {
        if self.status != ConnectionStatus::Connected {
            return Ok(());
        }
        self.send(PingreqPacket::new())
    }

    /// Bookkeeping that runs before the handler sees an incoming packet.
    pub(crate) fn handle_incoming(&mut self, packet: &VariablePacket) -> Result<()> {
        match packet {
            VariablePacket::ConnackPacket(connack) => {
                if self.status != ConnectionStatus::Connecting {
                    return Err(Error::UnexpectedPacket("CONNACK"));
                }
                if connack.connect_reason_code() == ConnectReasonCode::Success {
                    self.status = ConnectionStatus::Connected;
                }
            }
            VariablePacket::PublishPacket(publish) => {
                self.ensure_connected("PUBLISH")?;
                if self.config.auto_pub_response {
                    match publish.qos() {
                        QoSWithPacketIdentifier::Level0 => {}
                        QoSWithPacketIdentifier::Level1(pid) => {
                            self.send(PubackPacket::new(pid, PubackReasonCode::Success))?
                        }
                        QoSWithPacketIdentifier::Level2(pid) => {
                            self.send(PubrecPacket::new(pid, PubrecReasonCode::Success))?
                        }
                    }
                }
            }
            VariablePacket::PubackPacket(puback) => {
                self.ensure_connected("PUBACK")?;
                let pid = puback.packet_identifier();
                if self.inflight(pid) == Some(PublishFlow::AwaitPuback) {
                    self.release_packet_id(pid);
                } else {
                    warn!("puback for unknown packet id#{pid}");
                }
            }
            VariablePacket::PubrecPacket(pubrec) => {
                self.ensure_connected("PUBREC")?;
                let pid = pubrec.packet_identifier();
                if self.inflight(pid) != Some(PublishFlow::AwaitPubrec) {
                    warn!("pubrec for unknown packet id#{pid}");
                    return Ok(());
                }
                match pubrec.reason_code() {
                    PubrecReasonCode::Success | PubrecReasonCode::NoMatchingSubscribers => {
                        self.inflight.insert(pid, PublishFlow::AwaitPubcomp);
                        if self.config.auto_pub_response {
                            self.send(PubrelPacket::new_success(pid))?;
                        }
                    }
                    code => {
                        debug!("pubrec packet id#{pid} rejected: {code:?}");
                        self.release_packet_id(pid);
                    }
                }
            }
            VariablePacket::PubrelPacket(pubrel) => {
                self.ensure_connected("PUBREL")?;
                if self.config.auto_pub_response {
                    self.send(PubcompPacket::new_success(pubrel.packet_identifier()))?;
                }
            }
            VariablePacket::PubcompPacket(pubcomp) => {
                self.ensure_connected("PUBCOMP")?;
                let pid = pubcomp.packet_identifier();
                if self.inflight(pid) == Some(PublishFlow::AwaitPubcomp) {
                    self.release_packet_id(pid);
                } else {
                    warn!("pubcomp for unknown packet id#{pid}");
                }
            }
            VariablePacket::PingrespPacket(_) => {
                if self.config.pingresp_timeout.is_some() {
                    self.push_timer(TimerOp::Cancel, TimerKind::PingrespRecv, None);
                }
            }
            VariablePacket::ConnectPacket(_)
            | VariablePacket::PingreqPacket(_)
            | VariablePacket::SubscribePacket(_)
            | VariablePacket::UnsubscribePacket(_) => {
                return Err(Error::UnexpectedPacket(packet_name(packet)));
            }
            _ => {}
        }
        Ok(())
    }

    fn ensure_connected(&self, name: &'static str) -> Result<()> {
        if self.status != ConnectionStatus::Connected {
            return Err(Error::UnexpectedPacket(name));
        }
        Ok(())
    }

    fn start_flow(&mut self, packet_id: u16, flow: PublishFlow) {
        if !self.packet_ids.is_in_use(packet_id) {
            self.packet_ids.register(packet_id);
        }
        self.inflight.insert(packet_id, flow);
    }

    fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive as u64)
    }

    fn push_timer(&mut self, op: TimerOp, kind: TimerKind, duration: Option<Duration>) {
        self.events.push_back(Event::Timer(op, kind, duration));
    }
}
