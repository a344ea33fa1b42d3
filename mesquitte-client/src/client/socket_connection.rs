use std::{
    cmp, fmt, io,
    time::{Duration, Instant},
};

use bytes::{BufMut as _, BytesMut};
use mqtt_codec_kit::{
    common::QualityOfService,
    v5::{
        control::{ConnectReasonCode, DisconnectReasonCode},
        packet::{DisconnectPacket, VariablePacket},
    },
};

use crate::{
    debug, info,
    protocols::v5::{
        common::new_publish_packet, Connection, ConnectionStatus, Engine, Handler, OutgoingPacket,
        TimerKind, TimerOp,
    },
    transport::{Transport, MSG_NONE},
    trace, warn, Error, Result,
};

use super::{
    config::ClientConfig,
    observer::{LogObserver, Observer},
};

// reason codes from 0x80 on are failures
const PUBREC_FAILURE_THRESHOLD: u8 = 0x80;
// std sockets reject a zero read timeout
const MIN_RECV_TIMEOUT: Duration = Duration::from_millis(1);

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum SocketState {
    Open,
    Closing,
    Closed,
}

impl fmt::Display for SocketState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocketState::Open => write!(f, "open"),
            SocketState::Closing => write!(f, "closing"),
            SocketState::Closed => write!(f, "closed"),
        }
    }
}

/// Client side [`Handler`] writing packets to a [`Transport`].
///
/// Once the broker accepts the CONNECT it publishes the configured payloads at QoS 0,
/// 1 and 2, and disconnects once the QoS 2 exchange completes or the broker rejects it.
pub struct SocketConnection<T, O = LogObserver> {
    transport: T,
    observer: O,
    config: ClientConfig,
    state: SocketState,
    exactly_once_id: Option<u16>,
    disconnect_sent: bool,
    pingreq_deadline: Option<Instant>,
    pingresp_deadline: Option<Instant>,
}

impl<T: Transport> SocketConnection<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_observer(transport, config, LogObserver)
    }
}

impl<T: Transport, O: Observer> SocketConnection<T, O> {
    pub fn with_observer(transport: T, config: ClientConfig, observer: O) -> Self {
        Self {
            transport,
            observer,
            config,
            state: SocketState::Open,
            exactly_once_id: None,
            disconnect_sent: false,
            pingreq_deadline: None,
            pingresp_deadline: None,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> SocketState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SocketState::Closed
    }

    /// Identifier of the QoS 2 publication, once it was sent.
    pub fn exactly_once_id(&self) -> Option<u16> {
        self.exactly_once_id
    }

    /// Closes the transport once, later calls only make sure the engine knows.
    fn shutdown(&mut self, engine: &mut Engine) {
        if self.state == SocketState::Open {
            self.state = SocketState::Closing;
            if let Err(err) = self.transport.close() {
                warn!("close transport failed: {err}");
            }
            self.state = SocketState::Closed;
        }
        engine.notify_closed();
    }

    fn fail(&mut self, engine: &mut Engine, err: Error) {
        self.observer.on_error(&err);
        self.shutdown(engine);
    }

    fn publish_all(&mut self, engine: &mut Engine) -> Result<()> {
        let at_least_once_id = engine
            .acquire_unique_packet_id()
            .ok_or(Error::PacketIdExhausted)?;
        let Some(exactly_once_id) = engine.acquire_unique_packet_id() else {
            engine.release_packet_id(at_least_once_id);
            return Err(Error::PacketIdExhausted);
        };

        for (qos, packet_id) in [
            (QualityOfService::Level0, 0),
            (QualityOfService::Level1, at_least_once_id),
            (QualityOfService::Level2, exactly_once_id),
        ] {
            let publication = self.config.publication(qos);
            engine.send(new_publish_packet(
                publication.topic().clone(),
                qos,
                packet_id,
                publication.payload(),
            ))?;
        }
        self.exactly_once_id = Some(exactly_once_id);
        Ok(())
    }

    /// Ends the session after the exactly once publication, at most once.
    fn finish_exactly_once(&mut self, engine: &mut Engine, packet_id: u16) {
        if self.disconnect_sent || self.exactly_once_id != Some(packet_id) {
            return;
        }
        self.disconnect_sent = true;
        info!("exactly once publication packet id#{packet_id} finished, disconnecting");
        if let Err(err) =
            engine.send(DisconnectPacket::new(DisconnectReasonCode::NormalDisconnection))
        {
            self.fail(engine, err);
        }
    }

    /// The timer due first and how long until it fires.
    fn next_timer(&self) -> Option<(TimerKind, Duration)> {
        let now = Instant::now();
        [
            (TimerKind::PingrespRecv, self.pingresp_deadline),
            (TimerKind::PingreqSend, self.pingreq_deadline),
        ]
        .into_iter()
        .filter_map(|(kind, deadline)| deadline.map(|deadline| (kind, deadline)))
        .min_by_key(|(_, deadline)| *deadline)
        .map(|(kind, deadline)| {
            let remaining = deadline.saturating_duration_since(now);
            (kind, cmp::max(remaining, MIN_RECV_TIMEOUT))
        })
    }

    fn expire_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::PingreqSend => self.pingreq_deadline = None,
            TimerKind::PingrespRecv => self.pingresp_deadline = None,
        }
    }

    fn write_all_segments(&mut self, packet: &OutgoingPacket) -> Result<()> {
        let segments = packet.buffer_segments()?;
        let mut buf = BytesMut::with_capacity(segments.iter().map(|s| s.len()).sum());
        for segment in segments {
            buf.put(segment);
        }

        let sent = self.transport.send(&buf, MSG_NONE, None)?;
        if sent != buf.len() {
            return Err(Error::ShortWrite {
                sent,
                expected: buf.len(),
            });
        }
        Ok(())
    }
}

impl<T: Transport, O: Observer> Handler for SocketConnection<T, O> {
    fn on_error(&mut self, engine: &mut Engine, err: Error) {
        self.fail(engine, err);
    }

    fn on_close(&mut self, engine: &mut Engine) {
        if self.state == SocketState::Open {
            self.observer.on_close();
        }
        self.shutdown(engine);
    }

    fn on_send(
        &mut self,
        engine: &mut Engine,
        packet: OutgoingPacket,
        release_packet_id_if_send_error: Option<u16>,
    ) -> Result<()> {
        let result = if self.state == SocketState::Open {
            self.write_all_segments(&packet)
        } else {
            Err(Error::Closed)
        };

        match result {
            Ok(()) => {
                self.observer.on_send(&packet);
                Ok(())
            }
            Err(err) => {
                if let Some(packet_id) = release_packet_id_if_send_error {
                    engine.release_packet_id(packet_id);
                }
                self.observer.on_send_failed(&packet, &err);
                Err(err)
            }
        }
    }

    fn on_packet_id_release(&mut self, _engine: &mut Engine, packet_id: u16) {
        self.observer.on_packet_id_release(packet_id);
    }

    fn on_receive(&mut self, engine: &mut Engine, packet: VariablePacket) {
        self.observer.on_receive(&packet);
        match &packet {
            VariablePacket::ConnackPacket(connack) => {
                let code = connack.connect_reason_code();
                if code != ConnectReasonCode::Success {
                    self.fail(engine, Error::ConnectionRefused(code));
                    return;
                }
                if let Err(err) = self.publish_all(engine) {
                    self.fail(engine, err);
                }
            }
            VariablePacket::PubcompPacket(pubcomp) => {
                self.finish_exactly_once(engine, pubcomp.packet_identifier());
            }
            VariablePacket::PubrecPacket(pubrec) => {
                // a rejected PUBREC ends the flow, no PUBCOMP follows
                let code = pubrec.reason_code();
                if u8::from(code) >= PUBREC_FAILURE_THRESHOLD {
                    debug!("pubrec packet id#{} rejected: {code:?}", pubrec.packet_identifier());
                    self.finish_exactly_once(engine, pubrec.packet_identifier());
                }
            }
            VariablePacket::PublishPacket(_)
            | VariablePacket::PubackPacket(_)
            | VariablePacket::PubrelPacket(_) => {}
            VariablePacket::ConnectPacket(_)
            | VariablePacket::PingreqPacket(_)
            | VariablePacket::PingrespPacket(_)
            | VariablePacket::SubscribePacket(_)
            | VariablePacket::SubackPacket(_)
            | VariablePacket::UnsubscribePacket(_)
            | VariablePacket::UnsubackPacket(_)
            | VariablePacket::DisconnectPacket(_)
            | VariablePacket::AuthPacket(_) => {}
        }
    }

    fn on_timer_op(
        &mut self,
        _engine: &mut Engine,
        op: TimerOp,
        kind: TimerKind,
        duration: Option<Duration>,
    ) {
        self.observer.on_timer_op(op, kind, duration);
        let deadline = match op {
            TimerOp::Set | TimerOp::Reset => duration.map(|duration| Instant::now() + duration),
            TimerOp::Cancel => None,
        };
        match kind {
            TimerKind::PingreqSend => self.pingreq_deadline = deadline,
            TimerKind::PingrespRecv => self.pingresp_deadline = deadline,
        }
    }
}

impl<T: Transport, O: Observer> Connection<SocketConnection<T, O>> {
    /// Reads from the transport until the connection is closed.
    ///
    /// The receive timeout is the time left on the timer due first, a timed out read
    /// fires that timer: PINGREQ when keep alive is due, a keep alive timeout when the
    /// PINGRESP did not arrive.
    pub fn run(&mut self) {
        let mut buf = vec![0u8; self.handler().config().recv_buffer_size()];
        while !self.handler().is_closed() && self.status() != ConnectionStatus::Closed {
            let next_timer = self.handler().next_timer();
            let timeout = next_timer.map(|(_, timeout)| timeout);
            match self
                .handler_mut()
                .transport_mut()
                .recv(&mut buf, MSG_NONE, timeout)
            {
                Ok(0) => {
                    debug!("peer closed the connection");
                    self.close();
                }
                Ok(n) => {
                    trace!("read {n} bytes");
                    self.recv(&buf[..n]);
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    match next_timer {
                        Some((kind, _)) => {
                            self.handler_mut().expire_timer(kind);
                            self.notify_timer_fired(kind);
                        }
                        None => self.notify_error(err.into()),
                    }
                }
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => self.notify_error(err.into()),
            }
        }
    }
}
