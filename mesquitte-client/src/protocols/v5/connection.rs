use bytes::BytesMut;
use mqtt_codec_kit::v5::packet::{ConnectPacket, MqttDecoder, VariablePacket};
use tokio_util::codec::Decoder as _;

use crate::{debug, trace, warn, Error, Result};

use super::{
    common::packet_name,
    config::EngineConfig,
    engine::{ConnectionStatus, Engine, Event},
    handler::Handler,
    timer::TimerKind,
};

/// Drives a [`Handler`] with the packets read from and written to one connection.
pub struct Connection<H> {
    engine: Engine,
    handler: H,
    decoder: MqttDecoder,
    read_buf: BytesMut,
}

impl<H: Handler> Connection<H> {
    pub fn new(handler: H, config: EngineConfig) -> Self {
        Self {
            engine: Engine::new(config),
            handler,
            decoder: MqttDecoder::new(),
            read_buf: BytesMut::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    pub fn status(&self) -> ConnectionStatus {
        self.engine.status()
    }

    pub fn connect(&mut self, packet: ConnectPacket) {
        debug!("connect as {}", packet.client_identifier());
        if let Err(err) = self.engine.send(packet) {
            self.notify_error(err);
            return;
        }
        self.flush();
    }

    pub fn send<P: Into<VariablePacket>>(&mut self, packet: P) -> Result<()> {
        self.engine.send(packet)?;
        self.flush();
        Ok(())
    }

    /// Feeds bytes read from the transport, complete packets are dispatched right away
    /// and a partial one is kept until the rest arrives.
    pub fn recv(&mut self, data: &[u8]) {
        if self.engine.status() == ConnectionStatus::Closed {
            trace!("drop {} bytes received after close", data.len());
            return;
        }

        self.read_buf.extend_from_slice(data);
        while self.engine.status() != ConnectionStatus::Closed {
            match self.decoder.decode(&mut self.read_buf) {
                Ok(Some(packet)) => self.dispatch(packet),
                Ok(None) => break,
                Err(err) => {
                    warn!("decode packet failed: {err}");
                    self.read_buf.clear();
                    self.notify_error(err.into());
                    break;
                }
            }
        }
    }

    pub fn notify_timer_fired(&mut self, kind: TimerKind) {
        debug!("timer fired: {kind}");
        match kind {
            TimerKind::PingreqSend => {
                if let Err(err) = self.engine.send_pingreq() {
                    self.notify_error(err);
                    return;
                }
                self.flush();
            }
            TimerKind::PingrespRecv => self.notify_error(Error::KeepAliveTimeout),
        }
    }

    pub fn notify_error(&mut self, err: Error) {
        if self.engine.status() == ConnectionStatus::Closed {
            debug!("ignore error after close: {err}");
            return;
        }
        self.handler.on_error(&mut self.engine, err);
        self.engine.notify_closed();
        self.flush();
    }

    pub fn close(&mut self) {
        if self.engine.status() == ConnectionStatus::Closed {
            return;
        }
        self.handler.on_close(&mut self.engine);
        self.engine.notify_closed();
        self.flush();
    }

    fn dispatch(&mut self, packet: VariablePacket) {
        trace!("receive {} packet", packet_name(&packet));
        if let Err(err) = self.engine.handle_incoming(&packet) {
            self.notify_error(err);
            return;
        }

        let is_disconnect = matches!(packet, VariablePacket::DisconnectPacket(_));
        self.handler.on_receive(&mut self.engine, packet);
        self.flush();
        if is_disconnect {
            self.close();
        }
    }

    fn flush(&mut self) {
        while let Some(event) = self.engine.take_event() {
            match event {
                Event::Send(packet, release_packet_id_if_send_error) => {
                    let is_disconnect = packet.is_disconnect();
                    match self.handler.on_send(
                        &mut self.engine,
                        packet,
                        release_packet_id_if_send_error,
                    ) {
                        Ok(()) if is_disconnect => {
                            self.handler.on_close(&mut self.engine);
                            self.engine.notify_closed();
                        }
                        Ok(()) => {}
                        Err(err) => {
                            if self.engine.status() != ConnectionStatus::Closed {
                                self.handler.on_error(&mut self.engine, err);
                                self.engine.notify_closed();
                            }
                        }
                    }
                }
                Event::Release(packet_id) => {
                    self.handler.on_packet_id_release(&mut self.engine, packet_id)
                }
                Event::Timer(op, kind, duration) => {
                    self.handler
                        .on_timer_op(&mut self.engine, op, kind, duration)
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use mqtt_codec_kit::{
        common::Encodable,
        v5::{
            control::ConnectReasonCode,
            packet::{ConnackPacket, PingrespPacket},
        },
    };

    use super::*;
    use crate::protocols::v5::{outgoing::OutgoingPacket, timer::TimerOp};

    #[derive(Default)]
    struct Recorder {
        sent: Vec<&'static str>,
        received: Vec<&'static str>,
        errors: Vec<String>,
        timers: Vec<(TimerOp, TimerKind)>,
        closed: usize,
        fail_send: bool,
    }

    impl Handler for Recorder {
        fn on_error(&mut self, _engine: &mut Engine, err: Error) {
            self.errors.push(err.to_string());
        }

        fn on_close(&mut self, _engine: &mut Engine) {
            self.closed += 1;
        }

        fn on_send(
            &mut self,
            engine: &mut Engine,
            packet: OutgoingPacket,
            release_packet_id_if_send_error: Option<u16>,
        ) -> Result<()> {
            if self.fail_send {
                if let Some(pid) = release_packet_id_if_send_error {
                    engine.release_packet_id(pid);
                }
                return Err(Error::ShortWrite {
                    sent: 0,
                    expected: packet.encoded_length() as usize,
                });
            }
            self.sent.push(packet.name());
            Ok(())
        }

        fn on_receive(&mut self, _engine: &mut Engine, packet: VariablePacket) {
            self.received.push(packet_name(&packet));
        }

        fn on_timer_op(
            &mut self,
            _engine: &mut Engine,
            op: TimerOp,
            kind: TimerKind,
            _duration: Option<Duration>,
        ) {
            self.timers.push((op, kind));
        }
    }

    fn encode<P: Encodable>(packet: P) -> Vec<u8> {
        let mut buf = Vec::new();
        packet.encode(&mut buf).unwrap();
        buf
    }

    fn connected(config: EngineConfig) -> Connection<Recorder> {
        let mut conn = Connection::new(Recorder::default(), config);
        let mut connect = ConnectPacket::new("conn");
        connect.set_keep_alive(10);
        conn.connect(connect);
        conn.recv(&encode(ConnackPacket::new(false, ConnectReasonCode::Success)));
        conn
    }

    #[test]
    fn split_packet_is_decoded_once_complete() {
        let mut conn = Connection::new(Recorder::default(), EngineConfig::default());
        conn.connect(ConnectPacket::new("conn"));

        let bytes = encode(ConnackPacket::new(false, ConnectReasonCode::Success));
        let (head, tail) = bytes.split_at(2);
        conn.recv(head);
        assert!(conn.handler().received.is_empty());
        conn.recv(tail);

        assert_eq!(conn.handler().received, vec!["CONNACK"]);
        assert_eq!(conn.status(), ConnectionStatus::Connected);
    }

    #[test]
    fn keep_alive_timer_sends_pingreq() {
        let config = EngineConfig::new(u16::MAX, true, Some(Duration::from_secs(5)));
        let mut conn = connected(config);
        assert_eq!(
            conn.handler().timers,
            vec![(TimerOp::Set, TimerKind::PingreqSend)]
        );

        conn.notify_timer_fired(TimerKind::PingreqSend);
        assert_eq!(conn.handler().sent, vec!["CONNECT", "PINGREQ"]);
        assert!(conn
            .handler()
            .timers
            .contains(&(TimerOp::Set, TimerKind::PingrespRecv)));

        conn.recv(&encode(PingrespPacket::new()));
        assert_eq!(
            conn.handler().timers.last(),
            Some(&(TimerOp::Cancel, TimerKind::PingrespRecv))
        );
        assert!(conn.handler().errors.is_empty());
    }

    #[test]
    fn pingresp_timeout_fails_connection() {
        let mut conn = connected(EngineConfig::default());
        conn.notify_timer_fired(TimerKind::PingrespRecv);
        conn.notify_timer_fired(TimerKind::PingrespRecv);

        assert_eq!(conn.handler().errors, vec!["keep alive timeout".to_owned()]);
        assert_eq!(conn.status(), ConnectionStatus::Closed);
    }

    #[test]
    fn failed_send_reports_error_once() {
        let mut conn = Connection::new(
            Recorder {
                fail_send: true,
                ..Default::default()
            },
            EngineConfig::default(),
        );
        conn.connect(ConnectPacket::new("conn"));

        assert_eq!(conn.handler().errors.len(), 1);
        assert_eq!(conn.status(), ConnectionStatus::Closed);
        assert!(conn.send(PingrespPacket::new()).is_err());
    }

    #[test]
    fn malformed_bytes_fail_connection() {
        let mut conn = Connection::new(Recorder::default(), EngineConfig::default());
        conn.connect(ConnectPacket::new("conn"));
        conn.recv(&[0x00, 0x00]);

        assert_eq!(conn.handler().errors.len(), 1);
        assert_eq!(conn.status(), ConnectionStatus::Closed);
    }
}
