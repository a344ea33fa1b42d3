use std::time::Duration;

use mqtt_codec_kit::v5::packet::VariablePacket;

use crate::{
    debug, error, info,
    protocols::v5::{
        common::packet_name,
        outgoing::OutgoingPacket,
        timer::{TimerKind, TimerOp},
    },
    warn, Error,
};

/// Receives what happens on a [`super::SocketConnection`].
pub trait Observer {
    fn on_error(&mut self, _err: &Error) {}

    fn on_close(&mut self) {}

    fn on_send(&mut self, _packet: &OutgoingPacket) {}

    fn on_send_failed(&mut self, _packet: &OutgoingPacket, _err: &Error) {}

    fn on_receive(&mut self, _packet: &VariablePacket) {}

    fn on_packet_id_release(&mut self, _packet_id: u16) {}

    fn on_timer_op(&mut self, _op: TimerOp, _kind: TimerKind, _duration: Option<Duration>) {}
}

/// Writes every event to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_error(&mut self, err: &Error) {
        error!("connection error: {err}");
    }

    fn on_close(&mut self) {
        info!("connection closed");
    }

    fn on_send(&mut self, packet: &OutgoingPacket) {
        debug!("send {} packet: {} bytes", packet.name(), packet.encoded_length());
    }

    fn on_send_failed(&mut self, packet: &OutgoingPacket, err: &Error) {
        warn!("send {} packet failed: {err}", packet.name());
    }

    fn on_receive(&mut self, packet: &VariablePacket) {
        match packet {
            VariablePacket::PublishPacket(publish) => {
                let (qos, packet_id) = publish.qos().split();
                let topic: &str = publish.topic_name();
                debug!(
                    "receive PUBLISH packet: packet_id={packet_id:?} topic={topic} payload={} qos={qos:?} retain={} dup={}",
                    String::from_utf8_lossy(publish.payload()),
                    publish.retain(),
                    publish.dup(),
                );
            }
            VariablePacket::ConnackPacket(connack) => {
                info!("receive CONNACK packet: {:?}", connack.connect_reason_code());
            }
            packet => {
                debug!("receive {} packet", packet_name(packet));
            }
        }
    }

    fn on_packet_id_release(&mut self, packet_id: u16) {
        debug!("packet id#{packet_id} released");
    }

    fn on_timer_op(&mut self, op: TimerOp, kind: TimerKind, duration: Option<Duration>) {
        debug!("timer {op} {kind}: {duration:?}");
    }
}
