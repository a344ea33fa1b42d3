use std::time::Duration;

use mqtt_codec_kit::v5::packet::VariablePacket;

use crate::Error;

use super::{
    engine::Engine,
    outgoing::OutgoingPacket,
    timer::{TimerKind, TimerOp},
};

/// Client role callbacks invoked by [`super::Connection`].
///
/// Every callback gets the engine state, packets sent through it are delivered to
/// [`Handler::on_send`] after the current callback returns.
pub trait Handler {
    fn on_error(&mut self, engine: &mut Engine, err: Error);

    fn on_close(&mut self, engine: &mut Engine);

    /// Writes `packet` out. An `Err` is handed back to [`Handler::on_error`].
    ///
    /// `release_packet_id_if_send_error` carries the identifier of a QoS 1/2 PUBLISH,
    /// it has to be given back through [`Engine::release_packet_id`] when the write
    /// fails.
    fn on_send(
        &mut self,
        engine: &mut Engine,
        packet: OutgoingPacket,
        release_packet_id_if_send_error: Option<u16>,
    ) -> crate::Result<()>;

    fn on_packet_id_release(&mut self, _engine: &mut Engine, _packet_id: u16) {}

    fn on_receive(&mut self, engine: &mut Engine, packet: VariablePacket);

    fn on_timer_op(
        &mut self,
        _engine: &mut Engine,
        _op: TimerOp,
        _kind: TimerKind,
        _duration: Option<Duration>,
    ) {
    }
}
