use std::io;

use bytes::{BufMut as _, Bytes, BytesMut};
use mqtt_codec_kit::{
    common::{packet::EncodablePacket, qos::QoSWithPacketIdentifier, Encodable},
    v5::packet::VariablePacket,
};

use super::common::packet_name;

/// A packet on its way to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingPacket {
    packet: VariablePacket,
}

impl OutgoingPacket {
    pub fn new<P: Into<VariablePacket>>(packet: P) -> Self {
        Self {
            packet: packet.into(),
        }
    }

    pub fn packet(&self) -> &VariablePacket {
        &self.packet
    }

    pub fn name(&self) -> &'static str {
        packet_name(&self.packet)
    }

    /// Identifier of a QoS 1/2 PUBLISH.
    pub fn packet_id(&self) -> Option<u16> {
        match &self.packet {
            VariablePacket::PublishPacket(packet) => match packet.qos() {
                QoSWithPacketIdentifier::Level0 => None,
                QoSWithPacketIdentifier::Level1(pid) | QoSWithPacketIdentifier::Level2(pid) => {
                    Some(pid)
                }
            },
            _ => None,
        }
    }

    pub fn is_disconnect(&self) -> bool {
        matches!(self.packet, VariablePacket::DisconnectPacket(_))
    }

    pub fn encoded_length(&self) -> u32 {
        self.packet.encoded_length()
    }

    /// Wire representation in order: the fixed header, then variable header and payload
    /// when the packet has any.
    pub fn buffer_segments(&self) -> io::Result<Vec<Bytes>> {
        let mut header = BytesMut::with_capacity(5).writer();
        self.packet.fixed_header().encode(&mut header)?;

        let body_len = self.packet.encoded_packet_length() as usize;
        if body_len == 0 {
            return Ok(vec![header.into_inner().freeze()]);
        }

        let mut body = BytesMut::with_capacity(body_len).writer();
        self.packet.encode_packet(&mut body)?;

        Ok(vec![
            header.into_inner().freeze(),
            body.into_inner().freeze(),
        ])
    }
}
