use mqtt_codec_kit::{
    common::{qos::QoSWithPacketIdentifier, QualityOfService, TopicName},
    v5::packet::{PublishPacket, VariablePacket},
};

pub fn packet_name(packet: &VariablePacket) -> &'static str {
    match packet {
        VariablePacket::ConnectPacket(_) => "CONNECT",
        VariablePacket::ConnackPacket(_) => "CONNACK",
        VariablePacket::PublishPacket(_) => "PUBLISH",
        VariablePacket::PubackPacket(_) => "PUBACK",
        VariablePacket::PubrecPacket(_) => "PUBREC",
        VariablePacket::PubrelPacket(_) => "PUBREL",
        VariablePacket::PubcompPacket(_) => "PUBCOMP",
        VariablePacket::PingreqPacket(_) => "PINGREQ",
        VariablePacket::PingrespPacket(_) => "PINGRESP",
        VariablePacket::SubscribePacket(_) => "SUBSCRIBE",
        VariablePacket::SubackPacket(_) => "SUBACK",
        VariablePacket::UnsubscribePacket(_) => "UNSUBSCRIBE",
        VariablePacket::UnsubackPacket(_) => "UNSUBACK",
        VariablePacket::DisconnectPacket(_) => "DISCONNECT",
        VariablePacket::AuthPacket(_) => "AUTH",
    }
}

/// Builds a PUBLISH, `packet_id` is ignored for QoS 0.
pub fn new_publish_packet<P: Into<Vec<u8>>>(
    topic_name: TopicName,
    qos: QualityOfService,
    packet_id: u16,
    payload: P,
) -> PublishPacket {
    PublishPacket::new(
        topic_name,
        QoSWithPacketIdentifier::new(qos, packet_id),
        payload,
    )
}
