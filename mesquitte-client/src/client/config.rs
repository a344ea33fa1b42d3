use mqtt_codec_kit::{
    common::{QualityOfService, TopicName},
    v5::packet::ConnectPacket,
};
use nanoid::nanoid;

use crate::Result;

const DEFAULT_RECV_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    topic: TopicName,
    payload: Vec<u8>,
}

impl Publication {
    pub fn new<P: Into<Vec<u8>>>(topic: &str, payload: P) -> Result<Self> {
        Ok(Self {
            topic: TopicName::new(topic)?,
            payload: payload.into(),
        })
    }

    pub fn topic(&self) -> &TopicName {
        &self.topic
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// Settings of one client session: the CONNECT it opens with and the publication
/// sent at each QoS level once the broker accepts it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    client_id: String,
    keep_alive: u16,
    clean_start: bool,
    publications: [Publication; 3],
    recv_buffer_size: usize,
}

impl ClientConfig {
    /// An empty `client_id` is replaced by a random one.
    pub fn new(client_id: &str, keep_alive: u16) -> Result<Self> {
        let client_id = if client_id.is_empty() {
            nanoid!()
        } else {
            client_id.to_owned()
        };

        Ok(Self {
            client_id,
            keep_alive,
            clean_start: true,
            publications: [
                Publication::new("topic1", "payload1")?,
                Publication::new("topic2", "payload2")?,
                Publication::new("topic3", "payload3")?,
            ],
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn keep_alive(&self) -> u16 {
        self.keep_alive
    }

    pub fn clean_start(&self) -> bool {
        self.clean_start
    }

    pub fn set_clean_start(&mut self, clean_start: bool) {
        self.clean_start = clean_start;
    }

    pub fn publication(&self, qos: QualityOfService) -> &Publication {
        &self.publications[qos as usize]
    }

    pub fn set_publication<P: Into<Vec<u8>>>(
        &mut self,
        qos: QualityOfService,
        topic: &str,
        payload: P,
    ) -> Result<()> {
        self.publications[qos as usize] = Publication::new(topic, payload)?;
        Ok(())
    }

    pub fn recv_buffer_size(&self) -> usize {
        self.recv_buffer_size
    }

    pub fn set_recv_buffer_size(&mut self, size: usize) {
        self.recv_buffer_size = size.max(1);
    }

    pub fn connect_packet(&self) -> ConnectPacket {
        let mut packet = ConnectPacket::new(self.client_id.clone());
        packet.set_keep_alive(self.keep_alive);
        packet.set_clean_session(self.clean_start);
        packet
    }
}
