use std::time::Duration;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub max_packet_id: u16,
    /// Answer incoming PUBLISH / PUBREC / PUBREL without involving the handler.
    pub auto_pub_response: bool,
    /// How long to wait for a PINGRESP, `None` disables the timer.
    pub pingresp_timeout: Option<Duration>,
}

impl EngineConfig {
    pub fn new(
        max_packet_id: u16,
        auto_pub_response: bool,
        pingresp_timeout: Option<Duration>,
    ) -> Self {
        Self {
            max_packet_id,
            auto_pub_response,
            pingresp_timeout,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(u16::MAX, true, None)
    }
}
