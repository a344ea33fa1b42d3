pub use self::{
    config::EngineConfig,
    connection::Connection,
    engine::{ConnectionStatus, Engine, PublishFlow},
    handler::Handler,
    outgoing::OutgoingPacket,
    packet_id::PacketIdPool,
    timer::{TimerKind, TimerOp},
};

pub mod common;
pub mod config;
pub mod connection;
pub mod engine;
pub mod handler;
pub mod outgoing;
pub mod packet_id;
pub mod timer;
