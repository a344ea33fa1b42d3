use std::io;

use mqtt_codec_kit::{
    common::TopicNameError,
    v5::{control::ConnectReasonCode, packet::VariablePacketError},
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Io Error : {0}")]
    Io(#[from] io::Error),
    #[error("short write: {sent} of {expected} bytes sent")]
    ShortWrite { sent: usize, expected: usize },
    #[error("decode packet error : {0}")]
    Decode(#[from] VariablePacketError),
    #[error("connection refused : {0:?}")]
    ConnectionRefused(ConnectReasonCode),
    #[error("packet identifier exhausted")]
    PacketIdExhausted,
    #[error("connection closed")]
    Closed,
    #[error("invalid topic name : {0}")]
    TopicName(#[from] TopicNameError),
    #[error("unexpected packet : {0}")]
    UnexpectedPacket(&'static str),
    #[error("keep alive timeout")]
    KeepAliveTimeout,
}
