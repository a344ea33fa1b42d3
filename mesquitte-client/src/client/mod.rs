pub use self::{
    config::{ClientConfig, Publication},
    observer::{LogObserver, Observer},
    socket_connection::{SocketConnection, SocketState},
};

pub mod config;
pub mod observer;
pub mod socket_connection;
