//! MQTT v5.0 client connection over any blocking byte transport.
//!
//! A [`client::SocketConnection`] owns a [`transport::Transport`] and implements the
//! [`protocols::v5::Handler`] callbacks a [`protocols::v5::Connection`] drives it with.

#[cfg(not(feature = "v5"))]
compile_error!("v5 must be enabled");

pub mod client;
pub mod protocols;
pub mod transport;
pub mod types;

pub use types::{
    endpoint::{AddressSource, Endpoint, ENDPOINT_CAPACITY},
    error::{Error, Result},
};

#[macro_export]
macro_rules! trace { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::trace!($($x)*)
    }
) }

#[macro_export]
macro_rules! debug { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::debug!($($x)*)
    }
) }

#[macro_export]
macro_rules! info { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::info!($($x)*)
    }
) }

#[macro_export]
macro_rules! warn { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::warn!($($x)*)
    }
) }

#[macro_export]
macro_rules! error { ($($x:tt)*) => (
    #[cfg(feature = "log")] {
        log::error!($($x)*)
    }
) }
