#[cfg(feature = "v5")]
pub mod v5;
