pub mod board;
pub mod capture;
pub mod replay;
pub mod sim;

#[cfg(feature = "host-peripherals")]
pub mod publish;
#[cfg(feature = "host-peripherals")]
pub mod worker;

pub use capture::Capture;
