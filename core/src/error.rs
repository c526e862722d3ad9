//! Shared error type (§7): the handful of failure modes a CPU driver can
//! actually report to a caller once shader compilation and pipeline
//! assembly have already succeeded at creation time.
use std::{error, fmt};

#[derive(Clone, Debug)]
pub enum Error {
    OutOfHostMemory,
    OutOfDeviceMemory,
    InitializationFailed,
    ExtensionNotPresent(String),
    FeatureNotPresent(String),
    DeviceLost,
    Incomplete,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OutOfHostMemory => write!(f, "out of host memory"),
            Error::OutOfDeviceMemory => write!(f, "out of device memory"),
            Error::InitializationFailed => write!(f, "initialization failed"),
            Error::ExtensionNotPresent(name) => write!(f, "extension not present: {}", name),
            Error::FeatureNotPresent(name) => write!(f, "feature not present: {}", name),
            Error::DeviceLost => write!(f, "device lost"),
            Error::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl error::Error for Error {}

impl From<vkcpu_raster::pipeline::PipelineError> for Error {
    fn from(_: vkcpu_raster::pipeline::PipelineError) -> Self {
        Error::InitializationFailed
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;
