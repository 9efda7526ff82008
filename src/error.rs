//! Defines the general error type for the crate and various conversions into it
use std::convert;
use std::fmt;

/// General error type for the crate
#[derive(Debug)]
pub enum Error {
    BlankSignature,
    ClientDoesNotExist(String),
    InvalidConfigurationValue(String),
    InvalidIncidentKind(String),
    Io(std::io::Error),
    MissingDriverSignature,
    NoActiveShiftRecord(String),
    NoDriverConfigured,
    OffShift,
    Other(String),
    Rusqlite(rusqlite::Error),
    SerdeJson(serde_json::Error),
    SerdeYaml(serde_yaml::Error),
    ShiftAlreadyActive,
    UnknownServiceHandler(String),
}

impl convert::From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Error {
        Error::Rusqlite(err)
    }
}

impl convert::From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl convert::From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::SerdeJson(err)
    }
}

impl convert::From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Error {
        Error::SerdeYaml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BlankSignature => {
                write!(f, "Signature image is empty, capture it before submitting")
            }
            Error::ClientDoesNotExist(id) => {
                write!(f, "Client with id='{}' does not exist", id)
            }
            Error::InvalidConfigurationValue(msg) => write!(f, "{}", msg),
            Error::InvalidIncidentKind(kind) => {
                write!(f, "Unknown incident type: '{}'", kind)
            }
            Error::Io(e) => write!(f, "{}", e),
            Error::MissingDriverSignature => write!(
                f,
                "Driver signature is missing, complete the driver step before the client signs"
            ),
            Error::NoActiveShiftRecord(driver_id) => write!(
                f,
                "No active shift record found in the ledger for driver '{}'",
                driver_id
            ),
            Error::NoDriverConfigured => write!(
                f,
                "No driver id configured, set one in the config file or pass --driver"
            ),
            Error::OffShift => write!(
                f,
                "You are not on shift, start a shift before reporting an incident"
            ),
            Error::Other(msg) => write!(f, "{}", msg),
            Error::Rusqlite(e) => write!(f, "{}", e),
            Error::SerdeJson(e) => write!(f, "{}", e),
            Error::SerdeYaml(e) => write!(f, "{}", e),
            Error::ShiftAlreadyActive => {
                write!(f, "A shift is already active, end it before starting a new one")
            }
            Error::UnknownServiceHandler(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}
