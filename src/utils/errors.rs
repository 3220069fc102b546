#![forbid(unsafe_code)]

use poem_openapi::Object;
use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("userdir_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Inaccessible logger configuration file.
    #[error("Unable to access the Log4rs configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    #[error("Unable to read TLS certificate or key file: {}", .0)]
    TLSFileError(String),
}

// ***************************************************************************
//                             HTTP Error Body
// ***************************************************************************
/// The body returned with every non-data response, such as errors and
/// delete confirmations.
#[derive(Object, Debug)]
pub struct HttpResult {
    pub message: String,
}

impl HttpResult {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}
