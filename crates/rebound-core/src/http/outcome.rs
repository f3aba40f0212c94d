//! Result of a single attempt

use super::network_errors::TransportError;
use super::response::Response;

/// What one attempt produced. Never persisted; the schedulers consume it
/// immediately.
#[derive(Debug)]
pub enum Outcome {
    /// A 2xx response
    Success(Response),
    /// A response outside 2xx
    ServerFailure(Response),
    /// No response could be obtained
    NetworkFailure(TransportError),
    /// Cancelled before a response arrived
    Aborted,
}

impl Outcome {
    /// Sort a received response into success or failure by its status
    pub fn from_response(response: Response) -> Self {
        if response.ok() {
            Outcome::Success(response)
        } else {
            Outcome::ServerFailure(response)
        }
    }

    /// Status of the response, when one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            Outcome::Success(response) | Outcome::ServerFailure(response) => {
                Some(response.status())
            }
            Outcome::NetworkFailure(_) | Outcome::Aborted => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl From<Result<Response, TransportError>> for Outcome {
    fn from(result: Result<Response, TransportError>) -> Self {
        match result {
            Ok(response) => Outcome::from_response(response),
            Err(error) => Outcome::NetworkFailure(error),
        }
    }
}
