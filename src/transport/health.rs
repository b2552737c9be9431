//! Messages of the standard `grpc.health.v1` health-checking protocol.

/// Method path of `grpc.health.v1.Health/Check`.
pub const HEALTH_CHECK_METHOD: &str = "/grpc.health.v1.Health/Check";

/// Request for `Health/Check`. An empty service asks about the server as a
/// whole.
#[derive(Clone, PartialEq, Eq, Hash, prost::Message)]
pub struct HealthCheckRequest {
    /// Service name, or empty for the whole server.
    #[prost(string, tag = "1")]
    pub service: String,
}

/// Response of `Health/Check`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, prost::Message)]
pub struct HealthCheckResponse {
    /// A [`ServingStatus`] value.
    #[prost(enumeration = "ServingStatus", tag = "1")]
    pub status: i32,
}

impl HealthCheckResponse {
    /// A response carrying `status`.
    pub fn with_status(status: ServingStatus) -> Self {
        Self { status: status as i32 }
    }

    /// Returns `true` if the server reported `SERVING`.
    pub fn is_serving(&self) -> bool {
        self.status() == ServingStatus::Serving
    }
}

/// Serving state reported by the health service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ServingStatus {
    /// Not reported.
    Unknown = 0,
    /// Accepting requests.
    Serving = 1,
    /// Not accepting requests.
    NotServing = 2,
    /// The requested service is not known to the server.
    ServiceUnknown = 3,
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;

    #[test]
    fn test_health_response_decoding() {
        let bytes = HealthCheckResponse::with_status(ServingStatus::Serving).encode_to_vec();
        let decoded = HealthCheckResponse::decode(bytes.as_slice()).unwrap();
        assert!(decoded.is_serving());

        let unknown = HealthCheckResponse { status: 42 };
        assert_eq!(unknown.status(), ServingStatus::Unknown);
        assert!(!unknown.is_serving());
    }
}
