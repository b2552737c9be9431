//! Client identification sent by both transports.
//!
//! Every request carries a `User-Agent` and an `X-Weaviate-Client` header so
//! server operators can tell client versions apart.

use std::sync::OnceLock;

/// Header naming the client library and version.
pub const CLIENT_HEADER: &str = "X-Weaviate-Client";

static USER_AGENT: OnceLock<String> = OnceLock::new();

/// `weaviate-client-rust/0.1.0 (rust/1.85; linux/x86_64)`, computed once.
pub fn user_agent() -> &'static str {
    USER_AGENT.get_or_init(|| {
        format!(
            "{} ({}; {}/{})",
            client_header_value(),
            concat!("rust/", env!("CARGO_PKG_RUST_VERSION")),
            os_name(),
            std::env::consts::ARCH,
        )
    })
}

/// Value of [`CLIENT_HEADER`]: `weaviate-client-rust/0.1.0`.
pub fn client_header_value() -> &'static str {
    concat!("weaviate-client-rust/", env!("CARGO_PKG_VERSION"))
}

fn os_name() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}
