//! Version endpoint.
//!
//! The client parses this body with a strict scan; the byte sequence is
//! load-bearing and must never change shape.

use axum::body::Body;
use axum::http::{header, Response};

pub const VERSION_BODY: &[u8] = b"4.22\nNo info for version  4.22\n\n";

pub async fn handle() -> Response<Body> {
    Response::builder()
        .header(header::CONTENT_TYPE, "text/plain")
        .header(header::CONTENT_LENGTH, VERSION_BODY.len())
        .body(Body::from(VERSION_BODY))
        .expect("static response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_the_exact_literal() {
        assert_eq!(VERSION_BODY, b"4.22\nNo info for version  4.22\n\n");
        // "4.22\n" + "No info for version  4.22\n" + "\n"
        assert_eq!(VERSION_BODY.len(), 5 + 26 + 1);
    }
}
