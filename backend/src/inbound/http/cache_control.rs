//! Cache-control policy for per-user responses.

use actix_web::http::header;

/// Per-user responses must always be revalidated before reuse.
pub const PRIVATE_NO_CACHE_MUST_REVALIDATE: &str = "private, no-cache, must-revalidate";

/// Header tuple for responses that depend on the session.
pub const fn private_no_cache_header() -> (header::HeaderName, &'static str) {
    (header::CACHE_CONTROL, PRIVATE_NO_CACHE_MUST_REVALIDATE)
}
