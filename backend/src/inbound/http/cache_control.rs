//! Shared cache-control policies for HTTP handlers.

/// Profile reads must never be served from a cache without revalidation.
pub const NO_CACHE_MAX_AGE_ZERO: &str = "no-cache, max-age=0";

/// Health probes must never be cached at all.
pub const NO_STORE: &str = "no-store";

/// Build the cache-control header tuple for profile responses.
pub const fn profile_no_cache_header() -> (&'static str, &'static str) {
    ("Cache-Control", NO_CACHE_MAX_AGE_ZERO)
}
