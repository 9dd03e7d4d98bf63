//! Upstream endpoints the proxy is willing to forward.
//!
//! Anything not listed here is answered with 404 before any upstream call.

/// Path prefix of the versioned upstream API.
pub const API_PREFIX: &str = "/api/1.0";

/// Where an endpoint lives on the upstream origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    /// iTunes-compatible endpoint at the origin root.
    AppleCompatible,
    /// Endpoint under [`API_PREFIX`].
    Api,
}

/// iTunes-compatible endpoints.
const APPLE_ENDPOINTS: &[&str] = &["/search", "/lookup"];

/// Versioned API endpoints.
const API_ENDPOINTS: &[&str] = &[
    // Search
    "/search/byterm",
    "/search/bytitle",
    "/search/byperson",
    "/search/music/byterm",
    // Podcasts
    "/podcasts/byfeedid",
    "/podcasts/byfeedurl",
    "/podcasts/byitunesid",
    "/podcasts/byguid",
    "/podcasts/bytag",
    "/podcasts/bymedium",
    "/podcasts/trending",
    "/podcasts/dead",
    // Episodes
    "/episodes/byfeedid",
    "/episodes/byfeedurl",
    "/episodes/bypodcastguid",
    "/episodes/byitunesid",
    "/episodes/byid",
    "/episodes/byguid",
    "/episodes/live",
    "/episodes/random",
    // Recent
    "/recent/episodes",
    "/recent/feeds",
    "/recent/newfeeds",
    "/recent/newvaluefeeds",
    "/recent/soundbites",
    // Value
    "/value/byfeedid",
    "/value/byfeedurl",
    "/value/bypodcastguid",
    "/value/byepisodeguid",
    // Misc
    "/stats/current",
    "/categories/list",
    "/hub/pubnotify",
];

/// Look up a request path in the endpoint allowlist. Exact match only.
pub fn lookup(path: &str) -> Option<EndpointKind> {
    if APPLE_ENDPOINTS.contains(&path) {
        Some(EndpointKind::AppleCompatible)
    } else if API_ENDPOINTS.contains(&path) {
        Some(EndpointKind::Api)
    } else {
        None
    }
}

/// Every proxied path, for the service description.
pub fn all_paths() -> impl Iterator<Item = &'static str> {
    APPLE_ENDPOINTS.iter().chain(API_ENDPOINTS).copied()
}

/// Build the upstream URL for a request.
///
/// `base_url` has no trailing slash; `query` is the raw query string
/// without the leading `?`.
pub fn upstream_url(base_url: &str, kind: EndpointKind, path: &str, query: Option<&str>) -> String {
    let prefix = match kind {
        EndpointKind::AppleCompatible => "",
        EndpointKind::Api => API_PREFIX,
    };

    match query.filter(|q| !q.is_empty()) {
        Some(query) => format!("{base_url}{prefix}{path}?{query}"),
        None => format!("{base_url}{prefix}{path}"),
    }
}
