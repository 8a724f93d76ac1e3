//! Server identity inferred from response headers.
//!
//! The lookup is a pure function of the headers so it can be exercised without
//! any network access.

use crate::ResponseHeaders;

pub const UNKNOWN_SERVER: &str = "Unknown";

const AKAMAI: &str = "Akamai";
const APACHE_AEM: &str = "Apache (AEM)";

const AKAMAI_CACHE_MARKERS: &[&str] = &["cdn-cache; desc=HIT", "cdn-cache; desc=MISS"];
const AEM_INSTANCE_HEADERS: &[&str] = &["x-dispatcher", "x-aem-instance"];
const AEM_PATH_HEADERS: &[&str] = &["link", "baqend-tags"];
const AEM_CLIENTLIB_PATH: &str = "/etc.clientlibs";

pub fn detect_server_name(headers: &ResponseHeaders) -> String {
    if let Some(server) = headers.get("server").map(str::trim).filter(|v| !v.is_empty()) {
        return name_from_server_header(server);
    }

    let server_timing = headers.get("server-timing").unwrap_or_default();
    let akamai_cache = AKAMAI_CACHE_MARKERS
        .iter()
        .any(|marker| server_timing.contains(marker));
    let akamai_request_id = headers.contains("x-akamai-request-id");
    let aem = has_aem_markers(headers);

    if akamai_cache || akamai_request_id {
        return if aem { APACHE_AEM } else { AKAMAI }.to_string();
    }
    if aem {
        return APACHE_AEM.to_string();
    }
    UNKNOWN_SERVER.to_string()
}

fn name_from_server_header(server: &str) -> String {
    let lowered = server.to_lowercase();
    if lowered.contains("akamai") || lowered.contains("ghost") {
        return AKAMAI.to_string();
    }
    if lowered.contains("apache") {
        return APACHE_AEM.to_string();
    }
    capitalize(&lowered)
}

fn has_aem_markers(headers: &ResponseHeaders) -> bool {
    let dispatcher = AEM_INSTANCE_HEADERS
        .iter()
        .any(|name| headers.contains(name));
    let clientlib_paths = AEM_PATH_HEADERS.iter().any(|name| {
        headers
            .get(name)
            .is_some_and(|value| value.contains(AEM_CLIENTLIB_PATH))
    });
    dispatcher || clientlib_paths
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
