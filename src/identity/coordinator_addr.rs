use reqwest::Url;

/// Reduce a user-supplied coordinator address to its origin (scheme, host, port).
///
/// Path, query and fragment are dropped and default ports are elided, e.g.
/// `https://x.com:443/a/b?q=1` becomes `https://x.com`. Inputs that do not
/// parse as a URL, or that only yield an opaque origin such as
/// `localhost:5000`, come back with trailing slashes stripped instead.
pub fn normalize_coordinator_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => {
            let origin = url.origin();
            if origin.is_tuple() {
                origin.ascii_serialization()
            } else {
                raw.trim_end_matches('/').to_string()
            }
        }
        Err(_) => raw.trim_end_matches('/').to_string(),
    }
}

/// Join an absolute coordinator path onto a normalized address.
pub fn coordinator_endpoint(addr: &str, path: &str) -> String {
    let base = normalize_coordinator_url(addr);
    if path.starts_with('/') { format!("{}{}", base, path) } else { format!("{}/{}", base, path) }
}

/// Percent-encode a single path segment.
pub fn segment(raw: &str) -> String { urlencoding::encode(raw).into_owned() }

/// Percent-encode an attachment key while keeping its `/` separators.
pub fn key_path(key: &str) -> String {
    key.split('/').map(segment).collect::<Vec<_>>().join("/")
}
