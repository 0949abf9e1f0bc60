use std::collections::HashMap;

/// ACCESS_TOKEN_KEY
///
/// The fixed cookie name under which the bearer token is persisted. The remote
/// service sets this cookie on login with a 30-minute expiry; the portal mirrors
/// it onto its own login response so the session survives reloads.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// parse_cookies
///
/// Parses a raw `Cookie` header value into a name→value map. Pairs are split on
/// `;`, then each pair on the first `=`. Names are trimmed because user agents
/// join pairs with "; ". Pairs without an `=` are kept with an empty value,
/// matching how browsers expose bare cookie names.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in header.split(';') {
        let mut parts = pair.splitn(2, '=');
        let name = parts.next().unwrap_or("").trim();
        if name.is_empty() {
            continue;
        }
        let value = parts.next().unwrap_or("");
        cookies.insert(name.to_string(), value.to_string());
    }
    cookies
}

/// read_token
///
/// Looks up the bearer token under `ACCESS_TOKEN_KEY` in a `Cookie` header value.
///
/// Returns `None` when the key is absent. This is deliberate: an anonymous
/// visitor is a normal, expected outcome of session bootstrap, not a fault,
/// so the missing case must not surface as an error.
pub fn read_token(cookie_header: &str) -> Option<String> {
    let cookies = parse_cookies(cookie_header);
    cookies
        .get(ACCESS_TOKEN_KEY)
        .filter(|value| !value.is_empty())
        .cloned()
}
