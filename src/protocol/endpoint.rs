//! Endpoint URL construction for negotiate, connect and start.
//!
//! Connection data and the connection token are query-escaped the way HTML
//! forms encode them (space becomes `+`), which is what the server expects.

use url::Url;

use super::types::NegotiationResult;
use crate::config::ClientConfig;
use crate::constants;
use crate::error::{Error, Result};

/// Query-escape `value` in `application/x-www-form-urlencoded` form.
///
/// Space becomes `+`, `*` stays bare and `~` becomes `%7E`. Other query
/// escapers differ on those two characters, but the server decodes both
/// forms to the same bytes.
#[must_use]
pub fn query_escape(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// URL of the negotiate request.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the host or root path produce an
/// unparseable URL.
pub fn negotiate_url(config: &ClientConfig) -> Result<String> {
    validated(format!(
        "{}://{}{}/negotiate?clientProtocol={}&connectionData={}",
        config.http_scheme(),
        config.host,
        config.root_path,
        config.protocol_version,
        query_escape(&config.connection_data),
    ))
}

/// URL of the WebSocket connect request.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the negotiated base path produces an
/// unparseable URL.
pub fn connect_url(config: &ClientConfig, nr: &NegotiationResult) -> Result<String> {
    validated(format!(
        "{}://{}{}/connect?{}",
        config.ws_scheme(),
        config.host,
        nr.url,
        transport_query(config, nr),
    ))
}

/// URL of the start request.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] if the negotiated base path produces an
/// unparseable URL.
pub fn start_url(config: &ClientConfig, nr: &NegotiationResult) -> Result<String> {
    validated(format!(
        "{}://{}{}/start?{}",
        config.http_scheme(),
        config.host,
        nr.url,
        transport_query(config, nr),
    ))
}

fn transport_query(config: &ClientConfig, nr: &NegotiationResult) -> String {
    format!(
        "transport={}&clientProtocol={}&connectionToken={}&connectionData={}",
        constants::TRANSPORT_WEB_SOCKETS,
        config.protocol_version,
        query_escape(&nr.connection_token),
        query_escape(&config.connection_data),
    )
}

fn validated(url: String) -> Result<String> {
    match Url::parse(&url) {
        Ok(_) => Ok(url),
        Err(e) => Err(Error::InvalidUrl(format!("{url}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("hub.example.com", "1.5", r#"[{"name":"chat hub"}]"#)
    }

    fn negotiated() -> NegotiationResult {
        NegotiationResult {
            url: "/signalr".to_string(),
            connection_token: "ab+c/d==".to_string(),
            ..NegotiationResult::default()
        }
    }

    #[test]
    fn test_query_escape() {
        assert_eq!(query_escape("a b"), "a+b");
        assert_eq!(query_escape("ab+c/d=="), "ab%2Bc%2Fd%3D%3D");
        assert_eq!(query_escape(r#"[{"name":"x"}]"#), "%5B%7B%22name%22%3A%22x%22%7D%5D");
    }

    #[test]
    fn test_query_escape_tilde_and_star() {
        assert_eq!(query_escape("a~b*c"), "a%7Eb*c");
    }

    #[test]
    fn test_negotiate_url() {
        assert_eq!(
            negotiate_url(&config()).unwrap(),
            "https://hub.example.com/signalr/negotiate?clientProtocol=1.5\
             &connectionData=%5B%7B%22name%22%3A%22chat+hub%22%7D%5D"
        );
    }

    #[test]
    fn test_connect_url_uses_ws_scheme_and_escaped_token() {
        let url = connect_url(&config(), &negotiated()).unwrap();
        assert!(url.starts_with("wss://hub.example.com/signalr/connect?transport=webSockets"));
        assert!(url.contains("&clientProtocol=1.5&connectionToken=ab%2Bc%2Fd%3D%3D&"));
    }

    #[test]
    fn test_start_url() {
        let mut config = config();
        config.secure = false;
        let url = start_url(&config, &negotiated()).unwrap();
        assert!(url.starts_with("http://hub.example.com/signalr/start?transport=webSockets&"));
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let config = ClientConfig::new("bad host", "1.5", "");
        assert!(matches!(negotiate_url(&config), Err(Error::InvalidUrl(_))));
    }
}
