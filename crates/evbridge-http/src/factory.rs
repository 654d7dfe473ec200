//! Factories for HTTP transports.

use std::net::{SocketAddr, ToSocketAddrs};

use reqwest::Url;
use serde::Deserialize;
use tracing::info;

use evbridge_core::{Error, Factory, Result, Transport};

use crate::receiver::HttpReceiver;
use crate::sender::HttpSender;

/// Sender configuration: `{"sinkURI": "http://host:port/path"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpSenderFactory {
    #[serde(rename = "sinkURI", alias = "sinkUri")]
    pub sink_uri: String,
}

impl HttpSenderFactory {
    fn target(&self) -> Result<Url> {
        let url = Url::parse(&self.sink_uri)
            .map_err(|e| Error::Config(format!("invalid sinkURI '{}': {e}", self.sink_uri)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::Config(format!(
                "unsupported sinkURI scheme '{other}', expected http or https"
            ))),
        }
    }
}

impl Factory for HttpSenderFactory {
    fn new_transport(&self) -> Result<Box<dyn Transport>> {
        let target = self.target()?;
        info!(target = %target, "Sending events over HTTP");
        Ok(Box::new(HttpSender::new(target)?))
    }
}

/// Receiver configuration: `{"listenAddr": "host:port"}` (host may be empty,
/// as in `":8080"`), or `{"port": 8080}` to listen on all interfaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpReceiverFactory {
    #[serde(default, rename = "listenAddr")]
    pub listen_addr: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl HttpReceiverFactory {
    fn address(&self) -> Result<SocketAddr> {
        match (&self.listen_addr, self.port) {
            (Some(addr), None) => parse_listen_addr(addr),
            (None, Some(port)) => Ok(SocketAddr::from(([0, 0, 0, 0], port))),
            (Some(_), Some(_)) => Err(Error::Config(
                "set either 'listenAddr' or 'port', not both".into(),
            )),
            (None, None) => Err(Error::Config("'listenAddr' or 'port' is required".into())),
        }
    }
}

impl Factory for HttpReceiverFactory {
    fn new_transport(&self) -> Result<Box<dyn Transport>> {
        let addr = self.address()?;
        let receiver = HttpReceiver::bind(addr)?;
        info!(addr = %receiver.local_addr(), "Receiving events over HTTP");
        Ok(Box::new(receiver))
    }
}

/// Resolve `host:port`; an empty host means all interfaces.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr> {
    let full = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    full.to_socket_addrs()
        .map_err(|e| Error::Config(format!("invalid listenAddr '{addr}': {e}")))?
        .next()
        .ok_or_else(|| Error::Config(format!("listenAddr '{addr}' resolves to no address")))
}

#[cfg(test)]
mod tests {
    use evbridge_core::config::parse_factory;

    use super::*;

    #[test]
    fn listen_addr_with_empty_host_binds_all_interfaces() {
        assert_eq!(
            parse_listen_addr(":8080").unwrap(),
            SocketAddr::from(([0, 0, 0, 0], 8080))
        );
        assert_eq!(
            parse_listen_addr("127.0.0.1:9000").unwrap(),
            SocketAddr::from(([127, 0, 0, 1], 9000))
        );
    }

    #[test]
    fn listen_addr_without_port_is_config_error() {
        assert!(matches!(parse_listen_addr("localhost"), Err(Error::Config(_))));
    }

    #[test]
    fn receiver_config_shapes() {
        let f: HttpReceiverFactory =
            parse_factory("receiver", r#"{"listenAddr":"127.0.0.1:0"}"#).unwrap();
        assert_eq!(f.address().unwrap(), SocketAddr::from(([127, 0, 0, 1], 0)));

        let f: HttpReceiverFactory = parse_factory("receiver", r#"{"port":8081}"#).unwrap();
        assert_eq!(f.address().unwrap().port(), 8081);

        let f: HttpReceiverFactory = parse_factory("receiver", "{}").unwrap();
        assert!(matches!(f.address(), Err(Error::Config(_))));
    }

    #[test]
    fn sender_config_validates_uri() {
        let f: HttpSenderFactory =
            parse_factory("sender", r#"{"sinkURI":"http://localhost:8080/"}"#).unwrap();
        assert_eq!(f.target().unwrap().port(), Some(8080));

        let f = HttpSenderFactory {
            sink_uri: "not a uri".into(),
        };
        assert!(matches!(f.new_transport(), Err(Error::Config(_))));

        let f = HttpSenderFactory {
            sink_uri: "ftp://example.com".into(),
        };
        assert!(matches!(f.new_transport(), Err(Error::Config(_))));
    }

    #[test]
    fn receiver_factory_binds_socket() {
        let f = HttpReceiverFactory {
            listen_addr: Some("127.0.0.1:0".into()),
            port: None,
        };
        assert!(f.new_transport().is_ok());
    }
}
