//! Connection management: transport, framing and the type-state client.

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, NotAuthenticated, Selected};
pub use config::{Config, Security};
pub use framed::{FramedStream, ResponseAccumulator};
pub use stream::{ImapStream, connect_plain, connect_tls, create_tls_connector};

use crate::{Error, Result};

/// Opens a connection per `config`, reads the greeting and negotiates TLS.
///
/// # Errors
///
/// Returns `Error::Timeout` if the server does not respond within
/// `config.connect_timeout`, or any transport/protocol error.
pub async fn connect(config: &Config) -> Result<Client<ImapStream, NotAuthenticated>> {
    let establish = async {
        match config.security {
            Security::Implicit => {
                let stream = connect_tls(&config.host, config.port).await?;
                Client::from_stream(stream).await
            }
            Security::StartTls => {
                let stream = connect_plain(&config.host, config.port).await?;
                Client::from_stream(stream)
                    .await?
                    .starttls(&config.host)
                    .await
            }
            Security::None => {
                let stream = connect_plain(&config.host, config.port).await?;
                Client::from_stream(stream).await
            }
        }
    };

    tokio::time::timeout(config.connect_timeout, establish)
        .await
        .map_err(|_| Error::Timeout(config.connect_timeout))?
}
