//! # mailsift-mime
//!
//! MIME parsing for mail files stored on disk.
//!
//! ## Features
//!
//! - **Message parsing**: Headers, single-part and (nested) multipart bodies
//! - **Decoding**: Base64, Quoted-Printable, RFC 2047 encoded words
//! - **Content types**: Type, subtype and parameter parsing
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsift_mime::Message;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: Test\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw)?;
//! println!("Subject: {}", message.subject().unwrap_or_default());
//! println!("Body: {}", message.text_body().unwrap_or_default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, Part, TransferEncoding};
