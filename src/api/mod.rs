//! Ktuvit.me catalog access
//!
//! - `ktuvit`: the catalog client (search, login, listings, download)
//! - `transport`: HTTP calls with per-session cookie jars
//! - `envelope`: double-encoded JSON replies
//! - `extract`: subtitle table scraping
//! - `cipher`: login password encryption

pub mod cipher;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod ktuvit;
pub mod transport;

pub use cipher::{PasswordCipher, SaltedAesCipher};
pub use error::KtuvitError;
pub use extract::extract_listings;
pub use ktuvit::KtuvitClient;
pub use transport::HttpTransport;
