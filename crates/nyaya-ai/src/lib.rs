//! Language capabilities: lexical embeddings, remote inference, cosine index.
//!
//! The deterministic [`LexicalCapability`] is always available; the
//! HTTP-backed [`RemoteCapability`] is feature-gated behind `http`.

mod capability;
mod index;
mod lexical;
#[cfg(feature = "http")]
mod remote;

pub use capability::{CapabilityError, CompletionRequest, LanguageCapability};
pub use index::{IndexError, Neighbor, SearchIndex};
pub use lexical::{LexicalCapability, DEFAULT_DIM};
#[cfg(feature = "http")]
pub use remote::RemoteCapability;
