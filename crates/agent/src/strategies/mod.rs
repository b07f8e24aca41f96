//! Strategy executors.
//!
//! Exactly one executor runs per handled request. Executors read and
//! write the cache stores and may dispatch the runtime trimmer as a
//! side effect; store write failures on these paths degrade to less
//! caching, never to a failed response.

pub mod cache_first;
pub mod network_first;
pub mod runtime;

pub use cache_first::cache_first_static;
pub use network_first::network_first_navigation;
pub use runtime::network_then_cache_runtime;
