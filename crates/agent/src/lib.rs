//! Offline caching agent for a static web application.
//!
//! The agent intercepts outbound requests and decides, per request,
//! whether to serve from a local cache store, fetch from the network, or
//! both with a defined precedence. It exposes three lifecycle hooks —
//! [`Agent::install`], [`Agent::activate`], and [`Agent::handle`] —
//! invoked by a thin host-environment adapter.

pub mod agent;
pub mod fetch;
pub mod request;
pub mod router;
pub mod strategies;
pub mod trim;

pub use agent::{Agent, HandleOutcome};
pub use fetch::{FetchConfig, FetchOptions, FetchedResponse, Fetcher, HttpFetcher};
pub use request::{AgentRequest, RequestDestination, RequestMode};
pub use router::{Route, Strategy, classify};
