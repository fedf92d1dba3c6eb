// vpn-share-tool proxy discovery client
// Library exports

pub mod cache;
pub mod config;
pub mod errors;
pub mod logging;
pub mod network;
pub mod resolver;
pub mod service;

pub use cache::ProxyCache;
pub use config::{Config, Settings, TrustAnchor};
pub use errors::{ConfigError, ResolveError};
pub use resolver::{InstanceSource, Resolution, ResolveOptions, Resolver, Target};
pub use service::DiscoveryService;
