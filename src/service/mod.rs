// Discovery service client
//
// Finds discovery servers and asks them for live proxy-hosting instances.

pub mod discovery;
pub mod discovery_client;
pub mod tls;

pub use discovery::{assemble_candidates, DiscoveryLocator, DiscoveryService};
pub use discovery_client::{parse_instance_list, request_list, RegistryClient};
pub use tls::{discovery_connector, AnchoredVerifier};
