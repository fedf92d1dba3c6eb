// Network module: direct probing, local subnet discovery, and the
// proxy-hosting instance API.

pub mod client;
pub mod local_ip;
pub mod probe;
pub mod scan;

pub use client::{InstanceClient, ServiceRecord};
pub use local_ip::detect_local_ip;
pub use probe::is_reachable;
pub use scan::{scan_subnet, ScanOptions};
