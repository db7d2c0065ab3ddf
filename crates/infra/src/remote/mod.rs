//! Remote store adapters: PostgREST rows, object storage, reachability.

pub mod error;
pub mod heartbeat;
pub mod nameserver;
pub mod supabase;

pub use error::RemoteError;
pub use heartbeat::{ConnectionStatusListener, HeartbeatMonitor};
pub use nameserver::NameserverClient;
pub use supabase::SupabaseClient;
