pub mod csv_export;
pub mod session_poller;
pub mod watch_registry;

pub use csv_export::export_query_logs;
pub use session_poller::{start_polling, PollHandle, PollSnapshot, SessionTracker};
pub use watch_registry::WatchRegistry;
