pub mod browser;
pub mod process;
pub mod readiness;
pub mod runtime;

pub use browser::{BrowserOpener, SystemBrowser};
pub use process::{OutputSource, ServerProcess, ShutdownOutcome, StreamEnd};
pub use readiness::{HealthProbe, HttpProbe, ProbeResult, RetryPolicy, wait_until_ready};
pub use runtime::{DepsStatus, check_runtime, ensure_dependencies};
