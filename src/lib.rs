// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod config;
pub mod debounce;
pub mod error;
pub mod export;
pub mod game;
pub mod history;
pub mod logging;
pub mod recorder;
pub mod replay;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod stimulus;
pub mod timer;
pub mod util;
