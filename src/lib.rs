pub mod cli;
pub mod gesture;
pub mod io;
pub mod model;
pub mod ops;
pub mod service;
pub mod store;
pub mod tui;
pub mod util;

/// Multi-threaded runtime shared by the CLI and the TUI's background
/// mutations
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("tdb-worker")
        .build()
}
