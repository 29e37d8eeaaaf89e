// Library surface shared by the binary and the integration tests.
pub mod app_dirs;
pub mod config;
pub mod language;
pub mod leaderboard;
pub mod practice;
pub mod runtime;
pub mod scoring;
pub mod server;
pub mod session;
pub mod ui;
pub mod word_stream;
