pub mod apis;
pub mod hostcraft;
pub mod hytale;
pub mod java;
pub mod logging;
pub mod server;
pub mod systemd;
