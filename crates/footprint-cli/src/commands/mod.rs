pub mod control;
pub mod data;
pub mod events;
pub mod helpers;
pub mod host;
pub mod init;
pub mod manifest;
pub mod privacy;
