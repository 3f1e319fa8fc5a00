pub mod daemon;
pub mod init;
pub mod provision;
pub mod send;
pub mod status;
pub mod version;

pub use daemon::Daemon;
pub use init::Init;
pub use provision::Provision;
pub use send::SendMessage;
pub use status::Status;
pub use version::Version;
