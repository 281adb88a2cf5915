pub mod delete;
pub mod deploy;
pub mod logs;
pub mod serve;
pub mod status;
pub mod watch;
