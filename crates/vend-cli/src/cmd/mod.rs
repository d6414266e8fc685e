pub mod add;
pub mod init;
pub mod install;
pub mod lock;
