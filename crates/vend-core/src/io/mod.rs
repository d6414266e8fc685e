//! Filesystem helpers used during installation.

pub mod extract;
pub mod tree;
