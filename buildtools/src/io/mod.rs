//! Side-effecting collaborators and the helpers built directly on them.
//!
//! Each collaborator is a trait with one OS-backed implementation here and a
//! fake in `test_support`.

pub mod config;
pub mod dirs;
pub mod env;
pub mod fs;
pub mod printer;
pub mod process;
pub mod workdir;
