//! syscall-hunter - static system call dependency analysis for C/C++ repositories
//!
//! This library inventories the source files of a repository, expands the
//! transitive closure of headers they include, associates catalog syscalls
//! with the headers that mention them, and pinpoints the source lines where
//! each syscall is called.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod headers;
pub mod hunter;
pub mod inventory;
pub mod lexer;
pub mod locator;
pub mod mapper;
pub mod pipeline;
pub mod prefix_set;
pub mod report;
pub mod syscalls;

pub use catalog::SyscallCatalog;
pub use config::HunterConfig;
pub use error::{HunterError, Result};
pub use headers::{HeaderClosure, HeaderResolver};
pub use locator::{find_occurrences, OccurrenceLocator};
pub use mapper::{MatchMode, SyscallHeaderMapper};
pub use prefix_set::PrefixSet;
pub use report::RepoReport;
