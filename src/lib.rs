//! projmirror - reuse a .NET Core source tree from a classic project
//!
//! Mirrors the folder structure of an `.xproj` source project into a sibling
//! `.csproj` project for another target profile. Instead of copying files, the
//! target project references each source file through a linked `Compile`
//! item, so one source tree serves both projects.

pub mod aligner;
pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod mirror;
pub mod paths;
pub mod profile;
pub mod scaffold;
pub mod source;
pub mod templating;

pub use aligner::{AlignResult, Aligner};
pub use config::Config;
pub use context::SyncContext;
pub use error::Error;
pub use mirror::{IgnoreScope, LinkDescriptor, MirrorOptions};
