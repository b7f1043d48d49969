//! Staging, import rewriting, and per-language dispatch for protodrive.
//!
//! protodrive regenerates protobuf bindings for several output languages
//! from one schema tree. Schema files cannot compile in place because the
//! import paths inside the generated code depend on the destination package
//! layout, which differs per language. Each job therefore stages rewritten
//! copies into a disposable temp tree shaped like its package, points the
//! external compiler at that tree, and removes it afterwards on every exit
//! path.
//!
//! All process and filesystem effects sit behind the port traits in
//! [`ports`]; [`adapters`] has the process-backed defaults and recording
//! variants for tests.

pub mod adapters;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod interrupt;
pub mod ports;
pub mod rewrite;
pub mod staging;

pub use dispatch::Language;
pub use driver::{plan_jobs, DriveConfig, Driver, Job, Mapping};
pub use error::DriveError;
