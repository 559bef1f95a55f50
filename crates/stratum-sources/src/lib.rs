//! Configuration sources for stratum
//!
//! Each source turns some outside representation into [`Event`]s: the command
//! line ([`CommandLine`]), the process environment ([`Environment`]) and
//! configuration files ([`ConfigFile`]). A [`Configurator`] gathers events from
//! any number of sources and writes them into a [`stratum_core::Registry`],
//! where the priority of each event's category decides what wins.
//!
//! ```
//! use stratum_core::{Registry, Value};
//! use stratum_sources::{CommandLine, Configurator, Environment};
//!
//! let mut configurator = Configurator::new();
//! configurator
//!     .collect(&Environment::new("APP_").with_vars([("APP_GREETING", "hi {name}")]))?
//!     .collect(&CommandLine::new(["--name=ann"]))?;
//!
//! let mut registry = Registry::new();
//! configurator.apply(&mut registry)?;
//! assert_eq!(registry.get_key("greeting")?, Value::from("hi ann"));
//! # Ok::<(), stratum_sources::Error>(())
//! ```

pub mod command_line;
pub mod configurator;
pub mod environment;
pub mod error;
pub mod event;
pub mod files;

pub use command_line::CommandLine;
pub use configurator::{Configurator, Report, ReportEntry};
pub use environment::{DEFAULT_PREFIX, Environment};
pub use error::{Error, Result};
pub use event::{Event, Harvest, Source};
pub use files::{ConfigFile, Format};
