//! Configuration resolution engine
//!
//! Components declare typed, named settings ("traits") whose values can come
//! from defaults, configuration files, the environment, the command line or
//! code. This crate decides which of those values wins and evaluates it:
//!
//! - **Priority**: every assignment is stamped by a [`PriorityAuthority`];
//!   a slot keeps the value of the highest-ranked assignment it received.
//! - **Slots**: lazily evaluated, memoized value cells with provenance and an
//!   audit trail of every assignment they saw.
//! - **Nameserver**: the dotted-key registry that owns the slots, expands
//!   `{dotted.key}` references, detects cycles and invalidates dependents.
//! - **Inventories**: per-component trait tables with copy-on-write sharing
//!   of ancestor slots.
//! - **Registry**: the explicit context that registers components, creates
//!   instances and routes configuration to them.
//!
//! # Example
//!
//! ```
//! use stratum_core::{Category, Locator, Nameserver, Value};
//!
//! let mut ns = Nameserver::new();
//! ns.assign("name.greeting", "Hello, {name.who}", Category::Default, Locator::Api)?;
//! ns.assign("name.who", "world", Category::Default, Locator::Api)?;
//! assert_eq!(ns.get("name.greeting")?, Value::from("Hello, world"));
//!
//! ns.assign("name.who", "Michael", Category::CommandLine, Locator::command_line(1))?;
//! assert_eq!(ns.get("name.greeting")?, Value::from("Hello, Michael"));
//! # Ok::<(), stratum_core::Error>(())
//! ```

pub mod component;
pub mod constraint;
pub mod error;
pub mod expr;
pub mod inventory;
pub mod key;
pub mod locator;
pub mod nameserver;
pub mod priority;
pub mod registry;
pub mod schema;
pub mod shared;
pub mod slot;
pub mod value;

pub use component::{ComponentSpec, TraitSpec};
pub use constraint::Constraint;
pub use error::{Error, Result};
pub use expr::{BinaryOp, Expr, UnaryOp};
pub use inventory::{Entry, Inventory};
pub use locator::Locator;
pub use nameserver::{KeyBinding, Limits, Nameserver};
pub use priority::{Category, PriorityAuthority, PriorityToken};
pub use registry::{Instance, InstanceId, Registry, Route};
pub use schema::{Coerce, Schema};
pub use shared::SharedRegistry;
pub use slot::{Assignment, Disposition, Outcome, Slot, SlotId};
pub use value::{RawValue, Value};
