//! File-based command/response bridge for driving an ExtendScript host.
//!
//! Some scripting engines are reachable only through a panel that can read
//! and write files; there is no socket and no pipe to them. This crate
//! speaks that constraint as a protocol. The client side
//! ([`CommandChannel`]) writes a complete script as `cmd_<id>.jsx` into a
//! shared directory and polls for `res_<id>.json`; the panel side
//! ([`HostExecutor`]) discovers pending commands, claims each by deleting
//! it, hands the script to a [`ScriptEngine`], and writes the response
//! envelope back. Correlation ids pair the files, so many commands can be
//! in flight at once and replies may arrive out of order.
//!
//! Scripts are assembled by [`template::build`], which prepends an ES3
//! helper library (the engine has no module system and no native JSON),
//! and parameter values pass through [`sanitize::escape_string`] so clip
//! names and paths stay data rather than code. Higher layers can describe
//! tools declaratively with [`catalog::ToolCatalog`] and render calls into
//! ready-to-submit scripts.

pub mod audit;
pub mod catalog;
pub mod channel;
pub mod envelope;
pub mod error;
pub mod executor;
pub mod ids;
pub mod options;
pub mod paths;
pub mod sanitize;
pub mod template;

pub use catalog::{ToolCatalog, ToolSpec};
pub use channel::CommandChannel;
pub use envelope::BridgeResponse;
pub use error::BridgeError;
pub use executor::{HostExecutor, ScriptEngine};
pub use ids::CorrelationId;
pub use options::BridgeOptions;
