//! Target configuration documents for modesync.
//!
//! A target is one aggregate file the host reads its custom modes from,
//! either YAML or JSON:
//!
//! ```yaml
//! customModes:
//!   - slug: code
//!     name: Code
//!     roleDefinition: ...
//!     groups: [read, edit]
//!     source: global
//!   - slug: hand-written
//!     ...
//! __modesync_managed__:
//!   code: sha256:3f1c...
//! ```
//!
//! Entries listed under the reserved [`MANAGED_KEY`] are owned by modesync;
//! every other entry is foreign and must survive a sync untouched. The
//! [`formats`] module parses and renders both encodings into a
//! [`TargetConfig`].

pub mod error;
pub mod formats;
pub mod target;

pub use error::{Error, Result};
pub use formats::{FormatHandler, JsonFormatHandler, YamlFormatHandler, handler_for};
pub use target::{LoadedTarget, MANAGED_KEY, MODES_KEY, TargetConfig, entry_checksum, entry_slug, load};
