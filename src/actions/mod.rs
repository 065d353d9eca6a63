//! Page directives: parsing structured commands out of reply text and
//! executing them against the live page.
//!
//! # Architecture
//!
//! ```text
//! raw reply text
//!   └─▶ parse_reply ──▶ display text (markers stripped)
//!                   └─▶ [ActionDirective]  ──▶ DirectiveExecutor
//!                                                ├─ navigate  (RouteIndex-validated)
//!                                                ├─ click     (label scoring + dwell)
//!                                                ├─ scroll / highlight
//!                                                └─ suggest   (notification only)
//! ```

pub mod directive;
pub mod executor;
pub mod page;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use directive::{parse_reply, ActionDirective, ParsedReply};
pub use executor::DirectiveExecutor;
pub use page::{ActionError, PageActions, PageIntrospector, PageSnapshot, RouteIndex};
