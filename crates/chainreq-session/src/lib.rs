//! Session state for chainreq
//!
//! The [`SessionStore`] owns the request being edited together with its
//! response, test results and save context. It changes only through
//! [`SessionAction`]s reduced by the pure [`reduce`] function, and exposes
//! distinct-until-changed [`Projection`]s of the state.
//!
//! [`RequestRunner`] ties the store to a
//! [`RequestExecutor`](chainreq_network::RequestExecutor): it runs scripts,
//! resolves the effective request and writes every response back.
//!
//! # Example
//!
//! ```rust,ignore
//! use chainreq_session::{SessionAction, SessionProjections, SessionStore};
//!
//! let store = SessionStore::default();
//! let views = SessionProjections::attach(&store);
//! store.dispatch(SessionAction::SetEndpoint("get_posts".into()));
//! assert_eq!(views.endpoint.get(), "get_posts");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod action;
pub mod body_transition;
pub mod error;
pub mod projections;
pub mod reducer;
pub mod runner;
pub mod session;
pub mod store;

pub use action::SessionAction;
pub use body_transition::apply_body_transition;
pub use error::{ScriptError, ScriptPhase};
pub use projections::SessionProjections;
pub use reducer::reduce;
pub use runner::{NoopScriptRunner, RequestRunner, ScriptRunner};
pub use session::{Session, SessionPatch};
pub use store::{Observer, Projection, SessionStore, SubscriptionId};
