//! Identity verification and ephemeral token handlers.
//!
//! ## Token namespace
//!
//! Verification and password-reset tokens share one table; the row identifier
//! encodes purpose (`password_reset:<email>` vs bare email). At most one live
//! token exists per identifier: issuing deletes prior rows first.
//!
//! ## Consumption is atomic
//!
//! A token is consumed with a `DELETE .. RETURNING` executed inside the same
//! transaction as the state change it authorizes. Two requests racing on the
//! same token value cannot both win, and an expired row is rolled back in
//! place rather than deleted.
//!
//! ## Enumeration hiding
//!
//! `/request-reset` answers with the same message whether or not the account
//! exists; `/login` keeps wrong-password and unknown-account responses
//! identical.

pub(crate) mod credentials;
mod error;
pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod providers;
pub(crate) mod rate_limit;
pub(crate) mod register;
pub(crate) mod reset;
pub(crate) mod session;
mod state;
mod storage;
pub(crate) mod tokens;
pub(crate) mod types;
mod utils;
pub(crate) mod verification;

pub use credentials::{authenticate, IdentitySummary};
pub use error::AuthError;
pub use providers::{configured_providers, Provider};
pub use rate_limit::{CounterStore, FixedWindowLimiter, RateLimitResult};
pub use session::{compose_claims, Claims};
pub use state::{AuthConfig, AuthState};
pub use tokens::{validate as validate_token, TokenContext, TokenError, TokenPurpose};
