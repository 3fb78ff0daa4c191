//! Human verification implementations

mod turnstile;

pub use turnstile::{BypassVerifier, TurnstileVerifier, DEFAULT_TURNSTILE_ENDPOINT};
