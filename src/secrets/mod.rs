//! Secret lifecycle handling.
//!
//! This module provides the secret-or-plain value used at the REST boundary
//! and the rules deciding which plaintext is kept across create, import and
//! refresh.

mod policy;
mod value;

pub use policy::{REPLACE_ME, SecretRole, SecretSource, apply, needs_replacement, resolve};
pub use value::SecretValue;
