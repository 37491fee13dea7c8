//! Auth Module
//!
//! Password hashing for sign-up and sign-in.

pub mod hasher;

pub use hasher::{hash_password, verify_password, INVALID_CREDENTIALS};
