//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): error codes, extended with cookie store failures
//! - [`IoResultExt`](context::IoResultExt): path context for persistence I/O

pub mod context;
pub mod neterror;
