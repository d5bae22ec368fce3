//! Pipeline stages for label extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different hosted model) without touching the
//! others.
//!
//! ## Data Flow
//!
//! ```text
//! encode ──▶ invoke ──▶ extract
//! (base64)   (model)    (text → record)
//! ```
//!
//! 1. [`encode`]  — wrap validated image bytes as a base64 payload with a
//!    sniffed mime type
//! 2. [`invoke`]  — drive the model call with a timeout and an optional
//!    bounded retry; the only stage with network I/O
//! 3. [`extract`] — defensively parse the untrusted model text into the
//!    fixed four-field record
//!
//! An invocation moves through the stages in a straight line; any stage
//! failing ends the invocation with a categorised error — there is no
//! backtracking and no partial result.

pub mod encode;
pub mod extract;
pub mod invoke;
