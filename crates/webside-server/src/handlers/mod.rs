//! Route handlers
//!
//! Each handler extracts its parameters, runs one inspector operation through the
//! session gate and answers JSON (or plain text for ids and the dialect).

pub mod code;
pub mod objects;
