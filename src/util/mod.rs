//! Utility modules for lazydom.
//!
//! Contains `QName` handling and XML name validation.

pub mod qname;
