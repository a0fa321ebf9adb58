// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A pure-rust implementation of the scrypt key derivation function, with a
//! Modular Crypt Format (MCF) codec for storing and verifying password
//! hashes as `$s1$...` records.
//!
//! This is a fork of the scrypt/PBKDF2/HMAC/SHA-256 arithmetic originally
//! published as part of [cryptoxide](https://github.com/typed-io/cryptoxide),
//! itself descended from [Rust-Crypto by
//! DaGenix](https://github.com/DaGenix/rust-crypto), narrowed down to a
//! single algorithm family and given a fallible, `std`-based API surface.
//!
//! # Examples
//!
//! ```
//! use scrypt_mcf::mcf::{scrypt_mcf, scrypt_mcf_check};
//! use scrypt_mcf::scrypt::ScryptParams;
//!
//! let record = scrypt_mcf(b"hunter2", None, &ScryptParams::INTERACTIVE).unwrap();
//! assert!(scrypt_mcf_check(&record, b"hunter2").unwrap());
//! ```

#![allow(unknown_lints)]
#![warn(clippy::all)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::new_without_default)]
#![allow(clippy::let_and_return)]
#![allow(clippy::redundant_field_names)]
#![allow(clippy::wrong_self_convention)]
#![allow(clippy::suspicious_arithmetic_impl)]
#![allow(clippy::identity_op)]
#![allow(clippy::many_single_char_names)]

pub mod constant_time;
mod cryptoutil;
pub mod digest;
pub mod error;
pub mod hmac;
pub mod mcf;
pub mod pbkdf2;
pub mod scrypt;
pub mod sha2;

pub use error::ScryptError;
pub use mcf::{scrypt_mcf, scrypt_mcf_check};
pub use scrypt::{scrypt, ScryptParams};
