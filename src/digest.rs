//! Cryptographic Hash abstraction definition
//!
//! ```rust
//! use scrypt_mcf::digest::Digest;
//! use scrypt_mcf::sha2::Sha256;
//!
//! let mut hasher = Sha256::new();
//! hasher.input(b"hello world");
//! let mut out = [0u8; 32];
//! hasher.result(&mut out);
//! ```

// Copyright 2012-2013 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

/// The Digest trait specifies an interface common to digest functions, such as the SHA-2
/// family of digest functions.
pub trait Digest {
    /// Append message data in the digest state.
    fn input(&mut self, input: &[u8]);

    /// Retrieve the digest result. This method may be called multiple times.
    ///
    /// `out` must be large enough to contain `output_bytes()`.
    fn result(&mut self, out: &mut [u8]);

    /// Reset the digest. This method must be called after result() and before supplying more
    /// data.
    fn reset(&mut self);

    /// Get the output size in bits.
    fn output_bits(&self) -> usize;

    /// Get the output size in bytes.
    fn output_bytes(&self) -> usize {
        (self.output_bits() + 7) / 8
    }

    /// Get the block size in bytes.
    fn block_size(&self) -> usize;
}
