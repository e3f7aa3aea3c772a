// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `drng` exposes the x86-64 on-chip Digital Random Number Generator as a
//! byte-buffer-filling primitive.
//!
//! The crate answers exactly two questions for its caller: "does this
//! processor support the hardware entropy instructions?" and, if so, "fill
//! this buffer with hardware-generated random bytes." It is an entropy
//! *source*, not a hardened random number generator: there is no mixing,
//! no pooling, no reseeding policy, and no fallback to an OS generator
//! when the hardware is absent.
//!
//! Detection and use are separate steps. A host probes once at startup via
//! [`support::Support::detect()`] and threads the resulting record to
//! whatever components draw entropy; the draw primitives themselves never
//! re-probe. Rather than making an unchecked draw undefined behavior, the
//! way the raw instructions are, the crate makes it unrepresentable: the
//! instructions can only be issued through the [`source::Rdrand`] and
//! [`source::Rdseed`] capability tokens, and a token can only be minted
//! from a `Support` record that observed the instruction to be present.
//!
//! ```
//! use drng::source::Rdrand;
//! use drng::support::Support;
//!
//! let support = Support::detect();
//! if let Some(rng) = Rdrand::new(&support) {
//!     let mut nonce = [0; 16];
//!     rng.fill(&mut nonce)?;
//! }
//! # Ok::<(), drng::source::Error>(())
//! ```
//!
//! On targets other than x86-64, only the [`support`] module is compiled;
//! `detect()` reports no support and there is nothing else to call.

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(warnings)]
#![deny(unused)]

#[macro_use]
mod debug;

#[cfg(target_arch = "x86_64")]
mod insn;

#[cfg(target_arch = "x86_64")]
pub mod source;
pub mod support;
