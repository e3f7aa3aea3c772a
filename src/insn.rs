// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Raw wrappers over the x86-64 entropy instructions.
//!
//! Each instruction reports, through the carry flag, whether the value it
//! returned is valid entropy; the wrappers reissue the instruction until
//! it succeeds and hand back the first valid word. The retry loop is
//! deliberately unbounded: a transient failure (the on-chip conditioner
//! running dry under multi-core contention) clears within a few issues,
//! and a processor that fails persistently is broken in a way this crate
//! cannot recover from.
//!
//! Support is *not* re-checked here. Callers prove it by holding one of
//! the capability tokens in [`crate::source`].

use core::arch::x86_64::_rdrand64_step;
use core::arch::x86_64::_rdseed64_step;

/// Draws one 64-bit word from the DRNG output conditioner.
///
/// # Safety
///
/// The processor must advertise RDRAND; issuing the instruction without
/// that is undefined.
#[target_feature(enable = "rdrand")]
pub unsafe fn rdrand64() -> u64 {
    let mut retries = 0u32;
    loop {
        let mut word = 0;
        if _rdrand64_step(&mut word) == 1 {
            if retries > 0 {
                trace!("rdrand64 needed {} retries", retries);
            }
            return word;
        }
        retries += 1;
    }
}

/// Draws one 64-bit word from the entropy source feeding the conditioner.
///
/// Considerably slower than [`rdrand64()`], and rate-limited by the
/// hardware itself.
///
/// # Safety
///
/// The processor must advertise RDSEED; issuing the instruction without
/// that is undefined.
#[target_feature(enable = "rdseed")]
pub unsafe fn rdseed64() -> u64 {
    let mut retries = 0u32;
    loop {
        let mut word = 0;
        if _rdseed64_step(&mut word) == 1 {
            if retries > 0 {
                trace!("rdseed64 needed {} retries", retries);
            }
            return word;
        }
        retries += 1;
    }
}
