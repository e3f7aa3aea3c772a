// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Processor capability detection for the entropy instructions.
//!
//! RDRAND and RDSEED are advertised through separate CPUID feature bits,
//! and issuing either instruction on a processor that does not advertise
//! it is undefined. [`Support`] records, once, what the processor
//! advertises; the host application is expected to call
//! [`Support::detect()`] a single time during initialization and thread
//! the record to whatever components draw entropy. The record is plain
//! immutable data, so the queries on it are idempotent and safe to share
//! across threads without locking.

use core::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The number of bytes produced by one hardware draw.
///
/// Both entropy instructions fill a full native register per successful
/// issue; this crate only drives their 64-bit forms.
pub const WORD_BYTES: usize = mem::size_of::<u64>();

/// Which entropy instructions the current processor advertises.
///
/// A `Support` value can only report an instruction as available if the
/// probe actually ran and the build's native word width matched the
/// register width the instruction wrappers assume; every failure mode
/// degrades to "not supported" rather than to a misreported capability.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Support {
    rdrand: bool,
    rdseed: bool,
}

impl Support {
    /// Probes the processor for entropy-instruction support.
    ///
    /// Detection is a pure CPUID query with no side effects beyond the
    /// returned record, but it is not free; hosts should run it once at
    /// startup and reuse the record for the life of the process.
    ///
    /// Both flags come back false when the build's pointer width is not
    /// the 64-bit register width the draw primitives assume (a mismatched
    /// build configuration, not a runtime error), and on any target other
    /// than x86-64.
    pub fn detect() -> Self {
        if mem::size_of::<usize>() != WORD_BYTES {
            warn!("native word width is not 64 bits; reporting no support");
            return Self::none();
        }

        let support = Self::cpuid_flags();
        info!(
            "entropy instruction support: rdrand={}, rdseed={}",
            support.rdrand, support.rdseed,
        );
        support
    }

    /// Returns the record that reports no support at all.
    ///
    /// Useful as a placeholder in hosts that have not run detection, since
    /// it can never mint a capability token.
    pub const fn none() -> Self {
        Self {
            rdrand: false,
            rdseed: false,
        }
    }

    /// Returns whether the fresh-randomness instruction, RDRAND, may be
    /// issued on this processor.
    pub fn has_rdrand(&self) -> bool {
        self.rdrand
    }

    /// Returns whether the seed-quality instruction, RDSEED, may be
    /// issued on this processor.
    pub fn has_rdseed(&self) -> bool {
        self.rdseed
    }

    #[cfg(target_arch = "x86_64")]
    fn cpuid_flags() -> Self {
        let cpuid = raw_cpuid::CpuId::new();
        Self {
            // Leaf 1, ECX bit 30.
            rdrand: cpuid
                .get_feature_info()
                .map_or(false, |f| f.has_rdrand()),
            // Leaf 7, EBX bit 18.
            rdseed: cpuid
                .get_extended_feature_info()
                .map_or(false, |f| f.has_rdseed()),
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn cpuid_flags() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn detection_is_idempotent() {
        let first = Support::detect();
        for _ in 0..3 {
            assert_eq!(Support::detect(), first);
        }
    }

    #[test]
    fn none_reports_nothing() {
        let support = Support::none();
        assert!(!support.has_rdrand());
        assert!(!support.has_rdseed());
    }
}
