// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Entropy sources backed by the on-chip random number generator.
//!
//! The two instructions are exposed as zero-sized capability tokens:
//! [`Rdrand`] for the fresh-randomness instruction and [`Rdseed`] for the
//! seed-quality one. A token can only be minted from a
//! [`Support`](crate::support::Support) record that observed the
//! corresponding CPUID bit, so holding one is proof that the instruction
//! may be issued; the draw methods themselves never re-check support.
//!
//! Draws are stateless, so tokens are freely `Copy` and every method is
//! safe to call from any number of threads at once. Each draw reissues
//! its instruction until the hardware reports success, and so may block
//! the calling thread for as long as the hardware keeps failing; there is
//! no cap, no timeout, and no way to cancel a draw in flight.

use crate::insn;
use crate::support::Support;
use crate::support::WORD_BYTES;

/// The largest request [`Rdrand::fill()`] will serve, in bytes.
///
/// The ceiling exists to reject pathological single calls; callers with
/// genuinely larger appetites should split the request.
pub const MAX_FILL_BYTES: usize = 1_000_000 * WORD_BYTES;

/// An error returned by [`Rdrand::fill()`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Error {
    /// Indicates that a request was longer than [`MAX_FILL_BYTES`].
    BufferTooBig,
}

/// A proof that the processor supports the fresh-randomness instruction.
///
/// This is the workhorse source: RDRAND output comes from the DRNG's
/// conditioned DRBG and is suitable for bulk draws. Mint a token with
/// [`Rdrand::new()`] and fill buffers with [`Rdrand::fill()`]:
///
/// ```
/// # use drng::source::Rdrand;
/// # use drng::support::Support;
/// if let Some(rng) = Rdrand::new(&Support::detect()) {
///     let mut key = [0; 32];
///     rng.fill(&mut key)?;
/// }
/// # Ok::<(), drng::source::Error>(())
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Rdrand {
    _guarantee: (),
}

impl Rdrand {
    /// Mints a token, if `support` reports the instruction available.
    pub fn new(support: &Support) -> Option<Self> {
        if support.has_rdrand() {
            Some(Self { _guarantee: () })
        } else {
            None
        }
    }

    /// Draws one fresh 64-bit word.
    ///
    /// Retries the instruction until the hardware reports success, with no
    /// iteration cap; under normal operation that takes at most a handful
    /// of issues, but a faulty part could block the calling thread
    /// indefinitely.
    pub fn next_u64(&self) -> u64 {
        // Safety: minting `self` required a `Support` that saw CPUID
        // advertise RDRAND.
        unsafe { insn::rdrand64() }
    }

    /// Fills `buf` with hardware-generated random bytes, returning how
    /// many bytes were written.
    ///
    /// On success every byte of `buf` has been overwritten and the full
    /// `buf.len()` is returned; there are no partial fills. Whole words
    /// are written in native byte order at word-aligned offsets; a
    /// trailing partial word takes the leading bytes of one extra draw,
    /// and the rest of that draw is discarded rather than carried over to
    /// a future call.
    ///
    /// Requests longer than [`MAX_FILL_BYTES`] are rejected up front,
    /// before any draw is issued, leaving `buf` untouched. A zero-length
    /// `buf` succeeds without issuing a draw.
    pub fn fill(&self, buf: &mut [u8]) -> Result<usize, Error> {
        use byteorder::ByteOrder as _;

        check!(buf.len() <= MAX_FILL_BYTES, Error::BufferTooBig);

        let mut words = buf.chunks_exact_mut(WORD_BYTES);
        for word in &mut words {
            byteorder::NativeEndian::write_u64(word, self.next_u64());
        }

        let tail = words.into_remainder();
        if !tail.is_empty() {
            let mut word = [0; WORD_BYTES];
            byteorder::NativeEndian::write_u64(&mut word, self.next_u64());
            tail.copy_from_slice(&word[..tail.len()]);
        }

        Ok(buf.len())
    }
}

/// A proof that the processor supports the seed-quality instruction.
///
/// RDSEED output is drawn from the entropy source ahead of the DRNG's
/// conditioner, at the rate the hardware harvests it. It is meant for
/// seeding a generator the caller maintains, not for bulk output; there
/// is deliberately no `fill()` here.
#[derive(Copy, Clone, Debug)]
pub struct Rdseed {
    _guarantee: (),
}

impl Rdseed {
    /// Mints a token, if `support` reports the instruction available.
    pub fn new(support: &Support) -> Option<Self> {
        if support.has_rdseed() {
            Some(Self { _guarantee: () })
        } else {
            None
        }
    }

    /// Draws one seed-quality 64-bit word.
    ///
    /// Same retry contract as [`Rdrand::next_u64()`], but expect it to
    /// spin more often; the hardware rate-limits this instruction much
    /// more aggressively.
    pub fn next_u64(&self) -> u64 {
        // Safety: minting `self` required a `Support` that saw CPUID
        // advertise RDSEED.
        unsafe { insn::rdseed64() }
    }
}

#[cfg(feature = "rand_core")]
impl rand_core::RngCore for Rdrand {
    fn next_u32(&mut self) -> u32 {
        Rdrand::next_u64(self) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Rdrand::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        // Unlike `fill()`, this trait method is infallible, so it is not
        // subject to `MAX_FILL_BYTES`.
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(
        &mut self,
        dest: &mut [u8],
    ) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(feature = "rand_core")]
impl rand_core::RngCore for Rdseed {
    fn next_u32(&mut self) -> u32 {
        Rdseed::next_u64(self) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Rdseed::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(
        &mut self,
        dest: &mut [u8],
    ) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SENTINEL: u8 = 0x5a;

    fn rdrand() -> Option<Rdrand> {
        Rdrand::new(&Support::detect())
    }

    #[test]
    fn no_support_mints_no_tokens() {
        assert!(Rdrand::new(&Support::none()).is_none());
        assert!(Rdseed::new(&Support::none()).is_none());
    }

    #[test]
    fn fill_overwrites_every_byte() {
        let rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        for &len in &[0usize, 1, 7, 8, 9, 1000] {
            let mut first = vec![SENTINEL; len];
            let mut second = vec![SENTINEL; len];
            assert_eq!(rng.fill(&mut first), Ok(len));
            assert_eq!(rng.fill(&mut second), Ok(len));

            // One draw can produce the sentinel at any given position;
            // two independent draws producing it at the same position is
            // a 2^-16 event per byte, which the pair check absorbs.
            for i in 0..len {
                assert!(
                    first[i] != SENTINEL || second[i] != SENTINEL,
                    "byte {} of a {}-byte fill was never overwritten",
                    i,
                    len,
                );
            }
        }
    }

    #[test]
    fn fill_accepts_a_request_of_exactly_the_ceiling() {
        let rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        let mut buf = vec![0; MAX_FILL_BYTES];
        assert_eq!(rng.fill(&mut buf), Ok(MAX_FILL_BYTES));
    }

    #[test]
    fn fill_rejects_one_byte_over_the_ceiling() {
        let rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        let mut buf = vec![SENTINEL; MAX_FILL_BYTES + 1];
        assert_eq!(rng.fill(&mut buf), Err(Error::BufferTooBig));
        assert!(
            buf.iter().all(|&b| b == SENTINEL),
            "rejected fill must not touch the buffer",
        );
    }

    #[test]
    fn fill_rejects_one_word_over_the_ceiling() {
        let rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        let mut buf = vec![SENTINEL; MAX_FILL_BYTES + WORD_BYTES];
        assert_eq!(rng.fill(&mut buf), Err(Error::BufferTooBig));
        assert!(buf.iter().all(|&b| b == SENTINEL));
    }

    #[test]
    fn successive_fills_differ() {
        let rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        let mut first = [0; 32];
        let mut second = [0; 32];
        rng.fill(&mut first).unwrap();
        rng.fill(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn successive_words_differ() {
        let support = Support::detect();

        if let Some(rng) = Rdrand::new(&support) {
            assert_ne!(rng.next_u64(), rng.next_u64());
        }
        if let Some(seed) = Rdseed::new(&support) {
            assert_ne!(seed.next_u64(), seed.next_u64());
        }
    }

    #[cfg(feature = "rand_core")]
    #[test]
    fn rng_core_fill_bytes() {
        use rand_core::RngCore as _;

        let mut rng = match rdrand() {
            Some(rng) => rng,
            None => return,
        };

        let mut first = [0; 24];
        let mut second = [0; 24];
        rng.fill_bytes(&mut first);
        rng.fill_bytes(&mut second);
        assert_ne!(first, second);
    }
}
