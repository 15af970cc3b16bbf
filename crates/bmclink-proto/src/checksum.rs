//! 8-bit two's-complement checksums.
//!
//! Every IPMI message carries two of these: one over the addressed header
//! (`rs_addr`, `netfn_rslun`) and one over the remainder (`rq_addr`,
//! `rq_seq`, `command`, payload). The checksum byte is chosen so that the
//! protected bytes plus the checksum sum to zero modulo 256.

/// Running 8-bit two's-complement checksum.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumSink(u8);

impl ChecksumSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self(0)
    }

    /// Fold a single byte into the running sum.
    pub fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    /// Fold a slice into the running sum.
    pub fn extend(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.push(*b);
        }
    }

    /// The checksum byte: negation of the running sum modulo 256.
    #[must_use]
    pub fn finish(self) -> u8 {
        self.0.wrapping_neg()
    }

    /// True if the folded bytes (including the checksum byte) sum to zero.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 == 0
    }
}

/// Checksum over a slice in one shot.
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    let mut sink = ChecksumSink::new();
    sink.extend(bytes);
    sink.finish()
}
