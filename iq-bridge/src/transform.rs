//! Sample encoding conversion
//!
//! goesrecv publishes signed 8-bit I/Q samples; RTL_TCP clients expect
//! unsigned 8-bit samples centred on 128. Flipping the most significant bit
//! converts between the two.

/// Bit that differs between the signed and offset-binary encodings
pub const SAMPLE_MSB: u8 = 0x80;

/// Convert one sample byte (the conversion is its own inverse)
#[inline]
pub const fn flip_msb(byte: u8) -> u8 {
    byte ^ SAMPLE_MSB
}

/// Convert a buffer of sample bytes in place
#[inline]
pub fn flip_msb_in_place(samples: &mut [u8]) {
    for b in samples.iter_mut() {
        *b = flip_msb(*b);
    }
}
