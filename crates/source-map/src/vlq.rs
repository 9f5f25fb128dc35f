//! Base64 VLQ encoding used by the `mappings` field.

const BASE64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE_MASK: u64 = (1 << VLQ_BASE_SHIFT) - 1;
const VLQ_CONTINUATION_BIT: u64 = 1 << VLQ_BASE_SHIFT;

/// Appends the VLQ encoding of `value` to `out`.
pub(crate) fn encode(value: i64, out: &mut String) {
    // sign goes in the least significant bit
    let mut vlq = if value < 0 {
        ((value.unsigned_abs()) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = vlq & VLQ_BASE_MASK;
        vlq >>= VLQ_BASE_SHIFT;
        if vlq > 0 {
            digit |= VLQ_CONTINUATION_BIT;
        }
        out.push(BASE64_ALPHABET[digit as usize] as char);
        if vlq == 0 {
            break;
        }
    }
}
