//! GUID byte-order handling.
//!
//! SQL Server transmits GUID-shaped values (connection ids, activity ids,
//! `UNIQUEIDENTIFIER` columns) in the Windows `GUID` memory layout: the first
//! three groups are little-endian while the trailing eight bytes keep their
//! textual order. A GUID written as `01234567-89AB-CDEF-0123-456789ABCDEF`
//! therefore travels as:
//!
//! ```text
//! canonical: 01 23 45 67 | 89 AB | CD EF | 01 23 45 67 89 AB CD EF
//! wire:      67 45 23 01 | AB 89 | EF CD | 01 23 45 67 89 AB CD EF
//! ```
//!
//! The permutation is its own inverse, so the same function converts in both
//! directions. [`to_wire`] and [`from_wire`] exist only to make call sites read
//! in the direction of travel.

/// Length of a GUID in bytes.
pub const GUID_LEN: usize = 16;

/// Swap between canonical (RFC 4122 text order) and wire (mixed-endian) layout.
#[must_use]
pub const fn permute(bytes: [u8; GUID_LEN]) -> [u8; GUID_LEN] {
    [
        bytes[3], bytes[2], bytes[1], bytes[0], // Data1, u32 LE
        bytes[5], bytes[4], // Data2, u16 LE
        bytes[7], bytes[6], // Data3, u16 LE
        bytes[8], bytes[9], bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15],
    ]
}

/// Convert canonical GUID bytes to the order sent on the wire.
#[must_use]
pub const fn to_wire(canonical: [u8; GUID_LEN]) -> [u8; GUID_LEN] {
    permute(canonical)
}

/// Convert GUID bytes received from the wire to canonical order.
#[must_use]
pub const fn from_wire(wire: [u8; GUID_LEN]) -> [u8; GUID_LEN] {
    permute(wire)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: [u8; 16] = [
        0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD, 0xEF, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD,
        0xEF,
    ];
    const WIRE: [u8; 16] = [
        0x67, 0x45, 0x23, 0x01, 0xAB, 0x89, 0xEF, 0xCD, 0x01, 0x23, 0x45, 0x67, 0x89, 0xAB, 0xCD,
        0xEF,
    ];

    #[test]
    fn test_canonical_to_wire() {
        assert_eq!(to_wire(CANONICAL), WIRE);
    }

    #[test]
    fn test_wire_to_canonical() {
        assert_eq!(from_wire(WIRE), CANONICAL);
    }

    #[test]
    fn test_permutation_is_involution() {
        let bytes: [u8; 16] = core::array::from_fn(|i| i as u8 * 17);
        assert_eq!(permute(permute(bytes)), bytes);
    }

    #[test]
    fn test_tail_bytes_untouched() {
        let wire = to_wire(CANONICAL);
        assert_eq!(&wire[8..], &CANONICAL[8..]);
    }
}
