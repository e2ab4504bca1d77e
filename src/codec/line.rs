//! Line layout
//!
//! Reinterprets a fixed 270-byte line buffer as typed fields and back.
//!
//! ## Line Format
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ wavelength: f64 (0) | species_code: i32 (8) | log_gf: f32  │
//! │ e_lower: f64 (16)   | j_lower: f32 (24)                    │
//! │ e_upper: f64 (28)   | j_upper: f32 (36)                    │
//! │ lande_lower: f32 (40) | lande_upper: f32 (44)              │
//! │ gamma_radiative (48) | gamma_stark (52) | gamma_vdw (56)   │
//! ├────────────────────────────────────────────────────────────┤
//! │ term_blob: 210 bytes (60..270)                             │
//! │   0..88    lower term designation (ASCII)                  │
//! │   88..176  upper term designation (ASCII)                  │
//! │   176      reference marker                                │
//! │   177..183 three u16 bibliography pointers (binary form)   │
//! │   190      forbid flag                                     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Multi-byte fields are stored in the byte order of the machine that built
//! the file (little-endian for every store in circulation). Decoding reads
//! each field by offset and swaps when the host's native order differs; the
//! three binary bibliography pointers inside the blob are swapped too, gated
//! on the reference marker, because the rest of the blob is plain ASCII.

use serde::{Deserialize, Serialize};

use super::LINE_LENGTH;

/// Size of the opaque term/bibliography blob
pub const TERM_BLOB_LEN: usize = 210;

/// Byte offset of the term blob within a line
const TERM_BLOB_OFFSET: usize = 60;

/// Blob offset of the forbid flag
const FORBID_FLAG_OFFSET: usize = 190;

/// Blob offset of the reference marker byte
const REF_MARKER_OFFSET: usize = 176;

/// Blob offsets of the three binary reference pointers
const REF_POINTER_OFFSETS: [usize; 3] = [177, 179, 181];

/// Byte range of the lower term designation within the blob
const LOWER_TERM_RANGE: std::ops::Range<usize> = 0..88;

/// Byte range of the upper term designation within the blob
const UPPER_TERM_RANGE: std::ops::Range<usize> = 88..176;

// =============================================================================
// Byte Order
// =============================================================================

/// Byte order of multi-byte fields in a stored line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order every store file is written in
    pub const STORED: ByteOrder = ByteOrder::Little;

    /// Byte order of the reading host, detected at compile time
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Whether fields read from a stored line need their bytes swapped
    pub const fn needs_swap(self) -> bool {
        !matches!(self, ByteOrder::Little)
    }

    fn read_f64(self, buf: &[u8], offset: usize) -> f64 {
        let raw: [u8; 8] = buf[offset..offset + 8].try_into().unwrap_or([0; 8]);
        match self {
            ByteOrder::Little => f64::from_le_bytes(raw),
            ByteOrder::Big => f64::from_be_bytes(raw),
        }
    }

    fn read_f32(self, buf: &[u8], offset: usize) -> f32 {
        let raw: [u8; 4] = buf[offset..offset + 4].try_into().unwrap_or([0; 4]);
        match self {
            ByteOrder::Little => f32::from_le_bytes(raw),
            ByteOrder::Big => f32::from_be_bytes(raw),
        }
    }

    fn read_i32(self, buf: &[u8], offset: usize) -> i32 {
        let raw: [u8; 4] = buf[offset..offset + 4].try_into().unwrap_or([0; 4]);
        match self {
            ByteOrder::Little => i32::from_le_bytes(raw),
            ByteOrder::Big => i32::from_be_bytes(raw),
        }
    }
}

// =============================================================================
// LineRecord
// =============================================================================

/// One spectral transition, decoded from a 270-byte line buffer
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    /// Vacuum wavelength in Angstroms
    pub wavelength: f64,
    /// Species code; >= 5000 marks an isotope-specific variant,
    /// >= 10000 a molecule
    pub species_code: i32,
    /// log10 of the oscillator strength times statistical weight
    pub log_gf: f32,
    /// Lower level energy, in the source's declared unit
    pub e_lower: f64,
    /// Upper level energy, in the source's declared unit
    pub e_upper: f64,
    /// Lower level angular momentum quantum number
    pub j_lower: f32,
    /// Upper level angular momentum quantum number
    pub j_upper: f32,
    /// Lower level Lande g-factor; 99.0 means unknown
    pub lande_lower: f32,
    /// Upper level Lande g-factor; 99.0 means unknown
    pub lande_upper: f32,
    /// Radiative damping constant (log10); 0.0 means unknown
    pub gamma_radiative: f32,
    /// Stark damping constant (log10); 0.0 means unknown
    pub gamma_stark: f32,
    /// Van der Waals damping constant (log10); 0.0 means unknown
    pub gamma_vdw: f32,
    /// Term designations and bibliography pointers, carried opaquely
    pub term_blob: [u8; TERM_BLOB_LEN],
}

impl LineRecord {
    /// Decode a line from its fixed-offset byte layout.
    ///
    /// `order` is the byte order the file was written in; pointer bytes in
    /// the term blob are fixed up when it differs from the host order.
    pub fn decode(buf: &[u8; LINE_LENGTH], order: ByteOrder) -> Self {
        let mut term_blob = [0u8; TERM_BLOB_LEN];
        term_blob.copy_from_slice(&buf[TERM_BLOB_OFFSET..]);

        if order != ByteOrder::Little && term_blob[REF_MARKER_OFFSET] < b'0' {
            // Binary reference pointers are normalized to little-endian so
            // bib_refs reads them the same way on any host
            for off in REF_POINTER_OFFSETS {
                term_blob.swap(off, off + 1);
            }
        }

        LineRecord {
            wavelength: order.read_f64(buf, 0),
            species_code: order.read_i32(buf, 8),
            log_gf: order.read_f32(buf, 12),
            e_lower: order.read_f64(buf, 16),
            j_lower: order.read_f32(buf, 24),
            e_upper: order.read_f64(buf, 28),
            j_upper: order.read_f32(buf, 36),
            lande_lower: order.read_f32(buf, 40),
            lande_upper: order.read_f32(buf, 44),
            gamma_radiative: order.read_f32(buf, 48),
            gamma_stark: order.read_f32(buf, 52),
            gamma_vdw: order.read_f32(buf, 56),
            term_blob,
        }
    }

    /// Encode a line into the stored (little-endian) byte layout
    pub fn encode(&self) -> [u8; LINE_LENGTH] {
        let mut buf = [0u8; LINE_LENGTH];
        buf[0..8].copy_from_slice(&self.wavelength.to_le_bytes());
        buf[8..12].copy_from_slice(&self.species_code.to_le_bytes());
        buf[12..16].copy_from_slice(&self.log_gf.to_le_bytes());
        buf[16..24].copy_from_slice(&self.e_lower.to_le_bytes());
        buf[24..28].copy_from_slice(&self.j_lower.to_le_bytes());
        buf[28..36].copy_from_slice(&self.e_upper.to_le_bytes());
        buf[36..40].copy_from_slice(&self.j_upper.to_le_bytes());
        buf[40..44].copy_from_slice(&self.lande_lower.to_le_bytes());
        buf[44..48].copy_from_slice(&self.lande_upper.to_le_bytes());
        buf[48..52].copy_from_slice(&self.gamma_radiative.to_le_bytes());
        buf[52..56].copy_from_slice(&self.gamma_stark.to_le_bytes());
        buf[56..60].copy_from_slice(&self.gamma_vdw.to_le_bytes());
        buf[TERM_BLOB_OFFSET..].copy_from_slice(&self.term_blob);
        buf
    }

    /// Selection-rule tag: `b' '` allowed, `b'A'` autoionizing, other
    /// letters/digits mark a forbidden-transition class
    pub fn forbid_flag(&self) -> u8 {
        self.term_blob[FORBID_FLAG_OFFSET]
    }

    /// Set the forbid flag (used when synthesizing records)
    pub fn set_forbid_flag(&mut self, flag: u8) {
        self.term_blob[FORBID_FLAG_OFFSET] = flag;
    }

    /// Lower term designation, trimmed
    pub fn lower_term(&self) -> &str {
        blob_str(&self.term_blob[LOWER_TERM_RANGE])
    }

    /// Upper term designation, trimmed
    pub fn upper_term(&self) -> &str {
        blob_str(&self.term_blob[UPPER_TERM_RANGE])
    }

    /// Bibliography reference ids for this line.
    ///
    /// A marker byte below ASCII `'0'` means the references are stored as
    /// binary u16 pointers; otherwise the field is one ASCII-encoded id.
    /// Pointer slots holding zero or space padding are unused.
    pub fn bib_refs(&self) -> Vec<u16> {
        let marker = self.term_blob[REF_MARKER_OFFSET];
        if marker < b'0' {
            REF_POINTER_OFFSETS
                .iter()
                .map(|&off| [self.term_blob[off], self.term_blob[off + 1]])
                .filter(|slot| *slot != [0, 0] && *slot != [b' ', b' '])
                .map(u16::from_le_bytes)
                .collect()
        } else {
            blob_str(&self.term_blob[REF_MARKER_OFFSET..REF_MARKER_OFFSET + 7])
                .parse::<u16>()
                .ok()
                .into_iter()
                .collect()
        }
    }
}

impl Default for LineRecord {
    fn default() -> Self {
        LineRecord {
            wavelength: 0.0,
            species_code: 0,
            log_gf: 0.0,
            e_lower: 0.0,
            e_upper: 0.0,
            j_lower: 0.0,
            j_upper: 0.0,
            lande_lower: 99.0,
            lande_upper: 99.0,
            gamma_radiative: 0.0,
            gamma_stark: 0.0,
            gamma_vdw: 0.0,
            term_blob: [b' '; TERM_BLOB_LEN],
        }
    }
}

/// ASCII slice of the blob, trimmed of padding; lossy on stray bytes
fn blob_str(bytes: &[u8]) -> &str {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |p| p + 1);
    std::str::from_utf8(&bytes[..end]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LineRecord {
        let mut rec = LineRecord {
            wavelength: 5183.6042,
            species_code: 2602,
            log_gf: -1.24,
            e_lower: 12345.625,
            e_upper: 31632.875,
            j_lower: 2.0,
            j_upper: 3.0,
            lande_lower: 1.25,
            lande_upper: 1.5,
            gamma_radiative: 8.21,
            gamma_stark: -5.41,
            gamma_vdw: -7.59,
            ..LineRecord::default()
        };
        rec.set_forbid_flag(b' ');
        rec
    }

    #[test]
    fn encode_decode_round_trip() {
        let rec = sample();
        let buf = rec.encode();
        let back = LineRecord::decode(&buf, ByteOrder::Little);
        assert_eq!(back, rec);
    }

    #[test]
    fn forbid_flag_round_trip() {
        let mut rec = sample();
        rec.set_forbid_flag(b'4');
        let back = LineRecord::decode(&rec.encode(), ByteOrder::Little);
        assert_eq!(back.forbid_flag(), b'4');
    }

    #[test]
    fn term_designations_trimmed() {
        let mut rec = sample();
        rec.term_blob[0..7].copy_from_slice(b"a5D e7D");
        rec.term_blob[88..95].copy_from_slice(b"z7F y7P");
        assert_eq!(rec.lower_term(), "a5D e7D");
        assert_eq!(rec.upper_term(), "z7F y7P");
    }

    #[test]
    fn binary_bib_refs() {
        let mut rec = sample();
        rec.term_blob[176] = 1; // binary marker
        rec.term_blob[177..179].copy_from_slice(&42u16.to_le_bytes());
        rec.term_blob[179..181].copy_from_slice(&7u16.to_le_bytes());
        rec.term_blob[181..183].copy_from_slice(&0u16.to_le_bytes());
        assert_eq!(rec.bib_refs(), vec![42, 7]);
    }

    #[test]
    fn space_padded_ref_slots_are_unused() {
        let mut rec = sample();
        rec.term_blob[176] = 1;
        rec.term_blob[177..179].copy_from_slice(&42u16.to_le_bytes());
        // slots 2 and 3 keep the default space padding
        assert_eq!(rec.bib_refs(), vec![42]);
    }

    #[test]
    fn big_endian_refs_read_like_little_endian() {
        let mut rec = sample();
        rec.term_blob[176] = 1;
        rec.term_blob[177..179].copy_from_slice(&300u16.to_le_bytes());

        let mut swapped = rec.encode();
        // Pointer bytes as a big-endian writer would have laid them out
        swapped.swap(TERM_BLOB_OFFSET + 177, TERM_BLOB_OFFSET + 178);
        let back = LineRecord::decode(&swapped, ByteOrder::Big);
        assert_eq!(back.bib_refs(), vec![300]);
    }

    #[test]
    fn ascii_bib_ref() {
        let mut rec = sample();
        rec.term_blob[176..179].copy_from_slice(b"123");
        assert_eq!(rec.bib_refs(), vec![123]);
    }
}
