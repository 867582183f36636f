//! OpenPGP packet stream walk (RFC 4880 framing).
//!
//! Packets are walked until the image ends. Each packet yields a tag-byte
//! annotation, length-octet annotations, `header`/`body` spans, and a
//! whole-packet wrap named through the packet-tag lookup. New-format
//! partial bodies are followed chunk by chunk. Symmetric-key session-key,
//! compressed-data, and literal-data packets are decoded one level deeper.
//! All multi-byte scalars are network order.

use crate::cursor::Endian;
use crate::error::{DecodeFault, Result};
use crate::tagger::Tagger;

pub const TAG_RESERVED: u8 = 0;
pub const TAG_PUB_KEY_ENCR_SESS_KEY: u8 = 1;
pub const TAG_SIGNATURE: u8 = 2;
pub const TAG_SYMKEY_ENCR_SESS_KEY: u8 = 3;
pub const TAG_ONE_PASS_SIG: u8 = 4;
pub const TAG_SECRET_KEY: u8 = 5;
pub const TAG_PUB_KEY: u8 = 6;
pub const TAG_SECRET_SUBKEY: u8 = 7;
pub const TAG_COMPR_DATA: u8 = 8;
pub const TAG_SYMM_ENCR_DATA: u8 = 9;
pub const TAG_MARKER: u8 = 10;
pub const TAG_LITERAL_DATA: u8 = 11;
pub const TAG_TRUST: u8 = 12;
pub const TAG_USER_ID: u8 = 13;
pub const TAG_PUB_SUBKEY: u8 = 14;
pub const TAG_USER_ATTR: u8 = 17;
pub const TAG_SYMM_ENCR_INTEGRITY_PROT_DATA: u8 = 18;
pub const TAG_MODIF_DETECT_CODE: u8 = 19;

pub fn packet_tag_str(tag: u8) -> &'static str {
    match tag {
        TAG_RESERVED => "reserved",
        TAG_PUB_KEY_ENCR_SESS_KEY => "public-key encr session key",
        TAG_SIGNATURE => "signature",
        TAG_SYMKEY_ENCR_SESS_KEY => "symmetric-key encr session key",
        TAG_ONE_PASS_SIG => "one-pass signature",
        TAG_SECRET_KEY => "secret-key",
        TAG_PUB_KEY => "public-key",
        TAG_SECRET_SUBKEY => "secret-subkey",
        TAG_COMPR_DATA => "compressed data",
        TAG_SYMM_ENCR_DATA => "symmetric encr data",
        TAG_MARKER => "marker",
        TAG_LITERAL_DATA => "literal data",
        TAG_TRUST => "trust",
        TAG_USER_ID => "user id",
        TAG_PUB_SUBKEY => "public-subkey",
        TAG_USER_ATTR => "user attribute",
        TAG_SYMM_ENCR_INTEGRITY_PROT_DATA => {
            "symmetric encrypted and integrity protected data"
        }
        TAG_MODIF_DETECT_CODE => "modification detection code",
        _ => "unknown",
    }
}

// rfc4880 section 9.2
fn sym_algo_str(algo: u8) -> &'static str {
    match algo {
        0 => "plaintext/unencrypted",
        1 => "IDEA",
        2 => "TripleDES",
        3 => "CAST5",
        4 => "Blowfish",
        5 | 6 => "Reserved",
        7 => "AES128",
        8 => "AES192",
        9 => "AES256",
        10 => "Twofish",
        100..=110 => "private/experimental",
        _ => "unknown",
    }
}

// rfc4880 section 3.7.1
fn s2k_str(algo: u8) -> &'static str {
    match algo {
        0 => "Simple S2K",
        1 => "Salted S2K",
        2 => "Reserved",
        3 => "Iterated+Salted S2K",
        100..=110 => "private/experimental",
        _ => "unknown",
    }
}

// rfc4880 section 9.4
fn hash_algo_str(algo: u8) -> &'static str {
    match algo {
        0 => "invalid",
        1 => "md5",
        2 => "sha1",
        3 => "ripe-md",
        4..=7 => "reserved",
        8 => "sha256",
        9 => "sha384",
        10 => "sha512",
        11 => "sha224",
        100..=110 => "private/experimental",
        _ => "unknown",
    }
}

// rfc4880 section 9.3
fn compr_algo_str(algo: u8) -> &'static str {
    match algo {
        0 => "uncompressed",
        1 => "zip [rfc1951]",
        2 => "zlib [rfc1950]",
        3 => "bzip2 [bz2]",
        100..=110 => "private/experimental",
        _ => "unknown",
    }
}

fn literal_fmt_str(fmt: u8) -> &'static str {
    match fmt {
        b'b' => "binary",
        b't' => "text",
        b'u' => "utf-8",
        _ => "unknown",
    }
}

/// True when the first byte reads as a packet tag: bit 7 set and a tag id
/// inside the assigned range. Content-only, so this probe runs last in the
/// registry.
pub fn probe_pgp(data: &[u8]) -> bool {
    let Some(&byte) = data.first() else {
        return false;
    };
    if byte & 0x80 == 0 {
        return false;
    }
    let tag_id = if byte & 0x40 != 0 {
        byte & 0x3F
    } else {
        (byte & 0x3C) >> 2
    };
    matches!(tag_id, 1..=14 | 17..=19)
}

pub fn walk_pgp(t: &mut Tagger<'_>) -> Result<()> {
    t.cur.set_endian(Endian::Big);
    while !t.cur.is_eof() {
        tag_packet(t)?;
    }
    Ok(())
}

fn tag_packet(t: &mut Tagger<'_>) -> Result<()> {
    let o_packet = t.cur.pos();
    let byte = t.tag_u8("packet tag byte")?;
    if byte & 0x80 == 0 {
        return Err(DecodeFault::InvalidPacketTag {
            tag: byte,
            offset: o_packet,
        });
    }

    let (tag_id, style, hdr_end, chunks) = if byte & 0x40 != 0 {
        let (hdr_end, chunks) = tag_new_lengths(t)?;
        (byte & 0x3F, "new", hdr_end, chunks)
    } else {
        let (hdr_end, chunk) = tag_old_length(t, o_packet, byte & 3)?;
        ((byte & 0x3C) >> 2, "old", hdr_end, vec![chunk])
    };

    let packet_end = t.cur.pos();
    t.note(o_packet, hdr_end, format!("header ({})", style));
    for (start, len) in &chunks {
        t.note(*start, start + len, "body");
    }
    t.wrap(
        o_packet,
        format!("{} packet (Tag {})", packet_tag_str(tag_id), tag_id),
    );

    // deep decode only makes sense over one contiguous body chunk
    if chunks.len() == 1 {
        let (start, len) = chunks[0];
        tag_body(t, tag_id, start, start + len)?;
    }
    t.cur.seek(packet_end)?;
    Ok(())
}

/// Length octets of a new-format packet; loops while chunks declare
/// themselves partial. Returns the header end (after the first length
/// field) and the `(start, len)` of every body chunk.
fn tag_new_lengths(t: &mut Tagger<'_>) -> Result<(u64, Vec<(u64, u64)>)> {
    let mut chunks: Vec<(u64, u64)> = Vec::new();
    let mut hdr_end = t.cur.pos();
    loop {
        let octet1 = t.cur.peek_u8()?;
        let mut partial = false;
        let body_len: u64 = match octet1 {
            0..=191 => {
                let n = u64::from(octet1);
                t.tag(1, format!("length (direct): {:#X}", n))?;
                n
            }
            192..=223 => {
                let saved = t.cur.pos();
                t.cur.skip(1)?;
                let octet2 = t.cur.peek_u8()?;
                t.cur.seek(saved)?;
                let n = (u64::from(octet1) - 192) * 256 + u64::from(octet2) + 192;
                t.tag(2, format!("length (calculated): {:#X}", n))?;
                n
            }
            224..=254 => {
                partial = true;
                let n = 1u64 << (octet1 & 0x1F);
                t.tag(1, format!("length (partial): {:#X}", n))?;
                n
            }
            255 => {
                let saved = t.cur.pos();
                t.cur.skip(1)?;
                let n = u64::from(t.cur.peek_u32()?);
                t.cur.seek(saved)?;
                t.tag(5, format!("length (direct): {:#X}", n))?;
                n
            }
        };
        if chunks.is_empty() {
            hdr_end = t.cur.pos();
        }
        let start = t.cur.pos();
        t.cur.skip(body_len)?;
        chunks.push((start, body_len));
        if !partial || t.cur.is_eof() {
            break;
        }
    }
    Ok((hdr_end, chunks))
}

/// Length field of an old-format packet. Length type 3 has no octets: the
/// body is the whole rest of the image.
fn tag_old_length(
    t: &mut Tagger<'_>,
    o_packet: u64,
    length_type: u8,
) -> Result<(u64, (u64, u64))> {
    let body_len = match length_type {
        0 => u64::from(t.tag_u8("len")?),
        1 => u64::from(t.tag_u16("len")?),
        2 => u64::from(t.tag_u32("len")?),
        _ => {
            let n = t.cur.len() - (o_packet + 1);
            t.note(
                t.cur.pos(),
                t.cur.pos(),
                format!("length (implicit): {:#X}", n),
            );
            n
        }
    };
    let hdr_end = t.cur.pos();
    t.cur.skip(body_len)?;
    Ok((hdr_end, (hdr_end, body_len)))
}

fn tag_body(t: &mut Tagger<'_>, tag_id: u8, start: u64, end: u64) -> Result<()> {
    match tag_id {
        TAG_SYMKEY_ENCR_SESS_KEY => {
            t.cur.seek(start)?;
            t.tag_u8("version")?;
            let algo = t.cur.peek_u8()?;
            t.tag_u8(&format!("algorithm ({})", sym_algo_str(algo)))?;
            let s2k = t.cur.peek_u8()?;
            t.tag_u8(&format!("S2K ({})", s2k_str(s2k)))?;
            // only the iterated-and-salted S2K carries extra fields
            if s2k == 3 {
                let hash = t.cur.peek_u8()?;
                t.tag_u8(&format!("hash ({})", hash_algo_str(hash)))?;
                t.tag(8, "salt")?;
                let coded = t.cur.peek_u8()?;
                let count = (16u64 + u64::from(coded & 0xF)) << ((coded >> 4) + 6);
                t.tag_u8(&format!("count (decoded: {})", count))?;
            }
        }
        TAG_COMPR_DATA => {
            t.cur.seek(start)?;
            let algo = t.cur.peek_u8()?;
            t.tag_u8(&format!("algorithm ({})", compr_algo_str(algo)))?;
            t.tag(end.saturating_sub(t.cur.pos()), "compressed data")?;
        }
        TAG_LITERAL_DATA => {
            t.cur.seek(start)?;
            let fmt = t.cur.peek_u8()?;
            t.tag_u8(&format!("format ({})", literal_fmt_str(fmt)))?;
            let name_len = t.tag_u8("filename length")?;
            t.tag(u64::from(name_len), "filename")?;
            t.tag_u32("date")?;
            t.tag(end.saturating_sub(t.cur.pos()), "data")?;
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annot::{Annotation, ByteRange};

    fn walk_ok(data: &[u8]) -> Vec<Annotation> {
        let mut t = Tagger::new(data);
        walk_pgp(&mut t).unwrap();
        t.into_annotations()
    }

    fn labels(annots: &[Annotation]) -> Vec<&str> {
        annots.iter().map(|a| a.label.as_str()).collect()
    }

    #[test]
    fn test_probe() {
        // old format, tag 11, one-octet length
        assert!(probe_pgp(&[0xAC]));
        // new format, tag 2
        assert!(probe_pgp(&[0xC2]));
        // bit 7 clear
        assert!(!probe_pgp(&[0x3F]));
        // old format, tag 15 is unassigned
        assert!(!probe_pgp(&[0xBC]));
        // new format, tag 63 is unassigned
        assert!(!probe_pgp(&[0xFF]));
        assert!(!probe_pgp(&[]));
    }

    #[test]
    fn test_old_format_literal_data() {
        let mut data = vec![0xAC, 0x0D]; // tag 11, one-octet length 13
        data.push(b'b'); // format
        data.push(4); // filename length
        data.extend_from_slice(b"f.tx");
        data.extend_from_slice(&[0, 0, 0, 0]); // date
        data.extend_from_slice(&[0xAA, 0xBB, 0xCC]);

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert_eq!(
            l,
            [
                "packet tag byte=0xAC",
                "len=0xD",
                "header (old)",
                "body",
                "literal data packet (Tag 11)",
                "format (binary)=0x62",
                "filename length=0x4",
                "filename",
                "date=0x0",
                "data",
            ]
        );
        assert_eq!(annots[2].range, ByteRange::new(0, 2));
        assert_eq!(annots[3].range, ByteRange::new(2, 0xF));
        assert_eq!(annots[4].range, ByteRange::new(0, 0xF));
        assert_eq!(annots[7].range, ByteRange::new(4, 8)); // filename bytes
        assert_eq!(annots[9].range, ByteRange::new(0xC, 0xF)); // data remainder
    }

    #[test]
    fn test_new_format_direct_length() {
        let mut data = vec![0xC2, 0x05]; // tag 2, direct length 5
        data.extend_from_slice(&[0; 5]);

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert_eq!(
            l,
            [
                "packet tag byte=0xC2",
                "length (direct): 0x5",
                "header (new)",
                "body",
                "signature packet (Tag 2)",
            ]
        );
        assert_eq!(annots[2].range, ByteRange::new(0, 2));
        assert_eq!(annots[3].range, ByteRange::new(2, 7));
        assert_eq!(annots[4].range, ByteRange::new(0, 7));
    }

    #[test]
    fn test_new_format_two_octet_length() {
        let mut data = vec![0xC2, 0xC0, 0x00]; // (192-192)*256 + 0 + 192
        data.extend_from_slice(&vec![0u8; 192]);

        let annots = walk_ok(&data);
        let len = annots
            .iter()
            .find(|a| a.label == "length (calculated): 0xC0")
            .unwrap();
        assert_eq!(len.range, ByteRange::new(1, 3));
        let body = annots.iter().find(|a| a.label == "body").unwrap();
        assert_eq!(body.range, ByteRange::new(3, 3 + 192));
    }

    #[test]
    fn test_new_format_five_octet_length() {
        let mut data = vec![0xC2, 0xFF, 0x00, 0x00, 0x00, 0x03];
        data.extend_from_slice(&[1, 2, 3]);

        let annots = walk_ok(&data);
        let len = annots
            .iter()
            .find(|a| a.label == "length (direct): 0x3")
            .unwrap();
        assert_eq!(len.range, ByteRange::new(1, 6));
        let body = annots.iter().find(|a| a.label == "body").unwrap();
        assert_eq!(body.range, ByteRange::new(6, 9));
    }

    #[test]
    fn test_partial_body_chunks() {
        // tag 9, one partial chunk of 1 byte, then a direct 2-byte chunk
        let data = [0xC9, 0xE0, 0x11, 0x02, 0x22, 0x33];

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert_eq!(
            l,
            [
                "packet tag byte=0xC9",
                "length (partial): 0x1",
                "length (direct): 0x2",
                "header (new)",
                "body",
                "body",
                "symmetric encr data packet (Tag 9)",
            ]
        );
        assert_eq!(annots[3].range, ByteRange::new(0, 2));
        assert_eq!(annots[4].range, ByteRange::new(2, 3));
        assert_eq!(annots[5].range, ByteRange::new(4, 6));
        assert_eq!(annots[6].range, ByteRange::new(0, 6));
    }

    #[test]
    fn test_multichunk_skips_deep_decode() {
        // tag 11 but split over two chunks
        let data = [0xCB, 0xE0, 0x41, 0x00];
        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert!(l.contains(&"literal data packet (Tag 11)"));
        assert!(!l.iter().any(|s| s.starts_with("format (")));
    }

    #[test]
    fn test_indeterminate_length() {
        // tag 6, length type 3: body runs to the image end
        let data = [0x9B, 0x10, 0x20, 0x30, 0x40];
        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert_eq!(
            l,
            [
                "packet tag byte=0x9B",
                "length (implicit): 0x4",
                "header (old)",
                "body",
                "public-key packet (Tag 6)",
            ]
        );
        assert_eq!(annots[1].range, ByteRange::new(1, 1));
        assert_eq!(annots[2].range, ByteRange::new(0, 1));
        assert_eq!(annots[3].range, ByteRange::new(1, 5));
        assert_eq!(annots[4].range, ByteRange::new(0, 5));
    }

    #[test]
    fn test_symkey_deep_decode() {
        let mut data = vec![0x8C, 0x0D]; // tag 3, one-octet length 13
        data.push(4); // version
        data.push(9); // AES256
        data.push(3); // iterated+salted
        data.push(2); // sha1
        data.extend_from_slice(&[0x55; 8]); // salt
        data.push(0x60); // count: (16 + 0) << (6 + 6)

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert!(l.contains(&"version=0x4"));
        assert!(l.contains(&"algorithm (AES256)=0x9"));
        assert!(l.contains(&"S2K (Iterated+Salted S2K)=0x3"));
        assert!(l.contains(&"hash (sha1)=0x2"));
        assert!(l.contains(&"count (decoded: 65536)=0x60"));
        let salt = annots.iter().find(|a| a.label == "salt").unwrap();
        assert_eq!(salt.range.len(), 8);
    }

    #[test]
    fn test_symkey_simple_s2k_stops_after_type() {
        // tag 3, simple S2K (type 0): no hash, salt, or count fields
        let data = [0x8C, 0x04, 0x04, 0x09, 0x00, 0x02];

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert!(l.contains(&"S2K (Simple S2K)=0x0"));
        assert!(!l.iter().any(|s| s.starts_with("hash (")));
        assert!(!l.contains(&"salt"));
        assert!(!l.iter().any(|s| s.starts_with("count (")));
    }

    #[test]
    fn test_compressed_deep_decode() {
        let mut data = vec![0xA0, 0x05]; // tag 8, one-octet length 5
        data.push(1); // zip
        data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let annots = walk_ok(&data);
        let l = labels(&annots);
        assert!(l.contains(&"algorithm (zip [rfc1951])=0x1"));
        let rest = annots.iter().find(|a| a.label == "compressed data").unwrap();
        assert_eq!(rest.range, ByteRange::new(3, 7));
    }

    #[test]
    fn test_two_packets_walked_in_order() {
        let data = [0xC2, 0x01, 0xAA, 0xC9, 0x01, 0xBB];
        let annots = walk_ok(&data);
        let wraps: Vec<&Annotation> = annots
            .iter()
            .filter(|a| a.label.ends_with("packet (Tag 2)") || a.label.ends_with("packet (Tag 9)"))
            .collect();
        assert_eq!(wraps.len(), 2);
        assert_eq!(wraps[0].range, ByteRange::new(0, 3));
        assert_eq!(wraps[1].range, ByteRange::new(3, 6));
    }

    #[test]
    fn test_clear_bit7_is_fatal() {
        let mut t = Tagger::new(&[0x00u8][..]);
        let err = walk_pgp(&mut t).unwrap_err();
        assert_eq!(
            err,
            DecodeFault::InvalidPacketTag {
                tag: 0,
                offset: 0
            }
        );

        // valid packet, then a junk byte where the next tag should be
        let data = [0xC2, 0x01, 0xAA, 0x7F];
        let mut t = Tagger::new(&data[..]);
        let err = walk_pgp(&mut t).unwrap_err();
        assert_eq!(
            err,
            DecodeFault::InvalidPacketTag {
                tag: 0x7F,
                offset: 3
            }
        );
    }

    #[test]
    fn test_declared_length_past_end_is_fatal() {
        let data = [0xC2, 0x10, 0xAA, 0xBB];
        let mut t = Tagger::new(&data[..]);
        let err = walk_pgp(&mut t).unwrap_err();
        assert!(matches!(err, DecodeFault::OutOfBounds { .. }));
    }
}
