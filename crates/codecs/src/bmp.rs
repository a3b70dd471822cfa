//! Bitmap framing and RGB565 pixel operations.
//!
//! The client decodes two framings:
//! - 16-bpp RGB565, 122-byte prefix (BITMAPFILEHEADER + BITMAPV4HEADER),
//!   top-down, bit-field masks 0xF800/0x07E0/0x001F, sRGB colour-space
//!   tag, every other field zero, rows contiguous `2*width` bytes.
//! - 24-bpp BGR, 54-byte prefix, bottom-up, rows padded to 4 bytes, with
//!   the image-size and resolution fields zeroed.
//!
//! Both are served zlib-deflated.

use std::io::Write;

/// Length of the combined 565 file + info header.
pub const BMP565_PREFIX_LEN: usize = 122;

const FILE_HEADER_LEN: u32 = 14;
const V4_HEADER_LEN: u32 = 108;
const INFO_HEADER_LEN: u32 = 40;

fn put_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Build the 122-byte RGB565 prefix for a top-down `w` x `h` bitmap.
///
/// `w` is always even on this surface, so rows need no padding and the
/// pixel payload is exactly `w * h * 2` bytes.
pub fn bmp565_header(w: u32, h: u32) -> Vec<u8> {
    let hdr_len = FILE_HEADER_LEN + V4_HEADER_LEN;
    let pix_bytes = w * 2 * h;
    let file_bytes = hdr_len + pix_bytes;

    let mut header = Vec::with_capacity(BMP565_PREFIX_LEN);
    header.extend_from_slice(b"BM");
    put_u32(&mut header, file_bytes);
    put_u16(&mut header, 0); // reserved1
    put_u16(&mut header, 0); // reserved2
    put_u32(&mut header, hdr_len); // pixel data offset

    put_u32(&mut header, V4_HEADER_LEN);
    put_i32(&mut header, w as i32);
    put_i32(&mut header, -(h as i32)); // negative: top-down
    put_u16(&mut header, 1); // planes
    put_u16(&mut header, 16); // bpp
    put_u32(&mut header, 3); // BI_BITFIELDS
    put_u32(&mut header, pix_bytes);
    put_i32(&mut header, 0); // x resolution
    put_i32(&mut header, 0); // y resolution
    put_u32(&mut header, 0); // colours used
    put_u32(&mut header, 0); // colours important
    put_u32(&mut header, 0xF800); // red mask
    put_u32(&mut header, 0x07E0); // green mask
    put_u32(&mut header, 0x001F); // blue mask
    put_u32(&mut header, 0x0000); // alpha mask
    put_u32(&mut header, 1); // LCS_sRGB
    header.extend_from_slice(&[0u8; 36]); // CIE endpoints, unused
    put_u32(&mut header, 0); // gamma red
    put_u32(&mut header, 0); // gamma green
    put_u32(&mut header, 0); // gamma blue

    debug_assert_eq!(header.len(), BMP565_PREFIX_LEN);
    header
}

/// Build the 54-byte 24-bpp prefix for a bottom-up `w` x `h` bitmap.
///
/// Image-size and resolution fields are zeroed so the output is stable
/// regardless of the upstream frame that produced it.
pub fn bmp24_header(w: u32, h: u32) -> Vec<u8> {
    let row_bytes = (w * 3 + 3) / 4 * 4;
    let hdr_len = FILE_HEADER_LEN + INFO_HEADER_LEN;
    let file_bytes = hdr_len + row_bytes * h;

    let mut header = Vec::with_capacity(hdr_len as usize);
    header.extend_from_slice(b"BM");
    put_u32(&mut header, file_bytes);
    put_u16(&mut header, 0);
    put_u16(&mut header, 0);
    put_u32(&mut header, hdr_len);

    put_u32(&mut header, INFO_HEADER_LEN);
    put_i32(&mut header, w as i32);
    put_i32(&mut header, h as i32); // positive: bottom-up
    put_u16(&mut header, 1);
    put_u16(&mut header, 24);
    put_u32(&mut header, 0); // BI_RGB
    put_u32(&mut header, 0); // image size, normalized to zero
    put_i32(&mut header, 0); // x resolution, normalized
    put_i32(&mut header, 0); // y resolution, normalized
    put_u32(&mut header, 0);
    put_u32(&mut header, 0);

    debug_assert_eq!(header.len(), hdr_len as usize);
    header
}

/// Pack 8-bit channels into RGB565.
#[inline(always)]
pub fn pack_rgb565(r: u8, g: u8, b: u8) -> u16 {
    (((r & 0xF8) as u16) << 8) | (((g & 0xFC) as u16) << 3) | ((b >> 3) as u16)
}

/// Unpack RGB565 back to 8-bit channels (low bits zero).
#[inline(always)]
pub fn unpack_rgb565(p: u16) -> (u8, u8, u8) {
    (
        (((p >> 11) & 0x1F) as u8) << 3,
        (((p >> 5) & 0x3F) as u8) << 2,
        ((p & 0x1F) as u8) << 3,
    )
}

/// Halve each channel; the "dimmed" parity copy the client requires.
#[inline(always)]
pub fn dim_rgb565(p: u16) -> u16 {
    let r = (p >> 11) & 0x1F;
    let g = (p >> 5) & 0x3F;
    let b = p & 0x1F;
    ((r >> 1) << 11) | ((g >> 1) << 5) | (b >> 1)
}

/// Alpha-blend `fg` over `bg` in 5/6/5 channel space.
#[inline]
pub fn blend_rgb565(fg: u16, bg: u16, alpha: f32) -> u16 {
    let inv = 1.0 - alpha;
    let r1 = ((fg >> 11) & 0x1F) as f32;
    let g1 = ((fg >> 5) & 0x3F) as f32;
    let b1 = (fg & 0x1F) as f32;
    let r2 = ((bg >> 11) & 0x1F) as f32;
    let g2 = ((bg >> 5) & 0x3F) as f32;
    let b2 = (bg & 0x1F) as f32;

    let r = ((r1 * alpha + r2 * inv) as u16).min(31);
    let g = ((g1 * alpha + g2 * inv) as u16).min(63);
    let b = ((b1 * alpha + b2 * inv) as u16).min(31);
    (r << 11) | (g << 5) | b
}

/// zlib-deflate a byte stream. Any compression level is accepted by the
/// client's inflater; the default balances size and speed.
pub fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(
        Vec::with_capacity(data.len() / 4),
        flate2::Compression::default(),
    );
    enc.write_all(data).expect("in-memory zlib write");
    enc.finish().expect("in-memory zlib finish")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn prefix_is_122_bytes_and_stable() {
        let a = bmp565_header(660, 330);
        let b = bmp565_header(660, 330);
        assert_eq!(a.len(), BMP565_PREFIX_LEN);
        assert_eq!(a, b);
    }

    #[test]
    fn prefix_fields() {
        let h = bmp565_header(660, 330);
        assert_eq!(&h[0..2], b"BM");
        // pixel offset
        assert_eq!(u32::from_le_bytes(h[10..14].try_into().unwrap()), 122);
        // width positive, height negative
        assert_eq!(i32::from_le_bytes(h[18..22].try_into().unwrap()), 660);
        assert_eq!(i32::from_le_bytes(h[22..26].try_into().unwrap()), -330);
        // 16 bpp, BI_BITFIELDS
        assert_eq!(u16::from_le_bytes(h[28..30].try_into().unwrap()), 16);
        assert_eq!(u32::from_le_bytes(h[30..34].try_into().unwrap()), 3);
        // channel masks
        assert_eq!(u32::from_le_bytes(h[54..58].try_into().unwrap()), 0xF800);
        assert_eq!(u32::from_le_bytes(h[58..62].try_into().unwrap()), 0x07E0);
        assert_eq!(u32::from_le_bytes(h[62..66].try_into().unwrap()), 0x001F);
        // sRGB colour space tag
        assert_eq!(u32::from_le_bytes(h[70..74].try_into().unwrap()), 1);
    }

    #[test]
    fn rgb565_round_trip_masks_low_bits() {
        for &(r, g, b) in &[(0u8, 0u8, 0u8), (255, 255, 255), (0x4E, 0x13, 0x8A), (1, 2, 3)] {
            let (ur, ug, ub) = unpack_rgb565(pack_rgb565(r, g, b));
            assert_eq!((ur, ug, ub), (r & 0xF8, g & 0xFC, b & 0xF8));
        }
    }

    #[test]
    fn dim_halves_channels() {
        let p = pack_rgb565(0xF8, 0xFC, 0xF8);
        let (r, g, b) = unpack_rgb565(dim_rgb565(p));
        assert_eq!((r, g, b), (0x78, 0x7C, 0x78));
    }

    #[test]
    fn blend_endpoints() {
        let fg = pack_rgb565(255, 0, 0);
        let bg = pack_rgb565(0, 0, 255);
        assert_eq!(blend_rgb565(fg, bg, 1.0), fg);
        assert_eq!(blend_rgb565(fg, bg, 0.0), bg);
    }

    #[test]
    fn zlib_round_trip() {
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let z = zlib_compress(&data);
        let mut out = Vec::new();
        flate2::read::ZlibDecoder::new(&z[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn bmp24_normalized_fields_zeroed() {
        let h = bmp24_header(170, 170);
        assert_eq!(h.len(), 54);
        // image size + resolutions
        assert_eq!(u32::from_le_bytes(h[34..38].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(h[38..42].try_into().unwrap()), 0);
        assert_eq!(u32::from_le_bytes(h[42..46].try_into().unwrap()), 0);
        assert_eq!(i32::from_le_bytes(h[22..26].try_into().unwrap()), 170);
    }
}
