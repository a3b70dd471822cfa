//! Byte-level format codecs for the client surface.
//!
//! Everything the client decodes with fixed offsets lives here: the
//! 16-bpp RGB565 bitmap framing, the 24-bpp framing used for solar
//! imagery, and the colour-scale lookup tables.

pub mod bmp;
pub mod colorscale;

pub use bmp::{
    blend_rgb565, bmp24_header, bmp565_header, dim_rgb565, pack_rgb565, unpack_rgb565,
    zlib_compress, BMP565_PREFIX_LEN,
};
pub use colorscale::ColorTables;
