//! Structural parser and emitter for the GIF89a byte stream: magic,
//! Logical Screen Descriptor, color tables, the body block stream
//! (image descriptors, graphic control / comment / application /
//! plain-text extensions) and the trailer. Pixel data stays as
//! LZW-compressed bytes here — the compositor owns decoding and
//! composing it into RGBA.

use common_types::{ColorTable, GifError};

use crate::subblock;

pub const MAGIC_87A: [u8; 6] = *b"GIF87a";
pub const MAGIC_89A: [u8; 6] = *b"GIF89a";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogicalScreenDescriptor {
    pub width: u16,
    pub height: u16,
    pub color_resolution: u8,
    pub sort_flag: bool,
    pub bg_color_index: u8,
    pub pixel_aspect: u8,
}

/// Disposal method, user-input flag, transparency and delay for exactly
/// the next image block. Consumed on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicControlExtension {
    pub disposal_method: u8,
    pub user_input_flag: bool,
    pub transparent_color_flag: bool,
    pub transparent_color_index: u8,
    pub delay_time: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescriptor {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    pub interlace_flag: bool,
    pub sort_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBlock {
    pub descriptor: ImageDescriptor,
    pub local_color_table: Option<ColorTable>,
    pub lzw_min_code_size: u8,
    pub compressed: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyBlock {
    Image(ImageBlock),
    GraphicControl(GraphicControlExtension),
    Comment(String),
    /// `loop_count` is `Some` only for a recognized `NETSCAPE2.0` loop
    /// sub-block; any other application extension carries `None` and is
    /// otherwise inert (the identifier/auth code are kept so callers can
    /// report it through diagnostics without this module knowing about
    /// logging).
    Application {
        identifier: [u8; 8],
        auth_code: [u8; 3],
        loop_count: Option<u16>,
    },
    PlainText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub lsd: LogicalScreenDescriptor,
    pub global_color_table: Option<ColorTable>,
    pub blocks: Vec<BodyBlock>,
}

/// Parses a full GIF87a/GIF89a byte stream into its structural blocks.
pub fn parse(data: &[u8]) -> Result<Container, GifError> {
    if data.len() < 6 {
        return Err(GifError::Truncated {
            context: "magic".to_string(),
        });
    }
    let magic: [u8; 6] = data[0..6].try_into().unwrap();
    if magic != MAGIC_87A && magic != MAGIC_89A {
        return Err(GifError::BadMagic { found: magic });
    }

    let mut pos = 6;
    let (lsd, gct_flag, gct_size) = parse_lsd(data, &mut pos)?;
    let global_color_table = if gct_flag {
        Some(read_color_table(data, &mut pos, gct_size)?)
    } else {
        None
    };

    let mut blocks = Vec::new();
    loop {
        let tag = *data.get(pos).ok_or_else(|| GifError::Truncated {
            context: "body block tag".to_string(),
        })?;
        match tag {
            0x3B => break,
            0x2C => {
                pos += 1;
                blocks.push(BodyBlock::Image(parse_image_block(data, &mut pos)?));
            }
            0x21 => {
                pos += 1;
                let label = *data.get(pos).ok_or_else(|| GifError::Truncated {
                    context: "extension label".to_string(),
                })?;
                pos += 1;
                match label {
                    0xF9 => blocks.push(BodyBlock::GraphicControl(parse_gce(data, &mut pos)?)),
                    0xFE => blocks.push(BodyBlock::Comment(parse_comment(data, &mut pos)?)),
                    0xFF => blocks.push(parse_application(data, &mut pos)?),
                    0x01 => {
                        parse_plain_text(data, &mut pos)?;
                        blocks.push(BodyBlock::PlainText);
                    }
                    other => {
                        return Err(GifError::BadBlockTag {
                            tag: other,
                            offset: pos - 1,
                        })
                    }
                }
            }
            other => {
                return Err(GifError::BadBlockTag { tag: other, offset: pos });
            }
        }
    }

    Ok(Container {
        lsd,
        global_color_table,
        blocks,
    })
}

fn parse_lsd(
    data: &[u8],
    pos: &mut usize,
) -> Result<(LogicalScreenDescriptor, bool, u8), GifError> {
    let bytes = data
        .get(*pos..*pos + 7)
        .ok_or_else(|| GifError::Truncated {
            context: "logical screen descriptor".to_string(),
        })?;
    let width = u16::from_le_bytes([bytes[0], bytes[1]]);
    let height = u16::from_le_bytes([bytes[2], bytes[3]]);
    let packed = bytes[4];
    let bg_color_index = bytes[5];
    let pixel_aspect = bytes[6];
    *pos += 7;

    let gct_flag = packed & 0x80 != 0;
    let gct_size = packed & 0x07;
    let lsd = LogicalScreenDescriptor {
        width,
        height,
        color_resolution: (packed >> 4) & 0x07,
        sort_flag: packed & 0x08 != 0,
        bg_color_index,
        pixel_aspect,
    };
    Ok((lsd, gct_flag, gct_size))
}

fn read_color_table(data: &[u8], pos: &mut usize, size_field: u8) -> Result<ColorTable, GifError> {
    let count = 1usize << (size_field as u32 + 1);
    let nbytes = count * 3;
    let bytes = data
        .get(*pos..*pos + nbytes)
        .ok_or_else(|| GifError::Truncated {
            context: "color table".to_string(),
        })?;
    let entries = bytes.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();
    *pos += nbytes;
    Ok(ColorTable::new(entries))
}

fn parse_image_block(data: &[u8], pos: &mut usize) -> Result<ImageBlock, GifError> {
    let bytes = data
        .get(*pos..*pos + 9)
        .ok_or_else(|| GifError::Truncated {
            context: "image descriptor".to_string(),
        })?;
    let left = u16::from_le_bytes([bytes[0], bytes[1]]);
    let top = u16::from_le_bytes([bytes[2], bytes[3]]);
    let width = u16::from_le_bytes([bytes[4], bytes[5]]);
    let height = u16::from_le_bytes([bytes[6], bytes[7]]);
    let packed = bytes[8];
    *pos += 9;

    let lct_flag = packed & 0x80 != 0;
    let lct_size = packed & 0x07;
    let local_color_table = if lct_flag {
        Some(read_color_table(data, pos, lct_size)?)
    } else {
        None
    };

    let lzw_min_code_size = *data.get(*pos).ok_or_else(|| GifError::Truncated {
        context: "lzw min code size".to_string(),
    })?;
    *pos += 1;

    let compressed = subblock::read_sub_blocks(data, pos)?;

    Ok(ImageBlock {
        descriptor: ImageDescriptor {
            left,
            top,
            width,
            height,
            interlace_flag: packed & 0x40 != 0,
            sort_flag: packed & 0x20 != 0,
        },
        local_color_table,
        lzw_min_code_size,
        compressed,
    })
}

fn parse_gce(data: &[u8], pos: &mut usize) -> Result<GraphicControlExtension, GifError> {
    let bytes = data
        .get(*pos..*pos + 6)
        .ok_or_else(|| GifError::Truncated {
            context: "graphic control extension".to_string(),
        })?;
    // bytes[0] is the fixed block size (0x04); bytes[5] is the terminator.
    let packed = bytes[1];
    let delay_time = u16::from_le_bytes([bytes[2], bytes[3]]);
    let transparent_color_index = bytes[4];
    *pos += 6;

    Ok(GraphicControlExtension {
        disposal_method: (packed >> 2) & 0x07,
        user_input_flag: packed & 0x02 != 0,
        transparent_color_flag: packed & 0x01 != 0,
        transparent_color_index,
        delay_time,
    })
}

fn parse_comment(data: &[u8], pos: &mut usize) -> Result<String, GifError> {
    let bytes = subblock::read_sub_blocks(data, pos)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn parse_application(data: &[u8], pos: &mut usize) -> Result<BodyBlock, GifError> {
    let bytes = data
        .get(*pos..*pos + 12)
        .ok_or_else(|| GifError::Truncated {
            context: "application extension header".to_string(),
        })?;
    // bytes[0] is the fixed block size (0x0B).
    let mut identifier = [0u8; 8];
    identifier.copy_from_slice(&bytes[1..9]);
    let mut auth_code = [0u8; 3];
    auth_code.copy_from_slice(&bytes[9..12]);
    *pos += 12;

    let payload = subblock::read_sub_blocks(data, pos)?;
    let loop_count = if identifier == *b"NETSCAPE" && auth_code == *b"2.0" && payload.len() >= 3
        && payload[0] == 1
    {
        Some(u16::from_le_bytes([payload[1], payload[2]]))
    } else {
        None
    };

    Ok(BodyBlock::Application {
        identifier,
        auth_code,
        loop_count,
    })
}

fn parse_plain_text(data: &[u8], pos: &mut usize) -> Result<(), GifError> {
    let header_len = *data.get(*pos).ok_or_else(|| GifError::Truncated {
        context: "plain text header size".to_string(),
    })? as usize;
    let end = pos.checked_add(1 + header_len).filter(|&e| e <= data.len());
    *pos = end.ok_or_else(|| GifError::Truncated {
        context: "plain text header".to_string(),
    })?;
    subblock::read_sub_blocks(data, pos)?;
    Ok(())
}

// --- Emitter -----------------------------------------------------------

/// Appends the magic, LSD and GCT for a `GIF89a` stream of the given
/// logical size and global color table.
pub fn write_header(out: &mut Vec<u8>, width: u16, height: u16, gct: &ColorTable) {
    out.extend_from_slice(&MAGIC_89A);
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());

    let packed = 0x80 | (0x07 << 4) | gct.size_field();
    out.push(packed);
    out.push(0); // background color index
    out.push(0); // pixel aspect ratio

    write_color_table(out, gct);
}

fn write_color_table(out: &mut Vec<u8>, table: &ColorTable) {
    for &[r, g, b] in table.entries() {
        out.extend_from_slice(&[r, g, b]);
    }
}

/// Appends a NETSCAPE2.0 application extension requesting `loop_count`
/// additional loops (0 = forever).
pub fn write_netscape_loop(out: &mut Vec<u8>, loop_count_field: u16) {
    out.push(0x21);
    out.push(0xFF);
    out.push(0x0B);
    out.extend_from_slice(b"NETSCAPE2.0");
    out.push(0x03);
    out.push(0x01);
    out.extend_from_slice(&loop_count_field.to_le_bytes());
    out.push(0x00);
}

/// Appends a Comment Extension carrying `text`.
pub fn write_comment(out: &mut Vec<u8>, text: &str) {
    out.push(0x21);
    out.push(0xFE);
    subblock::write_sub_blocks(out, text.as_bytes());
}

/// Appends a Graphic Control Extension for the upcoming image block.
pub fn write_gce(out: &mut Vec<u8>, gce: &GraphicControlExtension) {
    out.push(0x21);
    out.push(0xF9);
    out.push(0x04);
    let packed = ((gce.disposal_method & 0x07) << 2)
        | (u8::from(gce.user_input_flag) << 1)
        | u8::from(gce.transparent_color_flag);
    out.push(packed);
    out.extend_from_slice(&gce.delay_time.to_le_bytes());
    out.push(gce.transparent_color_index);
    out.push(0x00);
}

/// Appends one image block: descriptor (no local color table — this
/// encoder always relies on the GCT), LZW min code size and the
/// sub-block-framed compressed pixel data.
pub fn write_image_block(
    out: &mut Vec<u8>,
    descriptor: &ImageDescriptor,
    lzw_min_code_size: u8,
    compressed: &[u8],
) {
    out.push(0x2C);
    out.extend_from_slice(&descriptor.left.to_le_bytes());
    out.extend_from_slice(&descriptor.top.to_le_bytes());
    out.extend_from_slice(&descriptor.width.to_le_bytes());
    out.extend_from_slice(&descriptor.height.to_le_bytes());
    let packed =
        (u8::from(descriptor.interlace_flag) << 6) | (u8::from(descriptor.sort_flag) << 5);
    out.push(packed);

    out.push(lzw_min_code_size);
    subblock::write_sub_blocks(out, compressed);
}

pub fn write_trailer(out: &mut Vec<u8>) {
    out.push(0x3B);
}
