//! GIF's data-sub-block framing: length-prefixed chunks of 1..255 bytes
//! terminated by a zero-length block. Every LZW byte stream and every
//! extension's payload (comment, application, plain text) is carried
//! through this framing.

use common_types::GifError;

/// Reads sub-blocks starting at `*pos`, concatenating their payloads,
/// and advances `*pos` past the zero-length terminator.
pub fn read_sub_blocks(data: &[u8], pos: &mut usize) -> Result<Vec<u8>, GifError> {
    let mut out = Vec::new();
    loop {
        let len = *data.get(*pos).ok_or_else(|| GifError::Truncated {
            context: "sub-block length".to_string(),
        })? as usize;
        *pos += 1;
        if len == 0 {
            return Ok(out);
        }
        let end = *pos + len;
        let chunk = data.get(*pos..end).ok_or_else(|| GifError::Truncated {
            context: "sub-block payload".to_string(),
        })?;
        out.extend_from_slice(chunk);
        *pos = end;
    }
}

/// Splits `payload` into sub-blocks of at most 255 bytes and appends a
/// zero-length terminator.
pub fn write_sub_blocks(out: &mut Vec<u8>, payload: &[u8]) {
    for chunk in payload.chunks(255) {
        out.push(chunk.len() as u8);
        out.extend_from_slice(chunk);
    }
    out.push(0);
}
