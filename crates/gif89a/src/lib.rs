//! Decoder and encoder for the GIF89a image format.
//!
//! Three coupled pieces do the work: [`container`] parses/emits the
//! structural byte layout, [`lzw`] handles the variable-width
//! compressed pixel data, and [`compositor`] applies disposal methods
//! and transparency to reconstruct the visible frame sequence. This
//! module wires them together behind [`decode`]/[`encode`].

mod bitstream;
mod compositor;
mod container;
mod lzw;
mod subblock;

use std::collections::HashMap;

use tracing::{debug, instrument, span, warn, Level};

pub use common_types::{
    Color, ColorTable, Diagnostics, Frame, Gif, GifError, NullDiagnostics, TracingDiagnostics,
};

use container::{GraphicControlExtension, ImageDescriptor};

/// Options for [`decode_with`]. The zero-value (`Default`) behaves like
/// the bare [`decode`] entry point.
#[derive(Default)]
pub struct DecodeOptions<'a> {
    pub diagnostics: Option<&'a dyn Diagnostics>,
}

/// Decodes a GIF87a/GIF89a byte stream into a fully-composed [`Gif`].
/// Non-fatal anomalies (unrecognized application extensions) are
/// reported through `tracing::warn!`; use [`decode_with`] to supply a
/// different [`Diagnostics`] sink.
#[instrument(level = "info", skip(bytes))]
pub fn decode(bytes: &[u8]) -> Result<Gif, GifError> {
    decode_with(bytes, &DecodeOptions::default())
}

/// Decodes a GIF87a/GIF89a byte stream, routing diagnostics through
/// `options.diagnostics` (defaulting to `tracing::warn!` when `None`).
pub fn decode_with(bytes: &[u8], options: &DecodeOptions<'_>) -> Result<Gif, GifError> {
    let span = span!(Level::INFO, "gif_decode", input_bytes = bytes.len());
    let _guard = span.enter();

    let container = container::parse(bytes)?;
    debug!(
        blocks = container.blocks.len(),
        width = container.lsd.width,
        height = container.lsd.height,
        "parsed container"
    );

    let result = match options.diagnostics {
        Some(sink) => compositor::compose(&container, sink),
        None => compositor::compose(&container, &TracingDiagnostics),
    };

    match &result {
        Ok(gif) => debug!(frames = gif.images.len(), "decode complete"),
        Err(err) => warn!(error = %err, code = err.code(), "decode failed"),
    }
    result
}

/// Encodes a [`Gif`] into a byte-exact `GIF89a` stream: one image block
/// per frame, a shared global color table built by [`build_palette`],
/// an optional per-frame Graphic Control Extension, and a NETSCAPE2.0
/// loop extension when the animation should repeat.
#[instrument(level = "info", skip(gif), fields(frames = gif.images.len()))]
pub fn encode(gif: &Gif) -> Result<Vec<u8>, GifError> {
    let span = span!(Level::INFO, "gif_encode", frames = gif.images.len());
    let _guard = span.enter();

    for (index, frame) in gif.images.iter().enumerate() {
        validate_frame(gif, index, frame)?;
    }

    let (table, index_of, transparent_index) = build_palette_indexed(&gif.images)?;
    let min_code_size = (table.size_field() + 1).max(2);

    let mut out = Vec::new();
    container::write_header(&mut out, gif.width, gif.height, &table);

    for comment in &gif.comments {
        container::write_comment(&mut out, comment);
    }

    if gif.images.len() > 1 || gif.loop_count != 1 {
        let loop_field = if gif.loop_count == 0 {
            0
        } else {
            gif.loop_count - 1
        };
        container::write_netscape_loop(&mut out, loop_field);
    }

    for frame in &gif.images {
        let indices = frame_indices(frame, &index_of, transparent_index);
        let has_transparent_pixel = transparent_index.is_some()
            && frame.pixels.chunks_exact(4).any(|p| p[3] == 0);

        if has_transparent_pixel || frame.delay_ms != 0 {
            container::write_gce(
                &mut out,
                &GraphicControlExtension {
                    disposal_method: 1,
                    user_input_flag: frame.user_input,
                    transparent_color_flag: has_transparent_pixel,
                    transparent_color_index: transparent_index.unwrap_or(0),
                    delay_time: (frame.delay_ms / 10) as u16,
                },
            );
        }

        let descriptor = ImageDescriptor {
            left: 0,
            top: 0,
            width: gif.width,
            height: gif.height,
            interlace_flag: false,
            sort_flag: false,
        };
        let compressed = lzw::compress(&indices, min_code_size);
        container::write_image_block(&mut out, &descriptor, min_code_size, &compressed);
    }

    container::write_trailer(&mut out);

    debug!(output_bytes = out.len(), "encode complete");
    Ok(out)
}

fn validate_frame(gif: &Gif, index: usize, frame: &Frame) -> Result<(), GifError> {
    let expected = gif.width as usize * gif.height as usize * 4;
    if frame.pixels.len() != expected {
        return Err(GifError::InvalidFrameSize {
            index,
            actual: frame.pixels.len(),
            expected,
        });
    }
    for (pixel_index, pixel) in frame.pixels.chunks_exact(4).enumerate() {
        let alpha = pixel[3];
        if alpha != 0 && alpha != 255 {
            return Err(GifError::InvalidAlpha {
                index,
                pixel_index,
                alpha,
            });
        }
    }
    Ok(())
}

/// Collects the set of unique RGB values across all frames; if any
/// pixel is transparent, reserves index 0 for it. Pads to the next
/// power of two in `[2, 256]` with black.
pub fn build_palette(frames: &[Frame]) -> Result<ColorTable, GifError> {
    let (table, _, _) = build_palette_indexed(frames)?;
    Ok(table)
}

fn build_palette_indexed(
    frames: &[Frame],
) -> Result<(ColorTable, HashMap<Color, u8>, Option<u8>), GifError> {
    let has_transparency = frames
        .iter()
        .any(|f| f.pixels.chunks_exact(4).any(|p| p[3] == 0));

    // Collected separately from the reserved transparent slot: a real
    // opaque pixel that happens to be black must not collide with index
    // 0's "arbitrary" RGB and be mistaken for a transparent pixel.
    let mut real_colors: Vec<Color> = Vec::new();
    for frame in frames {
        for pixel in frame.pixels.chunks_exact(4) {
            if pixel[3] == 0 {
                continue;
            }
            let color: Color = [pixel[0], pixel[1], pixel[2]];
            if !real_colors.contains(&color) {
                real_colors.push(color);
            }
        }
    }

    let mut order: Vec<Color> = Vec::new();
    let transparent_index = if has_transparency {
        order.push([0, 0, 0]);
        Some(0u8)
    } else {
        None
    };

    let total = order.len() + real_colors.len();
    if total > 256 {
        return Err(GifError::PaletteTooLarge { count: total });
    }

    let mut index_of: HashMap<Color, u8> = HashMap::new();
    for color in real_colors {
        let idx = order.len() as u8;
        order.push(color);
        index_of.entry(color).or_insert(idx);
    }

    let table = common_types::pad_to_power_of_two(order);
    Ok((table, index_of, transparent_index))
}

fn frame_indices(frame: &Frame, index_of: &HashMap<Color, u8>, transparent_index: Option<u8>) -> Vec<u8> {
    frame
        .pixels
        .chunks_exact(4)
        .map(|pixel| {
            if pixel[3] == 0 {
                transparent_index.unwrap_or(0)
            } else {
                let color: Color = [pixel[0], pixel[1], pixel[2]];
                index_of.get(&color).copied().unwrap_or(0)
            }
        })
        .collect()
}
