//! Applies the decoded image-block stream to a persistent RGBA canvas,
//! honoring each block's Graphic Control Extension (disposal method,
//! transparency, delay) to produce the public frame sequence.

use common_types::{Color, ColorTable, Diagnostics, Frame, Gif, GifError};

use crate::container::{BodyBlock, Container, GraphicControlExtension, ImageBlock};
use crate::lzw;

struct Canvas {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl Canvas {
    fn filled(width: u16, height: u16, background: [u8; 4]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&background);
        }
        Canvas { width, height, pixels }
    }

    fn set(&mut self, x: u16, y: u16, rgba: [u8; 4]) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&rgba);
    }

    fn fill_rect(&mut self, left: u16, top: u16, width: u16, height: u16, rgba: [u8; 4]) {
        let bottom = top.saturating_add(height).min(self.height);
        let right = left.saturating_add(width).min(self.width);
        for y in top..bottom {
            for x in left..right {
                self.set(x, y, rgba);
            }
        }
    }
}

fn background_rgba(gct: Option<&ColorTable>, bg_color_index: u8) -> [u8; 4] {
    match gct.and_then(|t| t.get(bg_color_index as usize)) {
        Some([r, g, b]) => [r, g, b, 255],
        None => [0, 0, 0, 255],
    }
}

/// Decodes one image block's LZW payload into RGBA pixels sized to its
/// own rectangle, using `table` and the GCE's transparency setting.
fn decode_image_pixels(
    image: &ImageBlock,
    table: &ColorTable,
    gce: &GraphicControlExtension,
) -> Result<Vec<[u8; 4]>, GifError> {
    let indices = lzw::decompress(&image.compressed, image.lzw_min_code_size)?;
    let expected = image.descriptor.width as usize * image.descriptor.height as usize;
    if indices.len() < expected {
        return Err(GifError::LzwDecodeError {
            message: format!(
                "decoded {} indices, expected {} for a {}x{} image",
                indices.len(),
                expected,
                image.descriptor.width,
                image.descriptor.height
            ),
        });
    }

    let mut pixels = Vec::with_capacity(expected);
    for &index in &indices[..expected] {
        let is_transparent =
            gce.transparent_color_flag && index as u16 == gce.transparent_color_index as u16;
        if is_transparent {
            pixels.push([0, 0, 0, 0]);
            continue;
        }
        let color: Color = table.get(index as usize).ok_or_else(|| GifError::LzwDecodeError {
            message: format!("index {index} exceeds color table size {}", table.len()),
        })?;
        pixels.push([color[0], color[1], color[2], 255]);
    }
    Ok(pixels)
}

/// Walks a parsed [`Container`] and reconstructs the public [`Gif`]:
/// composed RGBA frames, loop count, and concatenated comment text.
pub fn compose(container: &Container, diagnostics: &dyn Diagnostics) -> Result<Gif, GifError> {
    let width = container.lsd.width;
    let height = container.lsd.height;
    let background = background_rgba(container.global_color_table.as_ref(), container.lsd.bg_color_index);

    let mut canvas = Canvas::filled(width, height, background);
    let mut previous_canvas: Option<Vec<u8>> = None;
    let mut pending_gce: Option<GraphicControlExtension> = None;
    let mut loop_count: u16 = 1;
    let mut comments = Vec::new();
    let mut frames = Vec::new();

    for block in &container.blocks {
        match block {
            BodyBlock::GraphicControl(gce) => {
                pending_gce = Some(*gce);
            }
            BodyBlock::Comment(text) => {
                comments.push(text.clone());
            }
            BodyBlock::Application {
                identifier,
                loop_count: Some(raw),
                ..
            } => {
                loop_count = if *raw == 0 { 0 } else { raw.saturating_add(1) };
                let _ = identifier;
            }
            BodyBlock::Application {
                identifier,
                loop_count: None,
                ..
            } => {
                diagnostics.note(&format!(
                    "unrecognized application extension {:?}",
                    String::from_utf8_lossy(identifier)
                ));
            }
            BodyBlock::PlainText => {}
            BodyBlock::Image(image) => {
                let table = image
                    .local_color_table
                    .as_ref()
                    .or(container.global_color_table.as_ref())
                    .ok_or(GifError::MissingColorTable {
                        left: image.descriptor.left,
                        top: image.descriptor.top,
                    })?;

                let left = image.descriptor.left;
                let top = image.descriptor.top;
                let w = image.descriptor.width;
                let h = image.descriptor.height;
                if left.saturating_add(w) > width || top.saturating_add(h) > height {
                    return Err(GifError::ImageOutOfBounds {
                        left,
                        top,
                        width: w,
                        height: h,
                        screen_width: width,
                        screen_height: height,
                    });
                }

                let gce = pending_gce.take().unwrap_or_default();
                let pixels = decode_image_pixels(image, table, &gce)?;

                if gce.disposal_method == 3 {
                    previous_canvas = Some(canvas.pixels.clone());
                } else {
                    previous_canvas = None;
                }

                for y in 0..h {
                    for x in 0..w {
                        let rgba = pixels[(y as usize) * (w as usize) + (x as usize)];
                        canvas.set(left + x, top + y, rgba);
                    }
                }

                frames.push(Frame {
                    pixels: canvas.pixels.clone(),
                    delay_ms: gce.delay_time as u32 * 10,
                    user_input: gce.user_input_flag,
                });

                match gce.disposal_method {
                    0 | 1 => {}
                    2 => canvas.fill_rect(left, top, w, h, background),
                    3 => {
                        if let Some(saved) = previous_canvas.take() {
                            canvas.pixels = saved;
                        }
                    }
                    other => return Err(GifError::UnknownDisposalMethod { method: other }),
                }
            }
        }
    }

    let mut gif = Gif::new(width, height);
    gif.loop_count = loop_count;
    gif.images = frames;
    gif.comments = comments;
    Ok(gif)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_types::NullDiagnostics;

    fn solid_image(
        left: u16,
        top: u16,
        width: u16,
        height: u16,
        index: u8,
        gce: Option<GraphicControlExtension>,
    ) -> Vec<BodyBlock> {
        let mut blocks = Vec::new();
        if let Some(gce) = gce {
            blocks.push(BodyBlock::GraphicControl(gce));
        }
        let indices = vec![index; width as usize * height as usize];
        let compressed = lzw::compress(&indices, 2);
        blocks.push(BodyBlock::Image(ImageBlock {
            descriptor: crate::container::ImageDescriptor {
                left,
                top,
                width,
                height,
                interlace_flag: false,
                sort_flag: false,
            },
            local_color_table: None,
            lzw_min_code_size: 2,
            compressed,
        }));
        blocks
    }

    fn container_with(
        width: u16,
        height: u16,
        gct: Vec<Color>,
        blocks: Vec<BodyBlock>,
    ) -> Container {
        Container {
            lsd: crate::container::LogicalScreenDescriptor {
                width,
                height,
                color_resolution: 7,
                sort_flag: false,
                bg_color_index: 0,
                pixel_aspect: 0,
            },
            global_color_table: Some(ColorTable::new(gct)),
            blocks,
        }
    }

    #[test]
    fn composes_single_opaque_frame() {
        let blocks = solid_image(0, 0, 1, 1, 0, None);
        let container = container_with(1, 1, vec![[255, 255, 255], [0, 0, 0]], blocks);
        let gif = compose(&container, &NullDiagnostics).unwrap();
        assert_eq!(gif.images.len(), 1);
        assert_eq!(gif.images[0].pixels, vec![255, 255, 255, 255]);
    }

    #[test]
    fn transparent_pixel_is_emitted_as_see_through() {
        // First frame paints white; second, transparent, must show through
        // (A=0) on the emitted frame rather than keep the prior opaque pixel.
        let mut blocks = solid_image(0, 0, 1, 1, 0, None);
        blocks.extend(solid_image(
            0,
            0,
            1,
            1,
            1,
            Some(GraphicControlExtension {
                disposal_method: 1,
                user_input_flag: false,
                transparent_color_flag: true,
                transparent_color_index: 1,
                delay_time: 0,
            }),
        ));
        let container = container_with(1, 1, vec![[255, 255, 255], [0, 0, 0]], blocks);
        let gif = compose(&container, &NullDiagnostics).unwrap();
        assert_eq!(gif.images.len(), 2);
        assert_eq!(gif.images[1].pixels[3], 0);
    }

    #[test]
    fn disposal_method_three_restores_previous_canvas() {
        let mut blocks = solid_image(0, 0, 2, 2, 0, None); // white background frame
        blocks.extend(solid_image(
            0,
            0,
            1,
            1,
            1,
            Some(GraphicControlExtension {
                disposal_method: 3,
                user_input_flag: false,
                transparent_color_flag: false,
                transparent_color_index: 0,
                delay_time: 0,
            }),
        ));
        blocks.extend(solid_image(1, 1, 1, 1, 0, None));
        let container = container_with(2, 2, vec![[255, 255, 255], [0, 0, 0]], blocks);
        let gif = compose(&container, &NullDiagnostics).unwrap();
        assert_eq!(gif.images.len(), 3);
        // Third frame: the (0,0) pixel painted black by frame 2 must be
        // restored to white before frame 3 paints (1,1).
        let third = &gif.images[2].pixels;
        assert_eq!(&third[0..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn rejects_image_rect_outside_screen() {
        let blocks = solid_image(0, 0, 2, 2, 0, None);
        let container = container_with(1, 1, vec![[255, 255, 255], [0, 0, 0]], blocks);
        assert!(matches!(
            compose(&container, &NullDiagnostics),
            Err(GifError::ImageOutOfBounds { .. })
        ));
    }

    #[test]
    fn transparent_index_equal_to_background_index_still_shows_through() {
        // Background is GCT[0] = white; the only frame is fully
        // transparent at index 0 too. The index happening to equal the
        // background index must not be mistaken for opaque background —
        // the emitted frame still shows A=0.
        let blocks = solid_image(
            0,
            0,
            1,
            1,
            0,
            Some(GraphicControlExtension {
                disposal_method: 0,
                user_input_flag: false,
                transparent_color_flag: true,
                transparent_color_index: 0,
                delay_time: 0,
            }),
        );
        let container = container_with(1, 1, vec![[255, 255, 255], [0, 0, 0]], blocks);
        let gif = compose(&container, &NullDiagnostics).unwrap();
        assert_eq!(gif.images[0].pixels[3], 0);
    }

    #[test]
    fn missing_color_table_fails() {
        let blocks = solid_image(0, 0, 1, 1, 0, None);
        let container = Container {
            lsd: crate::container::LogicalScreenDescriptor {
                width: 1,
                height: 1,
                color_resolution: 7,
                sort_flag: false,
                bg_color_index: 0,
                pixel_aspect: 0,
            },
            global_color_table: None,
            blocks,
        };
        assert!(matches!(
            compose(&container, &NullDiagnostics),
            Err(GifError::MissingColorTable { .. })
        ));
    }
}
