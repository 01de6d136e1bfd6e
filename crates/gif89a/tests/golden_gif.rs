//! End-to-end coverage against hand-built byte fixtures and round trips
//! through the public `decode`/`encode` entry points.

use gif89a::{build_palette, decode, encode, Frame, Gif};

/// A 1x1 white-pixel GIF89a, built byte-by-byte against the format's
/// published layout (not through this crate's own encoder).
fn one_pixel_white_fixture() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"GIF89a");
    bytes.extend_from_slice(&1u16.to_le_bytes()); // width
    bytes.extend_from_slice(&1u16.to_le_bytes()); // height
    bytes.push(0xF0); // gct_flag + color res 7 + 2-color gct
    bytes.push(0); // bg color index
    bytes.push(0); // pixel aspect
    bytes.extend_from_slice(&[255, 255, 255, 0, 0, 0]); // GCT: white, black

    bytes.push(0x2C); // image separator
    bytes.extend_from_slice(&[0, 0, 0, 0]); // left, top
    bytes.extend_from_slice(&1u16.to_le_bytes()); // width
    bytes.extend_from_slice(&1u16.to_le_bytes()); // height
    bytes.push(0x00); // no local color table, no interlace

    bytes.push(0x02); // lzw min code size
                       // CLEAR(4), index 0, END(5) at code width 3, LSB-first packed.
    bytes.extend_from_slice(&[0x02, 0x44, 0x01, 0x00]); // sub-block + terminator

    bytes.push(0x3B); // trailer
    bytes
}

fn fixture_with_comment(comment: &str) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"GIF89a");
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.push(0xF0);
    bytes.push(0);
    bytes.push(0);
    bytes.extend_from_slice(&[255, 255, 255, 0, 0, 0]);

    bytes.push(0x21); // extension introducer
    bytes.push(0xFE); // comment label
    bytes.push(comment.len() as u8);
    bytes.extend_from_slice(comment.as_bytes());
    bytes.push(0x00);

    bytes.push(0x2C);
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.push(0x00);
    bytes.push(0x02);
    bytes.extend_from_slice(&[0x02, 0x44, 0x01, 0x00]);

    bytes.push(0x3B);
    bytes
}

#[test]
fn decodes_one_pixel_white_gif() {
    let gif = decode(&one_pixel_white_fixture()).unwrap();
    assert_eq!((gif.width, gif.height), (1, 1));
    assert_eq!(gif.images.len(), 1);
    assert_eq!(gif.images[0].pixels, vec![255, 255, 255, 255]);
    assert!(gif.comments.is_empty());
}

#[test]
fn decodes_single_comment_sub_block() {
    let gif = decode(&fixture_with_comment("Created with GIMP")).unwrap();
    assert_eq!(gif.comments, vec!["Created with GIMP".to_string()]);
}

#[test]
fn multi_frame_gradient_round_trips_through_composition() {
    let width = 8u16;
    let height = 8u16;
    let mut gif = Gif::new(width, height);
    for frame_idx in 0..4u8 {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            for x in 0..width {
                let v = ((x as u32 + y as u32 * 8 + frame_idx as u32 * 16) % 256) as u8;
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        gif.images.push(Frame {
            pixels,
            delay_ms: 100,
            user_input: false,
        });
    }

    let bytes = encode(&gif).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.images.len(), 4);
    for (original, composed) in gif.images.iter().zip(decoded.images.iter()) {
        assert_eq!(original.pixels, composed.pixels);
        assert_eq!(composed.pixels.len(), width as usize * height as usize * 4);
    }
}

#[test]
fn transparent_circle_has_alpha_zero_inside_and_255_outside() {
    let size = 16u16;
    let center = 7.5f32;
    let radius = 6.0f32;

    let mut gif = Gif::new(size, size);
    for _ in 0..2 {
        let mut pixels = Vec::with_capacity(size as usize * size as usize * 4);
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 - center;
                let dy = y as f32 - center;
                if (dx * dx + dy * dy).sqrt() <= radius {
                    pixels.extend_from_slice(&[0, 0, 0, 0]);
                } else {
                    pixels.extend_from_slice(&[10, 20, 30, 255]);
                }
            }
        }
        gif.images.push(Frame {
            pixels,
            delay_ms: 50,
            user_input: false,
        });
    }

    let bytes = encode(&gif).unwrap();
    let decoded = decode(&bytes).unwrap();

    for frame in &decoded.images {
        for (i, pixel) in frame.pixels.chunks_exact(4).enumerate() {
            let x = (i % size as usize) as f32;
            let y = (i / size as usize) as f32;
            let dx = x - center;
            let dy = y - center;
            let inside = (dx * dx + dy * dy).sqrt() <= radius;
            if inside {
                assert_eq!(pixel[3], 0, "pixel {i} should be transparent");
            } else {
                assert_eq!(pixel[3], 255, "pixel {i} should be opaque");
            }
        }
    }
}

#[test]
fn encode_then_decode_matches_hand_built_fixture() {
    let mut gif = Gif::new(1, 1);
    gif.images.push(Frame {
        pixels: vec![255, 255, 255, 255],
        delay_ms: 0,
        user_input: false,
    });

    let encoded = encode(&gif).unwrap();
    let roundtrip = decode(&encoded).unwrap();
    let fixture = decode(&one_pixel_white_fixture()).unwrap();

    assert_eq!(roundtrip.width, fixture.width);
    assert_eq!(roundtrip.height, fixture.height);
    assert_eq!(roundtrip.images.len(), fixture.images.len());
    assert_eq!(roundtrip.images[0].pixels, fixture.images[0].pixels);
}

#[test]
fn two_frame_animation_with_infinite_loop_round_trips_loop_count() {
    let mut gif = Gif::new(2, 2);
    gif.loop_count = 0;
    for value in [0u8, 255u8] {
        gif.images.push(Frame {
            pixels: vec![value; 2 * 2 * 4],
            delay_ms: 20,
            user_input: false,
        });
    }

    let bytes = encode(&gif).unwrap();
    assert!(
        bytes.windows(b"NETSCAPE2.0".len()).any(|w| w == b"NETSCAPE2.0"),
        "encoded stream should carry a NETSCAPE2.0 loop extension"
    );

    let decoded = decode(&bytes).unwrap();
    assert_eq!(decoded.loop_count, 0);
}

#[test]
fn deterministic_encoding_produces_identical_bytes() {
    let mut gif = Gif::new(4, 4);
    gif.images.push(Frame {
        pixels: vec![1, 2, 3, 255].repeat(16),
        delay_ms: 10,
        user_input: false,
    });

    let first = encode(&gif).unwrap();
    let second = encode(&gif).unwrap();
    assert_eq!(first, second);

    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(&first);
    let digest = hasher.finalize();
    assert_eq!(digest.len(), 32);
}

#[test]
fn build_palette_pads_to_power_of_two() {
    let frames = vec![Frame {
        pixels: vec![1, 2, 3, 255, 4, 5, 6, 255, 7, 8, 9, 255],
        delay_ms: 0,
        user_input: false,
    }];
    let table = build_palette(&frames).unwrap();
    assert_eq!(table.len(), 4); // 3 colors padded to next power of two
}
