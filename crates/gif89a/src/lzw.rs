//! Variable-width LZW, keyed by a starting code size, with the reserved
//! CLEAR/END codes GIF adds on top of the classic algorithm.
//!
//! Dictionary entries are stored as `(prefix_code, suffix_symbol)` pairs
//! with an implicit root table for codes `< 2^min_code_size`, rather than
//! materializing each entry as its own byte sequence.

use common_types::GifError;

use crate::bitstream::{BitReader, BitWriter};

const MAX_CODE_WIDTH: u8 = 12;
const MAX_DICT_SIZE: u16 = 1 << MAX_CODE_WIDTH;

#[derive(Clone, Copy)]
struct Entry {
    prefix: Option<u16>,
    suffix: u8,
}

struct Dictionary {
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    entries: Vec<Entry>,
    next_code: u16,
}

impl Dictionary {
    fn new(min_code_size: u8) -> Self {
        let clear_code = 1u16 << min_code_size;
        let end_code = clear_code + 1;
        let mut dict = Dictionary {
            min_code_size,
            clear_code,
            end_code,
            entries: Vec::with_capacity(MAX_DICT_SIZE as usize),
            next_code: 0,
        };
        dict.reset();
        dict
    }

    fn reset(&mut self) {
        self.entries.clear();
        for code in 0..self.clear_code {
            self.entries.push(Entry {
                prefix: None,
                suffix: code as u8,
            });
        }
        // Placeholders so `entries[code]` stays aligned for CLEAR/END;
        // they are never looked up since callers special-case those codes.
        self.entries.push(Entry {
            prefix: None,
            suffix: 0,
        });
        self.entries.push(Entry {
            prefix: None,
            suffix: 0,
        });
        self.next_code = self.end_code + 1;
    }

    fn is_full(&self) -> bool {
        self.next_code >= MAX_DICT_SIZE
    }

    fn add(&mut self, prefix: u16, suffix: u8) {
        self.entries.push(Entry {
            prefix: Some(prefix),
            suffix,
        });
        self.next_code += 1;
    }

    fn first_symbol(&self, code: u16) -> u8 {
        let mut cur = code;
        loop {
            let e = self.entries[cur as usize];
            match e.prefix {
                Some(p) => cur = p,
                None => return e.suffix,
            }
        }
    }

    fn sequence_for(&self, code: u16) -> Vec<u8> {
        let mut stack = Vec::new();
        let mut cur = code;
        loop {
            let e = self.entries[cur as usize];
            stack.push(e.suffix);
            match e.prefix {
                Some(p) => cur = p,
                None => break,
            }
        }
        stack.reverse();
        stack
    }
}

/// Decompresses an LZW byte stream (already de-sub-blocked) into the
/// original index sequence.
pub fn decompress(data: &[u8], min_code_size: u8) -> Result<Vec<u8>, GifError> {
    let mut dict = Dictionary::new(min_code_size);
    let mut code_width = min_code_size + 1;
    let mut prev: Option<u16> = None;
    let mut output = Vec::new();
    let mut reader = BitReader::new(data);

    loop {
        let code = reader.read_bits(code_width)?;

        if code == dict.clear_code {
            dict.reset();
            code_width = min_code_size + 1;
            prev = None;
            continue;
        }
        if code == dict.end_code {
            break;
        }

        let entry = if code < dict.next_code {
            dict.sequence_for(code)
        } else if code == dict.next_code {
            match prev {
                Some(p) => {
                    let mut seq = dict.sequence_for(p);
                    seq.push(dict.first_symbol(p));
                    seq
                }
                None => {
                    return Err(GifError::LzwDecodeError {
                        message: "KwKwK code with no previous code".to_string(),
                    })
                }
            }
        } else {
            return Err(GifError::LzwDecodeError {
                message: format!(
                    "code {code} exceeds dictionary size {}",
                    dict.next_code
                ),
            });
        };

        output.extend_from_slice(&entry);

        if let Some(p) = prev {
            if !dict.is_full() {
                dict.add(p, entry[0]);
                // The decoder learns of a new entry one code later than the
                // encoder did (it needs the *next* code's first symbol to
                // complete the pairing), so its table is permanently one
                // entry behind. Growing one threshold early compensates:
                // without it the decoder would still be reading the next
                // code at the old width after the encoder already bumped.
                if dict.next_code == (1u16 << code_width) - 1 && code_width < MAX_CODE_WIDTH {
                    code_width += 1;
                }
            }
        }

        prev = Some(code);
    }

    Ok(output)
}

/// Compresses a sequence of palette indices (each `< 2^min_code_size`)
/// into an LZW byte stream, byte-aligned at the end.
pub fn compress(indices: &[u8], min_code_size: u8) -> Vec<u8> {
    use std::collections::HashMap;

    let clear_code = 1u16 << min_code_size;
    let end_code = clear_code + 1;
    let mut next_code = end_code + 1;
    let mut code_width = min_code_size + 1;

    let mut writer = BitWriter::new();
    writer.write_bits(clear_code, code_width);

    // Keyed by (current buffered code, next symbol) -> extended code.
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut current: Option<u16> = None;

    for &symbol in indices {
        match current {
            None => current = Some(symbol as u16),
            Some(w) => {
                if let Some(&code) = table.get(&(w, symbol)) {
                    current = Some(code);
                } else {
                    writer.write_bits(w, code_width);
                    if next_code < MAX_DICT_SIZE {
                        table.insert((w, symbol), next_code);
                        next_code += 1;
                        if next_code == (1u16 << code_width) && code_width < MAX_CODE_WIDTH {
                            code_width += 1;
                        }
                    }
                    current = Some(symbol as u16);
                }
            }
        }
    }
    if let Some(w) = current {
        writer.write_bits(w, code_width);
    }
    writer.write_bits(end_code, code_width);
    writer.finish()
}
