/// Number of quantization levels per bar.
pub const LEVELS: u8 = 5;

/// Dot patterns for levels 0..=4 within one braille column, filling from
/// the bottom dot upwards.
const FILL_PATTERNS: [u8; LEVELS as usize] = [0x0, 0x8, 0xc, 0xe, 0xf];

/// Braille atlas indexed by `left | right << 4`, where each nibble holds the
/// dots of one column from top (bit 0) to bottom (bit 3).
pub const GLYPHS: [char; 256] = braille_atlas();

const fn braille_atlas() -> [char; 256] {
    // column bit -> Unicode braille dot bit
    const LEFT_DOTS: [u32; 4] = [0x01, 0x02, 0x04, 0x40];
    const RIGHT_DOTS: [u32; 4] = [0x08, 0x10, 0x20, 0x80];

    let mut table = ['\u{2800}'; 256];
    let mut code = 0;
    while code < 256 {
        let mut dots = 0;
        let mut bit = 0;
        while bit < 4 {
            if code & (1 << bit) != 0 {
                dots |= LEFT_DOTS[bit];
            }
            if code & (1 << (bit + 4)) != 0 {
                dots |= RIGHT_DOTS[bit];
            }
            bit += 1;
        }
        table[code] = match char::from_u32(0x2800 + dots) {
            Some(glyph) => glyph,
            None => '\u{2800}',
        };
        code += 1;
    }
    table
}

/// Atlas index for a pair of levels. Levels above 4 are treated as 4.
pub fn code(left: u8, right: u8) -> u8 {
    let pattern = |level: u8| FILL_PATTERNS[usize::from(level.min(LEVELS - 1))];
    pattern(left) | (pattern(right) << 4)
}

/// Glyph showing `left` and `right` as two bars side by side.
pub fn encode(left: u8, right: u8) -> char {
    GLYPHS[usize::from(code(left, right))]
}
