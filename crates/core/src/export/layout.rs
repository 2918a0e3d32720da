//! Page geometry, Helvetica metrics and line breaking for PDF export.
//!
//! All coordinates are PDF points on a US Letter page with the origin at the
//! bottom-left corner. Text is measured in WinAnsi bytes so that the widths
//! used for wrapping match the glyphs the viewer will draw.

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;
pub const MARGIN_X: i64 = 50;
pub const TEXT_WIDTH: i64 = PAGE_WIDTH - 2 * MARGIN_X;

pub const TITLE_FONT_SIZE: i64 = 16;
pub const TITLE_Y: i64 = PAGE_HEIGHT - 50;

pub const BODY_FONT_SIZE: i64 = 12;
pub const LINE_SPACING: i64 = 14;
pub const BODY_TOP: i64 = PAGE_HEIGHT - 80;
pub const BODY_TOP_BELOW_IMAGE: i64 = PAGE_HEIGHT - 350;
pub const CONTINUATION_TOP: i64 = PAGE_HEIGHT - 50;
pub const BOTTOM_MARGIN: i64 = 50;

pub const IMAGE_BOX: ImageBox = ImageBox {
    x: MARGIN_X,
    y: PAGE_HEIGHT - 320,
    width: 500,
    height: 250,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl ImageBox {
    /// Largest placement of a `width` x `height` image inside the box that
    /// keeps its aspect ratio, centred on both axes.
    pub fn fit(&self, width: u32, height: u32) -> ImageBox {
        if width == 0 || height == 0 {
            return *self;
        }
        let scale = (self.width as f64 / f64::from(width)).min(self.height as f64 / f64::from(height));
        let fitted_width = (f64::from(width) * scale).round() as i64;
        let fitted_height = (f64::from(height) * scale).round() as i64;
        ImageBox {
            x: self.x + (self.width - fitted_width) / 2,
            y: self.y + (self.height - fitted_height) / 2,
            width: fitted_width,
            height: fitted_height,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedLine {
    pub y: i64,
    pub text: Vec<u8>,
}

const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
    334, 260, 334, 584, // '{'..'~'
];

const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // 0xA0
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // 0xB0
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // 0xC0
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // 0xD0
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // 0xE0
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // 0xF0
];

const DEFAULT_WIDTH: u16 = 556;

/// Helvetica advance width of a WinAnsi byte, in thousandths of the font size.
pub fn glyph_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => ASCII_WIDTHS[usize::from(byte - 0x20)],
        0xA0..=0xFF => LATIN1_WIDTHS[usize::from(byte - 0xA0)],
        0x82 | 0x91 | 0x92 => 222,
        0x84 | 0x88 | 0x8B | 0x93 | 0x94 | 0x98 | 0x9B => 333,
        0x85 | 0x89 | 0x8C | 0x97 | 0x99 => 1000,
        0x95 => 350,
        0x9C => 944,
        0x8A | 0x9F => 667,
        0x8E => 611,
        0x9A | 0x9E => 500,
        _ => DEFAULT_WIDTH,
    }
}

fn win_ansi_byte(ch: char) -> Option<u8> {
    let code = u32::from(ch);
    match code {
        0x20..=0x7E | 0xA0..=0xFF => u8::try_from(code).ok(),
        _ => match ch {
            '\t' => Some(b' '),
            '€' => Some(0x80),
            '‚' => Some(0x82),
            'ƒ' => Some(0x83),
            '„' => Some(0x84),
            '…' => Some(0x85),
            '†' => Some(0x86),
            '‡' => Some(0x87),
            'ˆ' => Some(0x88),
            '‰' => Some(0x89),
            'Š' => Some(0x8A),
            '‹' => Some(0x8B),
            'Œ' => Some(0x8C),
            'Ž' => Some(0x8E),
            '‘' => Some(0x91),
            '’' => Some(0x92),
            '“' => Some(0x93),
            '”' => Some(0x94),
            '•' => Some(0x95),
            '–' => Some(0x96),
            '—' => Some(0x97),
            '˜' => Some(0x98),
            '™' => Some(0x99),
            'š' => Some(0x9A),
            '›' => Some(0x9B),
            'œ' => Some(0x9C),
            'ž' => Some(0x9E),
            'Ÿ' => Some(0x9F),
            _ => None,
        },
    }
}

/// Encodes text for a WinAnsi Type1 font. Unencodable characters (emoji,
/// CJK, control characters) are dropped.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().filter_map(win_ansi_byte).collect()
}

/// Width of encoded text in thousandths of a point.
pub fn text_width(text: &[u8], font_size: i64) -> i64 {
    text.iter().map(|b| i64::from(glyph_width(*b))).sum::<i64>() * font_size
}

fn fits(text: &[u8], font_size: i64, max_width: i64) -> bool {
    text_width(text, font_size) <= max_width * 1000
}

/// Greedy word wrap of one source line. A blank line yields one empty line;
/// a word wider than `max_width` is broken between characters.
pub fn wrap_line(line: &str, font_size: i64, max_width: i64) -> Vec<Vec<u8>> {
    let encoded = encode_win_ansi(line);
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for word in encoded.split(|b| *b == b' ').filter(|w| !w.is_empty()) {
        if !current.is_empty() {
            let mut candidate = current.clone();
            candidate.push(b' ');
            candidate.extend_from_slice(word);
            if fits(&candidate, font_size, max_width) {
                current = candidate;
                continue;
            }
            lines.push(std::mem::take(&mut current));
        }

        if fits(word, font_size, max_width) {
            current.extend_from_slice(word);
            continue;
        }

        for &byte in word {
            current.push(byte);
            if !fits(&current, font_size, max_width) && current.len() > 1 {
                current.pop();
                lines.push(std::mem::replace(&mut current, vec![byte]));
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Lays the body out onto pages. The first page starts at `first_top`;
/// continuation pages start at [`CONTINUATION_TOP`]. Always returns at
/// least one page.
pub fn paginate(body: &str, first_top: i64) -> Vec<Vec<PlacedLine>> {
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = first_top;

    for source in body.split('\n') {
        for text in wrap_line(source.trim_end_matches('\r'), BODY_FONT_SIZE, TEXT_WIDTH) {
            if y <= BOTTOM_MARGIN {
                pages.push(Vec::new());
                y = CONTINUATION_TOP;
            }
            if let Some(page) = pages.last_mut() {
                page.push(PlacedLine { y, text });
            }
            y -= LINE_SPACING;
        }
    }

    pages
}
