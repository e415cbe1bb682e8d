//! Helvetica metrics and WinAnsi (CP1252) encoding for the standard Type1 fonts.
//!
//! Widths are in 1/1000 em from the Adobe core font AFM files. Accented Latin-1 letters take
//! the width of their base letter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

/// ASCII 32..=126.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn ascii_width(face: Face, c: char) -> Option<u16> {
    let table = match face {
        Face::Regular => &HELVETICA,
        Face::Bold => &HELVETICA_BOLD,
    };
    let code = c as usize;
    (32..=126).contains(&code).then(|| table[code - 32])
}

fn base_letter(c: char) -> Option<char> {
    let base = match c {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ð' => 'D',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' | 'Ÿ' => 'Y',
        'Š' => 'S',
        'Ž' => 'Z',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' => 's',
        'ž' => 'z',
        _ => return None,
    };
    Some(base)
}

/// Glyph width in 1/1000 em.
pub fn char_width(face: Face, c: char) -> u16 {
    if let Some(w) = ascii_width(face, c) {
        return w;
    }
    if let Some(w) = base_letter(c).and_then(|b| ascii_width(face, b)) {
        return w;
    }
    match (c, face) {
        ('\u{a0}', _) => 278,
        ('Æ' | 'Œ' | '—' | '…' | '‰', _) => 1000,
        ('æ', _) => 889,
        ('œ', _) => 944,
        ('ß', _) => 611,
        ('°', _) => 400,
        ('•', _) => 350,
        ('‘' | '’', Face::Regular) => 222,
        ('‘' | '’', Face::Bold) => 278,
        ('“' | '”', Face::Regular) => 333,
        ('“' | '”', Face::Bold) => 500,
        _ => 556,
    }
}

/// Width of `text` in points at `size`.
pub fn text_width(face: Face, text: &str, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(face, c))).sum();
    units as f32 * size / 1000.0
}

/// Encodes to CP1252. Characters outside the code page become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code < 0x80 || (0xa0..=0xff).contains(&code) {
                return code as u8;
            }
            match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8a,
                '‹' => 0x8b,
                'Œ' => 0x8c,
                'Ž' => 0x8e,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9a,
                '›' => 0x9b,
                'œ' => 0x9c,
                'ž' => 0x9e,
                'Ÿ' => 0x9f,
                _ => b'?',
            }
        })
        .collect()
}

/// Greedy word wrap. Words longer than `max_width` get a line of their own.
pub fn wrap(face: Face, text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", current, word);
        if text_width(face, &candidate, size) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_from_afm() {
        assert_eq!(char_width(Face::Regular, 'W'), 944);
        assert_eq!(char_width(Face::Regular, 'i'), 222);
        assert_eq!(char_width(Face::Bold, 'i'), 278);
        assert_eq!(char_width(Face::Regular, 'é'), char_width(Face::Regular, 'e'));
        assert!((text_width(Face::Regular, "Hello", 10.0) - 22.78).abs() < 0.01);
    }

    #[test]
    fn encodes_cp1252() {
        assert_eq!(encode_win_ansi("Zürich"), b"Z\xfcrich".to_vec());
        assert_eq!(encode_win_ansi("l’été – 5 €"), b"l\x92\xe9t\xe9 \x96 5 \x80".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn wraps_at_width() {
        let lines = wrap(Face::Regular, "aaa bbb ccc ddd", 10.0, 40.0);
        // "aaa bbb" = 7 glyphs, 6 * 5.56 + 2.78 = 36.14pt
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
        assert_eq!(wrap(Face::Regular, "   ", 10.0, 40.0), Vec::<String>::new());
        assert_eq!(
            wrap(Face::Regular, "extraordinarily short", 10.0, 20.0),
            vec!["extraordinarily", "short"]
        );
    }
}
