//! Character width normalization and alnum counting.
//!
//! Mirrors `myaku.utils.normalize_char_width` / `get_alnum_count`: base forms
//! and article text are normalized so that katakana is always full-width and
//! latin letters/digits are always half-width, which is what lets lookups
//! like `base_form == query_str` be exact string comparisons.

/// Half-width katakana block (U+FF61..=U+FF9F), in the order jaconv/ICU
/// tables list them, mapped to their full-width equivalents. Combining
/// voiced/semi-voiced marks are folded into the preceding kana where a
/// precomposed full-width form exists.
const HALFWIDTH_KATAKANA: &[(char, &str)] = &[
    ('\u{FF61}', "。"),
    ('\u{FF62}', "「"),
    ('\u{FF63}', "」"),
    ('\u{FF64}', "、"),
    ('\u{FF65}', "・"),
    ('\u{FF66}', "ヲ"),
    ('\u{FF67}', "ァ"),
    ('\u{FF68}', "ィ"),
    ('\u{FF69}', "ゥ"),
    ('\u{FF6A}', "ェ"),
    ('\u{FF6B}', "ォ"),
    ('\u{FF6C}', "ャ"),
    ('\u{FF6D}', "ュ"),
    ('\u{FF6E}', "ョ"),
    ('\u{FF6F}', "ッ"),
    ('\u{FF70}', "ー"),
    ('\u{FF71}', "ア"),
    ('\u{FF72}', "イ"),
    ('\u{FF73}', "ウ"),
    ('\u{FF74}', "エ"),
    ('\u{FF75}', "オ"),
    ('\u{FF76}', "カ"),
    ('\u{FF77}', "キ"),
    ('\u{FF78}', "ク"),
    ('\u{FF79}', "ケ"),
    ('\u{FF7A}', "コ"),
    ('\u{FF7B}', "サ"),
    ('\u{FF7C}', "シ"),
    ('\u{FF7D}', "ス"),
    ('\u{FF7E}', "セ"),
    ('\u{FF7F}', "ソ"),
    ('\u{FF80}', "タ"),
    ('\u{FF81}', "チ"),
    ('\u{FF82}', "ツ"),
    ('\u{FF83}', "テ"),
    ('\u{FF84}', "ト"),
    ('\u{FF85}', "ナ"),
    ('\u{FF86}', "ニ"),
    ('\u{FF87}', "ヌ"),
    ('\u{FF88}', "ネ"),
    ('\u{FF89}', "ノ"),
    ('\u{FF8A}', "ハ"),
    ('\u{FF8B}', "ヒ"),
    ('\u{FF8C}', "フ"),
    ('\u{FF8D}', "ヘ"),
    ('\u{FF8E}', "ホ"),
    ('\u{FF8F}', "マ"),
    ('\u{FF90}', "ミ"),
    ('\u{FF91}', "ム"),
    ('\u{FF92}', "メ"),
    ('\u{FF93}', "モ"),
    ('\u{FF94}', "ヤ"),
    ('\u{FF95}', "ユ"),
    ('\u{FF96}', "ヨ"),
    ('\u{FF97}', "ラ"),
    ('\u{FF98}', "リ"),
    ('\u{FF99}', "ル"),
    ('\u{FF9A}', "レ"),
    ('\u{FF9B}', "ロ"),
    ('\u{FF9C}', "ワ"),
    ('\u{FF9D}', "ン"),
    ('\u{FF9E}', "゛"),
    ('\u{FF9F}', "゜"),
];

/// Base kana that gain a dakuten/handakuten from a following half-width mark.
const VOICED_PAIRS: &[(char, char, char)] = &[
    ('カ', '\u{FF9E}', 'ガ'),
    ('キ', '\u{FF9E}', 'ギ'),
    ('ク', '\u{FF9E}', 'グ'),
    ('ケ', '\u{FF9E}', 'ゲ'),
    ('コ', '\u{FF9E}', 'ゴ'),
    ('サ', '\u{FF9E}', 'ザ'),
    ('シ', '\u{FF9E}', 'ジ'),
    ('ス', '\u{FF9E}', 'ズ'),
    ('セ', '\u{FF9E}', 'ゼ'),
    ('ソ', '\u{FF9E}', 'ゾ'),
    ('タ', '\u{FF9E}', 'ダ'),
    ('チ', '\u{FF9E}', 'ヂ'),
    ('ツ', '\u{FF9E}', 'ヅ'),
    ('テ', '\u{FF9E}', 'デ'),
    ('ト', '\u{FF9E}', 'ド'),
    ('ハ', '\u{FF9E}', 'バ'),
    ('ヒ', '\u{FF9E}', 'ビ'),
    ('フ', '\u{FF9E}', 'ブ'),
    ('ヘ', '\u{FF9E}', 'ベ'),
    ('ホ', '\u{FF9E}', 'ボ'),
    ('ウ', '\u{FF9E}', 'ヴ'),
    ('ハ', '\u{FF9F}', 'パ'),
    ('ヒ', '\u{FF9F}', 'ピ'),
    ('フ', '\u{FF9F}', 'プ'),
    ('ヘ', '\u{FF9F}', 'ペ'),
    ('ホ', '\u{FF9F}', 'ポ'),
];

fn halfwidth_to_fullwidth_kana(c: char) -> Option<&'static str> {
    HALFWIDTH_KATAKANA.iter().find(|(hw, _)| *hw == c).map(|(_, fw)| *fw)
}

/// Converts fullwidth ASCII (U+FF01..=U+FF5E) and the fullwidth space
/// (U+3000) to their halfwidth equivalents; leaves everything else alone.
fn fullwidth_ascii_to_halfwidth(c: char) -> char {
    match c {
        '\u{3000}' => ' ',
        '\u{FF01}'..='\u{FF5E}' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Normalizes character widths in `text` to Myaku's standard: katakana is
/// widened to full-width, latin letters/digits/punctuation are narrowed to
/// half-width. This is what `FoundLexicalItem::base_form` and `Query`
/// construction run their input through.
pub fn normalize_char_width(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(fw_base) = halfwidth_to_fullwidth_kana(c) {
            // Look ahead for a combining voiced/semi-voiced mark.
            if i + 1 < chars.len() {
                let next = chars[i + 1];
                if let Some(base_char) = fw_base.chars().next() {
                    if let Some((_, _, voiced)) = VOICED_PAIRS
                        .iter()
                        .find(|(b, m, _)| *b == base_char && *m == next)
                    {
                        out.push(*voiced);
                        i += 2;
                        continue;
                    }
                }
            }
            out.push_str(fw_base);
            i += 1;
            continue;
        }
        out.push(fullwidth_ascii_to_halfwidth(c));
        i += 1;
    }
    out
}

/// Counts alphanumeric characters (Unicode `is_alphanumeric`) in `text`,
/// matching Python's `str.isalnum`-based `get_alnum_count`.
pub fn alnum_count(text: &str) -> usize {
    text.chars().filter(|c| c.is_alphanumeric()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halfwidth_katakana_widens() {
        assert_eq!(normalize_char_width("ｱｲｳ"), "アイウ");
    }

    #[test]
    fn halfwidth_voiced_katakana_combines() {
        assert_eq!(normalize_char_width("ｶﾞｷﾞ"), "ガギ");
    }

    #[test]
    fn fullwidth_ascii_narrows() {
        assert_eq!(normalize_char_width("Ａｂｃ１２３"), "Abc123");
    }

    #[test]
    fn mixed_text_round_trips_stably() {
        let once = normalize_char_width("走る１２３アｲｳ");
        let twice = normalize_char_width(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn alnum_count_counts_unicode_letters() {
        assert_eq!(alnum_count("走る123"), 4);
        assert_eq!(alnum_count("、。"), 0);
    }
}
