//! Lexical similarity ratio.
//!
//! The ratio is the InDel-normalised edit distance between two strings:
//! `(len_a + len_b - indel) / (len_a + len_b)`, where `indel` counts the
//! insertions and deletions needed to turn one string into the other. With only
//! insertions and deletions allowed, `indel = len_a + len_b - 2 * lcs`, so the
//! ratio reduces to `2 * lcs / (len_a + len_b)`.
//!
//! Lengths are measured in Unicode scalar values, and comparison is exact (no
//! case folding or whitespace normalisation).

/// Similarity of `a` and `b` as a percentage in `[0, 100]`.
///
/// Identical non-empty strings score 100. If either string is empty the score
/// is 0. The percentage is rounded half-to-even.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let total = (a.len() + b.len()) as f64;
    let lcs = lcs_len(&a, &b) as f64;
    let pct = (100.0 * 2.0 * lcs / total).round_ties_even();
    pct.clamp(0.0, 100.0) as u8
}

/// Length of the longest common subsequence, using a single rolling row.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    // Keep the row over the shorter string.
    let (outer, inner) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    let mut row = vec![0usize; inner.len() + 1];
    for &x in outer {
        let mut diag = 0usize;
        for (j, &y) in inner.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if x == y { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[inner.len()]
}

/// The first `n` characters of `text`.
pub fn leading_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
