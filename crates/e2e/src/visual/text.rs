//! Text comparison by longest matching blocks
//!
//! The ratio is `2 * M / (len_a + len_b)` where `M` is the total length of
//! the matching blocks found by repeatedly taking the longest common
//! contiguous block and recursing on both sides of it. Elements occurring
//! in more than 1% of a long second sequence are treated as too popular to
//! seed a match, which keeps large SVG documents tractable.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// Second sequences at least this long get popular elements pruned
const AUTOJUNK_MIN_LEN: usize = 200;

/// A block `a[a_start..a_start + len] == b[b_start..b_start + len]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

pub struct SequenceMatcher<'a, T> {
    a: &'a [T],
    b: &'a [T],
    b_index: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        let mut b_index: HashMap<&T, Vec<usize>> = HashMap::new();
        for (j, element) in b.iter().enumerate() {
            b_index.entry(element).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b_index }
    }

    /// Longest block inside `a[alo..ahi]` x `b[blo..bhi]`, earliest in `a`
    /// (then in `b`) on ties. `len == 0` when nothing matches.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);

        // run lengths of matches ending at each position of b
        let mut runs: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next_runs = HashMap::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| runs.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next_runs.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            runs = next_runs;
        }

        // pruned elements never seed a match but may still extend one
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        Block {
            a_start: best_i,
            b_start: best_j,
            len: best_len,
        }
    }

    /// All matching blocks, in no particular order
    pub fn matching_blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            let (i, j, k) = (block.a_start, block.b_start, block.len);
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
            blocks.push(block);
        }
        blocks
    }

    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matched: usize = self.matching_blocks().iter().map(|b| b.len).sum();
        2.0 * matched as f64 / total as f64
    }
}

/// Similarity ratio of two strings over their characters, in [0, 1].
///
/// The operands are put in a fixed order first, so the result does not
/// depend on argument order.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (first, second) = if (a.len(), &a) <= (b.len(), &b) {
        (&a, &b)
    } else {
        (&b, &a)
    };
    SequenceMatcher::new(first, second).ratio()
}

/// Read a text artifact whole, with `\r\n` and lone `\r` line endings
/// turned into `\n`
pub fn read_text(path: &Path) -> E2eResult<String> {
    let bytes = std::fs::read(path).map_err(|source| E2eError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|e| E2eError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(normalize_newlines(&text))
}

fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Ratio between two text files
pub fn similarity(a: &Path, b: &Path) -> E2eResult<f64> {
    Ok(ratio(&read_text(a)?, &read_text(b)?))
}
