//! Run Planner
//!
//! Decides which hash algorithms run and at which input sizes.
//!
//! - Candidates are selected by a regex over their names and keep
//!   registration order, which is also the tie-break order of a ranking.
//! - Sizes keep the order they were given in.

use crate::candidates::HashAlgorithm;
use regex::Regex;

/// Largest default input size exponent (10^8 bytes)
const MAX_DEFAULT_EXPONENT: u32 = 8;

/// Largest accepted input size (1 GiB). The corpus is held in memory.
pub const MAX_INPUT_SIZE: usize = 1 << 30;

/// What a run will measure
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    /// Input sizes in bytes, one suite each
    pub sizes: Vec<usize>,
    /// Selected algorithms in registration order
    pub algorithms: Vec<&'static HashAlgorithm>,
}

impl ExecutionPlan {
    /// Whether there is anything to measure
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty() || self.algorithms.is_empty()
    }
}

/// Powers of ten from 1 to 100,000,000 bytes
pub fn default_sizes() -> Vec<usize> {
    (0..=MAX_DEFAULT_EXPONENT).map(|e| 10usize.pow(e)).collect()
}

/// Parse an input size such as `1024`, `1_000`, `1e6`, `64KiB` or `10M`.
///
/// Decimal suffixes (`K`, `M`, `G`) are powers of 1000, binary suffixes
/// (`KiB`, `MiB`, `GiB`) powers of 1024. Zero and sizes above
/// [`MAX_INPUT_SIZE`] are rejected.
pub fn parse_size(s: &str) -> Result<usize, String> {
    let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return Err("empty size".to_string());
    }

    let split = cleaned
        .char_indices()
        .find(|&(i, c)| {
            let exponent = (c == 'e' || c == 'E') && i > 0 && is_exponent(&cleaned, i);
            c.is_alphabetic() && !exponent
        })
        .map(|(i, _)| i)
        .unwrap_or(cleaned.len());
    let (number, unit) = cleaned.split_at(split);

    let multiplier: f64 = match unit.to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "k" | "kb" => 1e3,
        "m" | "mb" => 1e6,
        "g" | "gb" => 1e9,
        "kib" => 1024.0,
        "mib" => 1024.0 * 1024.0,
        "gib" => 1024.0 * 1024.0 * 1024.0,
        other => return Err(format!("unknown size unit '{}' in '{}'", other, s)),
    };

    let value: f64 = number
        .parse()
        .map_err(|_| format!("invalid size '{}'", s))?;
    let bytes = value * multiplier;
    if !bytes.is_finite() || bytes < 1.0 || bytes.fract() != 0.0 {
        return Err(format!("size must be a positive whole number of bytes, got '{}'", s));
    }
    if bytes > MAX_INPUT_SIZE as f64 {
        return Err(format!("size '{}' exceeds the {} byte limit", s, MAX_INPUT_SIZE));
    }
    Ok(bytes as usize)
}

/// Check a size that did not come through [`parse_size`]
pub fn check_size(size: usize) -> Result<usize, String> {
    match size {
        0 => Err("input size must be positive, got 0".to_string()),
        s if s > MAX_INPUT_SIZE => Err(format!(
            "input size {} exceeds the {} byte limit",
            s, MAX_INPUT_SIZE
        )),
        s => Ok(s),
    }
}

/// `e` at `i` is an exponent marker when digits follow it
fn is_exponent(s: &str, i: usize) -> bool {
    s[i + 1..]
        .trim_start_matches(['+', '-'])
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

/// Build the execution plan from the registry, the requested sizes and a name filter
pub fn build_plan(
    algorithms: impl IntoIterator<Item = &'static HashAlgorithm>,
    sizes: Vec<usize>,
    filter: Option<&Regex>,
) -> ExecutionPlan {
    let selected = algorithms
        .into_iter()
        .filter(|a| filter.map_or(true, |re| re.is_match(a.name)))
        .collect();

    ExecutionPlan {
        sizes,
        algorithms: selected,
    }
}
