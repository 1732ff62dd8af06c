//! Thread identifier generation.

use chrono::Utc;
use rand::Rng;

/// Alphabet for the random id suffix (base-36, lowercase).
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 8;

/// Generates a fresh thread id.
///
/// Workspace-scoped ids take the form `ws:<workspace>:<millis>-<rand8>`;
/// unscoped ids drop the prefix. The millisecond timestamp lets a backend
/// infer ordering and the random suffix keeps ids created in the same
/// millisecond distinct.
pub fn new_thread_id(workspace: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    match workspace {
        Some(ws) if !ws.is_empty() => format!("ws:{ws}:{millis}-{suffix}"),
        _ => format!("{millis}-{suffix}"),
    }
}
