//! # Verhoeff Module
//!
//! National ID (Aadhaar) checksum validation using the Verhoeff scheme.
//! A number is valid when folding every digit, last digit first, through the
//! permutation and dihedral tables leaves a check value of zero.

/// Number of digits in a national ID
pub const NATIONAL_ID_LEN: usize = 12;

/// Multiplication table of the dihedral group D5
const D: [[u8; 10]; 10] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 2, 3, 4, 0, 6, 7, 8, 9, 5],
    [2, 3, 4, 0, 1, 7, 8, 9, 5, 6],
    [3, 4, 0, 1, 2, 8, 9, 5, 6, 7],
    [4, 0, 1, 2, 3, 9, 5, 6, 7, 8],
    [5, 9, 8, 7, 6, 0, 4, 3, 2, 1],
    [6, 5, 9, 8, 7, 1, 0, 4, 3, 2],
    [7, 6, 5, 9, 8, 2, 1, 0, 4, 3],
    [8, 7, 6, 5, 9, 3, 2, 1, 0, 4],
    [9, 8, 7, 6, 5, 4, 3, 2, 1, 0],
];

/// Position-dependent permutation table
const P: [[u8; 10]; 8] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
    [1, 5, 7, 6, 2, 8, 3, 0, 9, 4],
    [5, 8, 0, 3, 7, 9, 6, 1, 4, 2],
    [8, 9, 1, 6, 0, 4, 3, 5, 2, 7],
    [9, 4, 5, 3, 1, 2, 6, 8, 7, 0],
    [4, 2, 8, 6, 5, 7, 3, 9, 0, 1],
    [2, 7, 9, 3, 8, 0, 6, 4, 1, 5],
    [7, 0, 4, 6, 9, 1, 3, 2, 5, 8],
];

/// Inverse of each element of D5
const INV: [u8; 10] = [0, 4, 3, 2, 1, 5, 6, 7, 8, 9];

/// Validate a 12-digit national ID.
///
/// Anything that is not exactly twelve ASCII digits is rejected without
/// trimming; normalisation is the caller's job.
pub fn validate(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != NATIONAL_ID_LEN || !bytes.iter().all(u8::is_ascii_digit) {
        return false;
    }

    let check = bytes
        .iter()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, b)| {
            let permuted = P[i % 8][(b - b'0') as usize];
            D[c as usize][permuted as usize]
        });

    check == 0
}

/// Compute the check digit that completes an 11-digit body.
///
/// Returns None for input that is not exactly eleven ASCII digits.
pub fn check_digit(body: &str) -> Option<u8> {
    let bytes = body.as_bytes();
    if bytes.len() != NATIONAL_ID_LEN - 1 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }

    // The check digit will occupy position 0, so the body starts at 1
    let c = bytes
        .iter()
        .rev()
        .enumerate()
        .fold(0u8, |c, (i, b)| {
            let permuted = P[(i + 1) % 8][(b - b'0') as usize];
            D[c as usize][permuted as usize]
        });

    Some(INV[c as usize])
}

/// Display form of a national ID that only reveals the last four digits.
pub fn mask(national_id: &str) -> String {
    let visible: String = national_id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("XXXX XXXX {}", visible)
}
