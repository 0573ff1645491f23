//! National ID checks

use anyhow::{bail, Result};
use civicdesk_core::verhoeff;

/// Validate a national ID, or compute the check digit for an 11-digit body
pub fn verify(input: &str, check_digit: bool) -> Result<()> {
    if check_digit {
        let Some(digit) = verhoeff::check_digit(input) else {
            bail!("Expected an 11-digit body, got {:?}", input);
        };
        println!("Check digit: {}", digit);
        println!("National ID: {}{}", input, digit);
        return Ok(());
    }

    if verhoeff::validate(input) {
        println!("✅ {} is valid", verhoeff::mask(input));
    } else {
        println!("❌ Not a valid national ID");
    }
    Ok(())
}
