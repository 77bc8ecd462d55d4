//! Post-run memory inspector.
//!
//! Reads hexadecimal word addresses from a text stream and prints the
//! memory word stored at each one. A lone `q` ends the session, as does
//! end of input.

use crate::cpu::Memory;
use std::io::{self, BufRead, Write};

/// Run the inspector loop over `input`, writing results to `output`.
///
/// Returns the number of addresses looked up.
pub fn run_inspector<R: BufRead, W: Write>(memory: &Memory, input: R, mut output: W) -> io::Result<usize> {
    let mut lookups = 0;

    writeln!(output, "Enter hex word addresses (q to quit)")?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        for token in line.split_whitespace() {
            if token.eq_ignore_ascii_case("q") {
                return Ok(lookups);
            }
            writeln!(output, "{}", lookup(memory, token))?;
            lookups += 1;
        }
        output.flush()?;
    }

    Ok(lookups)
}

/// Format the answer for one address token.
fn lookup(memory: &Memory, token: &str) -> String {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token)
        .to_ascii_uppercase();

    let Ok(addr) = usize::from_str_radix(&digits, 16) else {
        return format!("0x{}: not a hex address", digits);
    };

    match memory.get(addr) {
        Some(word) => format!("0x{}: {:#06X} ({})", digits, word, word as i16),
        None => format!("0x{}: out of range (memory has {:#X} words)", digits, memory.capacity()),
    }
}
