use regex::Regex;

use crate::dialect::DumpGrammar;
use crate::error::{ParseError, Result};
use crate::state::{RegisterState, REGISTER_NAMES};

/// Normalize a hex address/value to its canonical integer form.
///
/// Accepts an optional `0x`/`0X` prefix and either letter case; the two
/// tools report addresses in different shapes and both must land on the
/// same `u16`.
pub fn parse_hex16(text: &str, field: &str) -> Result<u16> {
    let digits = text
        .trim()
        .strip_prefix("0x")
        .or_else(|| text.trim().strip_prefix("0X"))
        .unwrap_or_else(|| text.trim());
    u16::from_str_radix(digits, 16).map_err(|_| ParseError::InvalidValue {
        field: field.to_string(),
        text: text.to_string(),
    })
}

/// Parse a raw register dump into a complete [`RegisterState`].
///
/// Pure and order-independent: the grammar's `register_line` pattern is
/// applied over the whole capture and each of the six canonical names must
/// be found exactly once (repeats are tolerated only when they agree).
/// Labels outside the canonical set are ignored so a grammar may match more
/// than the six architectural registers without breaking the harness.
pub fn parse_registers(raw: &str, grammar: &DumpGrammar) -> Result<RegisterState> {
    let mut values: [Option<u16>; 6] = [None; 6];

    for cap in grammar.register_line.captures_iter(raw) {
        let name = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
        let Some(idx) = REGISTER_NAMES.iter().position(|n| *n == name) else {
            continue;
        };
        let value = parse_hex16(&cap[2], REGISTER_NAMES[idx])?;
        match values[idx] {
            None => values[idx] = Some(value),
            Some(first) if first == value => {}
            Some(first) => {
                return Err(ParseError::ConflictingRegister {
                    name: REGISTER_NAMES[idx],
                    first,
                    second: value,
                })
            }
        }
    }

    let field = |idx: usize| {
        values[idx].ok_or(ParseError::MissingRegister {
            name: REGISTER_NAMES[idx],
        })
    };

    Ok(RegisterState {
        af: field(0)?,
        bc: field(1)?,
        de: field(2)?,
        hl: field(3)?,
        sp: field(4)?,
        pc: field(5)?,
    })
}

/// Extract `(pc, instruction)` from a step or breakpoint-hit echo.
///
/// The last match wins: a continue can scroll several echo-shaped lines
/// past before the stop, and the stop line is the one the session is
/// paused at.
pub fn parse_echo(raw: &str, pattern: &Regex) -> Result<(u16, String)> {
    let cap = pattern
        .captures_iter(raw)
        .last()
        .ok_or_else(|| ParseError::MalformedEcho {
            text: raw.to_string(),
        })?;
    let pc = parse_hex16(&cap[1], "PC")?;
    let instruction = cap[2].trim().to_string();
    Ok((pc, instruction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ToolDialect;

    const CANDIDATE_DUMP: &str = "\
AF:      0x01b0
BC:      0x0013
DE:      0x00d8
HL:      0x014d
SP:      0xfffe
PC:      0x0101
Cycles:  123456
(gameboy) ";

    const REFERENCE_DUMP: &str = "\
AF = 0x01b0  BC = 0x0013  DE = 0x00d8
HL = 0x014d  SP = 0xfffe  PC = 0x0101
gddb> ";

    fn expected() -> RegisterState {
        RegisterState {
            af: 0x01B0,
            bc: 0x0013,
            de: 0x00D8,
            hl: 0x014D,
            sp: 0xFFFE,
            pc: 0x0101,
        }
    }

    #[test]
    fn both_dialects_parse_to_the_same_state() {
        let cand = ToolDialect::gameboy_emu();
        let refr = ToolDialect::gddb();
        let a = parse_registers(CANDIDATE_DUMP, &cand.grammar).unwrap();
        let b = parse_registers(REFERENCE_DUMP, &refr.grammar).unwrap();
        assert_eq!(a, expected());
        assert_eq!(a, b);
    }

    #[test]
    fn parsing_is_order_and_whitespace_independent() {
        let grammar = &ToolDialect::gddb().grammar;
        let shuffled = "PC = 0x0101\nAF = 0x01b0\nSP = 0xfffe\n\
                        HL = 0x014d\n  DE = 0x00d8\tBC = 0x0013\n";
        assert_eq!(parse_registers(shuffled, grammar).unwrap(), expected());
    }

    #[test]
    fn missing_register_is_fatal() {
        let grammar = &ToolDialect::gddb().grammar;
        let partial = "AF = 0x01b0\nBC = 0x0013\nDE = 0x00d8\nHL = 0x014d\nSP = 0xfffe\n";
        match parse_registers(partial, grammar) {
            Err(ParseError::MissingRegister { name: "PC" }) => {}
            other => panic!("expected missing PC, got {other:?}"),
        }
    }

    #[test]
    fn agreeing_repeats_are_tolerated_conflicts_are_not() {
        let grammar = &ToolDialect::gddb().grammar;
        let repeated = format!("{REFERENCE_DUMP}\nAF = 0x01b0\n");
        assert_eq!(parse_registers(&repeated, grammar).unwrap(), expected());

        let conflicting = format!("{REFERENCE_DUMP}\nAF = 0x01b1\n");
        match parse_registers(&conflicting, grammar) {
            Err(ParseError::ConflictingRegister {
                name: "AF",
                first: 0x01B0,
                second: 0x01B1,
            }) => {}
            other => panic!("expected AF conflict, got {other:?}"),
        }
    }

    #[test]
    fn hex_normalization_accepts_prefix_and_case() {
        assert_eq!(parse_hex16("0xC24C", "PC").unwrap(), 0xC24C);
        assert_eq!(parse_hex16("c24c", "PC").unwrap(), 0xC24C);
        assert_eq!(parse_hex16("0XFFFE", "SP").unwrap(), 0xFFFE);
        assert!(parse_hex16("0x10000", "PC").is_err());
        assert!(parse_hex16("wxyz", "PC").is_err());
    }

    #[test]
    fn candidate_echo_parses_address_and_instruction() {
        let grammar = &ToolDialect::gameboy_emu().grammar;
        let (pc, instr) = parse_echo("0xc24d: INC C\n(gameboy) ", &grammar.step_echo).unwrap();
        assert_eq!(pc, 0xC24D);
        assert_eq!(instr, "INC C");

        let (pc, instr) = parse_echo(
            "Breakpoint hit @ 0xc24c: LD A, B\n(gameboy) ",
            &grammar.breakpoint_hit,
        )
        .unwrap();
        assert_eq!(pc, 0xC24C);
        assert_eq!(instr, "LD A, B");
    }

    #[test]
    fn reference_echo_takes_the_last_scrolled_line() {
        let grammar = &ToolDialect::gddb().grammar;
        let scrolled = "c24a\tNOP\nc24b\tNOP\nc24c\tLD A, B\ngddb> ";
        let (pc, instr) = parse_echo(scrolled, &grammar.breakpoint_hit).unwrap();
        assert_eq!(pc, 0xC24C);
        assert_eq!(instr, "LD A, B");
    }

    #[test]
    fn malformed_echo_is_fatal() {
        let grammar = &ToolDialect::gameboy_emu().grammar;
        assert!(parse_echo("no address here", &grammar.step_echo).is_err());
    }
}
