use std::ffi::OsString;
use std::path::Path;

use regex::Regex;

use crate::error::Result;

/// How the target image is brought up, which decides the launch arguments
/// and (at the config layer) which start address makes sense.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Execute the boot ROM first; the test image is mapped behind it.
    Boot,
    /// Load the test image directly and start from its entry point.
    Direct,
}

/// Output patterns for one tool family's debugger REPL.
///
/// All four patterns are matched against the raw byte stream (lossily
/// decoded) captured since the previous exchange:
/// - `register_line`: two captures, register name and 16-bit hex value;
/// - `breakpoint_hit`: two captures, stop address and instruction text;
/// - `step_echo`: two captures, new address and instruction text;
/// - `prompt`: the idle prompt marker, no captures required.
#[derive(Clone, Debug)]
pub struct DumpGrammar {
    pub register_line: Regex,
    pub breakpoint_hit: Regex,
    pub step_echo: Regex,
    pub prompt: Regex,
}

impl DumpGrammar {
    pub fn new(
        register_line: &str,
        breakpoint_hit: &str,
        step_echo: &str,
        prompt: &str,
    ) -> Result<Self> {
        Ok(Self {
            register_line: Regex::new(register_line)?,
            breakpoint_hit: Regex::new(breakpoint_hit)?,
            step_echo: Regex::new(step_echo)?,
            prompt: Regex::new(prompt)?,
        })
    }
}

/// Everything the harness needs to drive one tool family: launch argv
/// shaping, the command strings it sends, and the grammar its output is
/// parsed with.
///
/// Command formatting is held as plain function pointers so a dialect stays
/// a value: the comparator never branches on tool family.
#[derive(Clone, Debug)]
pub struct ToolDialect {
    pub name: &'static str,
    pub grammar: DumpGrammar,
    break_command: fn(u16) -> String,
    continue_command: &'static str,
    step_command: &'static str,
    dump_command: &'static str,
    write_af_command: fn(u16) -> String,
    launch_args: fn(&Path, RunMode, Option<&Path>) -> Vec<OsString>,
}

impl ToolDialect {
    /// The candidate emulator's debugger (`(gameboy) ` prompt).
    ///
    /// Register dumps look like `AF:      0x01b0`, a breakpoint stop like
    /// `Breakpoint hit @ 0xc24c: LD A, B`, and a single step echoes
    /// `0xc24d: INC C`. Addresses in commands are bare hex (`b c24c`).
    pub fn gameboy_emu() -> Self {
        let grammar = DumpGrammar::new(
            r"(?m)^(AF|BC|DE|HL|SP|PC):\s+0x([0-9a-fA-F]{4})",
            r"Breakpoint hit @ 0x([0-9a-fA-F]+): ([^\r\n]+)",
            r"(?m)^0x([0-9a-fA-F]+): ([^\r\n]+)$",
            r"\(gameboy\) ",
        )
        .expect("built-in gameboy-emu grammar");
        Self {
            name: "gameboy-emu",
            grammar,
            break_command: |addr| format!("b {addr:x}"),
            continue_command: "c",
            step_command: "s",
            dump_command: "debug",
            write_af_command: |af| format!("set af {af:x}"),
            launch_args: |rom, mode, boot_rom| {
                let mut args = Vec::new();
                if mode == RunMode::Boot {
                    if let Some(boot) = boot_rom {
                        args.push(OsString::from("-b"));
                        args.push(boot.as_os_str().to_os_string());
                    }
                }
                args.push(rom.as_os_str().to_os_string());
                args.push(OsString::from("--debug"));
                args
            },
        }
    }

    /// The reference emulator's debugger (`gddb> ` prompt).
    ///
    /// Register dumps look like `AF = 0x01b0`; both the continue and the
    /// single-step commands echo a tab-separated `c24c\tLD A, B` line. gddb
    /// prints no dedicated breakpoint banner, so the echo line doubles as
    /// the hit notification. "Continue" is a step with a saturating count.
    pub fn gddb() -> Self {
        let grammar = DumpGrammar::new(
            r"(AF|BC|DE|HL|SP|PC) = 0x([0-9a-fA-F]{4})",
            r"(?m)^(?:0x)?([0-9a-fA-F]+)\t([^\r\n]+)$",
            r"(?m)^(?:0x)?([0-9a-fA-F]+)\t([^\r\n]+)$",
            r"gddb> ",
        )
        .expect("built-in gddb grammar");
        Self {
            name: "gddb",
            grammar,
            break_command: |addr| format!("break 0x{addr:x}"),
            continue_command: "step 0xFFFFFFFF",
            step_command: "step",
            dump_command: "show regs",
            write_af_command: |af| format!("set af 0x{af:x}"),
            launch_args: |rom, _mode, _boot_rom| {
                vec![OsString::from("-d"), rom.as_os_str().to_os_string()]
            },
        }
    }

    pub fn break_command(&self, addr: u16) -> String {
        (self.break_command)(addr)
    }

    pub fn continue_command(&self) -> &'static str {
        self.continue_command
    }

    pub fn step_command(&self) -> &'static str {
        self.step_command
    }

    pub fn dump_command(&self) -> &'static str {
        self.dump_command
    }

    pub fn write_af_command(&self, af: u16) -> String {
        (self.write_af_command)(af)
    }

    /// Argv (after the executable path) to launch this tool on `rom`.
    pub fn launch_args(&self, rom: &Path, mode: RunMode, boot_rom: Option<&Path>) -> Vec<OsString> {
        (self.launch_args)(rom, mode, boot_rom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn gameboy_emu_commands_use_bare_hex() {
        let d = ToolDialect::gameboy_emu();
        assert_eq!(d.break_command(0xC24C), "b c24c");
        assert_eq!(d.continue_command(), "c");
        assert_eq!(d.step_command(), "s");
        assert_eq!(d.dump_command(), "debug");
        assert_eq!(d.write_af_command(0x01B0), "set af 1b0");
    }

    #[test]
    fn gddb_commands_use_prefixed_hex() {
        let d = ToolDialect::gddb();
        assert_eq!(d.break_command(0xC24C), "break 0xc24c");
        assert_eq!(d.continue_command(), "step 0xFFFFFFFF");
        assert_eq!(d.dump_command(), "show regs");
        assert_eq!(d.write_af_command(0x0180), "set af 0x180");
    }

    #[test]
    fn boot_mode_inserts_boot_rom_for_the_candidate_only() {
        let rom = PathBuf::from("test.gb");
        let boot = PathBuf::from("dmg.bin");

        let cand = ToolDialect::gameboy_emu();
        let args = cand.launch_args(&rom, RunMode::Boot, Some(&boot));
        assert_eq!(args, vec!["-b", "dmg.bin", "test.gb", "--debug"]);
        let args = cand.launch_args(&rom, RunMode::Direct, None);
        assert_eq!(args, vec!["test.gb", "--debug"]);

        let refr = ToolDialect::gddb();
        let args = refr.launch_args(&rom, RunMode::Boot, Some(&boot));
        assert_eq!(args, vec!["-d", "test.gb"]);
    }

    #[test]
    fn prompts_match_only_their_own_tool() {
        let cand = ToolDialect::gameboy_emu();
        let refr = ToolDialect::gddb();
        assert!(cand.grammar.prompt.is_match("(gameboy) "));
        assert!(!cand.grammar.prompt.is_match("gddb> "));
        assert!(refr.grammar.prompt.is_match("gddb> "));
        assert!(!refr.grammar.prompt.is_match("(gameboy) "));
    }
}
