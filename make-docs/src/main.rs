//! Regenerate `src/scripts.rs` from the `--help` of the built checks
//!
//! Run from the workspace root after `cargo build`:
//!
//! ```plain
//! cargo run -p make-docs > src/scripts.rs
//! ```

use std::io;
use std::process::Command;

struct Check {
    name: &'static str,
    about: &'static str,
}

fn main() -> io::Result<()> {
    let preamble = "Documentation about the checks contained herein\n";

    let checks = [Check {
        name: "check_cpu",
        about: "Linux (RedHat and Debian families), Solaris, AIX and BSD. \
                Requires sar (sysstat on Linux, bsdsar on BSD).",
    }];

    let mut out: String = cp(preamble.split('\n'));
    out.push_str("\n");
    out.push_str(&cp(checks
        .iter()
        .map(|c| format!("- [{0}](#{0})", c.name))));
    out.push_str("\n");
    for check in &checks {
        out.push_str(&format!(
            "\
//!
//! # {0}
//!
//! {1}
//!
//! ```plain
//! $ {0} --help
",
            check.name, check.about
        ));
        let output = Command::new(&format!("target/debug/{}", check.name))
            .args(&["--help"])
            .output()?;
        let help = String::from_utf8_lossy(&output.stdout);
        out.push_str(&cp(help.split('\n')));
        out.push_str("\n//! ```\n");
    }
    out.push_str("\n");
    print!("{}", out);
    Ok(())
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
