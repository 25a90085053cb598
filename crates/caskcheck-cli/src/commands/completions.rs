use super::EXIT_SUCCESS;
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

#[allow(clippy::unnecessary_wraps)]
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, String> {
    write_completions::<C>(shell, &mut std::io::stdout().lock());
    Ok(EXIT_SUCCESS)
}

/// Completion script for `shell`, named after the command itself.
fn write_completions<C: CommandFactory>(shell: Shell, out: &mut impl Write) {
    let mut cmd = C::command();
    let bin = cmd.get_name().to_owned();
    clap_complete::generate(shell, &mut cmd, bin, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Cli;

    #[test]
    fn bash_completions_cover_subcommands() {
        let mut buf = Vec::new();
        write_completions::<Cli>(Shell::Bash, &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("caskcheck"));
        assert!(script.contains("validate"));
        assert!(script.contains("inspect"));
    }

    #[test]
    fn fish_completions_offer_all_flag() {
        let mut buf = Vec::new();
        write_completions::<Cli>(Shell::Fish, &mut buf);
        assert!(String::from_utf8(buf).unwrap().contains("-l all"));
    }
}
