//! Binary entry point. Reads the configuration, picks the front-end based on
//! whether stdin is a terminal, and runs it until the user quits.
use std::io::{self, IsTerminal};

use aquarium_shell::logging::{init_console, init_stderr};
use aquarium_shell::{run_console, run_repl, Config, Console, Shell};

fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    if io::stdin().is_terminal() && io::stdout().is_terminal() {
        let log = init_console(&config.log_level);
        let mut console = Console::new(Shell::new(config), log);
        run_console(&mut console)
    } else {
        init_stderr(&config.log_level);
        let shell = Shell::new(config);
        // Acquire the cursor before the first prompt so its diagnostic comes first.
        shell.manager();
        run_repl(&shell, io::stdin().lock(), io::stdout().lock())
    }
}
