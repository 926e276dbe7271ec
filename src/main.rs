mod cli;
mod logging_setup;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let command_line_interface = cli::CommandLineInterface::load();
    logging_setup::configure_logger(command_line_interface.log_config());
    command_line_interface.run()
}
