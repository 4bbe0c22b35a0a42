pub mod build;
pub mod publish;
pub mod validate;

use crate::cli::args::{Cli, Command};

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Build(args) => build::run(args),
        Command::Validate(args) => validate::run(args),
        Command::Publish(args) => publish::run(args),
    }
}
