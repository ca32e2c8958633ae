use anyhow::Result;
use clap::Parser;
use skill_matcher::core::init_logging;
use skill_matcher::trainer_cli::{handle_trainer_command, TrainerCli};

fn main() -> Result<()> {
    let cli = TrainerCli::parse();
    init_logging(&cli.log_file)?;
    handle_trainer_command(cli)
}
