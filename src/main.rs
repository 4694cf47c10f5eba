//! image-builder - build and push images for the sub-projects touched by the
//! latest commit of a branch.

use clap::Parser;

use image_builder::cli::Cli;
use image_builder::config::{Config, ConfigOverrides};
use image_builder::{logging, operations};

fn main() {
    let cli = Cli::parse();

    let config = match Config::load(ConfigOverrides::from(cli)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    logging::init(config.debug, config.json);

    match operations::build::run(&config) {
        Ok(summary) if config.dry_run => {
            for root in &summary.roots {
                println!("{root}");
            }
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
