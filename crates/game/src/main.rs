//! cellsim - interactive cellular grid simulation.
//!
//! Left button adds substance, right button draws walls, middle button
//! erases. An optional argument names a JSON configuration file.

use std::path::Path;

use cellsim::SimConfig;

fn main() {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => match SimConfig::load_json(Path::new(&path)) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path);
                config
            }
            Err(e) => {
                log::error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => SimConfig::default(),
    };

    if let Err(e) = cellsim_game::app::run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
