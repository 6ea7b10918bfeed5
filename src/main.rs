mod emulator;
mod settings;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = settings::Settings::parse();

    let mut emulator = emulator::Emulator::new(settings)?;
    emulator.run()
}
