use anyhow::Result;
use clap::Parser;
use log::info;
use std::io;

use brailleviz::capture::{AudioSource, DeviceCapture, WavFileSource};
use brailleviz::{App, Options};

fn main() -> Result<()> {
    env_logger::init();

    let options = Options::parse();
    options.validate()?;

    // the ring holds exactly one frame, so reading from the head yields the
    // latest `input_size` samples in order
    match options.wav.clone() {
        Some(path) => {
            let source = WavFileSource::open(&path, options.input_size)?;
            visualize(options, source)
        }
        None => {
            let source = DeviceCapture::new(options.input_size)?;
            visualize(options, source)
        }
    }
}

fn visualize<S: AudioSource>(options: Options, mut source: S) -> Result<()> {
    info!("Starting brailleviz at {} Hz", source.sample_rate());

    let mut app = App::new(options, source.sample_rate())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    app.run(&mut source, &mut out)
}
