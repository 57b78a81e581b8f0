use rigol_wav::{AcquisitionConfig, UsbtmcBus};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AcquisitionConfig::default();
    match rigol_wav::run(UsbtmcBus::new, &config) {
        Ok(acquisition) => {
            println!("saved {} samples at {} Sa/s from {} to {}",
                     acquisition.frames, acquisition.frame_rate, acquisition.resource,
                     acquisition.output.display());
        }
        Err(error) => {
            log::error!("{}", error);
            std::process::exit(-1);
        }
    }
}
