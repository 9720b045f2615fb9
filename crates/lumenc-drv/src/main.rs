use lumenc_drv::Config;
use lumenc_util::error::diagnostic_line;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(usage) => {
            eprintln!("{usage}");
            std::process::exit(1);
        }
    };

    if let Err(err) = lumenc_drv::run(&config) {
        eprintln!("{}", diagnostic_line(&err));
        std::process::exit(1);
    }
}
