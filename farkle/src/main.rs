use farkle::cli::{Args, BaseCommand, Command};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("FARKLE_LOG", "warn")).init();

    let args = Args::new(pico_args::Arguments::from_env());

    match BaseCommand::try_from_cli_args(args).and_then(BaseCommand::run) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            eprintln!("Try 'farkle --help' for more information.");
            std::process::exit(1);
        }
    }
}
