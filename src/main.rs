use dashgate::hashing::HashDriver;
use dashgate::logger::*;
use dashgate::server::*;
use dashgate::settings::*;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(
        hashing = ?project_settings.hashing,
        session = ?project_settings.session,
        jwt = ?project_settings.jwt,
        "settings loaded"
    );
    logger.reload_from_config(&LogConfig::from(&project_settings.log))?;

    // Builds every component so a bad configuration fails here, before any work.
    let core = AuthCore::try_new(&project_settings)?;

    match cli.command {
        Command::Hash { secret } => {
            let hash = core.hash_manager.hash(&secret)?;
            println!("{}", hash);
        }
        Command::Check { secret, hash } => {
            let matched = core.hash_manager.check(&secret, &hash)?;
            println!("{}", matched);
            if !matched {
                std::process::exit(1);
            }
        }
        Command::Drivers => {
            let default = core.hash_manager.default_driver();
            for name in core.hash_manager.drivers()? {
                let marker = if name == default { " (default)" } else { "" };
                println!("{}{}", name, marker);
            }
        }
    }

    Ok(())
}
