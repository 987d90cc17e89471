//! Configuration file command handlers.

use eg4mon_config::{Profile, config_path, load_config_or_default, save_config};

use crate::cli::{ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(cmd: ConfigCommand, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        ConfigCommand::Path => {
            println!("{}", config_path().display());
            Ok(())
        }

        ConfigCommand::Init { name } => init(&name, global),

        ConfigCommand::List => {
            let cfg = load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let mut names: Vec<&String> = cfg.profiles.keys().collect();
            names.sort_unstable();
            for profile in names {
                if profile == default {
                    println!("{profile} (default)");
                } else {
                    println!("{profile}");
                }
            }
            Ok(())
        }
    }
}

/// Seed a profile from whatever flags were passed, leaving the password in
/// `password_env` form so the file never holds a plaintext secret.
fn init(name: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg = load_config_or_default();

    let profile = Profile {
        username: global.username.clone(),
        password: None,
        password_env: Some("EG4_PASSWORD".into()),
        serial_number: global.serial.clone(),
        base_url: global.base_url.clone(),
        ignore_tls: global.insecure,
        ..Profile::default()
    };

    cfg.profiles.insert(name.to_owned(), profile);
    let default_missing = cfg
        .default_profile
        .as_ref()
        .is_none_or(|d| !cfg.profiles.contains_key(d));
    if default_missing {
        cfg.default_profile = Some(name.to_owned());
    }
    save_config(&cfg)?;

    if !global.quiet {
        eprintln!("Profile '{name}' written to {}", config_path().display());
    }
    Ok(())
}
