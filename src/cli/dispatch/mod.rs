use crate::{
    cli::{
        actions::{Action, forms, settings, theme, verify},
        commands::{
            self, ARG_API_URL, ARG_EMAIL, ARG_FRONTEND_URL, ARG_LINK, ARG_STORE, ARG_THEME_MODE,
            settings::{ARG_FILE, CMD_SHOW, CMD_UPDATE, CMD_UPLOAD_TEMPLATE, UPDATE_FIELDS},
        },
        globals::GlobalArgs,
    },
    config::{AppConfig, ConfigOverrides},
    forms::settings::SettingsUpdate,
    storage::default_store_path,
};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use std::path::PathBuf;

fn globals(matches: &ArgMatches) -> GlobalArgs {
    let config = AppConfig::new().with_overrides(ConfigOverrides {
        api_base_url: matches.get_one::<String>(ARG_API_URL).cloned(),
        frontend_base_url: matches.get_one::<String>(ARG_FRONTEND_URL).cloned(),
    });

    let store_path = matches
        .get_one::<String>(ARG_STORE)
        .map(|path| path.trim())
        .filter(|path| !path.is_empty())
        .map_or_else(default_store_path, PathBuf::from);

    GlobalArgs::new(config, store_path)
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("missing required argument: {name}"))
}

fn settings_update(matches: &ArgMatches) -> SettingsUpdate {
    let field = |name: &str| matches.get_one::<String>(name).cloned();
    SettingsUpdate {
        name: field(UPDATE_FIELDS[0]),
        email: field(UPDATE_FIELDS[1]),
        phone: field(UPDATE_FIELDS[2]),
        address: field(UPDATE_FIELDS[3]),
        website: field(UPDATE_FIELDS[4]),
    }
}

fn settings_command(matches: &ArgMatches) -> Result<settings::Command> {
    match matches.subcommand() {
        Some((CMD_SHOW, _)) => Ok(settings::Command::Show),
        Some((CMD_UPDATE, sub)) => Ok(settings::Command::Update(settings_update(sub))),
        Some((CMD_UPLOAD_TEMPLATE, sub)) => Ok(settings::Command::UploadTemplate(PathBuf::from(
            required(sub, ARG_FILE)?,
        ))),
        _ => Err(anyhow!("unknown settings command")),
    }
}

/// Maps parsed arguments to an `Action`.
///
/// # Errors
/// Returns an error if a subcommand or one of its arguments is missing.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    // Global args are propagated into subcommand matches.
    let (name, sub) = matches.subcommand().context("missing subcommand")?;
    let globals = globals(sub);

    let action = match name {
        commands::CMD_VERIFY => Action::Verify(verify::Args {
            globals,
            link: required(sub, ARG_LINK)?.clone(),
        }),
        commands::CMD_GATE => Action::Gate(globals),
        commands::CMD_REQUEST_LINK => Action::RequestLink(forms::Args {
            globals,
            email: required(sub, ARG_EMAIL)?.clone(),
        }),
        commands::CMD_SUBSCRIBE => Action::Subscribe(forms::Args {
            globals,
            email: required(sub, ARG_EMAIL)?.clone(),
        }),
        commands::settings::CMD_SETTINGS => Action::Settings(settings::Args {
            globals,
            command: settings_command(sub)?,
        }),
        commands::CMD_THEME => {
            let mode = sub
                .get_one::<String>(ARG_THEME_MODE)
                .map_or("show", String::as_str);
            Action::Theme(theme::Args {
                globals,
                mode: theme::Mode::parse(mode).with_context(|| format!("invalid theme: {mode}"))?,
            })
        }
        commands::CMD_LOGOUT => Action::Logout(globals),
        other => return Err(anyhow!("unknown command: {other}")),
    };

    Ok(action)
}
