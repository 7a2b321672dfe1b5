use crate::{
    cli::{actions::gate::require_session, globals::GlobalArgs},
    forms::settings::{
        InstitutionSettings, SettingsUpdate, TemplateUpload, fetch_settings, update_settings,
        upload_template,
    },
    session::AuthError,
};
use anyhow::{Context, Result, bail};
use std::path::PathBuf;

#[derive(Debug)]
pub enum Command {
    Show,
    Update(SettingsUpdate),
    UploadTemplate(PathBuf),
}

enum Request {
    Fetch,
    Update(SettingsUpdate),
    Upload(TemplateUpload),
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Runs a settings command behind the access gate.
///
/// # Errors
/// Returns an error if the session is rejected or the request fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, command } = args;

    // Local checks run before the gate so a bad file does not cost a round trip.
    let request = match command {
        Command::Show => Request::Fetch,
        Command::Update(update) => {
            update.validate().or_else(fail)?;
            Request::Update(update)
        }
        Command::UploadTemplate(path) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            Request::Upload(TemplateUpload::new(file_name, bytes).or_else(fail)?)
        }
    };

    let credential = require_session(&globals).await?;
    let api = globals.api_client()?;

    let settings = match request {
        Request::Fetch => fetch_settings(&api, &credential).await,
        Request::Update(update) => update_settings(&api, &credential, &update).await,
        Request::Upload(upload) => upload_template(&api, &credential, upload).await,
    }
    .or_else(fail)?;

    print_settings(&settings)
}

fn fail<T>(err: AuthError) -> Result<T> {
    eprintln!("{}", err.message());
    bail!("settings request failed: {}", err.code())
}

fn print_settings(settings: &InstitutionSettings) -> Result<()> {
    let rendered = serde_json::to_string_pretty(settings).context("failed to render settings")?;
    println!("{rendered}");
    Ok(())
}
