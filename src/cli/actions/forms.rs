use crate::{
    cli::globals::GlobalArgs,
    forms::{login_link::request_login_link, newsletter},
    session::AuthError,
};
use anyhow::{Result, bail};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
}

fn report(result: Result<&'static str, AuthError>) -> Result<()> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            eprintln!("{}", err.message());
            bail!("request failed: {}", err.code())
        }
    }
}

/// # Errors
/// Returns an error if the address is invalid or the request is rejected.
pub async fn request_link(args: Args) -> Result<()> {
    let api = args.globals.api_client()?;
    report(request_login_link(&api, &args.email).await)
}

/// # Errors
/// Returns an error if the address is invalid or already subscribed.
pub async fn subscribe(args: Args) -> Result<()> {
    let api = args.globals.api_client()?;
    report(newsletter::subscribe(&api, &args.email).await)
}
