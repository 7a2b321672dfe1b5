use crate::{
    cli::{actions::TerminalNavigator, globals::GlobalArgs},
    session::{LinkVerifier, VerificationOutcome, VerifyOptions},
};
use anyhow::{Result, bail};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub link: String,
}

/// Verifies a magic link and follows the resulting redirect.
///
/// # Errors
/// Returns an error if the client cannot be built or verification fails.
pub async fn execute(args: Args) -> Result<()> {
    let Args { globals, link } = args;

    let verifier = LinkVerifier::new(
        &globals.api_client()?,
        globals.credential_store(),
        Arc::new(TerminalNavigator),
        VerifyOptions::from_config(&globals.config),
    );

    println!("Verifying your login link...");
    let mut mount = verifier.mount_link(&link);

    match mount.settled().await {
        VerificationOutcome::Success(_) => {
            println!("Login successful! Taking you to your dashboard...");
            mount.finished().await;
            Ok(())
        }
        VerificationOutcome::Failure(err) => {
            eprintln!("{}", err.message());
            let countdown = mount.countdown();
            tokio::select! {
                () = mount.finished() => {}
                () = print_countdown(countdown) => {}
            }
            bail!("verification failed: {}", err.code())
        }
        VerificationOutcome::Pending => bail!("verification was interrupted"),
    }
}

// Runs until the sender is dropped, which happens once the redirect has fired.
async fn print_countdown(mut countdown: watch::Receiver<Option<u32>>) {
    loop {
        let remaining = *countdown.borrow_and_update();
        if let Some(seconds) = remaining.filter(|seconds| *seconds > 0) {
            println!("Redirecting to login in {seconds}...");
        }
        if countdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
