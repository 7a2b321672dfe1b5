pub mod logging;
pub mod settings;

use crate::config::{DEFAULT_API_BASE_URL, DEFAULT_FRONTEND_BASE_URL};
use clap::{
    Arg, ColorChoice, Command,
    builder::{
        PossibleValuesParser,
        styling::{AnsiColor, Effects, Styles},
    },
};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_FRONTEND_URL: &str = "frontend-url";
pub const ARG_STORE: &str = "store";
pub const ARG_LINK: &str = "link";
pub const ARG_EMAIL: &str = "email";
pub const ARG_THEME_MODE: &str = "mode";

pub const CMD_VERIFY: &str = "verify";
pub const CMD_GATE: &str = "gate";
pub const CMD_REQUEST_LINK: &str = "request-link";
pub const CMD_SUBSCRIBE: &str = "subscribe";
pub const CMD_THEME: &str = "theme";
pub const CMD_LOGOUT: &str = "logout";

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Institution email address")
        .required(true)
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("instipass")
        .about("Instipass institution sign-in client")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Base URL of the Instipass API")
                .env("INSTIPASS_API_URL")
                .default_value(DEFAULT_API_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_URL)
                .long("frontend-url")
                .help("Base URL used for login and dashboard redirects")
                .env("INSTIPASS_FRONTEND_URL")
                .default_value(DEFAULT_FRONTEND_BASE_URL)
                .global(true),
        )
        .arg(
            Arg::new(ARG_STORE)
                .long("store")
                .help("Client storage file (default: $HOME/.instipass/storage.json)")
                .env("INSTIPASS_STORE")
                .global(true),
        )
        .subcommand(
            Command::new(CMD_VERIFY)
                .about("Exchange a magic login link for a session")
                .arg(
                    Arg::new(ARG_LINK)
                        .help("The full link from the login email")
                        .required(true),
                ),
        )
        .subcommand(Command::new(CMD_GATE).about("Check that the stored session is still valid"))
        .subcommand(
            Command::new(CMD_REQUEST_LINK)
                .about("Email a login link to the institution")
                .arg(email_arg()),
        )
        .subcommand(
            Command::new(CMD_SUBSCRIBE)
                .about("Subscribe an address to the newsletter")
                .arg(email_arg()),
        )
        .subcommand(settings::command())
        .subcommand(
            Command::new(CMD_THEME).about("Show or change the theme").arg(
                Arg::new(ARG_THEME_MODE)
                    .value_parser(PossibleValuesParser::new(["show", "light", "dark", "toggle"]))
                    .default_value("show"),
            ),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Forget the stored session"));

    logging::with_args(command)
}
