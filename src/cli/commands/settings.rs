use clap::{Arg, Command};

pub const CMD_SETTINGS: &str = "settings";
pub const CMD_SHOW: &str = "show";
pub const CMD_UPDATE: &str = "update";
pub const CMD_UPLOAD_TEMPLATE: &str = "upload-template";

pub const ARG_FILE: &str = "file";
/// Updatable settings fields, each exposed as `--<field>`.
pub const UPDATE_FIELDS: [&str; 5] = ["name", "email", "phone", "address", "website"];

#[must_use]
pub fn command() -> Command {
    let update = UPDATE_FIELDS.iter().fold(
        Command::new(CMD_UPDATE)
            .about("Update institution details")
            .arg_required_else_help(true),
        |command, field| {
            command.arg(
                Arg::new(*field)
                    .long(*field)
                    .help(format!("New institution {field}")),
            )
        },
    );

    Command::new(CMD_SETTINGS)
        .about("Manage institution settings (requires a valid session)")
        .subcommand_required(true)
        .subcommand(Command::new(CMD_SHOW).about("Show institution settings"))
        .subcommand(update)
        .subcommand(
            Command::new(CMD_UPLOAD_TEMPLATE)
                .about("Upload the ID card template image (JPEG, PNG, GIF or SVG, 2MB max)")
                .arg(
                    Arg::new(ARG_FILE)
                        .help("Path to the template image")
                        .required(true),
                ),
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn update_takes_field_flags() {
        let matches = command().get_matches_from(vec![
            "settings",
            "update",
            "--name",
            "State University",
            "--website",
            "https://uni.edu",
        ]);
        let sub = matches.subcommand_matches(CMD_UPDATE).unwrap();
        assert_eq!(
            sub.get_one::<String>("name").map(String::as_str),
            Some("State University")
        );
        assert!(sub.get_one::<String>("phone").is_none());
    }

    #[test]
    fn upload_requires_file() {
        assert!(
            command()
                .try_get_matches_from(vec!["settings", "upload-template"])
                .is_err()
        );
    }
}
