use clap::Parser;
use pkgbot_config::cli::{Cli, Commands};
use std::path::Path;

#[test]
fn test_parse_check() {
    let cli = Cli::try_parse_from(["pkgbot-config", "check", "--strict"]).unwrap();

    match cli.command {
        Commands::Check(args) => assert!(args.strict),
        _ => panic!("Wrong command"),
    }
    assert!(!cli.json);
    assert!(cli.config.is_none());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "pkgbot-config",
        "show",
        "PkgBot",
        "--json",
        "--config",
        "/etc/pkgbot/pkgbot_config.yaml",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(
        cli.config.as_deref(),
        Some(Path::new("/etc/pkgbot/pkgbot_config.yaml"))
    );
    match cli.command {
        Commands::Show(args) => assert_eq!(args.section.as_deref(), Some("PkgBot")),
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_get_requires_key() {
    assert!(Cli::try_parse_from(["pkgbot-config", "get"]).is_err());

    let cli = Cli::try_parse_from(["pkgbot-config", "get", "JamfPro_Prod.jps_url"]).unwrap();
    match cli.command {
        Commands::Get(args) => assert_eq!(args.key, "JamfPro_Prod.jps_url"),
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_redact_extra_values() {
    let cli = Cli::try_parse_from([
        "pkgbot-config",
        "redact",
        "some text",
        "--also",
        "abc",
        "-a",
        "def",
    ])
    .unwrap();

    match cli.command {
        Commands::Redact(args) => {
            assert_eq!(args.text.as_deref(), Some("some text"));
            assert_eq!(args.also, vec!["abc".to_string(), "def".to_string()]);
        }
        _ => panic!("Wrong command"),
    }
}

#[test]
fn test_parse_watch() {
    let cli = Cli::try_parse_from(["pkgbot-config", "watch"]).unwrap();
    assert!(matches!(cli.command, Commands::Watch));
}
