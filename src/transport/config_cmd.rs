//! `config show|set|init`

use serde_json::json;
use std::io::{BufRead, Write};
use std::path::Path;

use super::cli::ConfigCommand;
use super::output::{Failure, Outcome};
use super::Session;
use crate::config::{mask_token, Config, TokenKind};
use crate::core::FailureKind;

pub(super) fn run(session: &Session, cmd: ConfigCommand) -> Result<Outcome, Failure> {
    let path = match &session.config_path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    match cmd {
        ConfigCommand::Show => show(&session.config, &path),
        ConfigCommand::Set { key, value } => {
            // Edit the file as written, without environment overrides
            let mut config = Config::load_file(&path)?;
            config
                .set(&key, &value)
                .map_err(|e| Failure::invalid("invalid_key", format!("{:#}", e)))?;
            save(&config, &path)?;
            Outcome::success(json!({
                "config_file": path,
                "key": key,
                "updated": true,
            }))
        }
        ConfigCommand::Init => {
            let stdin = std::io::stdin();
            let config = prompt_config(&mut stdin.lock(), &mut std::io::stderr())?;
            save(&config, &path)?;
            Outcome::success(json!({
                "config_file": path,
                "require_approval": config.require_approval,
                "initialized": true,
            }))
        }
    }
}

fn show(config: &Config, path: &Path) -> Result<Outcome, Failure> {
    let read_kind = TokenKind::detect(&config.read_token);
    let write_kind = TokenKind::detect(&config.write_token);
    Outcome::success(json!({
        "config_file": path,
        "read_token": mask_token(&config.read_token),
        "read_token_type": read_kind.display_name(),
        "write_token": mask_token(&config.write_token),
        "write_token_type": write_kind.display_name(),
        "write_token_description": write_kind.description(),
        "user_token": mask_token(&config.user_token),
        "require_approval": config.require_approval,
        "api": {
            "base_url": config.api.base_url,
            "timeout_secs": config.api.timeout_secs,
            "max_retries": config.api.max_retries,
        },
    }))
}

fn save(config: &Config, path: &Path) -> Result<(), Failure> {
    config.save_to(path).map_err(|e| {
        Failure::new(FailureKind::General, "save_failed", format!("{:#}", e))
            .with_suggestion("Check file permissions")
    })
}

/// Ask for tokens and the approval setting; both tokens are required
fn prompt_config(input: &mut impl BufRead, output: &mut impl Write) -> Result<Config, Failure> {
    writeln!(output, "slka configuration")?;
    let mut config = Config {
        read_token: ask(input, output, "Read token (xoxb-... or xoxp-...): ")?,
        write_token: ask(input, output, "Write token (xoxb-... or xoxp-...): ")?,
        user_token: ask(input, output, "User token (xoxp-..., optional): ")?,
        ..Default::default()
    };
    let approval = ask(input, output, "Require approval for write operations? [Y/n]: ")?;
    config.require_approval = !matches!(approval.to_ascii_lowercase().as_str(), "n" | "no");

    config.validate().map_err(|e| {
        Failure::invalid("invalid_config", e.to_string())
            .with_suggestion("Read and write tokens are required")
    })?;
    Ok(config)
}

fn ask(input: &mut impl BufRead, output: &mut impl Write, prompt: &str) -> std::io::Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prompt_config() {
        let mut input = Cursor::new("xoxb-1-r\nxoxp-2-w\n\nn\n");
        let mut output = Vec::new();
        let config = prompt_config(&mut input, &mut output).unwrap();
        assert_eq!(config.read_token, "xoxb-1-r");
        assert_eq!(config.write_token, "xoxp-2-w");
        assert!(config.user_token.is_empty());
        assert!(!config.require_approval);
        assert!(String::from_utf8(output).unwrap().contains("Write token"));
    }

    #[test]
    fn test_prompt_config_defaults_to_approval() {
        let mut input = Cursor::new("xoxb-1-r\nxoxb-1-w\n");
        let config = prompt_config(&mut input, &mut Vec::new()).unwrap();
        assert!(config.require_approval);
    }

    #[test]
    fn test_prompt_config_requires_tokens() {
        let mut input = Cursor::new("xoxb-1-r\n\n\n\n");
        let err = prompt_config(&mut input, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code, "invalid_config");
    }

    #[test]
    fn test_show_masks_tokens() {
        let config = Config {
            read_token: "xoxb-1-2-abcd".into(),
            write_token: "xoxp-9-8-wxyz".into(),
            ..Default::default()
        };
        let outcome = show(&config, Path::new("/tmp/slka.toml")).unwrap();
        let Outcome::Success(data) = outcome else {
            panic!("expected success");
        };
        assert_eq!(data["read_token"], "xoxb-1-2-***d");
        assert_eq!(data["read_token_type"], "Bot Token");
        assert_eq!(data["write_token_type"], "User Token");
        assert_eq!(data["user_token"], "");
    }
}
