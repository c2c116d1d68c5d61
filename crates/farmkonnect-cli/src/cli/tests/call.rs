use super::*;
use crate::cli::commands::parse_params;
use farmkonnect_core::client::Method;

#[test]
fn cli_parse_call_defaults_to_get() {
    match parse(&["farmkonnect", "call", "farms.list"]).command {
        CliCommand::Call {
            procedure,
            method,
            params,
            data,
        } => {
            assert_eq!(procedure, "farms.list");
            assert_eq!(method, Method::Get);
            assert!(params.is_empty());
            assert!(data.is_none());
        }
        _ => panic!("expected Call"),
    }
}

#[test]
fn cli_parse_call_with_params_and_body() {
    let cli = parse(&[
        "farmkonnect",
        "call",
        "financial.addExpense",
        "-X",
        "post",
        "--param",
        "farmId=3",
        "-p",
        "note=feed",
        "--data",
        r#"{"amount":120}"#,
    ]);
    match cli.command {
        CliCommand::Call {
            method,
            params,
            data,
            ..
        } => {
            assert_eq!(method, Method::Post);
            assert_eq!(params, vec!["farmId=3", "note=feed"]);
            assert_eq!(data.as_deref(), Some(r#"{"amount":120}"#));
        }
        _ => panic!("expected Call"),
    }
}

#[test]
fn cli_parse_call_rejects_unknown_method() {
    assert!(Cli::try_parse_from(["farmkonnect", "call", "farms.list", "-X", "HEAD"]).is_err());
}

#[test]
fn params_split_on_first_equals() {
    let raw = vec!["q=a=b".to_string(), "limit=10".to_string()];
    let parsed = parse_params(&raw).unwrap();
    assert_eq!(
        parsed,
        vec![
            ("q".to_string(), "a=b".to_string()),
            ("limit".to_string(), "10".to_string())
        ]
    );
}

#[test]
fn params_without_key_are_rejected() {
    assert!(parse_params(&["novalue".to_string()]).is_err());
    assert!(parse_params(&["=x".to_string()]).is_err());
}
