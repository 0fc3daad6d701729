use super::*;

#[test]
fn signers_parse_from_both_notations() {
    assert_eq!(
        parse_signer("Ada Lovelace <ada@example.com>"),
        Ok(Signer::new("Ada Lovelace", "ada@example.com"))
    );
    assert_eq!(
        parse_signer(" Bob , bob@example.com "),
        Ok(Signer::new("Bob", "bob@example.com"))
    );
    assert_eq!(parse_signer(",carol@example.com"), Ok(Signer::new("", "carol@example.com")));
    assert!(parse_signer("Dan <dan@example.com").is_err());
    assert!(parse_signer("just-a-name").is_err());
}

#[test]
fn exactly_one_contract_source_is_required() {
    assert!(Cli::try_parse_from(["contractiq", "analyze"]).is_err());
    assert!(Cli::try_parse_from([
        "contractiq",
        "analyze",
        "--template",
        "1",
        "--text",
        "NDA"
    ])
    .is_err());

    let cli = Cli::try_parse_from(["contractiq", "analyze", "--template", "1", "--risks"])
        .expect("parse");
    match cli.command {
        Command::Analyze { input, risks } => {
            assert_eq!(input.template.as_deref(), Some("1"));
            assert!(risks);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn send_collects_repeated_signers_and_global_flags() {
    let cli = Cli::try_parse_from([
        "contractiq",
        "send",
        "--text",
        "SERVICE AGREEMENT",
        "--signer",
        "Ada <ada@example.com>",
        "--signer",
        "Bob,bob@example.com",
        "--no-persist",
    ])
    .expect("parse");

    assert!(cli.no_persist);
    let Command::Send { signers, .. } = cli.command else {
        panic!("expected send");
    };
    assert_eq!(signers.len(), 2);
    assert_eq!(signers[1].email, "bob@example.com");
}

#[test]
fn collaborator_roles_parse_case_insensitively() {
    let cli = Cli::try_parse_from([
        "contractiq",
        "collab",
        "--contract",
        "9",
        "invite",
        "bob@example.com",
        "--role",
        "Editor",
    ])
    .expect("parse");

    let Command::Collab { contract, action } = cli.command else {
        panic!("expected collab");
    };
    assert_eq!(contract, 9);
    assert!(matches!(
        action,
        CollabCommand::Invite {
            role: CollaboratorRole::Editor,
            ..
        }
    ));
}
