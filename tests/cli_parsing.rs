use clap::Parser;
use steward::cli::{Cli, Commands};

#[test]
fn test_parse_define() {
    let cli = Cli::try_parse_from(vec![
        "steward",
        "define",
        "T1",
        "--agent",
        "worker-agent",
        "--task-file",
        "tasks/t1.md",
        "--priority",
        "high",
        "--eta",
        "2026-08-24T18:00:00Z",
    ])
    .unwrap();

    match cli.command {
        Commands::Define(args) => {
            assert_eq!(args.task_id, "T1");
            assert_eq!(args.agent, "worker-agent");
            assert_eq!(args.task_file, "tasks/t1.md");
            assert_eq!(args.priority, "high");
            assert_eq!(args.eta.as_deref(), Some("2026-08-24T18:00:00Z"));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_define_defaults_priority() {
    let cli = Cli::try_parse_from(vec![
        "steward", "define", "T1", "--agent", "a", "--task-file", "f.md",
    ])
    .unwrap();

    match cli.command {
        Commands::Define(args) => {
            assert_eq!(args.priority, "medium");
            assert!(args.eta.is_none());
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_delegate_and_check() {
    let cli = Cli::try_parse_from(vec!["steward", "delegate", "T1"]).unwrap();
    assert!(matches!(cli.command, Commands::Delegate(args) if args.task_id == "T1"));

    let cli = Cli::try_parse_from(vec!["steward", "check", "T1"]).unwrap();
    assert!(matches!(cli.command, Commands::Check(args) if args.task_id == "T1"));
}

#[test]
fn test_parse_status_variants() {
    let cli = Cli::try_parse_from(vec!["steward", "status"]).unwrap();
    match cli.command {
        Commands::Status(args) => {
            assert!(args.task_id.is_none());
            assert!(!args.events);
        }
        _ => panic!("Wrong top-level command"),
    }

    let cli = Cli::try_parse_from(vec!["steward", "status", "T1", "--events"]).unwrap();
    match cli.command {
        Commands::Status(args) => {
            assert_eq!(args.task_id.as_deref(), Some("T1"));
            assert!(args.events);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_reset_with_target_state() {
    let cli = Cli::try_parse_from(vec!["steward", "reset", "T1", "--to-state", "error"]).unwrap();
    match cli.command {
        Commands::Reset(args) => {
            assert_eq!(args.task_id, "T1");
            assert_eq!(args.to_state, "error");
        }
        _ => panic!("Wrong top-level command"),
    }

    let cli = Cli::try_parse_from(vec!["steward", "reset", "T1"]).unwrap();
    match cli.command {
        Commands::Reset(args) => assert_eq!(args.to_state, "defined"),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_force_complete_default_reason() {
    let cli = Cli::try_parse_from(vec!["steward", "force-complete", "T1"]).unwrap();
    match cli.command {
        Commands::ForceComplete(args) => {
            assert_eq!(args.task_id, "T1");
            assert_eq!(args.reason, "operator override");
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_global_json_flag() {
    let cli = Cli::try_parse_from(vec!["steward", "report", "--json"]).unwrap();
    assert!(cli.json);
    assert!(matches!(cli.command, Commands::Report(_)));

    let cli = Cli::try_parse_from(vec!["steward", "clear-violations"]).unwrap();
    assert!(!cli.json);
    assert!(matches!(cli.command, Commands::ClearViolations(_)));
}

#[test]
fn test_missing_required_args_fail() {
    assert!(Cli::try_parse_from(vec!["steward", "define", "T1"]).is_err());
    assert!(Cli::try_parse_from(vec!["steward", "delegate"]).is_err());
}
