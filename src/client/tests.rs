use super::*;
use crate::exec::Output;
use crate::exec::mock::{MockRunner, fail, has_args, ok};
use crate::model::ChangeKind;

const COLLECTION: &str = "https://tfs.example.com/tfs/DefaultCollection";
const STATUS_BRIEF: &str = include_str!("../../tests/fixtures/status_brief.txt");
const STATUS_DETAILED: &str = include_str!("../../tests/fixtures/status_detailed.txt");
const HISTORY_DETAILED: &str = include_str!("../../tests/fixtures/history_detailed.txt");

fn collection_arg() -> String {
    format!("/collection:{COLLECTION}")
}

fn settings() -> WorkspaceSettings {
    WorkspaceSettings {
        local_root: PathBuf::from("/home/alice/ws"),
        server_root: Some("$/Proj".to_string()),
        workspace: Some("alice-dev".to_string()),
        collection: Some(COLLECTION.to_string()),
        history_window: 50,
    }
}

fn client(runner: MockRunner) -> TfClient<MockRunner> {
    let exec = Executor::new(runner, "tf", "/home/alice/ws")
        .with_collection(Some(COLLECTION.to_string()));
    TfClient::new(exec, settings(), PathBuf::from("/home/alice/ws"))
}

fn calls(client: &TfClient<MockRunner>) -> Vec<Vec<String>> {
    client.executor().runner().captured_args()
}

#[test]
fn test_pending_changes_prefers_detailed_format() {
    let tf = client(MockRunner::responding(|args| {
        if has_args(args, &["/format:detailed"]) {
            ok(STATUS_DETAILED)
        } else {
            ok(STATUS_BRIEF)
        }
    }));

    let changes = tf.pending_changes();
    assert_eq!(
        changes,
        vec![
            PendingChange {
                file: "/home/alice/ws/src/Foo.cs".to_string(),
                action: ChangeKind::Edit,
            },
            PendingChange {
                file: "/home/alice/ws/src/New.cs".to_string(),
                action: ChangeKind::Add,
            },
            PendingChange {
                file: "/home/alice/ws/docs/Readme.md".to_string(),
                action: ChangeKind::Rename,
            },
        ]
    );
    assert_eq!(calls(&tf).len(), 1);
}

#[test]
fn test_pending_changes_falls_back_through_variants() {
    let tf = client(MockRunner::responding(|args| {
        if has_args(args, &[collection_arg().as_str()]) {
            ok("Foo.cs   edit   C:\\ws\\Foo.cs\n")
        } else if has_args(args, &["/workspace:alice-dev"]) {
            ok("There are no pending changes.\n")
        } else {
            fail("TF10158: The item specification is not valid.")
        }
    }));

    let changes = tf.pending_changes();
    assert_eq!(
        changes,
        vec![PendingChange {
            file: "C:\\ws\\Foo.cs".to_string(),
            action: ChangeKind::Edit,
        }]
    );

    let calls = calls(&tf);
    assert_eq!(calls.len(), 4);
    assert!(has_args(&calls[0], &["status", "/format:detailed", "/recursive"]));
    assert!(has_args(&calls[1], &["status", "/format:brief"]));
    assert!(has_args(&calls[2], &["/format:brief", "/workspace:alice-dev"]));
    let collection = collection_arg();
    assert!(!has_args(&calls[2], &[collection.as_str()]));
    assert!(has_args(
        &calls[3],
        &["/workspace:alice-dev", collection.as_str()]
    ));
}

#[test]
fn test_pending_changes_empty_when_everything_fails() {
    let tf = client(MockRunner::responding(|_| fail("TF10158: invalid")));
    assert!(tf.pending_changes().is_empty());
    assert_eq!(calls(&tf).len(), 4);
}

#[test]
fn test_checkin_passes_comment_as_one_argument() {
    let tf = client(MockRunner::responding(|_| ok("Changeset #104 checked in.")));
    tf.checkin("fix: handle \"quotes\" & spaces", &[]).unwrap();
    tf.checkin("partial", &["src/A.cs".to_string(), "$/Proj/B.cs".to_string()])
        .unwrap();

    let calls = calls(&tf);
    assert_eq!(
        calls[0],
        vec![
            "checkin",
            "/comment:fix: handle \"quotes\" & spaces",
            "/noprompt",
            "/recursive",
            "/home/alice/ws",
        ]
    );
    assert_eq!(
        calls[1],
        vec![
            "checkin",
            "/comment:partial",
            "/noprompt",
            "/home/alice/ws/src/A.cs",
            "$/Proj/B.cs",
        ]
    );
}

#[test]
fn test_execution_failure_propagates() {
    let tf = client(MockRunner::responding(|_| Output {
        code: Some(1),
        stdout: "TF203015: The item $/Proj/A.cs has an incompatible pending change.".to_string(),
        stderr: String::new(),
    }));
    let err = tf.undo(&[]).unwrap_err();
    assert!(err.to_string().starts_with("TF203015"));
    assert!(tf.get_latest().is_err());
}

#[test]
fn test_history_parses_entries_in_order() {
    let tf = client(MockRunner::responding(|_| ok(HISTORY_DETAILED)));
    let entries = tf.history(None, 10).unwrap();
    let ids: Vec<u64> = entries.iter().map(|e| e.changeset_id).collect();
    assert_eq!(ids, vec![103, 102, 101]);
    assert!(has_args(
        &calls(&tf)[0],
        &["history", "$/Proj", "/format:detailed", "/stopafter:10"]
    ));
}

#[test]
fn test_changeset_lookup_uses_scoped_history() {
    let tf = client(MockRunner::responding(|args| {
        if has_args(args, &["/version:C101~C101"]) {
            ok("Changeset: 101\nUser: alice\nComment: fix bug\nItems:\n  edit $/Proj/A.cs\n")
        } else {
            fail("unexpected")
        }
    }));
    let entry = tf.changeset(101).unwrap().unwrap();
    assert_eq!(entry.author.as_deref(), Some("alice"));
    assert_eq!(calls(&tf).len(), 1);
}

#[test]
fn test_changeset_lookup_falls_back_and_reports_not_found() {
    let tf = client(MockRunner::responding(|args| {
        if args[0] == "changeset" {
            ok("Changeset: 55\nUser: bob\nComment:\n  older\nItems:\n  add $/Proj/X.cs\n")
        } else {
            fail("TF14021: The specified changeset does not exist.")
        }
    }));
    assert_eq!(tf.changeset(55).unwrap().map(|e| e.changeset_id), Some(55));
    // the direct query answered with a different changeset
    assert_eq!(tf.changeset(56).unwrap(), None);
}

#[test]
fn test_changeset_lookup_errors_when_nothing_answers() {
    let tf = client(MockRunner::responding(|_| fail("TF30040: database unavailable")));
    assert!(tf.changeset(1).is_err());
}

#[test]
fn test_previous_revision_picks_nearest_lower_id() {
    let tf = client(MockRunner::responding(|_| ok(HISTORY_DETAILED)));
    assert_eq!(tf.previous_revision("$/Proj/A.cs;C103", 103).unwrap(), Some(102));
    assert_eq!(tf.previous_revision("$/Proj/A.cs", 102).unwrap(), Some(101));
    assert_eq!(tf.previous_revision("$/Proj/A.cs", 101).unwrap(), None);

    let calls = calls(&tf);
    assert!(has_args(&calls[0], &["$/Proj/A.cs", "/version:C103", "/stopafter:50"]));
}

#[test]
fn test_file_at_revision_materialises_temp_file() {
    let tf = client(MockRunner::responding(|_| ok("")));
    let path = tf.file_at_revision("$/Proj/src/A.cs;C9", 42).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("tfvc-"));
    assert!(name.ends_with(".C42.cs"));
    assert!(path.exists());

    let calls = calls(&tf);
    let args = &calls[0];
    assert_eq!(args[0], "view");
    assert_eq!(args[1], "$/Proj/src/A.cs;C42");
    assert_eq!(args[2], format!("/output:{}", path.display()));

    fs::remove_file(&path).unwrap();
}

#[test]
fn test_file_at_revision_cleans_up_on_failure() {
    let tf = client(MockRunner::responding(|_| fail("TF10123: no such item")));
    assert!(tf.file_at_revision("$/Proj/missing.txt", 3).is_err());

    let calls = calls(&tf);
    let args = &calls[0];
    let target = args[2].trim_start_matches("/output:");
    assert!(!Path::new(target).exists());
}

#[test]
fn test_branch_merge_resolve_rollback_arguments() {
    let tf = client(MockRunner::responding(|args| {
        if args[0] == "branches" {
            ok(">> $/Proj/Main <<\n   $/Proj/Dev  Branched from version 3\n")
        } else {
            ok("")
        }
    }));

    assert_eq!(
        tf.branches(None).unwrap(),
        vec!["$/Proj/Main".to_string(), "$/Proj/Dev".to_string()]
    );
    tf.create_branch("$/Proj/Main", "$/Proj/Release", Some(100)).unwrap();
    tf.merge("$/Proj/Dev", "$/Proj/Main", Some(77)).unwrap();
    tf.resolve(Some("src/A.cs"), ResolveStrategy::AcceptTheirs).unwrap();
    tf.rollback(90).unwrap();

    let calls = calls(&tf);
    assert_eq!(
        calls[0],
        vec!["branches".to_string(), "$/Proj".to_string(), collection_arg()]
    );
    assert_eq!(
        calls[1],
        vec!["branch", "$/Proj/Main", "$/Proj/Release", "/version:C100", "/noprompt"]
    );
    assert_eq!(
        calls[2],
        vec!["merge", "$/Proj/Dev", "$/Proj/Main", "/recursive", "/version:C77~C77", "/noprompt"]
    );
    assert_eq!(
        calls[3],
        vec!["resolve", "/home/alice/ws/src/A.cs", "/recursive", "/auto:AcceptTheirs", "/noprompt"]
    );
    assert_eq!(
        calls[4],
        vec!["rollback", "/changeset:C90", "/recursive", "/home/alice/ws", "/noprompt"]
    );
}

#[test]
fn test_branches_without_server_root_needs_a_path() {
    let exec = Executor::new(MockRunner::responding(|_| ok("")), "tf", "/ws");
    let tf = TfClient::new(
        exec,
        WorkspaceSettings {
            local_root: PathBuf::from("/ws"),
            server_root: None,
            workspace: None,
            collection: None,
            history_window: 50,
        },
        PathBuf::from("/ws"),
    );
    assert!(matches!(tf.branches(None), Err(TfError::Config(_))));
    // and without a workspace there is nothing to bind
    assert_eq!(tf.ensure_workspace().unwrap(), None);
    assert!(tf.executor().runner().captured.borrow().is_empty());
}

#[test]
fn test_ensure_workspace_reports_binding() {
    let tf = client(MockRunner::responding(|args| {
        if args[0] == "workfold" && args.len() == 2 {
            ok("Workspace : alice-dev (alice)\n $/Proj: /home/alice/ws\n")
        } else {
            fail("unexpected")
        }
    }));
    assert_eq!(
        tf.ensure_workspace().unwrap(),
        Some(Binding::AlreadyMapped("$/Proj".to_string()))
    );
}

#[test]
fn test_get_add_undo_arguments() {
    let tf = client(MockRunner::responding(|_| ok("")));
    tf.get_latest().unwrap();
    tf.add(&["src/New.cs".to_string(), "/home/alice/ws/docs/Guide.md".to_string()])
        .unwrap();
    tf.undo(&["src/A.cs".to_string(), "$/Proj/B.cs".to_string()])
        .unwrap();
    tf.undo(&[]).unwrap();

    let calls = calls(&tf);
    assert_eq!(calls[0], vec!["get", "/home/alice/ws", "/recursive", "/noprompt"]);
    assert_eq!(
        calls[1],
        vec![
            "add",
            "/home/alice/ws/src/New.cs",
            "/home/alice/ws/docs/Guide.md",
            "/noprompt",
        ]
    );
    assert_eq!(
        calls[2],
        vec!["undo", "/noprompt", "/home/alice/ws/src/A.cs", "$/Proj/B.cs"]
    );
    assert_eq!(calls[3], vec!["undo", "/noprompt", "/recursive", "/home/alice/ws"]);
}

#[test]
fn test_branch_and_merge_name_local_items_server_side() {
    let tf = client(MockRunner::responding(|_| ok("")));
    tf.create_branch("Main", "Releases/R1", None).unwrap();
    tf.merge("/home/alice/ws/Dev", "Main;C12", None).unwrap();
    // outside the mapping there is no server path to use
    tf.merge("/elsewhere/Dev", "$/Proj/Main", None).unwrap();

    let calls = calls(&tf);
    assert_eq!(
        calls[0],
        vec!["branch", "$/Proj/Main", "$/Proj/Releases/R1", "/noprompt"]
    );
    assert_eq!(
        calls[1],
        vec!["merge", "$/Proj/Dev", "$/Proj/Main", "/recursive", "/noprompt"]
    );
    assert_eq!(calls[2][1], "/elsewhere/Dev");
}
