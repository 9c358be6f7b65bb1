use crate::harness::{Assertion, ErrorMatch, Scenario};
use quest_core::{Advance, CheckStatus, PLACEHOLDER};
use std::collections::HashMap;

const MAIN: &[u8] = b"mod greet;\n\nfn main() {\n    println!(\"{}\", greet::greet(\"world\"));\n}\n";
const GREET: &[u8] = b"pub fn greet(name: &str) -> String {\n    format!(\"Hello, {}!\", name)\n}\n";
const GREET_TESTED: &[u8] = b"pub fn greet(name: &str) -> String {\n    format!(\"Hello, {}!\", name)\n}\n\n#[cfg(test)]\nmod tests {\n    #[test]\n    fn greets() {\n        assert_eq!(super::greet(\"x\"), \"Hello, x!\");\n    }\n}\n";

#[test]
fn test_walk_through_whole_plan() {
    Scenario::new("walk_through_whole_plan")
        .from_fixture("default")
        .begin_with_plan("greeter")
        .assert(Assertion::TaskCount(4))
        .assert_not_started()
        .next()
        .assert_last_advance(Advance::Started)
        .assert_on_task(1)
        .assert_file_content("src/main.rs", PLACEHOLDER)
        .check()
        .assert_last_check(CheckStatus::Fail)
        .assert(Assertion::LastCheckMessage("1 of 2 checks failed".to_string()))
        .learner_writes("src/main.rs", MAIN)
        .check()
        .assert_last_check(CheckStatus::Pass)
        .assert(Assertion::LastCheckMessage("All checks passed".to_string()))
        .assert_completed(&["t1"])
        .next()
        .assert_last_advance(Advance::Moved { from: 0, to: 1 })
        .assert_no_last_check()
        .assert_file_content("src/greet.rs", PLACEHOLDER)
        .check()
        .assert(Assertion::LastCheckMessage("1 of 2 checks failed".to_string()))
        .learner_writes("src/greet.rs", GREET)
        .check()
        .next()
        .assert_on_task(3)
        .learner_writes("src/greet.rs", GREET_TESTED)
        .check()
        .next()
        .assert_on_task(4)
        .learner_writes("README.md", b"# Greeter\n\ncargo run\n")
        .check()
        .assert_completed(&["t1", "t2", "t3", "t4"])
        .next()
        .assert_last_advance(Advance::Finished { total: 4 })
        .assert_all_tasks_complete()
        .next()
        .assert_last_advance(Advance::AlreadyComplete { total: 4 })
        .assert_all_tasks_complete()
        .complete()
        .assert_no_quest()
        .assert_file_exists("src/greet.rs")
        .run()
        .expect("scenario should pass");
}

#[test]
fn test_placeholders_never_overwrite_learner_files() {
    Scenario::new("placeholders_never_overwrite")
        .from_fixture("default")
        .with_file("src/main.rs", b"fn main() {}\n")
        .begin_with_plan("greeter")
        .next()
        .assert_file_content("src/main.rs", "fn main() {}\n")
        .check()
        .assert_last_check(CheckStatus::Pass)
        .run()
        .unwrap();
}

#[test]
fn test_begin_rejects_second_quest_and_unknown_templates() {
    Scenario::new("begin_rejections")
        .begin_with_template("no-such-template")
        .fails_with(ErrorMatch::TemplateNotFound)
        .assert_no_quest()
        .begin_with_plan("greeter")
        .begin_with_plan("greeter")
        .fails_with(ErrorMatch::SessionExists)
        .assert_not_started()
        .run()
        .unwrap();
}

#[test]
fn test_builtin_template_creates_first_files() {
    Scenario::new("builtin_template")
        .begin_with_template("rust-cli-basics")
        .assert(Assertion::TaskCount(3))
        .next()
        .assert_file_exists("src/main.rs")
        .learner_writes("Cargo.toml", b"[package]\nname = \"wc\"\n")
        .learner_writes("src/main.rs", b"fn main() {\n    println!(\"hello\");\n}\n")
        .check()
        .assert_last_check(CheckStatus::Pass)
        .assert_completed(&["t1"])
        .run()
        .unwrap();
}

#[test]
fn test_existing_project_passes_first_task() {
    let files = HashMap::from([
        ("Cargo.toml", &b"[package]\nname = \"wc\"\n"[..]),
        ("src/main.rs", &b"fn main() {\n    println!(\"hello\");\n}\n"[..]),
    ]);

    Scenario::new("existing_project")
        .with_files(files)
        .begin_with_template("rust-cli-basics")
        .next()
        .assert_file_contains("src/main.rs", "println!")
        .check()
        .assert_last_check(CheckStatus::Pass)
        .assert_completed(&["t1"])
        .run()
        .unwrap();
}
