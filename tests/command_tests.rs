// tests/command_tests.rs

use cfgtree::{Engine, ErrorCode, Flags, STATUS_FAILURE, STATUS_QUIT};

fn hosts() -> Engine {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let (status, _) = aug.srun(
        "set /files/etc/hosts/1/ipaddr 127.0.0.1\n\
         set /files/etc/hosts/1/canonical localhost.localdomain\n\
         set /files/etc/hosts/1/alias localhost\n\
         set /files/etc/hosts/2/ipaddr 192.168.0.1\n\
         set /files/etc/hosts/2/canonical gateway\n",
    );
    assert_eq!(status, 5);
    aug
}

// ============================================================================
// Status Codes
// ============================================================================

#[test]
fn test_blank_input() {
    let mut aug = hosts();
    assert_eq!(aug.srun(""), (0, String::new()));
    assert_eq!(aug.srun(" "), (0, String::new()));
    assert_eq!(aug.srun("# just a comment"), (0, String::new()));
}

#[test]
fn test_get_single_match() {
    let mut aug = hosts();
    assert_eq!(
        aug.srun("get /files/etc/hosts/*[canonical='localhost.localdomain']/ipaddr"),
        (
            1,
            "/files/etc/hosts/*[canonical='localhost.localdomain']/ipaddr = 127.0.0.1\n"
                .to_string()
        )
    );
}

#[test]
fn test_unknown_command() {
    let mut aug = hosts();
    assert_eq!(aug.srun("foo"), (STATUS_FAILURE, String::new()));
    // Syntax errors never reach the error record
    assert_eq!(aug.error().code, ErrorCode::NoError);
}

#[test]
fn test_missing_arguments() {
    let mut aug = hosts();
    assert_eq!(aug.srun("set"), (STATUS_FAILURE, String::new()));
    assert_eq!(aug.srun("get"), (STATUS_FAILURE, String::new()));
    assert_eq!(aug.srun("mv /files/a"), (STATUS_FAILURE, String::new()));
    assert_eq!(aug.srun("quit now"), (STATUS_FAILURE, String::new()));
}

#[test]
fn test_quit() {
    let mut aug = hosts();
    assert_eq!(aug.srun("quit"), (STATUS_QUIT, String::new()));
}

#[test]
fn test_quit_stops_the_script() {
    let mut aug = hosts();
    let (status, _) = aug.srun("quit\nset /files/after 1");
    assert_eq!(status, STATUS_QUIT);
    assert_eq!(aug.get("/files/after").unwrap(), None);
}

#[test]
fn test_status_counts_commands() {
    let mut aug = Engine::create("/", None, Flags::NONE);
    let (status, out) = aug.srun("set /files/a 1\n\n# note\nset /files/b 2\nget /files/a\n");
    assert_eq!(status, 3);
    assert_eq!(out, "/files/a = 1\n");
}

#[test]
fn test_failure_keeps_earlier_output() {
    let mut aug = hosts();
    let (status, out) = aug.srun("get /files/etc/hosts/1/ipaddr\nget /files/etc/hosts/*/ipaddr");
    assert_eq!(status, STATUS_FAILURE);
    assert_eq!(out, "/files/etc/hosts/1/ipaddr = 127.0.0.1\n");
    assert_eq!(aug.error().code, ErrorCode::MultipleMatches);
}

#[test]
fn test_invalid_path_is_recorded() {
    let mut aug = hosts();
    let (status, _) = aug.srun("get /files//etc");
    assert_eq!(status, STATUS_FAILURE);
    assert_eq!(aug.error().code, ErrorCode::InvalidPath);
    assert_eq!(aug.error().minor, Some(7));
}

#[test]
fn test_successful_run_clears_error_record() {
    let mut aug = hosts();
    aug.srun("get /files/etc/hosts/*/ipaddr");
    assert!(aug.error().is_error());
    aug.srun("get /files/etc/hosts/2/ipaddr");
    assert!(!aug.error().is_error());
}

// ============================================================================
// Command Output
// ============================================================================

#[test]
fn test_get_value_less_and_missing() {
    let mut aug = hosts();
    let (status, out) = aug.srun(
        "clear /files/etc/hosts/1/alias\n\
         get /files/etc/hosts/1/alias\n\
         get /files/etc/hosts/9",
    );
    assert_eq!(status, 3);
    assert_eq!(
        out,
        "/files/etc/hosts/1/alias (o)\n/files/etc/hosts/9 (none)\n"
    );
}

#[test]
fn test_set_quoted_value() {
    let mut aug = hosts();
    let (status, out) = aug.srun("set /files/etc/motd \"hello world\"\nget /files/etc/motd");
    assert_eq!(status, 2);
    assert_eq!(out, "/files/etc/motd = hello world\n");
}

#[test]
fn test_rm_reports_count() {
    let mut aug = hosts();
    assert_eq!(
        aug.srun("rm /files/etc/hosts/1"),
        (1, "rm : /files/etc/hosts/1 4\n".to_string())
    );
}

#[test]
fn test_match_lists_paths_and_values() {
    let mut aug = hosts();
    let (status, out) = aug.srun("match /files/etc/hosts/*/ipaddr");
    assert_eq!(status, 1);
    assert_eq!(
        out,
        "/files/etc/hosts/1/ipaddr = 127.0.0.1\n/files/etc/hosts/2/ipaddr = 192.168.0.1\n"
    );
}

#[test]
fn test_match_filters_by_value() {
    let mut aug = hosts();
    let (_, out) = aug.srun("match /files/etc/hosts/*/canonical gateway");
    assert_eq!(out, "/files/etc/hosts/2/canonical = gateway\n");

    let (status, out) = aug.srun("match /files/etc/fstab/*");
    assert_eq!(status, 1);
    assert_eq!(out, "  (no matches)\n");
}

#[test]
fn test_ls_marks_parents() {
    let mut aug = hosts();
    let (_, out) = aug.srun("ls /files/etc/hosts");
    assert_eq!(out, "1/\n2/\n");

    let (_, out) = aug.srun("ls /files/etc/hosts/2");
    assert_eq!(out, "ipaddr = 192.168.0.1\ncanonical = gateway\n");
}

#[test]
fn test_print_subtree() {
    let mut aug = hosts();
    let (status, out) = aug.srun("print /files/etc/hosts/2");
    assert_eq!(status, 1);
    assert_eq!(
        out,
        "/files/etc/hosts/2\n\
         /files/etc/hosts/2/ipaddr = \"192.168.0.1\"\n\
         /files/etc/hosts/2/canonical = \"gateway\"\n"
    );
}

#[test]
fn test_print_numbers_repeated_labels() {
    let mut aug = hosts();
    let (status, out) = aug.srun(
        "rm /files/etc/hosts/2\n\
         set /files/etc/hosts/1/alias[2] local\n\
         print /files/etc/hosts",
    );
    assert_eq!(status, 3);
    assert_eq!(
        out,
        "rm : /files/etc/hosts/2 3\n\
         /files/etc/hosts\n\
         /files/etc/hosts/1\n\
         /files/etc/hosts/1/ipaddr = \"127.0.0.1\"\n\
         /files/etc/hosts/1/canonical = \"localhost.localdomain\"\n\
         /files/etc/hosts/1/alias[1] = \"localhost\"\n\
         /files/etc/hosts/1/alias[2] = \"local\"\n"
    );
}

#[test]
fn test_move_and_insert() {
    let mut aug = hosts();
    let (status, _) = aug.srun(
        "mv /files/etc/hosts/2 /files/etc/hosts/3\n\
         ins alias after /files/etc/hosts/3/canonical\n\
         set /files/etc/hosts/3/alias gw",
    );
    assert_eq!(status, 3);
    assert_eq!(
        aug.matches("/files/etc/hosts/*").unwrap(),
        vec!["/files/etc/hosts/1", "/files/etc/hosts/3"]
    );
    assert_eq!(aug.get("/files/etc/hosts/3/alias").unwrap().as_deref(), Some("gw"));
}

#[test]
fn test_bad_insert_position() {
    let mut aug = hosts();
    assert_eq!(
        aug.srun("ins alias beside /files/etc/hosts/1/alias"),
        (STATUS_FAILURE, String::new())
    );
}

#[test]
fn test_save_command() {
    let mut aug = hosts();
    assert_eq!(aug.srun("save"), (1, String::new()));
    assert_eq!(aug.get("/augeas/events/saved").unwrap().as_deref(), Some("1"));
}
