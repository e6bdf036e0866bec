use std::sync::{Arc, Mutex};
use std::time::Duration;

use dbi_common::types::{
    BackendId, CallTraceEvent, ControlMarker, TraceLocation, VariableBatch, VariableTriple,
};
use dbi_tui::{App, Config, DataManager, DebugEvent, SessionClient, SortOrder, TuiConfig};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

/// Session double that records filter requests and swallows the rest.
#[derive(Debug, Default)]
struct StubSession {
    filters: Mutex<Vec<(BackendId, bool, String)>>,
}

impl SessionClient for StubSession {
    fn request_variables(
        &self,
        _backend: &BackendId,
        _globals: bool,
        _path: &[String],
        _offset: usize,
        _frame: usize,
    ) {
    }

    fn request_set_active_thread(&self, _backend: &BackendId, _thread_id: u64) {}

    fn request_filter_change(&self, backend: &BackendId, globals: bool, pattern: &str) {
        self.filters.lock().unwrap().push((backend.clone(), globals, pattern.to_string()));
    }

    fn request_set_call_trace(&self, _backend: &BackendId, _enabled: bool) {}
}

fn manager() -> (Arc<StubSession>, DataManager) {
    let session = Arc::new(StubSession::default());
    let dm = DataManager::new(session.clone(), &Config::default());
    (session, dm)
}

fn connect(dm: &mut DataManager, backend: &str) {
    dm.dispatch(DebugEvent::BackendConnected(backend.to_string()));
}

fn batch(
    backend: &str,
    path: &[&str],
    items: &[(&str, &str, &str)],
    marker: ControlMarker,
) -> DebugEvent {
    DebugEvent::Variables(VariableBatch {
        backend: backend.to_string(),
        globals: false,
        path: path.iter().map(|s| s.to_string()).collect(),
        frame: match marker {
            ControlMarker::NewGeneration { frame } => frame,
            _ => 0,
        },
        items: items
            .iter()
            .map(|(name, tag, value)| VariableTriple::new(*name, *tag, *value))
            .collect(),
        marker,
    })
}

fn location(function: &str, line: usize) -> TraceLocation {
    TraceLocation { file: "app.py".to_string(), line, function: function.to_string() }
}

#[test]
fn test_default_tui_config() {
    let config = TuiConfig::default();

    assert_eq!(config.refresh_interval, Duration::from_millis(50));
    assert!(!config.enable_mouse);
}

#[test]
fn test_custom_tui_config_clone() {
    let config =
        TuiConfig { refresh_interval: Duration::from_millis(500), enable_mouse: true };

    let cloned = config.clone();

    assert_eq!(cloned.refresh_interval, Duration::from_millis(500));
    assert!(cloned.enable_mouse);
}

#[test]
fn test_locals_tree_builds_from_batches() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");

    dm.dispatch(batch(
        "dbg-1",
        &[],
        &[("name", "str", "'bob'"), ("items", "list", "3")],
        ControlMarker::NewGeneration { frame: 0 },
    ));

    let rows = dm.locals.visible_rows(SortOrder::Ascending);
    let names: Vec<&str> =
        rows.iter().map(|r| r.path.last().map(String::as_str).unwrap_or("")).collect();
    assert_eq!(names, vec!["items", "name"], "top level is sorted by name");

    // Opening a container shows its children once their batch lands.
    dm.locals.expand(vec!["items".to_string()]);
    dm.dispatch(batch(
        "dbg-1",
        &["items"],
        &[("0", "int", "7"), ("10", "int", "8"), ("2", "int", "9")],
        ControlMarker::Complete,
    ));

    let rows = dm.locals.visible_rows(SortOrder::Ascending);
    let names: Vec<&str> =
        rows.iter().map(|r| r.path.last().map(String::as_str).unwrap_or("")).collect();
    assert_eq!(
        names,
        vec!["items", "0", "2", "10", "name"],
        "indices sort numerically, not lexically"
    );
    assert_eq!(rows[1].depth, 1);
}

#[test]
fn test_expansion_survives_a_new_generation() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");

    dm.dispatch(batch(
        "dbg-1",
        &[],
        &[("items", "list", "2")],
        ControlMarker::NewGeneration { frame: 0 },
    ));
    dm.locals.expand(vec!["items".to_string()]);
    dm.dispatch(batch(
        "dbg-1",
        &["items"],
        &[("0", "int", "1"), ("1", "int", "2")],
        ControlMarker::Complete,
    ));
    assert_eq!(dm.locals.visible_rows(SortOrder::Ascending).len(), 3);

    // The debuggee stops somewhere else: the tree resets, but the
    // user's open set does not.
    dm.dispatch(batch(
        "dbg-1",
        &[],
        &[("items", "list", "2")],
        ControlMarker::NewGeneration { frame: 1 },
    ));
    assert!(dm.locals.is_expanded(&["items".to_string()]));

    dm.dispatch(batch(
        "dbg-1",
        &["items"],
        &[("0", "int", "5"), ("1", "int", "6")],
        ControlMarker::Complete,
    ));
    let rows = dm.locals.visible_rows(SortOrder::Ascending);
    assert_eq!(rows.len(), 3, "reopened without user interaction");
}

#[test]
fn test_gone_marker_removes_the_node() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");

    dm.dispatch(batch(
        "dbg-1",
        &[],
        &[("a", "int", "1"), ("b", "int", "2")],
        ControlMarker::NewGeneration { frame: 0 },
    ));
    dm.dispatch(batch("dbg-1", &["b"], &[], ControlMarker::Gone));

    let rows = dm.locals.visible_rows(SortOrder::Ascending);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].path, vec!["a".to_string()]);
}

#[test]
fn test_batches_for_other_backends_are_dropped() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");

    dm.dispatch(batch(
        "dbg-2",
        &[],
        &[("stray", "int", "1")],
        ControlMarker::NewGeneration { frame: 0 },
    ));

    assert!(dm.locals.visible_rows(SortOrder::Ascending).is_empty());
}

#[test]
fn test_filter_change_is_forwarded_to_the_session() {
    let (session, mut dm) = manager();
    connect(&mut dm, "dbg-1");

    dm.locals.change_filter("user_*");

    let filters = session.filters.lock().unwrap();
    assert_eq!(filters.as_slice(), &[("dbg-1".to_string(), false, "user_*".to_string())]);
}

#[test]
fn test_rendering_survives_a_sliver_terminal() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");
    dm.dispatch(batch(
        "dbg-1",
        &[],
        &[("a", "int", "1"), ("b", "int", "2")],
        ControlMarker::NewGeneration { frame: 0 },
    ));

    // One column wide: every panel inset must clamp, not underflow.
    let mut app = App::new(&Config::default());
    let mut terminal = Terminal::new(TestBackend::new(1, 24)).unwrap();
    terminal.draw(|frame| app.render(frame, &mut dm).unwrap()).unwrap();
}

#[test]
fn test_call_trace_pairs_and_stops_on_exit() {
    let (_, mut dm) = manager();
    connect(&mut dm, "dbg-1");
    dm.calltrace.set_enabled(true);

    dm.dispatch(DebugEvent::CallTrace(CallTraceEvent {
        backend: "dbg-1".to_string(),
        is_call: true,
        from: location("main", 10),
        to: location("helper", 3),
    }));
    dm.dispatch(DebugEvent::CallTrace(CallTraceEvent {
        backend: "dbg-1".to_string(),
        is_call: false,
        from: location("helper", 5),
        to: location("main", 10),
    }));

    assert_eq!(dm.calltrace.entries().len(), 1);
    assert!(dm.calltrace.entries()[0].returned);

    dm.dispatch(DebugEvent::ClientExit {
        backend: "dbg-1".to_string(),
        program: "app.py".to_string(),
        status: 0,
        message: String::new(),
        quiet: false,
    });
    assert!(!dm.calltrace.is_enabled(), "tracing stops when the debuggee exits");
}
