//! Log pager and creative store behaviour as seen by a host.

use ryan_core::logs::{scroll_after_insert, END_OF_LOGS, LOADING_LOGS};
use ryan_core::{
    CreativeKind, CreativeStore, Failure, LogsResponse, LogPager, PagerState, Placement,
};

fn lines(range: std::ops::Range<usize>) -> String {
    range
        .map(|i| format!("2024-05-01 12:00:{:02} - WARNING - event {}", i % 60, i))
        .collect::<Vec<_>>()
        .join("\n")
        + "\n"
}

#[test]
fn full_page_then_scroll_issues_one_fetch() {
    let mut pager = LogPager::default();
    let first = pager.open().expect("initial fetch");
    assert_eq!((first.offset, first.limit), (0, 50));

    let outcome = pager.complete(first, Ok(LogsResponse::logs(lines(0..50), Some(50), Some(true))));
    assert_eq!(outcome.inserted, 50);
    assert_eq!(pager.offset(), 50);
    assert_eq!(pager.state(), PagerState::Idle);

    let next = pager.on_scroll(3.0).expect("older page");
    assert_eq!(next.offset, 50);
    assert!(pager.on_scroll(0.0).is_none());
    assert!(pager.begin_fetch().is_none());
}

#[test]
fn exhausted_pager_ignores_scroll() {
    let mut pager = LogPager::default();
    let first = pager.open().unwrap();
    pager.complete(first, Ok(LogsResponse::logs(lines(0..12), Some(12), Some(false))));
    assert_eq!(pager.state(), PagerState::Exhausted);
    assert!(pager.on_scroll(0.0).is_none());

    let rows = pager.rows();
    assert_eq!(rows[0].text, END_OF_LOGS);
    assert_eq!(rows.iter().filter(|r| r.text == END_OF_LOGS).count(), 1);
    assert!(rows[1..].iter().all(|r| r.classes == vec!["log-message", "warning"]));
}

#[test]
fn refresh_after_exhaustion_starts_over() {
    let mut pager = LogPager::default();
    let first = pager.open().unwrap();
    pager.complete(first, Ok(LogsResponse::logs(lines(0..3), Some(3), Some(false))));
    let again = pager.refresh().expect("refresh fetch");
    assert_eq!(again.offset, 0);
    assert_eq!(pager.rows().len(), 1);
    assert_eq!(pager.rows()[0].text, LOADING_LOGS);
}

#[test]
fn http_failure_shows_status_and_keeps_offset() {
    let mut pager = LogPager::default();
    let first = pager.open().unwrap();
    pager.complete(first, Err(Failure::Http("Service Unavailable".into())));
    assert_eq!(pager.offset(), 0);
    assert_eq!(
        pager.rows().last().unwrap().text,
        "Error fetching logs: Service Unavailable"
    );
    assert!(pager.on_scroll(0.0).is_some());
}

#[test]
fn prepend_scroll_keeps_viewport() {
    assert_eq!(scroll_after_insert(Placement::Prepend, 1000.0, 1800.0), 800.0);
}

#[test]
fn active_output_follows_removals() {
    let mut store = CreativeStore::new();
    store.add("a", CreativeKind::Code);
    store.add("b", CreativeKind::Creative);
    store.add("c", CreativeKind::Code);
    assert_eq!(store.active_index(), Some(2));

    store.remove(2);
    assert_eq!(store.active_index(), Some(1));
    assert_eq!(store.active_content(), Some("b"));

    let mut empty = CreativeStore::new();
    assert!(empty.remove(0).is_none());
    assert_eq!(empty.active_index(), None);
}
