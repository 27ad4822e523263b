use super::*;
use crate::cache::ResultCache;
use crate::net::Transport;
use crate::net::test_helpers::{MockTransport, countries_response, usa_france};
use crate::net::types::QueryError;
use std::time::Duration;

fn selector_with(mock: &Arc<MockTransport>) -> CountrySelector {
    let client = QueryClient::new(Arc::clone(mock) as Arc<dyn Transport>, Arc::new(ResultCache::new()));
    CountrySelector::new(client)
}

async fn mounted(mock: &Arc<MockTransport>) -> CountrySelector {
    let selector = selector_with(mock);
    selector.mount().await.unwrap();
    selector
}

// =========================================================================
// lifecycle
// =========================================================================

#[tokio::test]
async fn starts_idle() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = selector_with(&mock);
    assert_eq!(selector.state().phase, Phase::Idle);
    assert!(selector.is_mounted());
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn mount_publishes_loading_before_result() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(30)));
    let selector = selector_with(&mock);

    let handle = selector.mount();
    assert_eq!(selector.state().phase, Phase::Loading);
    assert_eq!(selector.view(), SelectorView::Loading);

    handle.await.unwrap();
    assert!(matches!(selector.state().phase, Phase::Populated { .. }));
}

#[tokio::test]
async fn subscribers_see_each_transition() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(10)));
    let selector = selector_with(&mock);
    let mut rx = selector.subscribe();

    let handle = selector.mount();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().phase, Phase::Loading);
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().phase.is_settled());
    handle.await.unwrap();
}

#[tokio::test]
async fn settled_waits_for_result() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(10)));
    let selector = selector_with(&mock);
    let _handle = selector.mount();
    let state = selector.settled().await;
    assert_eq!(state.rows().map(<[CountryRow]>::len), Some(2));
}

// =========================================================================
// rendering
// =========================================================================

#[tokio::test]
async fn populated_renders_two_labeled_options() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = mounted(&mock).await;

    let SelectorView::Options { options, confirmation, .. } = selector.view() else {
        panic!("expected options, got {:?}", selector.view());
    };
    let labels: Vec<&str> = options.iter().map(|o| o.label.as_str()).collect();
    assert_eq!(labels, vec!["USA \u{2014} 12 customers", "France \u{2014} 5 customers"]);
    assert!(confirmation.is_none());
}

#[tokio::test]
async fn empty_result_renders_no_data_not_error() {
    let mock = Arc::new(MockTransport::new(vec![countries_response(&[])]));
    let selector = mounted(&mock).await;
    assert_eq!(selector.view(), SelectorView::Empty { text: view::NO_DATA_TEXT });
}

#[tokio::test]
async fn failure_renders_message_and_no_options() {
    let mock = Arc::new(MockTransport::new(vec![Err(QueryError::Network("network unreachable".into()))]));
    let selector = mounted(&mock).await;

    let SelectorView::Error { message } = selector.view() else {
        panic!("expected error view");
    };
    assert!(message.contains("network unreachable"));
    assert!(selector.state().rows().is_none());
}

#[tokio::test]
async fn failure_is_terminal_until_refetch() {
    let mock = Arc::new(MockTransport::new(vec![Err(QueryError::Network("down".into())), usa_france()]));
    let selector = mounted(&mock).await;
    assert!(matches!(selector.state().phase, Phase::Failed { .. }));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(mock.calls(), 1);
    assert!(matches!(selector.state().phase, Phase::Failed { .. }));

    selector.refetch().await.unwrap();
    assert!(matches!(selector.state().phase, Phase::Populated { .. }));
    assert_eq!(mock.calls(), 2);
}

// =========================================================================
// selection
// =========================================================================

#[tokio::test]
async fn select_and_clear_update_confirmation() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = mounted(&mock).await;

    selector.select(Some("USA")).unwrap();
    assert_eq!(selector.selection().as_deref(), Some("USA"));
    let SelectorView::Options { confirmation, .. } = selector.view() else {
        panic!("expected options");
    };
    assert_eq!(confirmation.as_deref(), Some("Selected country: USA"));

    selector.select(None).unwrap();
    assert!(selector.selection().is_none());
    let SelectorView::Options { confirmation, .. } = selector.view() else {
        panic!("expected options");
    };
    assert!(confirmation.is_none());
}

#[tokio::test]
async fn select_unknown_country_is_rejected() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = mounted(&mock).await;

    assert_eq!(selector.select(Some("Atlantis")), Err(SelectError::UnknownCountry("Atlantis".into())));
    assert!(selector.selection().is_none());
}

#[tokio::test]
async fn select_before_population_is_rejected() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = selector_with(&mock);
    assert_eq!(selector.select(Some("USA")), Err(SelectError::NotPopulated));
    assert!(selector.select(None).is_ok());
}

#[tokio::test]
async fn select_publishes_change_synchronously() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = mounted(&mock).await;
    let mut rx = selector.subscribe();

    selector.select(Some("France")).unwrap();
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().selection.as_deref(), Some("France"));

    selector.select(Some("France")).unwrap();
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn refetch_with_identical_rows_keeps_selection() {
    let mock = Arc::new(MockTransport::new(vec![usa_france(), usa_france()]));
    let selector = mounted(&mock).await;
    selector.select(Some("USA")).unwrap();

    selector.refetch().await.unwrap();
    assert_eq!(selector.selection().as_deref(), Some("USA"));
    assert_eq!(mock.calls(), 1);

    selector.client.cache().clear();
    selector.refetch().await.unwrap();
    assert_eq!(mock.calls(), 2);
    assert_eq!(selector.selection().as_deref(), Some("USA"));
}

#[tokio::test]
async fn changed_rows_clear_selection_even_when_country_remains() {
    let mock = Arc::new(MockTransport::new(vec![
        usa_france(),
        countries_response(&[("USA", 13), ("Chile", 2)]),
    ]));
    let selector = mounted(&mock).await;
    selector.select(Some("USA")).unwrap();

    selector.client.cache().clear();
    selector.refetch().await.unwrap();

    assert_eq!(selector.state().rows(), Some(&[CountryRow::new("USA", 13), CountryRow::new("Chile", 2)][..]));
    assert!(selector.selection().is_none());
    let SelectorView::Options { confirmation, .. } = selector.view() else {
        panic!("expected options");
    };
    assert!(confirmation.is_none());
}

#[tokio::test]
async fn clear_selection_publishes_only_when_something_was_selected() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = mounted(&mock).await;
    let mut rx = selector.subscribe();

    selector.clear_selection();
    assert!(!rx.has_changed().unwrap());

    selector.select(Some("France")).unwrap();
    rx.borrow_and_update();
    selector.clear_selection();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().selection.is_none());
}

#[tokio::test]
async fn new_rows_without_selection_clear_it() {
    let mock = Arc::new(MockTransport::new(vec![usa_france(), countries_response(&[("Chile", 3)])]));
    let selector = mounted(&mock).await;
    selector.select(Some("USA")).unwrap();

    selector.client.cache().clear();
    selector.refetch().await.unwrap();
    assert!(selector.selection().is_none());
    assert_eq!(selector.state().rows().map(<[CountryRow]>::len), Some(1));
}

#[tokio::test]
async fn failure_after_selection_clears_it() {
    let mock = Arc::new(MockTransport::new(vec![usa_france(), Err(QueryError::Network("down".into()))]));
    let selector = mounted(&mock).await;
    selector.select(Some("France")).unwrap();

    selector.client.cache().clear();
    selector.refetch().await.unwrap();
    assert!(selector.selection().is_none());
    assert!(matches!(selector.view(), SelectorView::Error { .. }));
}

// =========================================================================
// cancellation / staleness
// =========================================================================

#[tokio::test]
async fn unmount_discards_late_result() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(30)));
    let selector = selector_with(&mock);
    let mut rx = selector.subscribe();

    let handle = selector.mount();
    rx.changed().await.unwrap();
    rx.borrow_and_update();
    selector.unmount();
    handle.await.unwrap();

    assert!(!selector.is_mounted());
    assert_eq!(selector.state().phase, Phase::Loading);
    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn mount_after_unmount_is_inert() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]));
    let selector = selector_with(&mock);
    selector.unmount();
    selector.mount().await.unwrap();
    assert_eq!(selector.state().phase, Phase::Idle);
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn dropping_selector_cancels_outstanding_dispatch() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(30)));
    let selector = selector_with(&mock);
    let rx = selector.subscribe();
    let handle = selector.mount();
    drop(selector);

    handle.await.unwrap();
    assert_eq!(rx.borrow().phase, Phase::Loading);
}

#[tokio::test]
async fn overlapping_dispatches_share_fetch_and_settle_once() {
    let mock = Arc::new(MockTransport::new(vec![usa_france()]).with_delay(Duration::from_millis(20)));
    let selector = selector_with(&mock);

    let first = selector.mount();
    let second = selector.refetch();
    let mut rx = selector.subscribe();
    rx.borrow_and_update();

    first.await.unwrap();
    second.await.unwrap();

    // Only the latest generation publishes, so exactly one change is pending.
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().phase.is_settled());
    assert_eq!(mock.calls(), 1);
}
