use pretty_assertions::assert_eq;
use selectable::{
    ConfigError, EventLog, IdGenerator, ItemValue, Notification, OperationError, PresentHandle,
    PresentRequest, Presenter, Selectable, SelectableConfig, ViewSnapshot,
};
use std::{cell::RefCell, rc::Rc};

fn parse_items(text: &str) -> Vec<ItemValue> {
    ItemValue::parse_json5(text)
        .expect("items parse")
        .as_array()
        .expect("array")
        .to_vec()
}

fn cities() -> Vec<ItemValue> {
    parse_items(
        "[
            { id: 1, name: 'Oslo', country: { code: 'no', label: 'Norway' } },
            { id: 2, name: 'Lyon', country: { code: 'fr', label: 'France' } },
            { id: 3, name: 'Bergen', country: { code: 'no', label: 'Norway' } },
            { id: 4, name: 'Paris', country: { code: 'fr', label: 'France' } },
        ]",
    )
}

fn city_config(multiple: bool, store_key: Option<bool>) -> SelectableConfig {
    SelectableConfig {
        item_value_field: Some("id".to_string()),
        item_text_field: Some("name".to_string()),
        should_store_item_value: store_key,
        is_multiple: multiple,
        ..Default::default()
    }
}

fn build(config: SelectableConfig, items: Vec<ItemValue>, log: &EventLog) -> Selectable {
    Selectable::builder(config)
        .items(items)
        .observer(log.clone())
        .build(&IdGenerator::new())
        .expect("build")
}

/// Records every presenter call by name.
#[derive(Clone, Default)]
struct Recorder {
    calls: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Presenter for Recorder {
    fn present(&mut self, request: &PresentRequest) -> anyhow::Result<PresentHandle> {
        self.calls
            .borrow_mut()
            .push(format!("present backdrop={}", request.backdrop_dismiss));
        Ok(PresentHandle(7))
    }

    fn dismiss(&mut self, handle: PresentHandle) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(format!("dismiss {}", handle.0));
        Ok(())
    }

    fn refresh(&mut self, view: ViewSnapshot<'_>) {
        self.calls
            .borrow_mut()
            .push(format!("refresh staged={}", view.staged.len()));
    }

    fn set_infinite_scroll_enabled(&mut self, enabled: bool) {
        self.calls.borrow_mut().push(format!("infinite {enabled}"));
    }

    fn complete_infinite_scroll(&mut self) {
        self.calls.borrow_mut().push("complete".to_string());
    }
}

#[test]
fn external_keys_round_trip_through_the_selection() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);

    s.set_value(ItemValue::from(vec![3, 1])).expect("set value");

    assert_eq!(s.selected_items(), &[ItemValue::from(3), ItemValue::from(1)]);
    assert_eq!(s.serialized_value(), "[3,1]");
    assert!(s.has_value());
    assert_eq!(s.label_text().text, "Bergen, Oslo");
}

#[test]
fn applying_the_same_value_twice_is_stable() {
    let log = EventLog::new();
    let mut s = build(city_config(false, None), cities(), &log);
    let record = ItemValue::parse_json5("{ id: 2 }").expect("record");

    s.set_value(record.clone()).expect("first");
    let selected = s.selected_items().to_vec();
    s.set_value(record).expect("second");

    assert_eq!(s.selected_items(), selected.as_slice());
    assert_eq!(selected, vec![cities()[1].clone()]);
}

#[test]
fn dangling_references_are_dropped() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);
    s.set_value(ItemValue::from(vec![1, 99])).expect("set value");
    assert_eq!(s.selected_items(), &[ItemValue::from(1)]);
}

#[test]
fn single_selection_never_holds_more_than_one_item() {
    let log = EventLog::new();
    let mut s = build(
        SelectableConfig {
            has_confirm_button: true,
            ..Default::default()
        },
        vec!["a".into(), "b".into(), "c".into()],
        &log,
    );
    s.open().expect("open");
    s.toggle_item(&"a".into()).expect("a");
    s.toggle_item(&"b".into()).expect("b");
    assert_eq!(s.staged_items(), &[ItemValue::from("b")]);
    assert_eq!(s.selected_items().len(), 1);

    s.confirm().expect("confirm");
    assert_eq!(s.value(), &ItemValue::from("b"));
}

#[test]
fn confirm_with_nothing_staged_commits_null() {
    let log = EventLog::new();
    let mut s = build(
        SelectableConfig {
            has_confirm_button: true,
            ..Default::default()
        },
        vec!["a".into(), "b".into()],
        &log,
    );
    s.set_value("a".into()).expect("set");
    s.open().expect("open");
    s.toggle_item(&"a".into()).expect("deselect");
    s.confirm_selection().expect("confirm");
    assert_eq!(s.value(), &ItemValue::Null);
    assert!(!s.has_value());
}

#[test]
fn encoded_values_resolve_whole_records() {
    let log = EventLog::new();
    let mut s = build(city_config(true, None), cities(), &log);
    s.set_value_encoded("[{'id': 4}, {'id': 2}]").expect("set encoded");
    assert_eq!(s.selected_items(), &[cities()[3].clone(), cities()[1].clone()]);

    let err = s.set_value_encoded("[{'id': 4}").expect_err("malformed");
    assert!(matches!(err, ConfigError::MalformedValue { .. }));
    assert_eq!(s.selected_items().len(), 2);
}

#[test]
fn grouping_preserves_first_seen_order_and_covers_every_item() {
    let log = EventLog::new();
    let items = cities();
    let s = build(
        SelectableConfig {
            group_value_field: Some("country.code".to_string()),
            group_text_field: Some("country.label".to_string()),
            ..city_config(false, None)
        },
        items.clone(),
        &log,
    );

    let groups = s.groups();
    let keys: Vec<_> = groups.iter().map(|g| g.key.as_deref()).collect();
    let labels: Vec<_> = groups.iter().map(|g| g.label.as_deref()).collect();
    assert_eq!(keys, vec![Some("no"), Some("fr")]);
    assert_eq!(labels, vec![Some("Norway"), Some("France")]);
    assert_eq!(groups[0].items, vec![items[0].clone(), items[2].clone()]);
    assert_eq!(groups.iter().map(|g| g.items.len()).sum::<usize>(), items.len());
}

#[test]
fn virtual_scroll_disables_grouping() {
    let log = EventLog::new();
    let s = build(
        SelectableConfig {
            group_value_field: Some("country.code".to_string()),
            has_virtual_scroll: true,
            ..city_config(false, None)
        },
        cities(),
        &log,
    );
    assert_eq!(s.groups().len(), 1);
    assert!(s.groups()[0].is_sentinel());
}

#[test]
fn filtered_items_are_a_subset_that_contains_the_search_text() {
    let log = EventLog::new();
    let mut s = build(city_config(false, None), cities(), &log);
    s.open().expect("open");
    log.clear();

    s.search("  o ");
    let names: Vec<_> = s
        .filtered_groups()
        .iter()
        .flat_map(|g| g.items.iter())
        .filter_map(|i| i.get("name").and_then(ItemValue::as_str))
        .collect();
    assert_eq!(names, vec!["Oslo", "Lyon"]);
    assert_eq!(s.search_text(), "o");

    s.search("zzz");
    assert!(!s.has_filtered_items());
    assert_eq!(log.names(), vec!["search-succeeded", "search-failed"]);
}

#[test]
fn delegated_search_only_announces_the_text() {
    let log = EventLog::new();
    let mut s = build(
        SelectableConfig {
            should_delegate_search_to_event: true,
            ..city_config(false, None)
        },
        cities(),
        &log,
    );
    s.open().expect("open");
    log.clear();

    s.search(" Par ");
    assert_eq!(
        log.notifications(),
        vec![Notification::SearchRequested {
            search_text: "Par".to_string()
        }]
    );
    assert_eq!(s.filtered_groups(), s.groups());

    s.close().expect("close");
    assert_eq!(s.search_text(), "Par");
}

#[test]
fn closing_resets_a_local_search() {
    let log = EventLog::new();
    let mut s = build(city_config(false, None), cities(), &log);
    s.open().expect("open");
    s.search("Oslo");
    s.close().expect("close");
    assert_eq!(s.search_text(), "");
    assert!(!s.has_search_text());
}

#[test]
fn internal_commit_is_processed_once_and_later_writes_are_external() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);
    s.open().expect("open");
    s.toggle_item(&cities()[1]).expect("toggle");
    log.clear();

    s.confirm().expect("confirm");
    assert_eq!(
        log.notifications(),
        vec![Notification::Changed {
            value: ItemValue::from(vec![2])
        }]
    );

    log.clear();
    s.set_value(ItemValue::from(vec![4])).expect("external");
    assert_eq!(s.selected_items(), &[ItemValue::from(4)]);
    assert_eq!(log.names(), vec!["changed", "style-state-changed"]);
}

#[test]
fn external_empty_values_normalize_in_place() {
    let log = EventLog::new();
    let mut single = build(city_config(false, Some(true)), cities(), &log);
    single.set_value(ItemValue::from(1)).expect("set");
    single.set_value("".into()).expect("clear");
    assert_eq!(single.value(), &ItemValue::Null);
    assert!(single.selected_items().is_empty());

    let mut multiple = build(city_config(true, Some(true)), cities(), &log);
    multiple.set_value(ItemValue::Null).expect("clear");
    assert_eq!(multiple.value(), &ItemValue::Array(Vec::new()));
}

#[test]
fn backdrop_dismissal_reports_close() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);
    s.open().expect("open");
    s.toggle_item(&cities()[0]).expect("toggle");
    log.clear();

    s.handle_dismissed(true);

    assert!(!s.is_open());
    assert!(s.staged_items().is_empty());
    assert_eq!(
        log.notifications(),
        vec![Notification::Closed { by_backdrop: true }]
    );

    s.handle_dismissed(true);
    assert_eq!(log.names().len(), 1);
}

#[test]
fn programmatic_dismissal_is_silent() {
    let log = EventLog::new();
    let mut s = build(city_config(false, None), cities(), &log);
    s.open().expect("open");
    log.clear();
    s.handle_dismissed(false);
    assert!(!s.is_open());
    assert!(log.names().is_empty());
}

#[test]
fn operations_in_the_wrong_state_are_rejected() {
    let log = EventLog::new();
    let mut s = build(
        SelectableConfig {
            disabled_items: vec![ItemValue::from(2)],
            ..city_config(false, Some(true))
        },
        cities(),
        &log,
    );

    assert!(matches!(
        s.toggle_item(&cities()[0]),
        Err(OperationError::NotOpen { .. })
    ));
    assert!(matches!(s.scroll_to_top(), Err(OperationError::NotOpen { .. })));
    assert!(matches!(
        s.close(),
        Err(OperationError::AlreadyClosedOrDisabled { .. })
    ));

    s.open().expect("open");
    assert!(matches!(
        s.open(),
        Err(OperationError::AlreadyOpenOrDisabled { .. })
    ));
    assert!(s.is_item_disabled(&cities()[1]));
    assert!(matches!(
        s.toggle_item(&cities()[1]),
        Err(OperationError::ItemDisabled { .. })
    ));
    assert!(s.selected_items().is_empty());
    assert!(s.is_open());
}

#[test]
fn rejected_items_leave_state_untouched() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);
    s.set_value(ItemValue::from(vec![1])).expect("set");

    let mixed = vec![cities()[0].clone(), ItemValue::from("stray")];
    let err = s.set_items(mixed).expect_err("mixed");
    assert!(matches!(err, ConfigError::MixedItems { index: 1, .. }));

    let err = s
        .set_items_from_value(ItemValue::from("not a list"))
        .expect_err("not a sequence");
    assert!(matches!(err, ConfigError::ItemsNotSequence { .. }));

    assert_eq!(s.items(), cities().as_slice());
    assert_eq!(s.selected_items(), &[ItemValue::from(1)]);
}

#[test]
fn delegated_search_results_keep_the_committed_value() {
    let log = EventLog::new();
    let mut s = build(
        SelectableConfig {
            should_delegate_search_to_event: true,
            ..city_config(true, Some(true))
        },
        cities(),
        &log,
    );
    s.set_value(ItemValue::from(vec![1, 2])).expect("set");
    s.open().expect("open");
    s.toggle_item(&cities()[2]).expect("toggle");
    assert_eq!(
        s.staged_items(),
        &[ItemValue::from(1), ItemValue::from(2), ItemValue::from(3)]
    );
    log.clear();

    s.search("Berg");
    s.set_items(vec![cities()[2].clone()]).expect("search results");

    assert_eq!(s.value(), &ItemValue::from(vec![1, 2]));
    assert!(s.has_value());
    assert_eq!(s.staged_items(), &[ItemValue::from(3)]);
    assert_eq!(s.selected_items(), &[ItemValue::from(3)]);
    assert_eq!(log.names(), vec!["search-requested"]);
}

#[test]
fn replacing_items_drops_dangling_selection_only() {
    let log = EventLog::new();
    let mut s = build(city_config(true, None), cities(), &log);
    s.set_value_encoded("[{'id': 1}, {'id': 2}]").expect("set");
    log.clear();

    let mut renamed = cities()[1..].to_vec();
    if let ItemValue::Object(map) = &mut renamed[0] {
        map.insert("name".to_string(), "Lyon-Part-Dieu".into());
    }
    s.set_items(renamed.clone()).expect("replace");

    assert_eq!(s.selected_items(), &[renamed[0].clone()]);
    assert_eq!(s.value().as_array().map(|a| a.len()), Some(2));
    assert!(log.names().is_empty());
}

#[test]
fn clear_announces_and_drops_the_selection() {
    let log = EventLog::new();
    let mut s = build(city_config(true, Some(true)), cities(), &log);
    s.set_value(ItemValue::from(vec![1, 3])).expect("set");
    log.clear();

    s.clear();

    assert_eq!(
        log.notifications(),
        vec![Notification::Cleared {
            items: vec![ItemValue::from(1), ItemValue::from(3)]
        }]
    );
    assert!(s.selected_items().is_empty());
    assert_eq!(s.value(), &ItemValue::from(vec![1, 3]));

    s.commit(&[]).expect("commit");
    assert_eq!(s.value(), &ItemValue::Array(Vec::new()));
}

#[test]
fn footer_buttons_follow_the_flags() {
    let log = EventLog::new();
    let mut s = build(SelectableConfig::default(), vec!["a".into()], &log);
    assert_eq!(s.footer_button_count(), 0);
    s.set_can_clear(true);
    s.set_has_confirm_button(true);
    s.set_can_add_item(true);
    assert_eq!(s.footer_button_count(), 3);
    s.set_has_confirm_button(false);
    s.set_multiple(true).expect("multiple");
    assert_eq!(s.footer_button_count(), 3);
}

#[test]
fn switching_to_multiple_reshapes_the_value() {
    let log = EventLog::new();
    let mut s = build(SelectableConfig::default(), vec!["a".into(), "b".into()], &log);
    s.set_value("b".into()).expect("set");
    s.set_multiple(true).expect("multiple");
    assert_eq!(s.value(), &ItemValue::from(vec!["b"]));
    s.set_multiple(false).expect("single");
    assert_eq!(s.value(), &ItemValue::from("b"));
}

#[test]
fn style_state_tracks_value_and_disabled() {
    let log = EventLog::new();
    let mut s = build(SelectableConfig::default(), vec!["a".into()], &log);
    log.clear();
    s.set_value("a".into()).expect("set");
    s.set_disabled(true);

    let styles: Vec<_> = log
        .notifications()
        .into_iter()
        .filter_map(|n| match n {
            Notification::StyleChanged(style) => Some(style),
            _ => None,
        })
        .collect();
    assert_eq!(styles.len(), 2);
    assert!(styles[0].has_value && !styles[0].is_disabled);
    assert!(styles[1].has_value && styles[1].is_disabled);
}

#[test]
fn presenter_sees_requests_refreshes_and_infinite_scroll() {
    let log = EventLog::new();
    let recorder = Recorder::default();
    let mut s = Selectable::builder(SelectableConfig {
        has_infinite_scroll: true,
        should_backdrop_close: false,
        ..city_config(true, Some(true))
    })
    .items(cities())
    .presenter(recorder.clone())
    .observer(log.clone())
    .build(&IdGenerator::new())
    .expect("build");

    s.toggle_item(&cities()[0]).expect_err("closed");
    s.open().expect("open");
    s.toggle_item(&cities()[0]).expect("toggle");
    s.disable_infinite_scroll();
    s.request_more_items();
    s.end_infinite_scroll().expect("end");
    s.close().expect("close");

    assert_eq!(
        recorder.calls(),
        vec![
            "present backdrop=false",
            "refresh staged=0",
            "refresh staged=1",
            "infinite false",
            "complete",
            "refresh staged=1",
            "dismiss 7",
        ]
    );
    assert!(log.names().contains(&"more-items-requested"));
}

#[test]
fn focus_and_add_requests_are_forwarded() {
    let log = EventLog::new();
    let mut s = build(SelectableConfig::default(), vec!["a".into()], &log);
    log.clear();
    s.focus();
    s.request_add_item();
    s.blur();
    assert_eq!(
        log.names(),
        vec!["focus-gained", "add-item-requested", "focus-lost"]
    );
}
