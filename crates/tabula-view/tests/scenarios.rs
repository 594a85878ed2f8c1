#![forbid(unsafe_code)]

//! End-to-end view scenarios driven through the public coordinator API and
//! its declarative attributes.

use tabula_core::{Row, RowId};
use tabula_view::{
    ColumnDecl, ColumnRef, FilterOp, FilterRule, RowVisibility, SortDirection, ViewConfig,
    ViewCoordinator, ViewEvent, names,
};

// ── Helpers ─────────────────────────────────────────────────────────────

fn people_columns() -> Vec<ColumnDecl> {
    vec![
        ColumnDecl::new("Name"),
        ColumnDecl::new("Email"),
        ColumnDecl::new("Role"),
    ]
}

fn people_rows() -> Vec<Row> {
    vec![
        Row::new(1, ["Ava", "ava@example.com", "Admin"]),
        Row::new(2, ["Liam", "liam@example.com", "Editor"]),
        Row::new(3, ["Mia", "mia@example.com", "Admin"]),
    ]
}

fn people(config: ViewConfig) -> ViewCoordinator {
    let mut view = ViewCoordinator::new(config);
    view.attach(people_columns(), people_rows());
    view.drain_events();
    view
}

fn visible_names(view: &ViewCoordinator) -> Vec<String> {
    view.visible_slice()
        .rows
        .iter()
        .map(|r| r.row.cell(0).to_string())
        .collect()
}

fn header_keys(view: &ViewCoordinator) -> Vec<String> {
    view.columns().iter().map(|c| c.key.clone()).collect()
}

// ── Scenario 1: virtualization window ───────────────────────────────────

#[test]
fn scrolled_window_materializes_overscanned_range() {
    let config = ViewConfig::default()
        .with_virtualization(240.0)
        .with_row_height(40.0)
        .with_overscan(2);
    let mut view = ViewCoordinator::new(config);
    let rows = (0..120u64).map(|i| Row::new(i, [format!("row {i}")])).collect();
    view.attach(vec![ColumnDecl::new("Label")], rows);
    view.drain_events();

    view.set_scroll_immediate(480.0);

    let window = view.virtual_window();
    assert_eq!(window.start, 10);
    assert_eq!(window.end, 20);
    assert!(window.len() >= 6 + 2 * 2);

    let slice = view.visible_slice();
    assert!(slice.has_spacers());
    assert_eq!(slice.top_spacer, 400.0);
    assert_eq!(slice.bottom_spacer, 4000.0);
    assert_eq!(slice.rows.first().map(|r| r.position), Some(10));
    assert!(view.visibility(5).contains(RowVisibility::HIDDEN_BY_VIRTUAL));

    let events = view.drain_events();
    assert!(events.contains(&ViewEvent::VirtualRangeChanged {
        start: 10,
        end: 20,
        visible: 10,
        total: 120,
        top_spacer: 400.0,
        bottom_spacer: 4000.0,
    }));
}

// ── Scenario 2: structured rule ─────────────────────────────────────────

#[test]
fn equals_rule_hides_non_matching_rows() {
    let mut view = people(ViewConfig::default());
    view.set_attribute(
        names::FILTER_RULES,
        r#"[{"column":"role","op":"equals","value":"Admin"}]"#,
    );

    assert_eq!(visible_names(&view), vec!["Ava", "Mia"]);
    assert!(view.visibility(1).contains(RowVisibility::HIDDEN_BY_FILTER));
    assert!(view.visibility(0).is_visible());

    let events = view.drain_events();
    let filter = events
        .iter()
        .find(|e| e.kind() == "filter-changed")
        .expect("filter-changed emitted");
    let ViewEvent::FilterChanged {
        rules,
        total,
        filtered,
        ..
    } = filter
    else {
        unreachable!();
    };
    assert_eq!((*total, *filtered), (3, 2));
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].column, "role");
    assert_eq!(rules[0].op, "equals");
}

// ── Scenario 3: sort toggle policy ──────────────────────────────────────

#[test]
fn header_clicks_toggle_then_reset() {
    let mut view = people(ViewConfig::default());
    assert_eq!(view.header_click(0), Some(SortDirection::Asc));
    assert_eq!(view.header_click(0), Some(SortDirection::Desc));
    assert_eq!(visible_names(&view), vec!["Mia", "Liam", "Ava"]);
    assert_eq!(view.attribute(names::SORT_DIRECTION), Some("desc"));

    assert_eq!(view.header_click(2), Some(SortDirection::Asc));
    assert_eq!(view.sort_state().column.as_deref(), Some("role"));
    // Equal roles keep collection order.
    assert_eq!(visible_names(&view), vec!["Ava", "Mia", "Liam"]);

    let sorts: Vec<_> = view
        .drain_events()
        .into_iter()
        .filter(|e| e.kind() == "sort-changed")
        .collect();
    assert_eq!(sorts.len(), 3);
}

// ── Scenario 4: page normalization ──────────────────────────────────────

#[test]
fn out_of_range_page_is_normalized() {
    let mut view = people(ViewConfig::default());
    view.set_attribute(names::PAGE_SIZE, "500");
    view.drain_events();
    view.set_attribute(names::PAGE, "9999");

    let page = view.page_window();
    assert_eq!((page.page, page.page_count), (1, 1));
    assert_eq!(view.attribute(names::PAGE), Some("1"));
    let events = view.drain_events();
    assert!(events.contains(&ViewEvent::PageNormalized {
        requested: 9999,
        page: 1,
        page_count: 1,
    }));
}

// ── Scenario 5: reorder round-trip ──────────────────────────────────────

#[test]
fn emitted_order_round_trips() {
    let mut view = people(ViewConfig::default());
    let reorder = view.move_column(0, 2).expect("move applies");
    assert_eq!(reorder.order_string(), "email,role,name");

    let events = view.drain_events();
    assert!(events.contains(&ViewEvent::ColumnOrderChanged {
        source: Some(0),
        target: Some(2),
        order: vec!["email".into(), "role".into(), "name".into()],
    }));
    let arranged = header_keys(&view);

    let mut fresh = people(ViewConfig::default());
    fresh.set_attribute(names::COLUMN_ORDER, &reorder.order_string());
    assert_eq!(header_keys(&fresh), arranged);

    // Re-applying to the view that produced it changes nothing.
    view.set_attribute(names::COLUMN_ORDER, &reorder.order_string());
    assert_eq!(header_keys(&view), arranged);
    assert!(view.drain_events().iter().all(|e| e.kind() != "column-order-changed"));
}

// ── Scenario 6: multi-select and clear ──────────────────────────────────

#[test]
fn clear_reports_prior_count() {
    let mut view = people(ViewConfig::default());
    view.set_attribute(names::MULTISELECT, "");
    assert!(view.toggle_row(RowId::new(1)));
    assert!(view.toggle_row(RowId::new(2)));
    assert_eq!(view.selected_ids(), vec![RowId::new(1), RowId::new(2)]);
    assert!(view.bulk_visible());

    assert_eq!(view.clear_selection(), 2);
    assert!(view.drain_events().contains(&ViewEvent::BulkCleared { count: 2 }));
    assert!(!view.is_selected(RowId::new(1)));
    assert!(!view.is_selected(RowId::new(2)));
    assert!(!view.bulk_visible());
}

// ── Selection survives filtering ────────────────────────────────────────

#[test]
fn selection_survives_filter_round_trip() {
    let mut view = people(ViewConfig::default());
    view.toggle_row(RowId::new(2));
    view.set_filter_query("admin");
    assert!(visible_names(&view).iter().all(|n| n != "Liam"));
    assert!(view.is_selected(RowId::new(2)));
    let flags = view.visibility(1);
    assert!(flags.contains(RowVisibility::HIDDEN_BY_FILTER | RowVisibility::SELECTED));

    view.set_filter_query("");
    assert!(view.is_selected(RowId::new(2)));
    assert!(view.visible_slice().rows.iter().any(|r| r.selected && r.index == 1));
}

// ── Pins and widths ─────────────────────────────────────────────────────

#[test]
fn pins_follow_widths_and_order() {
    let mut view = people(ViewConfig::default().with_column_widths(48.0, 100.0));
    view.resize_column(&ColumnRef::Key("name".into()), 150.0);
    view.set_attribute(names::COLUMN_PINS, "left:name,email;right:role");

    let layout = view.pin_layout().clone();
    assert_eq!(layout.left.len(), 2);
    assert_eq!(layout.left[0].offset, 0.0);
    assert_eq!(layout.left[1].offset, 150.0);
    assert!(layout.left[1].edge && !layout.left[0].edge);
    assert_eq!(layout.right[0].key, "role");
    assert!(layout.right[0].edge);

    view.move_column(0, 1);
    let layout = view.pin_layout();
    assert_eq!(layout.left[0].key, "email");
    assert_eq!(layout.left[1].offset, 100.0);
    assert_eq!(view.attribute(names::COLUMN_PINS), Some("left:name,email;right:role"));
}

#[test]
fn resize_below_minimum_is_clamped_and_reported() {
    let mut view = people(ViewConfig::default());
    assert_eq!(view.resize_column(&ColumnRef::Index(1), 3.0), Some(48.0));
    assert!(view.drain_events().contains(&ViewEvent::ColumnResized {
        key: "email".into(),
        width: 48.0,
    }));
}

// ── Column references across reorders ───────────────────────────────────

#[test]
fn positional_rule_keeps_its_column_through_reorder() {
    let mut view = people(ViewConfig::default());
    view.set_attribute(
        names::FILTER_RULES,
        r#"[{"column":2,"op":"equals","value":"Admin"}]"#,
    );
    assert_eq!(view.filtered_count(), 2);
    assert_eq!(
        view.attribute(names::FILTER_RULES),
        Some(r#"[{"column":"role","op":"equals","value":"Admin"}]"#)
    );

    view.move_column(2, 0);
    assert_eq!(view.column_order(), "role,name,email");
    assert_eq!(view.filtered_count(), 2);
    assert_eq!(visible_names(&view), vec!["Ava", "Mia"]);
}

#[test]
fn positional_query_column_set_before_attach_is_pinned_on_attach() {
    let mut view = ViewCoordinator::new(ViewConfig::default());
    view.set_attribute(names::FILTER_COLUMN, "2");
    view.set_attribute(names::FILTER_QUERY, "admin");
    view.attach(people_columns(), people_rows());
    assert_eq!(view.attribute(names::FILTER_COLUMN), Some("role"));
    assert_eq!(view.attribute(names::FILTER_RULES), None);
    assert_eq!(visible_names(&view), vec!["Ava", "Mia"]);

    view.move_column(2, 0);
    assert_eq!(visible_names(&view), vec!["Ava", "Mia"]);
}

#[test]
fn numeric_column_keys_are_addressable() {
    let mut view = ViewCoordinator::new(ViewConfig::default());
    view.attach(
        vec![ColumnDecl::new("Name"), ColumnDecl::new("2024")],
        vec![Row::new(1, ["Ava", "x"]), Row::new(2, ["Liam", "y"])],
    );
    view.set_filter_rules(vec![FilterRule::on("2024", FilterOp::Equals, "x")]);
    assert_eq!(view.filtered_count(), 1);

    view.set_filter_rules(Vec::new());
    assert_eq!(
        view.request_sort(&ColumnRef::parse("2024")),
        Some(SortDirection::Asc)
    );
    assert_eq!(view.sort_state().column.as_deref(), Some("2024"));
}
