use eqconvert_core::chart::{self, Viewport};
use eqconvert_core::convert::download_filename;
use eqconvert_core::markup::{escape_markup, to_html};
use eqconvert_core::protocol::{GraphSplDetails, TargetFormat};
use eqconvert_core::store::{EqEntry, SessionStore, StoreError};
use eqconvert_core::tabs::{TabPair, TabPanel};
use std::collections::BTreeMap;

const UNIT: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

fn pair(tab: &str, panel: &str, label: &str) -> TabPair {
    TabPair {
        tab_id: tab.to_string(),
        panel_id: panel.to_string(),
        label: label.to_string(),
    }
}

#[test]
fn escape_covers_all_markup_characters() {
    assert_eq!(
        escape_markup("<a href=\"x\">Tom & Jerry's</a>"),
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&apos;s&lt;/a&gt;"
    );
}

#[test]
fn escape_is_idempotent_on_entities() {
    let once = escape_markup("Tom &amp; Jerry & <b>");
    assert_eq!(once, "Tom &amp; Jerry &amp; &lt;b&gt;");
    assert_eq!(escape_markup(&once), once);

    // Numeric references survive, malformed ones do not.
    assert_eq!(escape_markup("&#38; &#x26;"), "&#38; &#x26;");
    assert_eq!(escape_markup("&#; &#xZZ;"), "&amp;#; &amp;#xZZ;");
}

#[test]
fn indents_nested_markup_one_level_per_open_tag() {
    let text = "<?xml version=\"1.0\"?>\n<plist>\n<dict>\n<key>name</key>\n</dict>\n</plist>";
    let expected = [
        "&lt;?xml version=&quot;1.0&quot;?&gt;".to_string(),
        format!("{UNIT}&lt;plist&gt;"),
        format!("{UNIT}{UNIT}&lt;dict&gt;"),
        format!("{UNIT}{UNIT}&lt;key&gt;name&lt;/key&gt;"),
        format!("{UNIT}&lt;/dict&gt;"),
        "&lt;/plist&gt;".to_string(),
    ]
    .join("<br/>");
    assert_eq!(to_html(text), expected);
}

#[test]
fn depth_never_goes_negative() {
    let text = "</a>\n</b>\n<c>";
    let expected = [
        "&lt;/a&gt;".to_string(),
        "&lt;/b&gt;".to_string(),
        format!("{UNIT}&lt;c&gt;"),
    ]
    .join("<br/>");
    assert_eq!(to_html(text), expected);
}

#[test]
fn self_closing_line_keeps_its_level() {
    let text = "<a>\n<b/>\n<d>";
    let expected = [
        format!("{UNIT}&lt;a&gt;"),
        format!("{UNIT}&lt;b/&gt;"),
        format!("{UNIT}{UNIT}&lt;d&gt;"),
    ]
    .join("<br/>");
    assert_eq!(to_html(text), expected);
}

#[test]
fn prolog_lines_render_flush_and_reset_depth() {
    let text = "<a>\n<Preset>\n<b>";
    let expected = [
        format!("{UNIT}&lt;a&gt;"),
        "&lt;Preset&gt;".to_string(),
        format!("{UNIT}&lt;b&gt;"),
    ]
    .join("<br/>");
    assert_eq!(to_html(text), expected);
}

#[test]
fn formatter_keeps_no_state_between_calls() {
    let opens = "<a>\n<b>\n<c>";
    let first = to_html(opens);
    assert_eq!(to_html(opens), first);
}

#[test]
fn download_filenames_follow_the_substitution_rule() {
    assert_eq!(
        download_filename("myeq.txt", TargetFormat::Aupreset),
        "myeq.aupreset"
    );
    assert_eq!(download_filename("x", TargetFormat::Aupreset), "x.aupreset");
    assert_eq!(
        download_filename("myeq.txt", TargetFormat::RmeTotalmixChannel),
        "myeq.tmeq"
    );
    assert_eq!(
        download_filename("myeq.txt", TargetFormat::RmeTotalmixRoom),
        "myeq.tmreq"
    );
    // APO keeps the source name untouched.
    assert_eq!(download_filename("myeq.txt", TargetFormat::Apo), "myeq.txt");
}

#[test]
fn chart_size_clamps_to_the_sane_range() {
    let huge = Viewport {
        width: 10_000,
        height: 500,
    };
    assert_eq!(chart::chart_size(huge), (800, 400));

    let tiny = Viewport {
        width: 100,
        height: 500,
    };
    assert_eq!(chart::chart_size(tiny), (300, 150));
}

#[test]
fn stage_chart_truncates_at_the_first_gap() {
    let mut spl = BTreeMap::new();
    spl.insert("0".to_string(), vec![1.0]);
    spl.insert("1".to_string(), vec![2.0]);
    spl.insert("3".to_string(), vec![4.0]);
    let details = GraphSplDetails {
        freq: vec![1000.0],
        spl,
    };
    let spec = chart::stage_chart(
        &details,
        Viewport {
            width: 640,
            height: 480,
        },
    );
    assert_eq!(spec.data.len(), 2);
    assert_eq!(spec.data[1].y, vec![2.0]);
    assert_eq!(spec.data[0].showlegend, Some(false));
    assert!(!spec.config.responsive);
}

#[test]
fn stage_lookup_resolves_string_keys_and_stops_past_the_end() {
    let mut spl = BTreeMap::new();
    spl.insert("0".to_string(), vec![1.0]);
    spl.insert("1".to_string(), vec![2.0]);
    let details = GraphSplDetails {
        freq: vec![1000.0],
        spl,
    };
    assert_eq!(details.stage(0), Some(&[1.0][..]));
    assert_eq!(details.stage(1), Some(&[2.0][..]));
    assert_eq!(details.stage(2), None);
}

#[test]
fn stage_chart_caps_the_series_count() {
    let mut spl = BTreeMap::new();
    for i in 0..40 {
        spl.insert(i.to_string(), vec![i as f64]);
    }
    let details = GraphSplDetails {
        freq: vec![1000.0],
        spl,
    };
    let spec = chart::stage_chart(
        &details,
        Viewport {
            width: 640,
            height: 480,
        },
    );
    assert_eq!(spec.data.len(), 32);
}

#[test]
fn entries_require_a_128_character_hash() {
    assert!(EqEntry::new(&"a".repeat(128), "ok").is_ok());
    assert!(EqEntry::new(&"a".repeat(127), "short").is_err());
    assert!(EqEntry::new(&"a".repeat(129), "long").is_err());
    assert!(EqEntry::new("", "empty").is_err());
}

#[test]
fn store_preserves_append_order_and_resets_to_empty() {
    let mut store = SessionStore::new();
    for i in 0..3 {
        let entry = EqEntry::new(&"b".repeat(128), format!("eq{i}")).expect("entry");
        store.append(entry);
    }
    assert_eq!(store.count(), 3);
    for i in 0..3 {
        assert_eq!(store.entry_at(i).expect("entry").name(), format!("eq{i}"));
    }
    assert!(matches!(
        store.entry_at(3),
        Err(StoreError::IndexOutOfRange { index: 3, count: 3 })
    ));

    store.reset();
    assert_eq!(store.count(), 0);
    assert!(store.entry_at(0).is_err());
}

#[test]
fn rebuilding_a_panel_activates_the_first_pair() {
    let mut panel = TabPanel::new();
    assert!(panel.active().is_none());

    panel.rebuild(vec![
        pair("name0", "plot0", "Living Room"),
        pair("name1", "plot1", "Office"),
    ]);
    assert_eq!(panel.active().expect("active").panel_id, "plot0");
    assert!(panel.is_tab_active("name0"));
    assert!(!panel.is_tab_active("name1"));
}

#[test]
fn exactly_one_panel_is_visible_after_activation() {
    let mut panel = TabPanel::new();
    panel.rebuild(vec![
        pair("name0", "plot0", "a"),
        pair("name1", "plot1", "b"),
        pair("name2", "plot2", "c"),
    ]);

    panel.activate("plot1").expect("known target");
    let visible: Vec<&str> = panel
        .pairs()
        .iter()
        .map(|p| p.panel_id.as_str())
        .filter(|id| panel.is_panel_visible(id))
        .collect();
    assert_eq!(visible, vec!["plot1"]);

    let active_tabs: Vec<&str> = panel
        .pairs()
        .iter()
        .map(|p| p.tab_id.as_str())
        .filter(|id| panel.is_tab_active(id))
        .collect();
    assert_eq!(active_tabs, vec!["name1"]);
}

#[test]
fn unknown_activation_target_is_rejected_and_state_kept() {
    let mut panel = TabPanel::new();
    panel.rebuild(vec![pair("name0", "plot0", "a"), pair("name1", "plot1", "b")]);
    panel.activate("plot1").expect("known target");

    assert!(panel.activate("plot7").is_err());
    assert!(panel.activate_tab("name7").is_err());
    // The previously active pair is still the visible one.
    assert_eq!(panel.active().expect("active").panel_id, "plot1");
}

#[test]
fn tab_clicks_move_the_active_pair() {
    let mut panel = TabPanel::new();
    panel.rebuild(vec![pair("name0", "plot0", "a"), pair("name1", "plot1", "b")]);

    panel.activate_tab("name1").expect("known tab");
    assert!(panel.is_panel_visible("plot1"));
    assert!(!panel.is_panel_visible("plot0"));

    panel.rebuild(Vec::new());
    assert!(panel.active().is_none());
    assert!(panel.is_empty());
}
