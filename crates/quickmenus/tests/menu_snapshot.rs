use insta::assert_snapshot;
use quickmenus::QuickMenus;
use quickmenus::app::quick_select::QuickSelectSet;
use quickmenus::domain::model::RadialPosition;
use quickmenus::host::headless::HeadlessHost;
use quickmenus::host::store::MemoryStore;
use quickmenus::infra::config::{Config, MenuConfig};

fn plugin() -> QuickMenus {
    let config = Config {
        menus: vec![
            MenuConfig {
                name: "FMenus".into(),
                hotkey: "F".into(),
                annotation: None,
                kinds: vec!["quick-select".into()],
                pre_build: None,
                secondary: None,
            },
            MenuConfig {
                name: "AltFMenus".into(),
                hotkey: "Alt+F".into(),
                annotation: None,
                kinds: vec!["quick-select-collections".into()],
                pre_build: None,
                secondary: None,
            },
        ],
        ..Config::default()
    };
    let mut quick = QuickMenus::new(config, Box::new(MemoryStore::new()));
    quick.load(&mut HeadlessHost::new()).expect("load plugin");
    quick
}

#[test]
fn quick_select_menu_renders() {
    let mut quick = plugin();
    quick
        .library()
        .with_active(|collection, store| {
            collection.add_set(
                QuickSelectSet::new(["|hero|spine"], Some("Spine".into()), Some(RadialPosition::N))?,
                store,
            )?;
            collection.add_set(QuickSelectSet::new(["|hero|arm_L"], None, None)?, store)?;
            collection.add_set(
                QuickSelectSet::new(["|hero|leg_L", "|hero|leg_R"], None, Some(RadialPosition::S))?,
                store,
            )
        })
        .expect("seed sets");

    let mut host = HeadlessHost::new();
    host.select(["|hero|head"]);
    let report = quick.press("FMenus", &mut host);
    assert!(report.failed.is_empty());

    let rendered = host.render();
    assert_snapshot!("quick_select_menu", rendered.trim_end());
}

#[test]
fn collections_menu_renders() {
    let mut quick = plugin();
    quick.library().create("anim").expect("create anim");
    quick.library().set_active("default").expect("activate default");

    let mut host = HeadlessHost::new().with_panel("graphEditor");
    let report = quick.press("AltFMenus", &mut host);
    assert_eq!(report.built, vec!["quick-select-collections"]);

    let rendered = host.render();
    assert_snapshot!("collections_menu", rendered.trim_end());
}
