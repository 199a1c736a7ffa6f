//! Bulk menu import: pasted text to a replaced category.

use std::sync::Arc;

use tiffin_client::TiffinClient;
use tiffin_client::bulk::{lines_to_menu_items, parse_bulk_menu};
use tiffin_client::mutations::MutationError;
use tiffin_core::{MenuCategory, Rupees, UserId, UserRole};
use tiffin_integration_tests::InMemoryBackend;

fn setup(role: UserRole) -> (Arc<InMemoryBackend>, TiffinClient) {
    tiffin_integration_tests::init_tracing();
    let backend = Arc::new(InMemoryBackend::new());
    backend.sign_in(&UserId::new("2vxsx-fae"), role);
    let client = TiffinClient::new(Arc::clone(&backend) as Arc<dyn tiffin_client::remote::RemoteService>);
    (backend, client)
}

#[tokio::test]
async fn test_pasted_price_list_replaces_the_category() {
    let (backend, client) = setup(UserRole::Admin);

    // Seed an item the import should wipe out.
    client
        .mutations()
        .add_menu_item(tiffin_core::NewMenuItem::bare(
            "Old Biryani",
            Rupees::new(99),
            MenuCategory::Biryani,
        ))
        .await
        .expect("seed item");
    client.queries().menu_items().await.expect("warm cache");
    let menu_calls = backend.calls("menu_items");

    let report = parse_bulk_menu("Chicken Biryani, 250/-\nGarlic Naan\nMutton Biryani, 300/-");
    assert_eq!(report.lines_submitted, 3);
    assert_eq!(report.lines_skipped(), 1);

    client
        .mutations()
        .replace_category_menu_items(
            MenuCategory::Biryani,
            lines_to_menu_items(&report.items, MenuCategory::Biryani),
        )
        .await
        .expect("replace");

    // The replace invalidated the menu caches.
    let menu = client
        .queries()
        .menu_items_by_category(MenuCategory::Biryani)
        .await
        .expect("category");
    assert_eq!(backend.calls("menu_items"), menu_calls);
    let names: Vec<_> = menu.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Chicken Biryani", "Mutton Biryani"]);
    assert_eq!(menu[0].price, Rupees::new(250));

    let all = client.queries().menu_items().await.expect("all items");
    assert_eq!(backend.calls("menu_items"), menu_calls + 1);
    assert!(all.iter().all(|i| i.name != "Old Biryani"));
}

#[tokio::test]
async fn test_fully_unparseable_paste_is_rejected_client_side() {
    let (backend, client) = setup(UserRole::Admin);

    let report = parse_bulk_menu("Today's specials\nAsk the counter");
    assert!(report.items.is_empty());

    let err = client
        .mutations()
        .replace_category_menu_items(
            MenuCategory::Starters,
            lines_to_menu_items(&report.items, MenuCategory::Starters),
        )
        .await
        .expect_err("nothing to import");
    assert!(matches!(err, MutationError::Validation(_)));
    assert_eq!(backend.calls("replace_category_menu_items"), 0);
}

#[tokio::test]
async fn test_deactivated_item_stays_listed() {
    let (_backend, client) = setup(UserRole::Admin);

    let id = client
        .mutations()
        .add_menu_item(tiffin_core::NewMenuItem::bare(
            "Veg Momos",
            Rupees::new(90),
            MenuCategory::Momos,
        ))
        .await
        .expect("add item");

    client
        .mutations()
        .set_menu_item_active(id, false)
        .await
        .expect("deactivate");

    let menu = client.queries().menu_items().await.expect("menu");
    assert_eq!(menu.len(), 1);
    assert!(!menu[0].is_active);
}
